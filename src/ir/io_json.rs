//! JSON serialization for annotix projects.
//!
//! Two document shapes are supported:
//! - a project bundle: the project plus every image, with image bytes
//!   base64 encoded, used for backups and for moving work between machines
//! - a `.tixconfig` file: only the project name, type and classes, used to
//!   share a class setup across a team

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::model::{AnnotatedImage, Annotation, ClassDefinition, Project, ProjectType};
use crate::error::AnnotixError;

/// A project together with its images and annotations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectBundle {
    pub project: Project,
    #[serde(default)]
    pub images: Vec<AnnotatedImage>,
}

/// Class setup shared through a `.tixconfig` file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    #[serde(default)]
    pub classes: Vec<ClassDefinition>,
}

impl ProjectConfig {
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            project_type: project.project_type,
            classes: project.classes.clone(),
        }
    }

    /// Creates a fresh project from this configuration.
    pub fn into_project(self) -> Project {
        Project::new(self.name, self.project_type, self.classes)
    }
}

/// Reads a project bundle from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, including any
/// annotation whose `data` does not match its `type`.
pub fn read_project_json(path: &Path) -> Result<ProjectBundle, AnnotixError> {
    let file = File::open(path).map_err(AnnotixError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| AnnotixError::ProjectJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a project bundle to a JSON file (pretty printed).
pub fn write_project_json(path: &Path, bundle: &ProjectBundle) -> Result<(), AnnotixError> {
    let file = File::create(path).map_err(AnnotixError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, bundle).map_err(|source| {
        AnnotixError::ProjectJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Reads a project bundle from a JSON string.
pub fn from_json_str(json: &str) -> Result<ProjectBundle, serde_json::Error> {
    serde_json::from_str(json)
}

/// Writes a project bundle to a JSON string.
pub fn to_json_string(bundle: &ProjectBundle) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(bundle)
}

/// Fuzz-only entrypoint for bundle and annotation record parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_project(input: &[u8]) -> Result<(), AnnotixError> {
    let _ = serde_json::from_slice::<ProjectBundle>(input);
    let text = std::str::from_utf8(input).map_err(|e| {
        AnnotixError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    parse_annotation_json(text)?;
    Ok(())
}

/// Reads a `.tixconfig` file.
pub fn read_project_config(path: &Path) -> Result<ProjectConfig, AnnotixError> {
    let file = File::open(path).map_err(AnnotixError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| AnnotixError::ProjectJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders a project's `.tixconfig` contents.
pub fn to_project_config_string(project: &Project) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ProjectConfig::from_project(project))
}

/// Writes a project's `.tixconfig` file.
pub fn write_project_config(path: &Path, project: &Project) -> Result<(), AnnotixError> {
    let file = File::create(path).map_err(AnnotixError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &ProjectConfig::from_project(project)).map_err(
        |source| AnnotixError::ProjectJsonWrite {
            path: path.to_path_buf(),
            source,
        },
    )
}

/// Parses a single stored annotation record.
///
/// The error names the record's `id` when one can be read, so a bad record
/// can be traced back to the annotation store.
pub fn parse_annotation_json(json: &str) -> Result<Annotation, AnnotixError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|source| AnnotixError::AnnotationJson {
            id: "<unparsed>".to_string(),
            source,
        })?;
    let id = value
        .get("id")
        .and_then(|id| id.as_str())
        .unwrap_or("<missing id>")
        .to_string();

    serde_json::from_value(value).map_err(|source| AnnotixError::AnnotationJson { id, source })
}

/// Serde adapter storing raw bytes as standard base64.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        AnnotationData, BBoxData, ClassDefinition, Coord, PolygonData, ProjectType,
    };

    fn sample_bundle() -> ProjectBundle {
        let project = Project::new(
            "Test Project",
            ProjectType::Polygon,
            vec![
                ClassDefinition::new(0u64, "cat", "#ff0000"),
                ClassDefinition::new(1u64, "dog", "#00ff00"),
            ],
        );
        let image = AnnotatedImage::new(1u64, "image001.png", 64, 48)
            .with_bytes(vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3])
            .with_annotation(Annotation::new(
                "a-1",
                0u64,
                AnnotationData::BBox(BBoxData::new(1.0, 2.0, 3.0, 4.0)),
            ))
            .with_annotation(Annotation::new(
                "a-2",
                1u64,
                AnnotationData::Polygon(PolygonData::closed(vec![
                    Coord::new(0.0, 0.0),
                    Coord::new(10.0, 0.0),
                    Coord::new(10.0, 10.0),
                ])),
            ));

        ProjectBundle {
            project,
            images: vec![image],
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let original = sample_bundle();
        let json = to_json_string(&original).expect("serialization failed");
        let restored = from_json_str(&json).expect("deserialization failed");
        assert_eq!(restored, original);
    }

    #[test]
    fn test_image_bytes_are_base64() {
        let json = to_json_string(&sample_bundle()).expect("serialization failed");
        assert!(json.contains("\"data\": \"iVBORwABAgM=\""), "{json}");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("project.json");
        let original = sample_bundle();
        write_project_json(&path, &original).expect("write");
        let restored = read_project_json(&path).expect("read");
        assert_eq!(restored, original);
    }

    #[test]
    fn test_parse_error_names_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").expect("write");
        let err = read_project_json(&path).unwrap_err();
        assert!(matches!(err, AnnotixError::ProjectJsonParse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_project_config_roundtrip() {
        let bundle = sample_bundle();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("team.tixconfig");
        write_project_config(&path, &bundle.project).expect("write");

        let config = read_project_config(&path).expect("read");
        assert_eq!(config.name, "Test Project");
        assert_eq!(config.project_type, ProjectType::Polygon);
        assert_eq!(config.classes.len(), 2);

        let text = to_project_config_string(&bundle.project).expect("render");
        assert!(!text.contains("images"));
        assert_eq!(config.into_project().classes, bundle.project.classes);
    }

    #[test]
    fn test_parse_annotation_reports_id() {
        let err = parse_annotation_json(
            r#"{"id":"bad-1","type":"keypoints","classId":0,"data":{"x":1}}"#,
        )
        .unwrap_err();
        match err {
            AnnotixError::AnnotationJson { id, .. } => assert_eq!(id, "bad-1"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
