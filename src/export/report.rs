//! Export report types for tracking skipped content and lossy mappings.
//!
//! Mirrors how `validation::ValidationReport` tracks project issues: every
//! entry has a severity, a stable snake_case code and a human-readable
//! message.

use serde::Serialize;
use std::fmt;

/// A report produced alongside every export archive.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExportReport {
    /// Format name, as accepted by `ExportFormat::from_str`.
    pub format: String,
    /// Counts from the input project.
    pub input: ExportCounts,
    /// Counts actually written to the archive.
    pub output: ExportCounts,
    pub issues: Vec<ExportIssue>,
}

impl ExportReport {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: ExportIssue) {
        self.issues.push(issue);
    }

    /// Count of warning-level issues (skipped images).
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ExportSeverity::Warning)
            .count()
    }

    /// Count of info-level issues (skipped or approximated annotations).
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ExportSeverity::Info)
            .count()
    }

    /// Issues carrying the given code.
    pub fn issues_with_code(&self, code: ExportIssueCode) -> impl Iterator<Item = &ExportIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    /// Returns true if any image was left out of the archive.
    pub fn has_skipped_images(&self) -> bool {
        self.issues_with_code(ExportIssueCode::ImageSkipped)
            .next()
            .is_some()
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {}: {} images, {} annotations",
            self.format, self.input.images, self.input.annotations
        )?;

        if self.output != self.input {
            writeln!(
                f,
                "  written: {} images, {} annotations",
                self.output.images, self.output.annotations
            )?;
        }

        for (severity, heading) in [
            (ExportSeverity::Warning, "Warnings"),
            (ExportSeverity::Info, "Notes"),
        ] {
            let matching: Vec<&ExportIssue> = self
                .issues
                .iter()
                .filter(|i| i.severity == severity)
                .collect();
            if matching.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{} ({}):", heading, matching.len())?;
            for issue in matching {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// Counts of exported elements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportCounts {
    pub images: usize,
    pub annotations: usize,
}

/// A single issue recorded during export.
#[derive(Clone, Debug, Serialize)]
pub struct ExportIssue {
    pub severity: ExportSeverity,
    pub code: ExportIssueCode,
    pub message: String,
}

impl ExportIssue {
    pub fn warning(code: ExportIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ExportSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn info(code: ExportIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ExportSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportSeverity {
    /// An image was left out of the archive.
    Warning,
    /// An annotation was skipped or approximated.
    Info,
}

/// Stable issue codes for programmatic consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportIssueCode {
    /// The image failed to export and was left out.
    ImageSkipped,
    /// The image has no annotations and was left out.
    ImageWithoutAnnotations,
    /// The format cannot represent this annotation type.
    UnsupportedAnnotation,
    /// OBB rotation was dropped in favor of the axis-aligned box.
    ObbRotationDropped,
    /// Annotation has no class and the format requires one.
    MissingClass,
    /// Annotation geometry produced nothing to write (empty mask, too few points).
    EmptyGeometry,
    /// Annotation references a class the project does not define.
    UnknownClass,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_has_no_issues() {
        let report = ExportReport::new("coco");
        assert_eq!(report.warning_count(), 0);
        assert_eq!(report.info_count(), 0);
        assert!(!report.has_skipped_images());
    }

    #[test]
    fn counts_by_severity() {
        let mut report = ExportReport::new("pascal-voc");
        report.add(ExportIssue::warning(
            ExportIssueCode::ImageSkipped,
            "image 'a.png' skipped",
        ));
        report.add(ExportIssue::info(
            ExportIssueCode::UnsupportedAnnotation,
            "polygon skipped",
        ));
        report.add(ExportIssue::info(
            ExportIssueCode::ObbRotationDropped,
            "rotation dropped",
        ));
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.info_count(), 2);
        assert!(report.has_skipped_images());
        assert_eq!(
            report
                .issues_with_code(ExportIssueCode::ObbRotationDropped)
                .count(),
            1
        );
    }

    #[test]
    fn display_lists_warnings_before_notes() {
        let mut report = ExportReport::new("coco");
        report.input = ExportCounts {
            images: 2,
            annotations: 3,
        };
        report.output = ExportCounts {
            images: 1,
            annotations: 2,
        };
        report.add(ExportIssue::info(ExportIssueCode::EmptyGeometry, "note"));
        report.add(ExportIssue::warning(ExportIssueCode::ImageSkipped, "warn"));

        let text = report.to_string();
        assert!(text.contains("written: 1 images, 2 annotations"));
        let warn_at = text.find("Warnings (1):").unwrap();
        let note_at = text.find("Notes (1):").unwrap();
        assert!(warn_at < note_at);
    }

    #[test]
    fn report_serializes_to_json() {
        let mut report = ExportReport::new("yolo-detection");
        report.add(ExportIssue::info(
            ExportIssueCode::MissingClass,
            "annotation a1 has no class",
        ));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"format\":\"yolo-detection\""));
        assert!(json.contains("\"severity\":\"info\""));
        assert!(json.contains("\"code\":\"missing_class\""));
    }
}
