//! In-memory zip archive assembly.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::AnnotixError;

/// Append-only deflate zip writer backed by a `Vec<u8>`.
pub(crate) struct ArchiveWriter {
    format: &'static str,
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl ArchiveWriter {
    pub(crate) fn new(format: &'static str) -> Self {
        Self {
            format,
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            entries: 0,
        }
    }

    /// Appends one file. Folders are implied by `/` in `name`.
    pub(crate) fn add(&mut self, name: &str, bytes: &[u8]) -> Result<(), AnnotixError> {
        self.zip
            .start_file(name, self.options)
            .map_err(|source| self.write_error(name, source))?;
        self.zip
            .write_all(bytes)
            .map_err(|e| self.write_error(name, e.into()))?;
        self.entries += 1;
        Ok(())
    }

    pub(crate) fn entries(&self) -> usize {
        self.entries
    }

    /// Writes the central directory and returns the archive bytes.
    pub(crate) fn finish(self) -> Result<Vec<u8>, AnnotixError> {
        let format = self.format;
        let cursor = self
            .zip
            .finish()
            .map_err(|source| AnnotixError::ArchiveWrite {
                format,
                entry: "<central directory>".to_string(),
                source,
            })?;
        Ok(cursor.into_inner())
    }

    fn write_error(&self, entry: &str, source: zip::result::ZipError) -> AnnotixError {
        AnnotixError::ArchiveWrite {
            format: self.format,
            entry: entry.to_string(),
            source,
        }
    }
}
