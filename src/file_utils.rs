// File utilities for the video transcriber
//
// This module contains utility functions for the files the client reads and writes:
// export file naming, saving exported transcripts and reading plain-text transcripts back.

use log::{error, info};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::export::ExportFormat;

/// Name used when a transcript has no usable title
pub const DEFAULT_EXPORT_NAME: &str = "transcripcion";

/// Make a title safe to use as a file name
///
/// Every character that is not an ASCII letter or digit becomes `_`, and the result
/// is lowercased. An empty title falls back to [`DEFAULT_EXPORT_NAME`].
pub fn sanitize_filename(title: &str) -> String {
    if title.trim().is_empty() {
        return DEFAULT_EXPORT_NAME.to_string();
    }
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Build the path of an export file
///
/// # Arguments
///
/// * `dir` - Directory the export goes to
/// * `title` - Transcript title, sanitized into the file stem
/// * `format` - Export format, which picks the extension
pub fn export_path(dir: &Path, title: &str, format: ExportFormat) -> PathBuf {
    dir.join(format!("{}.{}", sanitize_filename(title), format.extension()))
}

/// Save exported text as UTF-8
///
/// # Errors
///
/// Returns an IO error if the file cannot be created or written
pub fn save_export(contents: &str, file_path: &Path) -> io::Result<()> {
    let mut file = File::create(file_path).map_err(|e| {
        error!("Failed to create export file {}: {}", file_path.display(), e);
        e
    })?;
    file.write_all(contents.as_bytes())?;
    info!("Exported transcript to {}", file_path.display());
    Ok(())
}

/// Reads a text file into a string
///
/// # Arguments
///
/// * `path` - Path to the file to read
///
/// # Returns
///
/// * `Result<String, io::Error>` - Contents of the file or an error
pub fn read_text_file(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}
