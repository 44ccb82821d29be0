use chrono::{DateTime, Local};
use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::{FileOperation, IoError};

pub const RECORD_DIR: &str = "logs";
pub const RECORD_FILE: &str = "LayoutCreation.txt";

const TIMESTAMP_FORMAT: &str = "%b-%d-%Y %I:%M:%S %p";

pub fn record_path(root: &Path) -> PathBuf {
    root.join(RECORD_DIR).join(RECORD_FILE)
}

pub fn format_record(at: &DateTime<Local>, author: &str) -> String {
    format!(
        "Layout creation completed on {} By: {}",
        at.format(TIMESTAMP_FORMAT),
        author
    )
}

/// Appends one completion line to `<root>/logs/LayoutCreation.txt`.
///
/// The `logs` directory is never created here: if the layout did not declare it, the
/// append fails and the caller decides what to do with the error.
pub fn append_completion_record(root: &Path, author: &str) -> Result<PathBuf, IoError> {
    let path = record_path(root);
    let line = format_record(&Local::now(), author);

    log::info!("{}", line);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|error| IoError::new(FileOperation::Append, path.clone(), error))?;

    writeln!(file, "{}", line)
        .map_err(|error| IoError::new(FileOperation::Append, path.clone(), error))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_record_uses_twelve_hour_clock() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 14, 5, 9).unwrap();

        assert_eq!(
            format_record(&at, "dev"),
            "Layout creation completed on Mar-07-2024 02:05:09 PM By: dev"
        );
    }

    #[test]
    fn test_append_requires_logs_directory() {
        let root = tempfile::tempdir().unwrap();

        let result = append_completion_record(root.path(), "dev");

        assert!(result.is_err());
        assert!(!root.path().join(RECORD_DIR).exists());
    }

    #[test]
    fn test_append_accumulates_lines() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join(RECORD_DIR)).unwrap();

        append_completion_record(root.path(), "dev").unwrap();
        let path = append_completion_record(root.path(), "dev").unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().all(|line| line.ends_with("By: dev")));
    }
}
