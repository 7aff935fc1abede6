//! File-based data source.
//!
//! Polls a JSON file for log-history snapshots. Useful for inspecting a
//! captured history offline (e.g. the master's response saved with curl).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{DataSource, HistoryEnvelope, LogHistory};

/// A data source that reads log-history snapshots from a JSON file.
///
/// Accepts either the master's envelope (`{"logs_history": [...]}`) or a
/// bare entry array. The source tracks the file's modification time and
/// only returns new data when the file has been updated.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
        }
    }

    /// Returns the path being monitored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the file's modification time.
    fn get_modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    /// Read and parse the file.
    fn read_file(&mut self) -> Option<LogHistory> {
        match fs::read_to_string(&self.path) {
            Ok(content) => match parse_history(&content) {
                Ok(history) => {
                    self.last_error = None;
                    Some(history)
                }
                Err(e) => {
                    self.last_error = Some(format!("Parse error: {}", e));
                    None
                }
            },
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                None
            }
        }
    }
}

/// Parse a history snapshot, accepting envelope or bare-array form.
fn parse_history(content: &str) -> serde_json::Result<LogHistory> {
    if content.trim_start().starts_with('[') {
        serde_json::from_str::<LogHistory>(content)
    } else {
        serde_json::from_str::<HistoryEnvelope>(content).map(|e| e.logs_history)
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<LogHistory> {
        let current_modified = self.get_modified_time();

        // Check if file has been modified since last read
        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,        // First poll, always read
            (Some(_), None) => false, // File disappeared, don't update
            (Some(last), Some(current)) => current > last,
        };

        if file_changed {
            if let Some(history) = self.read_file() {
                self.last_modified = current_modified;
                return Some(history);
            }
        }

        None
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, Write};
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{
            "logs_history": [
                {
                    "log": { "timestamp": "2025-11-02T10:00:00+00:00" },
                    "prediction": "XSS",
                    "worker": "http://127.0.0.1:8001/process_log"
                }
            ]
        }"#
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/history.json");
        assert_eq!(source.path(), Path::new("/tmp/history.json"));
        assert_eq!(source.description(), "file: /tmp/history.json");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_poll_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path());

        // First poll should return data
        let history = source.poll().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prediction.as_deref(), Some("XSS"));

        // Second poll without file change should return None
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_bare_array() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"[{{"log":{{"timestamp":"t1"}}}}]"#).unwrap();

        let mut source = FileSource::new(file.path());
        let history = source.poll().unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_file_source_detects_changes() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path());
        let _ = source.poll();

        // Modify the file (need to wait a bit for mtime to change)
        std::thread::sleep(std::time::Duration::from_millis(10));
        file.rewind().unwrap();
        writeln!(file, r#"{{"logs_history": []}}"#).unwrap();
        file.flush().unwrap();

        // Poll again - should detect change
        // Note: may be flaky on filesystems with low mtime resolution
        if let Some(history) = source.poll() {
            assert!(history.is_empty());
        }
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/history.json");

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
    }

    #[test]
    fn test_file_source_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut source = FileSource::new(file.path());

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Parse error"));
    }
}
