//! Transcript adapter
//!
//! The transcript is the append-only log of prior actions in a session. The
//! engine only ever reads it; provenance rules scan it for spawn-evidence
//! markers. An unreadable transcript is a distinct signal, not an empty one:
//! the delegation rule fails secure on it.

use std::path::Path;

use thiserror::Error;

/// The transcript could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transcript unavailable: {0}")]
pub struct TranscriptUnavailable(pub String);

/// Read the transcript as lines.
///
/// Read once per invocation and memoized by the snapshot; the file may keep
/// growing underneath us, which is fine — rules only look for evidence of
/// events that must have happened *before* the action under review.
pub fn read_lines(path: &Path) -> Result<Vec<String>, TranscriptUnavailable> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TranscriptUnavailable(format!("{}: {}", path.display(), e)))?;

    Ok(content.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "line one").unwrap();
        writeln!(file, "line two").unwrap();

        let lines = read_lines(file.path()).unwrap();
        assert_eq!(lines, vec!["line one", "line two"]);
    }

    #[test]
    fn test_missing_file_is_unavailable_not_empty() {
        let err = read_lines(Path::new("/nonexistent/transcript.jsonl")).unwrap_err();
        assert!(err.0.contains("transcript.jsonl"));
    }

    #[test]
    fn test_empty_file_is_empty_not_unavailable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let lines = read_lines(file.path()).unwrap();
        assert!(lines.is_empty());
    }
}
