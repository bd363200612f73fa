use std::path::PathBuf;

/// Errors that can occur across DCI crates.
///
/// The coupling core itself never fails; errors come from the boundary
/// (record validation, trace input, configuration and report output).
/// Library crates use this type directly; the binary converts to
/// `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use dci_core::DciError;
///
/// let err = DciError::Config("decimals must be at most 12".into());
/// assert!(err.to_string().contains("decimals"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DciError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Trace input that is well-formed JSON but not a span list.
    #[error("parse error: {0}")]
    Parse(String),

    /// A call record that violates the caller/callee preconditions.
    #[error("invalid call record: {0}")]
    InvalidRecord(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DciError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn invalid_record_displays_message() {
        let err = DciError::InvalidRecord("empty caller".into());
        assert_eq!(err.to_string(), "invalid call record: empty caller");
    }

    #[test]
    fn json_error_converts() {
        let json_err = serde_json::from_str::<Vec<u32>>("{").unwrap_err();
        let err: DciError = json_err.into();
        assert!(err.to_string().starts_with("serialization error"));
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = DciError::FileNotFound(PathBuf::from("/tmp/traces.json"));
        assert!(err.to_string().contains("/tmp/traces.json"));
    }
}
