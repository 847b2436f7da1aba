use thiserror::Error;

/// Main error type for okrsnap.
///
/// Only unrecoverable conditions are represented here. Per-goal fetch and
/// normalization failures are soft: the traversal engine records them in its
/// failed set and keeps going.
#[derive(Error, Debug)]
pub enum OkrsnapError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote API errors on the root-list path (fatal, unlike per-goal fetches)
    #[error("Remote API error: {0}")]
    Remote(String),

    /// The directory view returned no root goals; nothing to traverse
    #[error("Initial snapshot returned no root goals")]
    EmptyRoots,

    /// Every root goal failed to resolve; the run made zero progress
    #[error("No goals were processed successfully ({failed} roots failed)")]
    NoProgress { failed: usize },

    /// Snapshot rendering or parsing errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Snapshot persistence errors
    #[error("Sink error: {0}")]
    Sink(String),
}

/// Convenient Result type using OkrsnapError
pub type Result<T> = std::result::Result<T, OkrsnapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OkrsnapError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OkrsnapError = io_err.into();
        assert!(matches!(err, OkrsnapError::Io(_)));
    }

    #[test]
    fn test_no_progress_display() {
        let err = OkrsnapError::NoProgress { failed: 3 };
        assert!(err.to_string().contains("3 roots failed"));
    }
}
