//! Error types for the graypipe image pipeline.
//!
//! Pipeline errors are organized by stage so that a failed item's report
//! names both the file and what went wrong with it.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for graypipe operations.
#[derive(Error, Debug)]
pub enum GraypipeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Per-item pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source file does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// No separate output path could be derived, so saving would replace the input
    #[error("Refusing to overwrite source {0}: no distinct output path")]
    DestinationIsSource(PathBuf),

    /// Source file exists but could not be read
    #[error("Cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Neither content nor extension identify a known format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// A transform stage received a job that was never loaded
    #[error("No image loaded for {path} before {stage} stage")]
    MissingPayload { path: PathBuf, stage: String },

    /// Resampling failed
    #[error("Resize failed for {path}: {message}")]
    Resize { path: PathBuf, message: String },

    /// Output directory could not be created
    #[error("Cannot create directory {path}: {message}")]
    CreateDir { path: PathBuf, message: String },

    /// Output file could not be created or flushed
    #[error("Cannot write {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// JPEG encoding failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// A stage's blocking task panicked or was cancelled
    #[error("{stage} task failed for {path}: {message}")]
    Join {
        path: PathBuf,
        stage: String,
        message: String,
    },
}

/// Convenience type alias for graypipe results.
pub type Result<T> = std::result::Result<T, GraypipeError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_names_path() {
        let err = PipelineError::FileNotFound(PathBuf::from("images/missing.jpeg"));
        assert_eq!(err.to_string(), "File not found: images/missing.jpeg");
    }

    #[test]
    fn test_pipeline_error_converts_to_top_level() {
        let err: GraypipeError = PipelineError::Resize {
            path: PathBuf::from("a.png"),
            message: "zero-sized image".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("Pipeline error: Resize failed"));
    }

    #[test]
    fn test_destination_is_source_message() {
        let err = PipelineError::DestinationIsSource(PathBuf::from("photos/cat.png"));
        assert_eq!(
            err.to_string(),
            "Refusing to overwrite source photos/cat.png: no distinct output path"
        );
    }
}
