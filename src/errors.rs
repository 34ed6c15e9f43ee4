//! Error types for the upload pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for one pipeline run.
///
/// Each stage fails fast with exactly one of these variants; the process
/// top level converts the variant's message into the failure signal.
/// Cleanup problems are deliberately not represented here: a transient
/// artifact that cannot be removed is logged as a warning and never
/// changes the run outcome.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// One or more required configuration variables are missing.
    /// Validation scans every variable before reporting, so the message
    /// always lists all of them at once.
    #[error("The following variables are missing: {}", .0.join(", "))]
    Configuration(Vec<String>),

    /// A variable is present but carries an unrecognized value.
    #[error("Invalid value for {field}: \"{value}\"")]
    InvalidConfiguration { field: String, value: String },

    /// The configured source path does not exist.
    #[error("Source path \"{}\" does not exist", .0.display())]
    SourceNotFound(PathBuf),

    /// The source path exists but does not match the configured mode.
    #[error("Source path \"{}\" is not a {expected}", .path.display())]
    SourceTypeMismatch {
        path: PathBuf,
        expected: &'static str,
    },

    /// Building the archive failed; a partial output file may remain on
    /// disk and is removed by cleanup, not by the archiver.
    #[error("Failed to build archive: {0:#}")]
    Archive(anyhow::Error),

    /// The transfer to object storage failed. Carries the target bucket
    /// and the underlying cause so neither is ever silently swallowed.
    #[error("Upload to bucket \"{bucket}\" failed: {cause:#}")]
    Upload {
        bucket: String,
        cause: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_configuration_error_lists_all_fields() {
        let err = PipelineError::Configuration(vec![
            "SOURCE_PATH".to_string(),
            "BUCKET_NAME".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("SOURCE_PATH"));
        assert!(msg.contains("BUCKET_NAME"));
    }

    #[test]
    fn test_invalid_configuration_names_value() {
        let err = PipelineError::InvalidConfiguration {
            field: "SOURCE_MODE".to_string(),
            value: "TARBALL".to_string(),
        };
        assert!(err.to_string().contains("TARBALL"));
    }

    #[test]
    fn test_upload_error_carries_bucket_and_cause() {
        let err = PipelineError::Upload {
            bucket: "my-bucket".to_string(),
            cause: anyhow!("connection reset"),
        };
        let msg = err.to_string();
        assert!(msg.contains("my-bucket"));
        assert!(msg.contains("connection reset"));
    }
}
