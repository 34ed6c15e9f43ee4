//! Job configuration read from environment variables.
//!
//! The process environment is snapshotted once into a flat map, validated,
//! and turned into an immutable [`UploadJob`] that the rest of the pipeline
//! receives by reference. Validation reports every missing variable in a
//! single error rather than stopping at the first one.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;

use log::warn;

use crate::constants::{
    DEFAULT_ARCHIVE_NAME, DEFAULT_CONTENT_TYPE, DEFAULT_REGION, DEFAULT_STORAGE_CLASS,
};
use crate::errors::PipelineError;

/// Environment variable names consumed by the job.
pub mod keys {
    pub const SOURCE_PATH: &str = "SOURCE_PATH";
    pub const SOURCE_MODE: &str = "SOURCE_MODE";
    pub const DEST_FILE: &str = "DEST_FILE";
    pub const BUCKET_NAME: &str = "BUCKET_NAME";
    pub const AWS_SECRET_ID: &str = "AWS_SECRET_ID";
    pub const AWS_SECRET_KEY: &str = "AWS_SECRET_KEY";
    pub const AWS_REGION: &str = "AWS_REGION";
    pub const AWS_ENDPOINT: &str = "AWS_ENDPOINT";
    pub const STORAGE_CLASS: &str = "STORAGE_CLASS";
    pub const ZIP_PATH: &str = "ZIP_PATH";
    pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
    pub const METADATA_KEY: &str = "METADATA_KEY";
    pub const METADATA_VALUE: &str = "METADATA_VALUE";
}

/// How the source path is packaged before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// The source is a directory; it is compressed into a transient ZIP
    /// archive which becomes the uploaded artifact.
    Zip,
    /// The source is a regular file and is uploaded as-is.
    File,
}

impl SourceMode {
    /// Parse the literal wire values. Case-sensitive on purpose: `zip` is
    /// rejected so a typo never silently changes the packaging behavior.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ZIP" => Some(SourceMode::Zip),
            "FILE" => Some(SourceMode::File),
            _ => None,
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::Zip => write!(f, "ZIP"),
            SourceMode::File => write!(f, "FILE"),
        }
    }
}

/// Static credentials for the object-storage backend.
#[derive(Clone)]
pub struct Credentials {
    pub id: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("secret", &"***")
            .finish()
    }
}

/// Validated, immutable description of one upload run.
#[derive(Debug, Clone)]
pub struct UploadJob {
    /// File or directory to package; guaranteed to exist and to match
    /// `source_mode` once validation has passed.
    pub source_path: PathBuf,
    pub source_mode: SourceMode,
    /// Object key the artifact is stored under.
    pub dest_key: String,
    pub bucket: String,
    pub credentials: Credentials,
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    pub endpoint: Option<String>,
    pub storage_class: String,
    pub content_type: String,
    /// Single metadata pair attached to the stored object, under the
    /// configured key name.
    pub metadata: Option<(String, String)>,
    /// Where the transient archive is written in ZIP mode. Never user data,
    /// always disposable.
    pub archive_path: PathBuf,
}

/// A value that is absent or empty counts as missing, matching shell usage
/// where `VAR=` and an unset variable mean the same thing.
fn lookup(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key).filter(|v| !v.is_empty()).cloned()
}

impl UploadJob {
    /// Snapshot the process environment and validate it into a job.
    pub fn from_env() -> Result<Self, PipelineError> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_map(&vars)
    }

    /// Validate a flat key-value map into a job descriptor.
    ///
    /// Required-field presence is checked across *all* fields before
    /// reporting, so the resulting [`PipelineError::Configuration`] names
    /// every missing variable at once. Source existence and type checks run
    /// only after presence passes, since they need the resolved path. The
    /// only side effects are `exists`/metadata calls on the source path.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, PipelineError> {
        let mut missing: Vec<String> = Vec::new();
        let mut require = |key: &str| match lookup(vars, key) {
            Some(value) => Some(value),
            None => {
                missing.push(key.to_string());
                None
            }
        };

        let source_path = require(keys::SOURCE_PATH);
        let dest_key = require(keys::DEST_FILE);
        let bucket = require(keys::BUCKET_NAME);
        let secret_id = require(keys::AWS_SECRET_ID);
        let secret_key = require(keys::AWS_SECRET_KEY);

        let (Some(source_path), Some(dest_key), Some(bucket), Some(secret_id), Some(secret_key)) =
            (source_path, dest_key, bucket, secret_id, secret_key)
        else {
            return Err(PipelineError::Configuration(missing));
        };

        let mode_value =
            lookup(vars, keys::SOURCE_MODE).unwrap_or_else(|| SourceMode::Zip.to_string());
        let source_mode =
            SourceMode::parse(&mode_value).ok_or_else(|| PipelineError::InvalidConfiguration {
                field: keys::SOURCE_MODE.to_string(),
                value: mode_value,
            })?;

        let source_path = PathBuf::from(source_path);
        if !source_path.exists() {
            return Err(PipelineError::SourceNotFound(source_path));
        }
        match source_mode {
            SourceMode::Zip if !source_path.is_dir() => {
                return Err(PipelineError::SourceTypeMismatch {
                    path: source_path,
                    expected: "directory",
                });
            }
            SourceMode::File if !source_path.is_file() => {
                return Err(PipelineError::SourceTypeMismatch {
                    path: source_path,
                    expected: "regular file",
                });
            }
            _ => {}
        }

        let metadata = match (
            lookup(vars, keys::METADATA_KEY),
            lookup(vars, keys::METADATA_VALUE),
        ) {
            (Some(key), Some(value)) => Some((key, value)),
            (None, None) => None,
            _ => {
                warn!(
                    "{} and {} must both be set; ignoring object metadata",
                    keys::METADATA_KEY,
                    keys::METADATA_VALUE
                );
                None
            }
        };

        let archive_path = lookup(vars, keys::ZIP_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join(DEFAULT_ARCHIVE_NAME));

        Ok(UploadJob {
            source_path,
            source_mode,
            dest_key,
            bucket,
            credentials: Credentials {
                id: secret_id,
                secret: secret_key,
            },
            region: lookup(vars, keys::AWS_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint: lookup(vars, keys::AWS_ENDPOINT),
            storage_class: lookup(vars, keys::STORAGE_CLASS)
                .unwrap_or_else(|| DEFAULT_STORAGE_CLASS.to_string()),
            content_type: lookup(vars, keys::CONTENT_TYPE)
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            metadata,
            archive_path,
        })
    }
}
