//! Stage orchestration for one upload run.
//!
//! Stages execute strictly in sequence: archive (ZIP mode only), then
//! upload. Cleanup of the transient archive is handled by a drop guard
//! registered before the archiver runs, so it covers every exit path,
//! including a partially written archive after an archive failure.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::archive;
use crate::cloud::s3::ObjectStore;
use crate::config::{SourceMode, UploadJob};
use crate::errors::PipelineError;

/// Drop guard owning the transient archive file for the duration of a run.
///
/// Dropping it deletes the file. A file that is already absent counts as
/// success; any other deletion error is logged and never overrides the
/// primary run outcome.
struct TransientArtifact {
    path: PathBuf,
}

impl TransientArtifact {
    fn register(path: &Path) -> Self {
        TransientArtifact {
            path: path.to_path_buf(),
        }
    }
}

impl Drop for TransientArtifact {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed transient archive {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Cleanup warning: could not remove {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Run the archive-then-upload pipeline for a validated job.
///
/// In ZIP mode the source directory is compressed to `job.archive_path` and
/// that archive is uploaded; in FILE mode the source file is uploaded as-is
/// and the archive path is never touched. Exactly one artifact is uploaded
/// per invocation, and the transient archive is removed before this function
/// returns, whether the run succeeded or failed.
pub async fn run(job: &UploadJob, store: &dyn ObjectStore) -> Result<(), PipelineError> {
    let _cleanup = match job.source_mode {
        SourceMode::Zip => Some(TransientArtifact::register(&job.archive_path)),
        SourceMode::File => None,
    };

    let upload_path: &Path = match job.source_mode {
        SourceMode::Zip => {
            info!(
                "Creating zip file of directory {}",
                job.source_path.display()
            );
            let entries = archive::compress_dir(&job.source_path, &job.archive_path)?;
            info!(
                "Archived {} entries to {}",
                entries,
                job.archive_path.display()
            );
            &job.archive_path
        }
        SourceMode::File => &job.source_path,
    };

    info!("Uploading to \"{}\" as \"{}\"", job.bucket, job.dest_key);
    store
        .store_file(upload_path, &job.dest_key)
        .await
        .map_err(|cause| PipelineError::Upload {
            bucket: job.bucket.clone(),
            cause,
        })?;
    info!("Successful upload to \"{}\"", job.bucket);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_transient_artifact_removes_file_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("artifact.zip");
        fs::write(&path, b"zip bytes").unwrap();

        {
            let _guard = TransientArtifact::register(&path);
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_transient_artifact_absent_file_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("never-created.zip");

        // Dropping the guard must not panic when the file never existed.
        let guard = TransientArtifact::register(&path);
        drop(guard);
        assert!(!path.exists());
    }
}
