//! Upload transport for the resolved artifact.
//!
//! Small files go up in a single `PutObject`; anything above the multipart
//! threshold is streamed in sequential 8MB parts so the payload never has to
//! reside in memory at once. The call resolves only after the backend has
//! acknowledged the complete object. No retries happen at this layer; a
//! failed transfer terminates the run and any retry policy belongs to the
//! orchestrator re-invoking the whole pipeline.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use rusoto_core::ByteStream;
use rusoto_s3::{
    AbortMultipartUploadRequest, CompleteMultipartUploadRequest, CompletedMultipartUpload,
    CompletedPart, CreateMultipartUploadRequest, PutObjectRequest, S3Client, UploadPartRequest, S3,
};
use tokio::fs::File as AsyncFile;
use tokio::io::AsyncReadExt;

use crate::cloud::client::create_s3_client;
use crate::config::UploadJob;
use crate::constants::{LARGE_FILE_THRESHOLD, S3_UPLOAD_CHUNK_SIZE};

/// Capability to durably store a local file under a key.
///
/// The pipeline depends on this trait rather than on the S3 client directly,
/// which keeps the orchestration testable without a storage backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Deliver the file's bytes under `key` and resolve only once the
    /// backend has acknowledged the complete object.
    async fn store_file(&self, path: &Path, key: &str) -> Result<()>;
}

/// S3-backed [`ObjectStore`] carrying the destination bucket, storage class,
/// content type, and optional object metadata for every request it issues.
pub struct S3Uploader {
    client: S3Client,
    bucket: String,
    storage_class: String,
    content_type: String,
    metadata: Option<HashMap<String, String>>,
}

impl S3Uploader {
    pub fn from_job(job: &UploadJob) -> Result<Self> {
        let client = create_s3_client(job)?;
        let metadata = job
            .metadata
            .as_ref()
            .map(|(key, value)| HashMap::from([(key.clone(), value.clone())]));

        Ok(S3Uploader {
            client,
            bucket: job.bucket.clone(),
            storage_class: job.storage_class.clone(),
            content_type: job.content_type.clone(),
            metadata,
        })
    }

    /// Upload a small file with a single PutObject request.
    async fn upload_whole(&self, path: &Path, key: &str, file_size: u64) -> Result<()> {
        let mut file = AsyncFile::open(path)
            .await
            .with_context(|| format!("Failed to open {} for upload", path.display()))?;
        let mut contents = Vec::with_capacity(file_size as usize);
        file.read_to_end(&mut contents)
            .await
            .with_context(|| format!("Failed to read {} for upload", path.display()))?;

        let request = PutObjectRequest {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            body: Some(ByteStream::from(contents)),
            storage_class: Some(self.storage_class.clone()),
            content_type: Some(self.content_type.clone()),
            metadata: self.metadata.clone(),
            ..Default::default()
        };
        self.client
            .put_object(request)
            .await
            .context("PutObject request failed")?;
        Ok(())
    }

    /// Upload a large file as a sequential multipart transfer, aborting the
    /// multipart upload on any part failure.
    async fn upload_multipart(&self, path: &Path, key: &str, file_size: u64) -> Result<()> {
        let create_result = self
            .client
            .create_multipart_upload(CreateMultipartUploadRequest {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                storage_class: Some(self.storage_class.clone()),
                content_type: Some(self.content_type.clone()),
                metadata: self.metadata.clone(),
                ..Default::default()
            })
            .await
            .context("Failed to initialize multipart upload")?;
        let upload_id = create_result
            .upload_id
            .ok_or_else(|| anyhow!("No upload ID returned from S3"))?;

        debug!(
            "Started multipart upload {} for {}",
            upload_id,
            path.display()
        );

        let completed_parts = match self.upload_parts(path, key, &upload_id, file_size).await {
            Ok(parts) => parts,
            Err(e) => {
                let _ = self
                    .client
                    .abort_multipart_upload(AbortMultipartUploadRequest {
                        bucket: self.bucket.clone(),
                        key: key.to_string(),
                        upload_id: upload_id.clone(),
                        ..Default::default()
                    })
                    .await;
                return Err(e);
            }
        };

        self.client
            .complete_multipart_upload(CompleteMultipartUploadRequest {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                upload_id,
                multipart_upload: Some(CompletedMultipartUpload {
                    parts: Some(completed_parts),
                }),
                ..Default::default()
            })
            .await
            .context("Failed to complete multipart upload")?;

        debug!("Completed multipart upload for {}", path.display());
        Ok(())
    }

    async fn upload_parts(
        &self,
        path: &Path,
        key: &str,
        upload_id: &str,
        file_size: u64,
    ) -> Result<Vec<CompletedPart>> {
        let mut file = AsyncFile::open(path)
            .await
            .with_context(|| format!("Failed to open {} for multipart upload", path.display()))?;

        let chunk_size = S3_UPLOAD_CHUNK_SIZE as u64;
        let num_parts = (file_size + chunk_size - 1) / chunk_size;
        debug!("Uploading {} parts for {}", num_parts, path.display());

        let mut completed_parts = Vec::with_capacity(num_parts as usize);
        let mut remaining = file_size;

        for part_number in 1..=num_parts {
            let part_size = remaining.min(chunk_size) as usize;
            let mut buffer = vec![0u8; part_size];
            file.read_exact(&mut buffer)
                .await
                .with_context(|| format!("Failed to read part {} from {}", part_number, path.display()))?;
            remaining -= part_size as u64;

            let output = self
                .client
                .upload_part(UploadPartRequest {
                    bucket: self.bucket.clone(),
                    key: key.to_string(),
                    upload_id: upload_id.to_string(),
                    part_number: part_number as i64,
                    body: Some(ByteStream::from(buffer)),
                    ..Default::default()
                })
                .await
                .with_context(|| format!("Failed to upload part {}", part_number))?;
            let e_tag = output
                .e_tag
                .ok_or_else(|| anyhow!("No ETag in upload part response"))?;

            completed_parts.push(CompletedPart {
                e_tag: Some(e_tag),
                part_number: Some(part_number as i64),
            });
            debug!("Uploaded part {}/{}", part_number, num_parts);
        }

        Ok(completed_parts)
    }
}

#[async_trait]
impl ObjectStore for S3Uploader {
    async fn store_file(&self, path: &Path, key: &str) -> Result<()> {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to get metadata for {}", path.display()))?;
        let file_size = metadata.len();

        info!(
            "Uploading {} ({} bytes) to s3://{}/{}",
            path.display(),
            file_size,
            self.bucket,
            key
        );

        if file_size > LARGE_FILE_THRESHOLD {
            self.upload_multipart(path, key, file_size).await
        } else {
            self.upload_whole(path, key, file_size).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{keys, UploadJob};
    use std::collections::HashMap as StdHashMap;
    use tempfile::TempDir;

    fn job_map(source: &Path) -> StdHashMap<String, String> {
        StdHashMap::from([
            (keys::SOURCE_PATH.to_string(), source.display().to_string()),
            (keys::DEST_FILE.to_string(), "out.zip".to_string()),
            (keys::BUCKET_NAME.to_string(), "test-bucket".to_string()),
            (keys::AWS_SECRET_ID.to_string(), "AKIATEST".to_string()),
            (keys::AWS_SECRET_KEY.to_string(), "secret".to_string()),
        ])
    }

    #[test]
    fn test_uploader_carries_job_parameters() {
        let temp = TempDir::new().unwrap();
        let mut vars = job_map(temp.path());
        vars.insert(keys::STORAGE_CLASS.to_string(), "GLACIER".to_string());
        vars.insert(keys::CONTENT_TYPE.to_string(), "application/zip".to_string());
        vars.insert(keys::METADATA_KEY.to_string(), "build-id".to_string());
        vars.insert(keys::METADATA_VALUE.to_string(), "42".to_string());

        let job = UploadJob::from_map(&vars).unwrap();
        let uploader = S3Uploader::from_job(&job).unwrap();

        assert_eq!(uploader.bucket, "test-bucket");
        assert_eq!(uploader.storage_class, "GLACIER");
        assert_eq!(uploader.content_type, "application/zip");
        assert_eq!(
            uploader.metadata,
            Some(StdHashMap::from([(
                "build-id".to_string(),
                "42".to_string()
            )]))
        );
    }

    #[test]
    fn test_part_count_calculation() {
        let chunk = S3_UPLOAD_CHUNK_SIZE as u64;
        for (file_size, expected_parts) in [
            (chunk - 1, 1),
            (chunk, 1),
            (chunk + 1, 2),
            (chunk * 10, 10),
        ] {
            let num_parts = (file_size + chunk - 1) / chunk;
            assert_eq!(
                num_parts, expected_parts,
                "File size {} should need {} parts",
                file_size, expected_parts
            );
        }
    }

    #[tokio::test]
    async fn test_store_file_nonexistent_path() {
        let temp = TempDir::new().unwrap();
        let job = UploadJob::from_map(&job_map(temp.path())).unwrap();
        let uploader = S3Uploader::from_job(&job).unwrap();

        let result = uploader
            .store_file(Path::new("/nonexistent/file.zip"), "out.zip")
            .await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to get metadata"));
    }
}
