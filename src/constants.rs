//! Global constants for the s3-zip-upload application.
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make configuration changes easier.

// Compression constants
/// Chunk size for streaming file contents into the archive (512KB)
pub const COMPRESSION_CHUNK_SIZE: usize = 512 * 1024;

/// Deflate level used for every archive entry (maximum practical compression)
pub const ARCHIVE_COMPRESSION_LEVEL: i32 = 9;

// Cloud storage constants
/// S3 upload chunk size (8MB, S3 minimum is 5MB)
pub const S3_UPLOAD_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Threshold above which uploads switch to multipart (50MB)
pub const LARGE_FILE_THRESHOLD: u64 = 50 * 1024 * 1024;

// Configuration defaults
/// Region used when AWS_REGION is not supplied
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Storage class used when STORAGE_CLASS is not supplied
pub const DEFAULT_STORAGE_CLASS: &str = "STANDARD";

/// Content type used when CONTENT_TYPE is not supplied
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// File name of the transient archive inside the system temp directory
pub const DEFAULT_ARCHIVE_NAME: &str = "upload.zip";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_chunk_size_meets_s3_minimum() {
        assert!(S3_UPLOAD_CHUNK_SIZE >= 5 * 1024 * 1024);
    }

    #[test]
    fn test_multipart_threshold_exceeds_chunk_size() {
        assert!(LARGE_FILE_THRESHOLD >= S3_UPLOAD_CHUNK_SIZE as u64);
    }
}
