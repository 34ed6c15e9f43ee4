//! Cloud storage integration.

/// S3 client construction from job configuration
pub mod client;

/// Upload transport (streaming, multipart-capable)
pub mod s3;
