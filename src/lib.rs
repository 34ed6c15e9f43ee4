//! # s3-zip-upload
//!
//! A small run-to-completion task that packages a local directory into a ZIP
//! archive (or takes a single file as-is) and uploads it to an S3-compatible
//! bucket. All job input comes from environment variables, which makes it
//! suitable as a step inside CI/automation pipelines.
//!
//! ## Pipeline
//!
//! Each invocation runs four stages strictly in sequence:
//!
//! 1. **Validate** the environment into an immutable [`config::UploadJob`],
//!    reporting every missing variable at once.
//! 2. **Archive** the source directory into a transient ZIP file (skipped in
//!    `FILE` mode).
//! 3. **Upload** the artifact with a streaming, multipart-capable transfer.
//! 4. **Cleanup** removes the transient archive on every exit path, success
//!    or failure.
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`config`]: Environment-driven job configuration and validation
//! - [`errors`]: Typed failure taxonomy for the pipeline
//! - [`archive`]: Streaming ZIP creation from a directory tree
//! - [`cloud`]: S3 client construction and upload transport
//! - [`pipeline`]: Stage orchestration and transient-artifact cleanup
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Environment-driven job configuration and validation
pub mod config;

/// Typed failure taxonomy for the pipeline
pub mod errors;

/// Streaming ZIP creation from a directory tree
pub mod archive;

/// S3 client construction and upload transport
pub mod cloud;

/// Stage orchestration and transient-artifact cleanup
pub mod pipeline;

/// Application constants and configuration values
pub mod constants;
