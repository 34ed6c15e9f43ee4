//! S3 client construction from the validated job configuration.

use anyhow::{Context, Result};
use log::warn;
use rusoto_core::{HttpClient, Region};
use rusoto_credential::StaticProvider;
use rusoto_s3::S3Client;

use crate::config::UploadJob;

/// Create an S3 client for the job's credentials, region, and optional
/// custom endpoint.
///
/// A configured endpoint takes precedence and yields a custom region, which
/// is how rusoto addresses S3-compatible services. Without one, the region
/// name is parsed, falling back to the SDK default when unrecognized.
pub fn create_s3_client(job: &UploadJob) -> Result<S3Client> {
    let region = match &job.endpoint {
        Some(endpoint) => Region::Custom {
            name: job.region.clone(),
            endpoint: endpoint.clone(),
        },
        None => match job.region.parse::<Region>() {
            Ok(region) => region,
            Err(_) => {
                warn!("Invalid region '{}', using default", job.region);
                Region::default()
            }
        },
    };

    let provider = StaticProvider::new_minimal(
        job.credentials.id.clone(),
        job.credentials.secret.clone(),
    );
    let http_client = HttpClient::new().context("Failed to create HTTP client")?;

    Ok(S3Client::new_with(http_client, provider, region))
}
