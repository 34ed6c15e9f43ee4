use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use tokio::runtime::Runtime;

use s3_zip_upload::cli::Args;
use s3_zip_upload::cloud::s3::S3Uploader;
use s3_zip_upload::config::UploadJob;
use s3_zip_upload::pipeline;

fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.verbose)?;

    // Read and validate the environment once; the job is immutable from
    // here on.
    let job = UploadJob::from_env()?;
    info!(
        "Starting {} upload of {} to bucket \"{}\"",
        job.source_mode,
        job.source_path.display(),
        job.bucket
    );

    let runtime = Runtime::new().context("Failed to create Tokio runtime")?;
    runtime.block_on(async {
        let uploader = S3Uploader::from_job(&job)?;
        pipeline::run(&job, &uploader).await?;
        Ok::<(), anyhow::Error>(())
    })?;

    info!("Upload completed successfully");
    Ok(())
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;
    Ok(())
}
