use clap::Parser;

/// Command-line arguments for the s3-zip-upload tool.
///
/// All job configuration comes from environment variables; the command line
/// only controls process-level behavior.
#[derive(Parser, Debug)]
#[clap(
    name = "s3-zip-upload",
    about = "Archive a directory and upload it to S3-compatible storage"
)]
pub struct Args {
    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}
