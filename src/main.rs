// Entrypoint for the uploader.
// - Keeps `main` small: set up logging, parse flags, build the client and
//   hand it to the upload flow.
// - Any error ends the process with a non-zero exit status.

use clap::Parser;
use tekdrive_upload::{api::ApiClient, cli};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse_from(cli::normalize_flags(std::env::args_os()));
    let api = ApiClient::new(args.config())?;

    cli::run_upload(&api, &args.file, &args.name)?;
    Ok(())
}
