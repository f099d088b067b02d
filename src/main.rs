mod api;
mod auth;
mod cli;
mod client;
mod multipart;

use clap::Parser;
use cli::Cli;
use log::error;

fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let cli = Cli::parse();

    // Build the stderr logger.
    let env_logger = env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .format_file(false)
        .format_target(false)
        .format_timestamp(None)
        .build();

    // Wrap the logger so log messages and the upload progress bar don't
    // interfere with each other.
    let progress = indicatif::MultiProgress::new();
    indicatif_log_bridge::LogWrapper::new(progress.clone(), env_logger)
        .try_init()
        .unwrap();

    // Run the CLI application. Upload references go to stdout; everything
    // else is logged to stderr.
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = cli.run(&progress, &mut stdout) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}
