use clap::Parser;
use env_logger::Env;
use log::{debug, error};

use video_transcriber::cli::{self, CliArgs};
use video_transcriber::config_loader;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // Initialize logger
    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    // Config file values fill in whatever the environment leaves unset
    if config_loader::load_config() {
        debug!("Loaded {}", config_loader::CONFIG_FILE_PATH);
    }

    if let Err(e) = cli::run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
