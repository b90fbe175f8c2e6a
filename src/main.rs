use clap::Parser;
use favirecon::{load_config, setup_logging, Cli, CliRunner};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let args = Cli::parse();

    // Load configuration; logging depends on its verbose and silent settings
    let config = match load_config(&args).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = setup_logging(&config) {
        eprintln!("{e}");
    }

    let cli_runner = match CliRunner::new(config, &args) {
        Ok(runner) => runner,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let result = tokio::select! {
        result = cli_runner.run() => result,
        _ = signal::ctrl_c() => {
            info!("Received interrupt, stopping");
            std::process::exit(130);
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
