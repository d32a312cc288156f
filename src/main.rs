use anyhow::Context;
use clap::Parser;
use ymir::app::{runner, ServiceBuilder};
use ymir::config::{Cli, RegistryConfig};
use ymir::utils::logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match RegistryConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    logger::init_cli_logger(cli.verbose, &config.logging.level, config.logging.json);
    tracing::debug!("configuration: {:?}", config);

    let bus = ServiceBuilder::new(&config)
        .build()
        .await
        .context("failed to initialise the registry")?;

    let outcome = runner::execute(&bus, cli.command, cli.json).await;

    // Pending audit records are written before the process exits.
    bus.shutdown().await;

    match outcome {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("command failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    }
}
