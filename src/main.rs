use anyhow::Result;
use clap::Parser;
use fleet_config::AppConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fleet-assistant")]
#[command(about = "Wind fleet dashboard backend with a Databricks Genie relay", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override `server.bind` from the config file
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,

    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, action = clap::ArgAction::SetTrue)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs)?;

    let mut config = AppConfig::load_or_default(&cli.config)?;
    if let Some(bind) = cli.bind {
        info!("Overriding bind address with {}", bind);
        config.server.bind = bind;
        config.validate()?;
    }

    fleet_server::serve(config).await?;

    Ok(())
}

fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let filter = if verbose {
        "debug"
    } else {
        "info"
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    Ok(())
}
