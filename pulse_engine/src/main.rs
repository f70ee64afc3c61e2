use anyhow::Result;
use clap::Parser;
use pulse_engine::cli;
use pulse_engine::config::PulseConfig;
use pulse_engine::telemetry;

#[derive(Parser)]
#[command(author, version, about = "Pulse feed engine CLI")]
struct Args {
    /// Override the base directory used for persisted session state
    #[arg(long)]
    base_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();
    let config = match args.base_dir {
        Some(base) => PulseConfig::with_paths(pulse_engine::config::PulsePaths::from_base_dir(
            base,
        )?),
        None => PulseConfig::from_env()?,
    };
    tracing::info!(
        page_size = config.page_size,
        debounce_ms = config.debounce_ms,
        "pulse engine starting"
    );

    cli::run_cli(config).await
}
