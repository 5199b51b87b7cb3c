use anyhow::{Context, Result};
use clap::Parser;

use jq_exporter::{cli::Cli, config, init_tracing, server};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // An unreadable or unparsable configuration is fatal; the Err return
    // exits the process with code 1.
    let cfg = config::load_config(&args.config).with_context(|| {
        format!(
            "failed to load configuration from {}",
            args.config.display()
        )
    })?;

    init_tracing(&cfg.log_level);

    server::start(cfg).await
}
