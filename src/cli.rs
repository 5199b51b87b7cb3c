use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "jq-exporter",
    version,
    about = "Export jq-extracted JSON values as Prometheus gauges"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(default_value = "config.yml")]
    pub config: PathBuf,
}
