use std::path::PathBuf;
use structopt::StructOpt;

use f2b_whitelist::config::Config;
use f2b_whitelist::pipeline;
use f2b_whitelist::registry::WhoisLookup;

/// fail2ban ignoreip whitelist generator
///
/// Scans the mail log for successful logins, journals them, and writes a
/// draft ignoreip fragment with a tiered justification report. Invoked with
/// no arguments it runs the full pipeline with the built-in paths.
#[derive(StructOpt, Debug)]
#[structopt(name = "f2b-whitelist", about = "fail2ban mail-login whitelist generator")]
struct Cli {
    /// Path to a TOML configuration file overriding the default paths
    #[structopt(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::from_args();

    let config = match cli.config {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };

    let summary = pipeline::run(&config, &WhoisLookup::new())?;
    log::info!(
        "Run complete: {} pruned, {} ingested, {} IPs in directive",
        summary.pruned,
        summary.ingested,
        summary.selected
    );

    Ok(())
}
