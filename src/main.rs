use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use termfeed::config::Config;
use termfeed::source::http::HttpTimelineSource;
use termfeed::{commands, hooks, Client, SourceHandle};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "termfeed", version, about = "Stream a timeline and type commands against it")]
struct Cli {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds between timeline polls
    #[arg(short, long)]
    interval: Option<u64>,

    /// Account name, overriding the config file
    #[arg(short, long)]
    user: Option<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match cli.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    config.apply_env();
    if let Some(interval) = cli.interval {
        config.update_interval = interval.max(1);
    }
    if let Some(user) = &cli.user {
        config.user_name = user.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let source: SourceHandle = Arc::new(HttpTimelineSource::new(&config));
    let client = Client::new(source, config.poll_interval());
    hooks::register_defaults(client.registry());
    commands::register_defaults(client.registry(), client.controller(), io::stdout())?;

    client.run().await
}
