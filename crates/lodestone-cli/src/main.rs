//! Lodestone CLI - Resolve players, profiles and member metrics.

use clap::Parser;
use lodestone_cli::commands;
use lodestone_cli::config::OutputFormat;
use lodestone_cli::{Cli, Command, Config, Formatter};
use lodestone_resolver::Resolver;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays clean JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let no_color = cli.no_color;

    if let Err(e) = run(cli).await {
        let formatter = Formatter::new(OutputFormat::Json, !no_color);
        eprintln!("{}", formatter.error(&format!("Error: {}", e)));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> lodestone_cli::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(key) = cli.api_key {
        config.resolver.upstream.api_key = Some(key);
    }

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let resolver = Resolver::from_config(&config.resolver)?;
    debug!(store = ?config.resolver.store.path, "Resolver ready");

    match cli.command {
        Command::Player { name } => commands::execute_player(&name, &resolver, &formatter).await?,
        Command::PlayerId { id } => commands::execute_player_id(&id, &resolver, &formatter).await?,
        Command::Profiles { name } => commands::execute_profiles(&name, &resolver, &formatter).await?,
        Command::Member { name, profile_id } => {
            commands::execute_member(&name, &profile_id, &resolver, &formatter).await?
        }
    }

    for stats in resolver.stats() {
        debug!("{}", stats.summary());
    }
    Ok(())
}
