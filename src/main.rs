mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands};
use toolbelt::{create_default_registry, AppConfig, Dispatcher};

/// Log to stderr so stdout carries only tool output.
fn init_logging(verbose: bool) {
    let default = if verbose { "toolbelt=debug" } else { "toolbelt=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    if let Some(path) = &cli.config {
        return AppConfig::load_from(path);
    }

    // Auto-generate config file on first run
    let config_path = AppConfig::config_path()?;
    if !config_path.exists() {
        let path = AppConfig::save_default()?;
        tracing::info!("created default config: {}", path.display());
    }
    AppConfig::load()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let registry = create_default_registry(&config)?;
    let dispatcher = Dispatcher::new(registry).strict(cli.strict || config.dispatch.strict);

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Commands::List { json } => cli::run_list(&dispatcher, *json, &mut stdout)?,
        Commands::Call {
            name,
            arguments,
            history,
        } => cli::run_call(
            &dispatcher,
            name,
            arguments,
            history.as_deref(),
            config.dispatch.max_result_chars,
            &mut stdout,
        )?,
    }
    Ok(())
}
