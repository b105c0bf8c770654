mod cli;
mod commands;
mod config;
mod storage;

use crate::cli::{Command, ConfigCommand, StoreCommand};
use clap::Parser;
use color_eyre::Result;
use stash_storage::LocalStorage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI to the local store.
fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    let password = cli.password.as_deref();
    match cli.command.unwrap_or(Command::Store(StoreCommand::Keys)) {
        Command::Version => print_version(),
        Command::Health => run_health_check(&config, password)?,
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
        Command::Store(cmd) => run_store_command(cmd, &config, password, cli.read_only)?,
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info; keep stdout for command output.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("stash {}", env!("CARGO_PKG_VERSION"));
}

fn run_store_command(
    cmd: StoreCommand,
    config: &config::Config,
    password: Option<&str>,
    read_only: bool,
) -> Result<()> {
    let mut settings = storage::storage_config(config, read_only)?;
    if settings.read_only && cmd.modifies_store() {
        color_eyre::eyre::bail!("cannot modify a store opened read-only");
    }
    settings.auto_persist = cmd.persists_on_exit();

    let mut store = storage::open(settings, password)?;
    let mut stdout = std::io::stdout().lock();
    commands::handle(cmd, &mut store, &mut stdout)?;
    store.close()?;
    Ok(())
}

/// Opens the configured store and runs a round-trip probe in memory only.
fn run_health_check(config: &config::Config, password: Option<&str>) -> Result<()> {
    let mut settings = storage::storage_config(config, false)?;
    settings.auto_persist = false;

    let mut store = storage::open(settings, password)?;
    run_store_health(&mut store)?;
    println!("Storage: ok ({})", store.path().display());
    Ok(())
}

fn run_store_health(store: &mut LocalStorage) -> Result<()> {
    let probe_key = "health/probe";
    let payload = "ok";
    let previous = store.exists(probe_key);

    store.store(probe_key, payload)?;
    let round_trip: String = store.load(probe_key)?;
    if !previous {
        store.remove(probe_key);
    }

    if round_trip != payload {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
