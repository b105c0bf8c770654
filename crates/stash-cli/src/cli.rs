use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "stash",
    about = "File-backed key-value store with optional encryption at rest",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Password for stores with encryption enabled.
    #[arg(long, env = "STASH_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,
    /// Open the store read-only; commands that modify the store or its file are refused.
    #[arg(long, global = true)]
    pub read_only: bool,
    /// Optional subcommand; defaults to listing keys when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    #[command(flatten)]
    Store(StoreCommand),
    /// Print version and exit.
    Version,
    /// Run a health check against the configured store (open, store, load, remove).
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Commands operating on the store contents.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    /// Print the value stored under a key as JSON.
    Get { key: String },
    /// Store a value; text that is not valid JSON is stored as a string.
    Set { key: String, value: String },
    /// Remove a key (no-op when missing).
    Remove { key: String },
    /// List all keys in sorted order.
    Keys,
    /// Remove every entry.
    Clear,
    /// Delete the backing file.
    Destroy,
}

impl StoreCommand {
    /// Whether the command changes contents that should be written back on exit.
    pub fn persists_on_exit(&self) -> bool {
        matches!(
            self,
            StoreCommand::Set { .. } | StoreCommand::Remove { .. } | StoreCommand::Clear
        )
    }

    /// Whether the command changes the store or its backing file at all.
    pub fn modifies_store(&self) -> bool {
        self.persists_on_exit() || matches!(self, StoreCommand::Destroy)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
