use std::io::Write;

use color_eyre::Result;
use serde_json::Value;
use stash_storage::LocalStorage;

use crate::cli::StoreCommand;

/// Execute a store subcommand, writing user-facing output to `out`.
pub fn handle(cmd: StoreCommand, storage: &mut LocalStorage, out: &mut impl Write) -> Result<()> {
    match cmd {
        StoreCommand::Get { key } => {
            let value = storage.load_untyped(&key)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        StoreCommand::Set { key, value } => {
            storage.store(&key, &parse_value(&value))?;
            writeln!(out, "Stored {key}")?;
        }
        StoreCommand::Remove { key } => {
            if storage.exists(&key) {
                storage.remove(&key);
                writeln!(out, "Removed {key}")?;
            } else {
                writeln!(out, "No entry for {key}")?;
            }
        }
        StoreCommand::Keys => {
            let keys = storage.keys();
            if keys.is_empty() {
                writeln!(out, "No keys yet. Add one with `stash set <key> <value>`.")?;
                return Ok(());
            }
            for key in keys {
                writeln!(out, "{key}")?;
            }
        }
        StoreCommand::Clear => {
            let count = storage.len();
            storage.clear();
            writeln!(out, "Cleared {count} entries")?;
        }
        StoreCommand::Destroy => {
            storage.destroy()?;
            writeln!(out, "Deleted {}", storage.path().display())?;
        }
    }

    Ok(())
}

/// Accept JSON literals; fall back to storing the raw text as a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
