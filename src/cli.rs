use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Simple, file-backed task tracker with due-date reminders.
/// Storage defaults to ~/.tickler/store.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tkl", version, about = "Task tracker with due-date reminders")]
pub struct Cli {
    /// Path to the JSON store file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
