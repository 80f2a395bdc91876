//! # tickler - Task tracker with due-date reminders
//!
//! A small terminal task tracker: create, edit, complete, filter, sort and
//! delete short text tasks, each optionally carrying a priority and a due
//! instant. State persists across sessions in a local JSON snapshot and a
//! desktop notification fires once when a task's due time elapses.
//!
//! ## Key Features
//!
//! - **Priorities and due instants**: high/medium/low plus an optional
//!   absolute due time with natural input ("tomorrow 09:00", "in 2h")
//! - **One-shot reminders**: a 30-second scan fires a desktop notification
//!   the first time a task is due and never again for the same due date
//! - **Multiple Interfaces**: full CLI for automation + interactive TUI with
//!   a light/dark theme
//! - **Local File Storage**: one JSON snapshot, loaded at startup and written
//!   after every change; storage failures degrade gracefully
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the interactive UI
//! tkl ui
//!
//! # Add a task via CLI
//! tkl add "Buy milk" --priority high --due "tomorrow 09:00"
//!
//! # List active tasks by due date
//! tkl list --filter active --sort due
//!
//! # Fire any pending reminders (e.g. from cron)
//! tkl scan
//! ```
//!
//! Data is stored in `~/.tickler/store.json`; pass `--db` to use another file.

use std::path::PathBuf;

use clap::Parser;

pub mod cli;
pub mod cmd;
pub mod fields;
pub mod reminder;
pub mod store;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use store::TaskStore;

fn main() {
    let cli = Cli::parse();

    let db_path = cli.db.unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let dir = PathBuf::from(home).join(".tickler");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!("Failed to create data directory {}: {}", dir.display(), e);
            std::process::exit(1);
        }
        dir.join("store.json")
    });

    // Completions and the UI manage their own I/O; everything else follows
    // the load -> mutate -> persist cycle.
    match &cli.command {
        Commands::Ui => {
            cmd_ui(&db_path);
            return;
        }
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            return;
        }
        _ => {}
    }

    let mut store = TaskStore::load(&db_path);

    match cli.command {
        Commands::Ui | Commands::Completions { .. } => unreachable!("handled above"),

        Commands::Add { text, priority, due } => cmd_add(&mut store, &db_path, text, priority, due),

        Commands::List { filter, sort } => cmd_list(&store, filter, sort),

        Commands::View { id } => cmd_view(&store, id),

        Commands::Edit { id, text, priority, due, clear_due } =>
            cmd_edit(&mut store, &db_path, id, text, priority, due, clear_due),

        Commands::Toggle { id } => cmd_toggle(&mut store, &db_path, id),

        Commands::Delete { id } => cmd_delete(&mut store, &db_path, id),

        Commands::Scan => cmd_scan(&mut store, &db_path),

        Commands::Theme { value } => cmd_theme(&mut store, &db_path, value),
    }
}
