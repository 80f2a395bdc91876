//! Command implementations for the CLI interface.
//!
//! This module contains all the command handlers behind the subcommands:
//! one-shot CRUD operations on the store, the on-demand reminder scan, and
//! the TUI entry point. Every mutating handler follows the same cycle as
//! the UI: load the snapshot, apply one mutation, persist, exit.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::path::Path;

use chrono::{TimeZone, Utc};

use crate::fields::*;
use crate::reminder::{reminder_scan, DesktopNotifier};
use crate::store::{format_due_absolute, format_due_relative, TaskStore};
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI interface.
    Ui,

    /// Add a new task.
    Add {
        /// Task text.
        text: String,
        /// Priority: high | medium | low.
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due instant: "YYYY-MM-DDTHH:MM", "tomorrow 09:00", "in 2h", ...
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks with optional filtering and sorting.
    List {
        /// Completion filter: all | active | completed.
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
        /// Sort key: created | due | priority.
        #[arg(long, value_enum, default_value_t = SortKey::Created)]
        sort: SortKey,
    },

    /// View a single task by ID.
    View {
        /// Task ID to view.
        id: u64,
    },

    /// Edit a task's text, priority or due date.
    Edit {
        /// Task ID to edit.
        id: u64,
        #[arg(long)]
        text: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// New due instant. Omitting keeps the current one.
        #[arg(long)]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
    },

    /// Toggle a task between active and completed.
    Toggle {
        /// Task ID to toggle.
        id: u64,
    },

    /// Delete a task by ID.
    Delete {
        /// Task ID to delete.
        id: u64,
    },

    /// Run one reminder pass over due tasks and exit.
    Scan,

    /// Set or toggle the colour theme.
    Theme {
        /// Theme to set; omit to toggle.
        #[arg(value_enum)]
        value: Option<Theme>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Save the store, downgrading failures to a warning. The in-memory state
/// stays authoritative; a failed write is not fatal.
fn save_or_warn(store: &TaskStore, path: &Path) {
    if let Err(e) = store.save(path) {
        eprintln!("Warning: failed to save store: {e}");
    }
}

/// Launch the terminal user interface.
pub fn cmd_ui(db_path: &Path) {
    if let Err(e) = run_tui(db_path) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Add a new task to the store.
pub fn cmd_add(store: &mut TaskStore, db_path: &Path, text: String, priority: Priority, due: Option<String>) {
    match store.add(&text, priority, due.as_deref(), Utc::now()) {
        Ok(id) => {
            save_or_warn(store, db_path);
            println!("Added task {}", id);
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Print the filtered, sorted task table.
pub fn cmd_list(store: &TaskStore, filter: Filter, sort: SortKey) {
    let now = Utc::now();
    let view = store.project(filter, sort);
    println!("{:<5} {:<3} {:<8} {:<10} {}", "ID", "", "Pri", "Due", "Text");
    for t in view {
        let mark = if t.is_completed { "x" } else { " " };
        println!(
            "{:<5} [{}] {:<8} {:<10} {}",
            t.id,
            mark,
            format_priority(t.priority),
            format_due_relative(t.due_at, now),
            t.text
        );
    }
}

/// View detailed information about a single task.
pub fn cmd_view(store: &TaskStore, id: u64) {
    let Some(t) = store.get(id) else {
        eprintln!("Task {} not found.", id);
        std::process::exit(1);
    };
    let now = Utc::now();
    println!("ID:           {}", t.id);
    println!("Text:         {}", t.text);
    println!("Status:       {}", if t.is_completed { "completed" } else { "active" });
    println!("Priority:     {}", format_priority(t.priority));
    println!(
        "Due:          {}{}",
        format_due_absolute(t.due_at),
        match t.due_at {
            Some(d) => format!(" ({})", format_due_relative(Some(d), now)),
            None => String::new(),
        }
    );
    println!("Notified:     {}", if t.notified { "yes" } else { "no" });
    println!(
        "Created UTC:  {}",
        Utc.timestamp_opt(t.created_at_utc, 0)
            .single()
            .map(|d| d.to_rfc3339())
            .unwrap_or_else(|| "-".into())
    );
}

/// Edit a task's fields. Flags that are omitted keep the current values;
/// the merged result goes through the same validation as `add`.
pub fn cmd_edit(
    store: &mut TaskStore,
    db_path: &Path,
    id: u64,
    text: Option<String>,
    priority: Option<Priority>,
    due: Option<String>,
    clear_due: bool,
) {
    let Some(t) = store.get(id) else {
        eprintln!("Task {} not found.", id);
        std::process::exit(1);
    };
    let new_text = text.unwrap_or_else(|| t.text.clone());
    let new_priority = priority.unwrap_or(t.priority);
    let new_due = if clear_due {
        None
    } else {
        due.or_else(|| t.due_at.map(|d| d.to_rfc3339()))
    };

    match store.commit_edit(id, &new_text, new_priority, new_due.as_deref(), Utc::now()) {
        Ok(true) => {
            save_or_warn(store, db_path);
            println!("Updated task {}", id);
        }
        Ok(false) => {
            eprintln!("Task {} not found.", id);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Toggle a task between active and completed.
pub fn cmd_toggle(store: &mut TaskStore, db_path: &Path, id: u64) {
    if store.toggle_complete(id) {
        save_or_warn(store, db_path);
        if let Some(t) = store.get(id) {
            println!(
                "Task {} is now {}",
                id,
                if t.is_completed { "completed" } else { "active" }
            );
        }
    } else {
        eprintln!("Task {} not found.", id);
        std::process::exit(1);
    }
}

/// Delete a task. Deleting an unknown ID leaves the store unchanged and is
/// not an error.
pub fn cmd_delete(store: &mut TaskStore, db_path: &Path, id: u64) {
    if store.delete(id) {
        save_or_warn(store, db_path);
        println!("Deleted task {}", id);
    } else {
        println!("Task {} not found; nothing deleted.", id);
    }
}

/// Run one reminder pass over due tasks, persisting any state change.
pub fn cmd_scan(store: &mut TaskStore, db_path: &Path) {
    let changed = reminder_scan(&mut store.tasks, Utc::now(), &DesktopNotifier);
    if changed > 0 {
        save_or_warn(store, db_path);
        println!("{} reminder(s) fired.", changed);
    } else {
        println!("No reminders due.");
    }
}

/// Set or toggle the colour theme preference.
pub fn cmd_theme(store: &mut TaskStore, db_path: &Path, value: Option<Theme>) {
    store.theme = match value {
        Some(t) => t,
        None => store.theme.toggled(),
    };
    save_or_warn(store, db_path);
    println!("Theme set to {}", format_theme(store.theme));
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
