//! Enumerations and field types for task tracking.
//!
//! This module defines the structured value types attached to tasks and to
//! list projections: priority levels, display filters, sort keys, and the
//! persisted colour theme.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Priority level of a task.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Ordering rank for sorting: High sorts before Medium before Low.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

}

/// Completion filter for list projections.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    /// Cycle All -> Active -> Completed -> All.
    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Active,
            Filter::Active => Filter::Completed,
            Filter::Completed => Filter::All,
        }
    }
}

/// Available sort orders for task lists.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Created,
    Due,
    Priority,
}

impl SortKey {
    /// Cycle Created -> Due -> Priority -> Created.
    pub fn next(self) -> Self {
        match self {
            SortKey::Created => SortKey::Due,
            SortKey::Due => SortKey::Priority,
            SortKey::Priority => SortKey::Created,
        }
    }
}

/// Persisted colour theme preference.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

/// Format a filter for display.
pub fn format_filter(f: Filter) -> &'static str {
    match f {
        Filter::All => "All",
        Filter::Active => "Active",
        Filter::Completed => "Completed",
    }
}

/// Format a sort key for display.
pub fn format_sort_key(s: SortKey) -> &'static str {
    match s {
        SortKey::Created => "Created",
        SortKey::Due => "Due date",
        SortKey::Priority => "Priority",
    }
}

/// Format a theme for display.
pub fn format_theme(t: Theme) -> &'static str {
    match t {
        Theme::Light => "light",
        Theme::Dark => "dark",
    }
}
