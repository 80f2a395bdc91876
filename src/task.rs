//! Task data structure.
//!
//! This module defines the core `Task` struct, the single persisted entity:
//! a short text item with completion state, a priority, an optional due
//! instant and a one-shot reminder flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::Priority;

/// A single to-do entry.
///
/// `due_at` is an absolute UTC instant serialized as ISO-8601; `None` means
/// no due date. `notified` records that the due reminder for the current due
/// date has already fired; a committed edit resets it so a new due date gets
/// a fresh reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub text: String,
    pub is_completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    pub created_at_utc: i64,
    #[serde(default)]
    pub notified: bool,
}
