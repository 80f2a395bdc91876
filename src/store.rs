//! Task store, validation and persistence.
//!
//! This module provides the `TaskStore` struct that owns the in-memory task
//! list and the persisted theme preference, applies all mutation operations
//! (add, toggle, delete, edit), and computes the filtered/sorted projection
//! used for display. It also handles loading and saving the JSON snapshot
//! and parsing human due-date input.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fields::{Filter, Priority, SortKey, Theme};
use crate::task::Task;

/// A rejected mutation. At most one message is shown to the user at a time;
/// a new failure replaces any prior one and a successful operation clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task text cannot be empty.")]
    EmptyText,
    #[error("Please provide a valid due date.")]
    InvalidDueDate,
    #[error("Due date must be in the future.")]
    DueDateInPast,
}

/// In-memory store for tasks plus the persisted theme preference.
///
/// Serializes to a single JSON document with exactly two entries: `todos`
/// (the task array) and `theme`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskStore {
    #[serde(rename = "todos")]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub theme: Theme,
}

impl TaskStore {
    /// Load the store from a JSON snapshot, falling back to an empty store
    /// if the file is missing, unreadable or malformed. Storage failures are
    /// never fatal.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return TaskStore::default();
        }
        let mut buf = String::new();
        match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => match serde_json::from_str(&buf) {
                Ok(store) => store,
                Err(e) => {
                    eprintln!("Error parsing store, starting fresh: {e}");
                    TaskStore::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading store, starting fresh: {e}");
                TaskStore::default()
            }
        }
    }

    /// Save the store to a JSON snapshot using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(self).unwrap();
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Generate the next available task ID.
    pub fn next_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Add a new task. Text must be non-empty after trimming; a due input,
    /// when given, must parse and lie strictly in the future relative to
    /// `now`. Returns the new task's ID.
    pub fn add(
        &mut self,
        text: &str,
        priority: Priority,
        due_input: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<u64, ValidationError> {
        let text = validate_text(text)?;
        let due_at = validate_due(due_input, now)?;
        let id = self.next_id();
        self.tasks.push(Task {
            id,
            text,
            is_completed: false,
            priority,
            due_at,
            created_at_utc: now.timestamp(),
            notified: false,
        });
        Ok(id)
    }

    /// Flip the completion flag of a task. Leaves `notified` untouched.
    /// Returns false when no task has the given ID.
    pub fn toggle_complete(&mut self, id: u64) -> bool {
        match self.get_mut(id) {
            Some(t) => {
                t.is_completed = !t.is_completed;
                true
            }
            None => false,
        }
    }

    /// Remove a task. An absent ID leaves the collection unchanged and
    /// returns false without raising an error.
    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Overwrite a task's text, priority and due date, applying the same
    /// validation as `add`. A committed edit always resets `notified` so a
    /// new due date gets a fresh reminder. Returns `Ok(false)` when no task
    /// has the given ID.
    pub fn commit_edit(
        &mut self,
        id: u64,
        text: &str,
        priority: Priority,
        due_input: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, ValidationError> {
        let text = validate_text(text)?;
        let due_at = validate_due(due_input, now)?;
        match self.get_mut(id) {
            Some(t) => {
                t.text = text;
                t.priority = priority;
                t.due_at = due_at;
                t.notified = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Pure read: the filtered, sorted view of the task list for display.
    ///
    /// Sorting is stable, so tasks comparing equal keep their relative order
    /// from the underlying list. With `SortKey::Due`, tasks without a due
    /// date sort last. Never mutates stored order.
    pub fn project(&self, filter: Filter, sort: SortKey) -> Vec<&Task> {
        let mut view: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| match filter {
                Filter::All => true,
                Filter::Active => !t.is_completed,
                Filter::Completed => t.is_completed,
            })
            .collect();
        match sort {
            SortKey::Created => view.sort_by_key(|t| t.created_at_utc),
            SortKey::Due => view.sort_by_key(|t| t.due_at.unwrap_or(DateTime::<Utc>::MAX_UTC)),
            SortKey::Priority => view.sort_by_key(|t| t.priority.rank()),
        }
        view
    }
}

/// Trim task text, rejecting the empty string.
pub fn validate_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// Resolve optional due input to a validated instant. Empty or absent input
/// means no due date; anything else must parse and be strictly after `now`.
pub fn validate_due(
    due_input: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let raw = match due_input {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(None),
    };
    let due = parse_due_input(raw).ok_or(ValidationError::InvalidDueDate)?;
    if due <= now {
        return Err(ValidationError::DueDateInPast);
    }
    Ok(Some(due))
}

/// Parse human-readable due input to a UTC instant.
///
/// Supports:
/// - RFC 3339 ("2025-06-01T12:00:00Z")
/// - "YYYY-MM-DDTHH:MM", "YYYY-MM-DD HH:MM" (local wall clock)
/// - "YYYY-MM-DD" (local midnight)
/// - "in 30m", "in 2h", "in 3d", "in 1w"
/// - "tomorrow", "today 17:30", "tomorrow 09:00"
pub fn parse_due_input(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_naive_to_utc(naive);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return local_naive_to_utc(d.and_hms_opt(0, 0, 0)?);
    }

    let lower = s.to_lowercase();

    // "in X" patterns
    if let Some(rest) = lower.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some(n) = rest.strip_suffix('m') {
            if let Ok(mins) = n.trim().parse::<i64>() {
                return Some(Utc::now() + Duration::minutes(mins));
            }
        }
        if let Some(n) = rest.strip_suffix('h') {
            if let Ok(hours) = n.trim().parse::<i64>() {
                return Some(Utc::now() + Duration::hours(hours));
            }
        }
        if let Some(n) = rest.strip_suffix('d') {
            if let Ok(days) = n.trim().parse::<i64>() {
                return Some(Utc::now() + Duration::days(days));
            }
        }
        if let Some(n) = rest.strip_suffix('w') {
            if let Ok(weeks) = n.trim().parse::<i64>() {
                return Some(Utc::now() + Duration::weeks(weeks));
            }
        }
        return None;
    }

    // "today HH:MM" / "tomorrow [HH:MM]"
    let today = Local::now().date_naive();
    if let Some(rest) = lower.strip_prefix("today") {
        let time = NaiveTime::parse_from_str(rest.trim(), "%H:%M").ok()?;
        return local_naive_to_utc(today.and_time(time));
    }
    if let Some(rest) = lower.strip_prefix("tomorrow") {
        let rest = rest.trim();
        let time = if rest.is_empty() {
            NaiveTime::from_hms_opt(0, 0, 0)?
        } else {
            NaiveTime::parse_from_str(rest, "%H:%M").ok()?
        };
        return local_naive_to_utc((today + Duration::days(1)).and_time(time));
    }

    None
}

/// Interpret a naive timestamp as local wall-clock time and convert to UTC.
fn local_naive_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a due instant relative to now ("in 5m", "in 2h", "3d late").
pub fn format_due_relative(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = d - now;
            let mins = delta.num_minutes();
            if mins.abs() < 1 {
                "now".into()
            } else if mins >= 0 {
                if mins < 60 {
                    format!("in {}m", mins)
                } else if mins < 60 * 24 {
                    format!("in {}h", delta.num_hours())
                } else {
                    format!("in {}d", delta.num_days())
                }
            } else if mins > -60 {
                format!("{}m late", -mins)
            } else if mins > -60 * 24 {
                format!("{}h late", -delta.num_hours())
            } else {
                format!("{}d late", -delta.num_days())
            }
        }
    }
}

/// Format a due instant as local wall-clock time, or "-" when absent.
pub fn format_due_absolute(due: Option<DateTime<Utc>>) -> String {
    match due {
        None => "-".into(),
        Some(d) => d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn store_with(texts: &[(&str, Priority)]) -> TaskStore {
        let mut store = TaskStore::default();
        for (text, priority) in texts {
            store.add(text, *priority, None, fixed_now()).unwrap();
        }
        store
    }

    #[test]
    fn add_rejects_empty_and_whitespace_text() {
        let mut store = TaskStore::default();
        assert_eq!(
            store.add("", Priority::Medium, None, fixed_now()),
            Err(ValidationError::EmptyText)
        );
        assert_eq!(
            store.add("   ", Priority::Medium, None, fixed_now()),
            Err(ValidationError::EmptyText)
        );
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn add_rejects_past_and_garbage_due_dates() {
        let mut store = TaskStore::default();
        assert_eq!(
            store.add("Buy milk", Priority::High, Some("2025-06-01T11:59:00Z"), fixed_now()),
            Err(ValidationError::DueDateInPast)
        );
        // Exactly now is not strictly in the future.
        assert_eq!(
            store.add("Buy milk", Priority::High, Some("2025-06-01T12:00:00Z"), fixed_now()),
            Err(ValidationError::DueDateInPast)
        );
        assert_eq!(
            store.add("Buy milk", Priority::High, Some("not a date"), fixed_now()),
            Err(ValidationError::InvalidDueDate)
        );
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn add_sets_defaults_and_trims_text() {
        let mut store = TaskStore::default();
        let id = store
            .add("  Buy milk  ", Priority::High, Some("2025-06-01T13:00:00Z"), fixed_now())
            .unwrap();
        let t = store.get(id).unwrap();
        assert_eq!(t.text, "Buy milk");
        assert!(!t.is_completed);
        assert!(!t.notified);
        assert_eq!(t.priority, Priority::High);
        assert!(t.created_at_utc <= fixed_now().timestamp());
        assert_eq!(t.due_at, Some(Utc.with_ymd_and_hms(2025, 6, 1, 13, 0, 0).unwrap()));
    }

    #[test]
    fn ids_are_unique_and_monotonic() {
        let store = store_with(&[("a", Priority::Medium), ("b", Priority::Medium)]);
        assert_eq!(store.tasks[0].id, 1);
        assert_eq!(store.tasks[1].id, 2);
        assert_eq!(store.next_id(), 3);
    }

    #[test]
    fn toggle_complete_is_idempotent_under_double_application() {
        let mut store = store_with(&[("a", Priority::Medium)]);
        let id = store.tasks[0].id;
        assert!(store.toggle_complete(id));
        assert!(store.get(id).unwrap().is_completed);
        assert!(store.toggle_complete(id));
        assert!(!store.get(id).unwrap().is_completed);
    }

    #[test]
    fn toggle_complete_leaves_notified_alone() {
        let mut store = store_with(&[("a", Priority::Medium)]);
        let id = store.tasks[0].id;
        store.get_mut(id).unwrap().notified = true;
        store.toggle_complete(id);
        assert!(store.get(id).unwrap().notified);
    }

    #[test]
    fn delete_nonexistent_id_leaves_collection_unchanged() {
        let mut store = store_with(&[("a", Priority::Medium)]);
        assert!(!store.delete(99));
        assert_eq!(store.tasks.len(), 1);
        assert!(store.delete(1));
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn commit_edit_resets_notified_and_validates() {
        let mut store = store_with(&[("a", Priority::Medium)]);
        let id = store.tasks[0].id;
        store.get_mut(id).unwrap().notified = true;

        assert_eq!(
            store.commit_edit(id, "", Priority::Low, None, fixed_now()),
            Err(ValidationError::EmptyText)
        );
        // Failed validation must not have touched the task.
        assert!(store.get(id).unwrap().notified);

        assert_eq!(
            store.commit_edit(id, "b", Priority::Low, Some("2025-06-02T09:00:00Z"), fixed_now()),
            Ok(true)
        );
        let t = store.get(id).unwrap();
        assert_eq!(t.text, "b");
        assert_eq!(t.priority, Priority::Low);
        assert!(!t.notified);

        assert_eq!(store.commit_edit(99, "c", Priority::Low, None, fixed_now()), Ok(false));
    }

    #[test]
    fn project_filters_by_completion() {
        let mut store = store_with(&[("a", Priority::Medium), ("b", Priority::Medium)]);
        store.toggle_complete(1);
        assert!(store.project(Filter::Active, SortKey::Created).iter().all(|t| !t.is_completed));
        assert!(store
            .project(Filter::Completed, SortKey::Created)
            .iter()
            .all(|t| t.is_completed));
        assert_eq!(store.project(Filter::All, SortKey::Created).len(), 2);
    }

    #[test]
    fn project_by_priority_keeps_rank_order_and_stability() {
        let store = store_with(&[
            ("low1", Priority::Low),
            ("med1", Priority::Medium),
            ("high1", Priority::High),
            ("med2", Priority::Medium),
        ]);
        let view = store.project(Filter::All, SortKey::Priority);
        let texts: Vec<&str> = view.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["high1", "med1", "med2", "low1"]);
    }

    #[test]
    fn project_by_due_puts_undated_tasks_last() {
        let mut store = TaskStore::default();
        store.add("later", Priority::Medium, Some("2025-06-03T00:00:00Z"), fixed_now()).unwrap();
        store.add("none", Priority::Medium, None, fixed_now()).unwrap();
        store.add("soon", Priority::Medium, Some("2025-06-02T00:00:00Z"), fixed_now()).unwrap();
        let view = store.project(Filter::All, SortKey::Due);
        let texts: Vec<&str> = view.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["soon", "later", "none"]);
    }

    #[test]
    fn project_does_not_mutate_stored_order() {
        let store = store_with(&[("b", Priority::Low), ("a", Priority::High)]);
        let _ = store.project(Filter::All, SortKey::Priority);
        let texts: Vec<&str> = store.tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["b", "a"]);
    }

    #[test]
    fn new_task_appears_last_in_created_projection() {
        let mut store = store_with(&[("first", Priority::Medium)]);
        store.add("Buy milk", Priority::High, None, fixed_now()).unwrap();
        let view = store.project(Filter::All, SortKey::Created);
        let last = view.last().unwrap();
        assert_eq!(last.text, "Buy milk");
        assert_eq!(last.priority, Priority::High);
        assert_eq!(last.due_at, None);
    }

    #[test]
    fn parse_due_input_accepts_documented_forms() {
        assert!(parse_due_input("2025-06-01T13:00:00Z").is_some());
        assert!(parse_due_input("2025-06-01T13:00").is_some());
        assert!(parse_due_input("2025-06-01 13:00").is_some());
        assert!(parse_due_input("2025-06-01").is_some());
        assert!(parse_due_input("tomorrow").is_some());
        assert!(parse_due_input("tomorrow 09:00").is_some());
        assert!(parse_due_input("in 2h").is_some());
        assert!(parse_due_input("in 45m").is_some());
        assert!(parse_due_input("").is_none());
        assert!(parse_due_input("next sprint").is_none());
    }

    #[test]
    fn relative_due_inputs_land_in_the_future() {
        let now = Utc::now();
        assert!(parse_due_input("in 2h").unwrap() > now);
        assert!(parse_due_input("in 1w").unwrap() > now);
    }

    #[test]
    fn save_then_load_round_trips_tasks_and_theme() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = TaskStore::default();
        store.add("a", Priority::High, Some("2025-06-02T08:30:00Z"), fixed_now()).unwrap();
        store.add("b", Priority::Low, None, fixed_now()).unwrap();
        store.toggle_complete(2);
        store.theme = Theme::Dark;
        store.save(&path).unwrap();

        let reloaded = TaskStore::load(&path);
        assert_eq!(reloaded.tasks, store.tasks);
        assert_eq!(reloaded.theme, Theme::Dark);
    }

    #[test]
    fn load_missing_or_corrupt_snapshot_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = TaskStore::load(&dir.path().join("nope.json"));
        assert!(missing.tasks.is_empty());
        assert_eq!(missing.theme, Theme::Light);

        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();
        let corrupt = TaskStore::load(&path);
        assert!(corrupt.tasks.is_empty());
        assert_eq!(corrupt.theme, Theme::Light);
    }

    #[test]
    fn snapshot_uses_the_two_durable_keys() {
        let mut store = TaskStore::default();
        store.add("a", Priority::Medium, None, fixed_now()).unwrap();
        store.theme = Theme::Dark;
        let json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&store).unwrap()).unwrap();
        assert!(json.get("todos").unwrap().is_array());
        assert_eq!(json.get("theme").unwrap(), "dark");
    }
}
