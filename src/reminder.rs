//! Due-date reminder scan and the desktop notification boundary.
//!
//! The scan walks the current task list on a fixed cadence, fires a one-shot
//! notification for every newly-due task and flags it as notified. Emission
//! goes through the `Notifier` capability so the scan itself stays pure with
//! respect to the host desktop.

use std::process::Command;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::task::Task;

/// Wall-clock cadence of the recurring scan inside the UI loop.
pub const SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// Capability boundary for emitting desktop notifications.
///
/// `permitted` is the capability check; when it reports false the scan still
/// runs and still marks tasks as notified, only the visible emission is
/// skipped. Reminder state is never silently lost to a missing capability.
pub trait Notifier {
    /// Whether notifications can currently be delivered.
    fn permitted(&self) -> bool;

    /// Emit one notification. Failures are the implementation's problem;
    /// the scan does not observe them.
    fn notify(&self, title: &str, body: &str);
}

/// Desktop notifier backed by `notify-send`.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn permitted(&self) -> bool {
        which::which("notify-send").is_ok()
    }

    fn notify(&self, title: &str, body: &str) {
        let _ = Command::new("notify-send").arg(title).arg(body).status();
    }
}

/// Scan the task list against `now`, firing a reminder for every task that
/// is not completed, not yet notified, and whose due instant has elapsed.
/// Each such task is flagged `notified = true` so the reminder fires exactly
/// once per due cycle. Returns the number of tasks that changed; the caller
/// persists the list when it is non-zero.
pub fn reminder_scan(tasks: &mut [Task], now: DateTime<Utc>, notifier: &dyn Notifier) -> usize {
    let permitted = notifier.permitted();
    let mut changed = 0;
    for task in tasks.iter_mut() {
        if task.is_completed || task.notified {
            continue;
        }
        let Some(due) = task.due_at else { continue };
        if due > now {
            continue;
        }
        if permitted {
            notifier.notify("Task due", &task.text);
        }
        task.notified = true;
        changed += 1;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::store::TaskStore;
    use chrono::TimeZone;
    use std::cell::RefCell;

    struct RecordingNotifier {
        permitted: bool,
        sent: RefCell<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn new(permitted: bool) -> Self {
            Self { permitted, sent: RefCell::new(Vec::new()) }
        }
    }

    impl Notifier for RecordingNotifier {
        fn permitted(&self) -> bool {
            self.permitted
        }
        fn notify(&self, title: &str, body: &str) {
            self.sent.borrow_mut().push((title.to_string(), body.to_string()));
        }
    }

    fn store_with_due(due: &str) -> TaskStore {
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut store = TaskStore::default();
        store.add("Buy milk", Priority::Medium, Some(due), created).unwrap();
        store
    }

    #[test]
    fn due_task_fires_exactly_once() {
        // Due one hour after creation; scan one minute past due.
        let mut store = store_with_due("2025-06-01T13:00:00Z");
        let scan_at = Utc.with_ymd_and_hms(2025, 6, 1, 13, 1, 0).unwrap();
        let notifier = RecordingNotifier::new(true);

        assert_eq!(reminder_scan(&mut store.tasks, scan_at, &notifier), 1);
        assert!(store.tasks[0].notified);
        assert_eq!(notifier.sent.borrow().as_slice(), &[("Task due".into(), "Buy milk".into())]);

        // A later scan produces no additional notification.
        let later = Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap();
        assert_eq!(reminder_scan(&mut store.tasks, later, &notifier), 0);
        assert_eq!(notifier.sent.borrow().len(), 1);
    }

    #[test]
    fn not_yet_due_task_is_left_alone() {
        let mut store = store_with_due("2025-06-01T13:00:00Z");
        let scan_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        let notifier = RecordingNotifier::new(true);
        assert_eq!(reminder_scan(&mut store.tasks, scan_at, &notifier), 0);
        assert!(!store.tasks[0].notified);
        assert!(notifier.sent.borrow().is_empty());
    }

    #[test]
    fn completed_task_never_notifies() {
        let mut store = store_with_due("2025-06-01T13:00:00Z");
        let id = store.tasks[0].id;
        store.toggle_complete(id);
        let scan_at = Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap();
        let notifier = RecordingNotifier::new(true);
        assert_eq!(reminder_scan(&mut store.tasks, scan_at, &notifier), 0);
        assert!(!store.tasks[0].notified);
    }

    #[test]
    fn task_without_due_date_is_skipped() {
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut store = TaskStore::default();
        store.add("no due", Priority::Medium, None, created).unwrap();
        let notifier = RecordingNotifier::new(true);
        assert_eq!(reminder_scan(&mut store.tasks, created, &notifier), 0);
    }

    #[test]
    fn scan_without_capability_still_marks_notified() {
        let mut store = store_with_due("2025-06-01T13:00:00Z");
        let scan_at = Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap();
        let notifier = RecordingNotifier::new(false);
        assert_eq!(reminder_scan(&mut store.tasks, scan_at, &notifier), 1);
        assert!(store.tasks[0].notified);
        assert!(notifier.sent.borrow().is_empty());
    }

    #[test]
    fn edit_after_reminder_rearms_the_task() {
        let mut store = store_with_due("2025-06-01T13:00:00Z");
        let id = store.tasks[0].id;
        let scan_at = Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap();
        let notifier = RecordingNotifier::new(true);
        reminder_scan(&mut store.tasks, scan_at, &notifier);

        store
            .commit_edit(id, "Buy milk", Priority::Medium, Some("2025-06-01T15:00:00Z"), scan_at)
            .unwrap();
        assert!(!store.tasks[0].notified);

        let after_new_due = Utc.with_ymd_and_hms(2025, 6, 1, 15, 5, 0).unwrap();
        assert_eq!(reminder_scan(&mut store.tasks, after_new_due, &notifier), 1);
        assert_eq!(notifier.sent.borrow().len(), 2);
    }
}
