//! Task form handling for the terminal user interface.
//!
//! This module provides the `TaskForm` structure backing the add and edit
//! screens: a text input, a priority selector and a due-instant input, with
//! field ordering and active-field management. The form is pure presentation
//! state; cancelling an edit drops the form without touching the store.

use chrono::Local;

use crate::fields::Priority;
use crate::task::Task;
use crate::tui::input::InputField;

/// Field order constants for the form.
pub const TEXT_FIELD: usize = 0;
pub const PRIORITY_FIELD: usize = 1;
pub const DUE_FIELD: usize = 2;
pub const FIELD_COUNT: usize = 3;

/// Form state for creating or editing a task.
pub struct TaskForm {
    pub text: InputField,
    pub due: InputField,
    pub priority: usize,
    pub current_field: usize,
    pub priorities: Vec<Priority>,
}

impl TaskForm {
    /// Create an empty form with the default priority selected.
    pub fn new() -> Self {
        let mut form = Self {
            text: InputField::new(),
            due: InputField::new(),
            priority: 1, // Medium
            current_field: TEXT_FIELD,
            priorities: vec![Priority::High, Priority::Medium, Priority::Low],
        };
        form.update_active_field();
        form
    }

    /// Create a form prefilled from an existing task, due instant rendered
    /// as local wall-clock time so it round-trips through the parser.
    pub fn from_task(task: &Task) -> Self {
        let due_value = task
            .due_at
            .map(|d| d.with_timezone(&Local).format("%Y-%m-%dT%H:%M").to_string())
            .unwrap_or_default();
        let mut form = Self {
            text: InputField::with_value(&task.text),
            due: InputField::with_value(&due_value),
            priority: task.priority.rank() as usize,
            current_field: TEXT_FIELD,
            priorities: vec![Priority::High, Priority::Medium, Priority::Low],
        };
        form.update_active_field();
        form
    }

    /// The currently selected priority.
    pub fn selected_priority(&self) -> Priority {
        self.priorities[self.priority]
    }

    /// The due input as an optional string; empty means no due date.
    pub fn due_input(&self) -> Option<&str> {
        let v = self.due.value.trim();
        if v.is_empty() {
            None
        } else {
            Some(self.due.value.as_str())
        }
    }

    /// Move to the next field, wrapping around.
    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// Move to the previous field, wrapping around.
    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// Sync each input field's active flag with the current selection.
    pub fn update_active_field(&mut self) {
        self.text.active = self.current_field == TEXT_FIELD;
        self.due.active = self.current_field == DUE_FIELD;
    }

    /// Route a typed character to the active field.
    pub fn handle_char(&mut self, c: char) {
        match self.current_field {
            TEXT_FIELD => self.text.handle_char(c),
            DUE_FIELD => self.due.handle_char(c),
            _ => {}
        }
    }

    /// Route backspace to the active field.
    pub fn handle_backspace(&mut self) {
        match self.current_field {
            TEXT_FIELD => self.text.handle_backspace(),
            DUE_FIELD => self.due.handle_backspace(),
            _ => {}
        }
    }

    /// Route delete to the active field.
    pub fn handle_delete(&mut self) {
        match self.current_field {
            TEXT_FIELD => self.text.handle_delete(),
            DUE_FIELD => self.due.handle_delete(),
            _ => {}
        }
    }

    /// Left/right either moves the text cursor or cycles the priority
    /// selector, depending on the active field.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            TEXT_FIELD => {
                if right {
                    self.text.move_cursor_right()
                } else {
                    self.text.move_cursor_left()
                }
            }
            DUE_FIELD => {
                if right {
                    self.due.move_cursor_right()
                } else {
                    self.due.move_cursor_left()
                }
            }
            PRIORITY_FIELD => {
                let n = self.priorities.len();
                self.priority = if right {
                    (self.priority + 1) % n
                } else {
                    (self.priority + n - 1) % n
                };
            }
            _ => {}
        }
    }
}
