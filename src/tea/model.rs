//! Form state. No channels, no terminal handles.

use crate::checklist::{completion_percentage, Checklist};
use crate::render::{next_version, RenderState, TaskView};

/// Page size used until the first resize event arrives.
const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub label: String,
    pub checked: bool,
}

pub struct Model {
    pub stage: String,
    pub title: String,
    pub tasks: Vec<TaskItem>,
    /// Running count of checked tasks, kept in step with `tasks`.
    pub checked: usize,
    pub selected: usize,
    /// Rows visible in the task panel; drives PgUp/PgDn.
    pub page_size: usize,
    /// Whether the keymap legend is expanded (toggled by '?')
    pub show_keymap: bool,
    pub dirty: bool,
}

impl Model {
    pub fn new(checklist: &Checklist) -> Self {
        Self {
            stage: checklist.stage.clone(),
            title: checklist.title.clone(),
            tasks: checklist
                .tasks
                .iter()
                .map(|label| TaskItem {
                    label: label.clone(),
                    checked: false,
                })
                .collect(),
            checked: 0,
            selected: 0,
            page_size: DEFAULT_PAGE_SIZE,
            show_keymap: false,
            dirty: true,
        }
    }

    /// Flip one checkbox. Out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) {
        let Some(task) = self.tasks.get_mut(index) else {
            return;
        };
        task.checked = !task.checked;
        if task.checked {
            self.checked += 1;
        } else {
            self.checked -= 1;
        }
        self.dirty = true;
    }

    pub fn progress_percentage(&self) -> u16 {
        completion_percentage(self.checked, self.tasks.len())
    }

    pub fn progress_label(&self) -> String {
        format!("Progress: {}%", self.progress_percentage())
    }

    /// Immutable view for the render loop, stamped with a fresh version.
    pub fn snapshot(&self) -> RenderState {
        RenderState {
            version: next_version(),
            title: self.title.clone(),
            tasks: self
                .tasks
                .iter()
                .map(|t| TaskView {
                    label: t.label.clone(),
                    checked: t.checked,
                })
                .collect(),
            selected: self.selected,
            checked: self.checked,
            percentage: self.progress_percentage(),
            progress: self.progress_label(),
            show_keymap: self.show_keymap,
        }
    }
}
