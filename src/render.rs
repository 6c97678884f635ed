use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub label: String,
    pub checked: bool,
}

static VERSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Monotonic snapshot version. Starts at 1 so it never equals a default state.
pub fn next_version() -> u64 {
    VERSION_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Immutable snapshot of the form handed to the render loop.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub version: u64,
    pub title: String,
    pub tasks: Vec<TaskView>,
    pub selected: usize,
    pub checked: usize,
    pub percentage: u16,
    /// "Progress: N%" as computed by the model
    pub progress: String,
    /// Whether the keymap legend is expanded (toggled by '?')
    pub show_keymap: bool,
}
