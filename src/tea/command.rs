//! Side effects requested by `update`.

/// Output commands from the update function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Close the form. Nothing is saved.
    Quit,
}
