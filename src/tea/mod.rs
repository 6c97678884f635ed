//! The Elm Architecture (TEA) split for the checklist form.
//!
//! - `Model`: the form's state (tasks, checked flags, cursor)
//! - `Message`: terminal input fed to `update`
//! - `Command`: side effects `update` asks the runtime to perform
//! - `update`: mutates the model, never touches the terminal

pub mod command;
pub mod message;
pub mod model;
pub mod update;

pub use command::Command;
pub use message::Message;
pub use model::{Model, TaskItem};
pub use update::update;
