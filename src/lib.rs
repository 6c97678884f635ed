pub mod artifact;
pub mod checklist;
pub mod config;
pub mod error;
pub mod log;
pub mod runner;

// Interactive checklist form
pub mod app;
pub mod render;
pub mod tea;
pub mod ui;

pub use checklist::{Checklist, Stage};
pub use error::{Error, Result};
