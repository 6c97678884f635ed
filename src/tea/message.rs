//! Inputs to the update function.

use crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    /// Terminal resized; `u16` is the new height, which sets the page size.
    Resize(u16, u16),
}
