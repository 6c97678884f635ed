//! Update function: Model + Message → Commands.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::mlog_debug;
use crate::ui::CHROME_HEIGHT;

use super::command::Command;
use super::message::Message;
use super::model::Model;

pub fn update(model: &mut Model, msg: Message) -> Vec<Command> {
    let mut cmds = Vec::new();

    match msg {
        Message::Key(key) => {
            // Windows terminals report both press and release
            if key.kind == KeyEventKind::Release {
                return cmds;
            }
            model.dirty = true;
            update_form(model, key, &mut cmds);
        }

        Message::Resize(_, height) => {
            model.page_size = usize::from(height.saturating_sub(CHROME_HEIGHT)).max(1);
            model.dirty = true;
        }
    }

    cmds
}

fn update_form(model: &mut Model, key: KeyEvent, cmds: &mut Vec<Command>) {
    let len = model.tasks.len();

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            cmds.push(Command::Quit);
        }

        KeyCode::Char('j') | KeyCode::Down => {
            if len > 0 {
                model.selected = (model.selected + 1) % len;
            }
        }

        KeyCode::Char('k') | KeyCode::Up => {
            if len > 0 {
                model.selected = model.selected.checked_sub(1).unwrap_or(len - 1);
            }
        }

        KeyCode::PageDown => {
            if len > 0 {
                model.selected = (model.selected + model.page_size).min(len - 1);
            }
        }

        KeyCode::PageUp => {
            model.selected = model.selected.saturating_sub(model.page_size);
        }

        KeyCode::Char('g') | KeyCode::Home => {
            model.selected = 0;
        }

        KeyCode::Char('G') | KeyCode::End => {
            model.selected = len.saturating_sub(1);
        }

        KeyCode::Char(' ') | KeyCode::Char('x') | KeyCode::Enter => {
            let index = model.selected;
            model.toggle(index);
            mlog_debug!(
                "Toggled task {} in {}: {}/{} checked ({}%)",
                index,
                model.stage,
                model.checked,
                len,
                model.progress_percentage()
            );
        }

        KeyCode::Char('?') => {
            model.show_keymap = !model.show_keymap;
        }

        KeyCode::Char('q') | KeyCode::Esc => {
            cmds.push(Command::Quit);
        }

        _ => {}
    }
}
