//! Terminal rendering for the checklist form.
//!
//! Layout, top to bottom: stage title, scrollable task panel, separator,
//! progress gauge, status bar. Everything is drawn from a [`RenderState`]
//! snapshot; this module never mutates application state.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use crate::render::{RenderState, TaskView};

const COLOR_TEXT_DIMMED: Color = Color::Gray;
const COLOR_TEXT_MUTED: Color = Color::DarkGray;
const COLOR_SEPARATOR: Color = Color::White;
const COLOR_CHECKED: Color = Color::Green;
const COLOR_GAUGE: Color = Color::Cyan;

const TITLE_HEIGHT: u16 = 2;
const SEPARATOR_HEIGHT: u16 = 1;
const PROGRESS_HEIGHT: u16 = 1;
const STATUSBAR_HEIGHT: u16 = 1;

/// Rows taken by everything except the task panel.
pub const CHROME_HEIGHT: u16 = TITLE_HEIGHT + SEPARATOR_HEIGHT + PROGRESS_HEIGHT + STATUSBAR_HEIGHT;

struct Keybinding(&'static str, &'static str);

struct KeybindingGroup(Vec<Keybinding>);

fn keybindings() -> Vec<KeybindingGroup> {
    vec![
        KeybindingGroup(vec![Keybinding("j/k", "move"), Keybinding("PgUp/PgDn", "page")]),
        KeybindingGroup(vec![Keybinding("Space", "toggle")]),
        KeybindingGroup(vec![Keybinding("q", "close")]),
    ]
}

pub fn draw(frame: &mut Frame, state: &RenderState) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(TITLE_HEIGHT),
        Constraint::Fill(1),
        Constraint::Length(SEPARATOR_HEIGHT),
        Constraint::Length(PROGRESS_HEIGHT),
        Constraint::Length(STATUSBAR_HEIGHT),
    ])
    .split(area);

    render_title(frame, state, chunks[0]);
    render_tasks(frame, state, chunks[1]);
    render_separator(frame, chunks[2]);
    render_progress(frame, state, chunks[3]);
    render_statusbar(frame, state, chunks[4]);
}

fn render_title(frame: &mut Frame, state: &RenderState, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            state.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Month-End Checklist", Style::default().fg(COLOR_TEXT_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// First visible row so the selection stays centered, clamped at both ends.
pub fn scroll_offset(selected: usize, len: usize, height: usize) -> usize {
    if height == 0 || len <= height {
        return 0;
    }
    let half = height / 2;
    selected.saturating_sub(half).min(len - height)
}

fn render_tasks(frame: &mut Frame, state: &RenderState, area: Rect) {
    if state.tasks.is_empty() {
        let msg = Line::from(Span::styled(
            "No tasks for this stage",
            Style::default().fg(COLOR_TEXT_MUTED),
        ));
        frame.render_widget(Paragraph::new(msg), area);
        return;
    }

    let height = area.height as usize;
    let offset = scroll_offset(state.selected, state.tasks.len(), height);
    let lines: Vec<Line> = state
        .tasks
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(i, task)| task_row(task, i == state.selected))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);

    if state.tasks.len() > height {
        let mut scrollbar_state = ScrollbarState::new(state.tasks.len().saturating_sub(height))
            .position(offset);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None),
            area,
            &mut scrollbar_state,
        );
    }
}

fn task_row(task: &TaskView, is_selected: bool) -> Line<'static> {
    let (mark, mut mark_style) = if task.checked {
        ("[x] ", Style::default().fg(COLOR_CHECKED))
    } else {
        ("[ ] ", Style::default().fg(COLOR_TEXT_DIMMED))
    };
    let mut label_style = if task.checked {
        Style::default().fg(COLOR_TEXT_DIMMED)
    } else {
        Style::default()
    };
    if is_selected {
        label_style = label_style.add_modifier(Modifier::REVERSED);
        mark_style = mark_style.add_modifier(Modifier::BOLD);
    }
    Line::from(vec![
        Span::styled(mark, mark_style),
        Span::styled(task.label.clone(), label_style),
    ])
}

fn render_separator(frame: &mut Frame, area: Rect) {
    let solid = "─".repeat(area.width as usize);
    let line = Line::from(Span::styled(solid, Style::default().fg(COLOR_SEPARATOR)));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_progress(frame: &mut Frame, state: &RenderState, area: Rect) {
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(COLOR_GAUGE).bg(Color::DarkGray))
        .percent(state.percentage.min(100))
        .label(progress_label(state));
    frame.render_widget(gauge, area);
}

fn progress_label(state: &RenderState) -> String {
    format!("{} ({}/{})", state.progress, state.checked, state.tasks.len())
}

/// '?' alone when collapsed, '? │ <legend>' when expanded.
fn render_statusbar(frame: &mut Frame, state: &RenderState, area: Rect) {
    let key_style = Style::default().fg(COLOR_TEXT_DIMMED);
    let desc_style = Style::default().fg(COLOR_TEXT_MUTED);
    let help_style = if state.show_keymap {
        Style::default()
    } else {
        Style::default().fg(COLOR_TEXT_MUTED)
    };

    let mut spans = vec![Span::styled("?", help_style)];
    if state.show_keymap {
        for group in keybindings() {
            spans.push(Span::styled(" │ ", desc_style));
            for (idx, binding) in group.0.iter().enumerate() {
                if idx > 0 {
                    spans.push(Span::styled(" • ", desc_style));
                }
                spans.push(Span::styled(binding.0, key_style));
                spans.push(Span::styled(format!(" {}", binding.1), desc_style));
            }
        }
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
