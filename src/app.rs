//! Interactive form runtime.
//!
//! Two loops share the terminal: the logic thread reads crossterm events and
//! runs `update`, the calling thread draws. Snapshots travel over a bounded(1)
//! channel where the newest state always wins.

use std::io::{self, stdout, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::checklist::Checklist;
use crate::render::RenderState;
use crate::tea::{update, Command, Message, Model};
use crate::{mlog, mlog_debug, mlog_warn, ui, Error, Result};

const FRAME_DURATION: Duration = Duration::from_micros(16_666); // 60fps
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Checkbox state when the form was closed. Reported, never saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormSummary {
    pub checked: usize,
    pub total: usize,
    pub percentage: u16,
}

impl FormSummary {
    fn from_model(model: &Model) -> Self {
        Self {
            checked: model.checked,
            total: model.tasks.len(),
            percentage: model.progress_percentage(),
        }
    }
}

/// Open the form for `checklist` and block until the user closes it.
pub fn run_form(checklist: &Checklist) -> Result<FormSummary> {
    mlog!(
        "Opening form for {} ({} tasks)",
        checklist.stage,
        checklist.len()
    );

    // The input thread starts only once the terminal is ready
    let mut terminal = setup_terminal()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let (state_tx, state_rx) = crossbeam_channel::bounded::<RenderState>(1);

    let model = Model::new(checklist);
    let shutdown_clone = shutdown.clone();
    let stale_rx = state_rx.clone();
    let logic_handle =
        thread::spawn(move || LogicThread::run(model, state_tx, stale_rx, shutdown_clone));

    let result = render_loop(&mut terminal, state_rx, &shutdown);

    shutdown.store(true, Ordering::SeqCst);
    let logic_result = join_logic(logic_handle);
    restore_terminal(&mut terminal)?;
    result?;

    let summary = logic_result?;
    mlog!(
        "Form for {} closed at {}/{} ({}%)",
        checklist.stage,
        summary.checked,
        summary.total,
        summary.percentage
    );
    Ok(summary)
}

pub struct LogicThread;

impl LogicThread {
    pub fn run(
        mut model: Model,
        state_tx: Sender<RenderState>,
        stale_rx: Receiver<RenderState>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<FormSummary> {
        if let Ok((width, height)) = crossterm::terminal::size() {
            update(&mut model, Message::Resize(width, height));
        }
        send_state(&state_tx, &stale_rx, &mut model);

        while !shutdown.load(Ordering::Relaxed) {
            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            let msg = match event::read()? {
                Event::Key(key) => Message::Key(key),
                Event::Resize(width, height) => Message::Resize(width, height),
                _ => continue,
            };

            for cmd in update(&mut model, msg) {
                match cmd {
                    Command::Quit => {
                        mlog_debug!("Command::Quit");
                        shutdown.store(true, Ordering::Relaxed);
                        return Ok(FormSummary::from_model(&model));
                    }
                }
            }

            if model.dirty {
                send_state(&state_tx, &stale_rx, &mut model);
            }
        }

        Ok(FormSummary::from_model(&model))
    }
}

fn join_logic(handle: JoinHandle<Result<FormSummary>>) -> Result<FormSummary> {
    handle.join().map_err(|_| Error::InputThreadPanicked)?
}

/// Replace whatever snapshot is still queued with the current one.
fn send_state(state_tx: &Sender<RenderState>, stale_rx: &Receiver<RenderState>, model: &mut Model) {
    let _ = stale_rx.try_recv();
    let _ = state_tx.try_send(model.snapshot());
    model.dirty = false;
}

fn render_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: Receiver<RenderState>,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut state = RenderState::default();
    let mut last_version: u64 = 0;
    let mut last_frame = Instant::now();
    let mut dirty = false;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match state_rx.try_recv() {
            Ok(s) => {
                dirty = dirty || s.version != last_version;
                state = s;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        if last_frame.elapsed() < FRAME_DURATION {
            thread::sleep(Duration::from_micros(500));
            continue;
        }
        last_frame = Instant::now();

        if dirty {
            terminal.draw(|f| ui::draw(f, &state))?;
            last_version = state.version;
            dirty = false;
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    undo_on_err(enter_alternate_screen(), || {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
    })
}

fn enter_alternate_screen() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    Ok(terminal)
}

/// Run `undo` when a setup step failed, then pass the result through.
fn undo_on_err<T>(result: Result<T>, undo: impl FnOnce()) -> Result<T> {
    if let Err(e) = &result {
        mlog_warn!("Terminal setup failed, restoring: {}", e);
        undo();
    }
    result
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(disable_raw_mode()?)
}
