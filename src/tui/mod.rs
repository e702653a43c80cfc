//! Interactive terminal dashboard.
//!
//! One loop owns the terminal and the `Dashboard`: it drains fetch events,
//! redraws, and waits up to one input tick for a key. The search prompt is a
//! separate blocking loop that returns once a query is submitted or cancelled.

pub mod dashboard;
pub mod render;
pub mod sanitize;
pub mod viewport;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

pub use dashboard::Dashboard;
pub use viewport::ScrollInput;

use crate::error::{MonitorError, Result};
use crate::monitor::FetchEvent;

type DashboardTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Raw mode and the alternate screen, restored on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, Show, LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Scroll(ScrollInput),
    Search,
    Quit,
}

fn command_for(code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
    if is_interrupt(code, modifiers) {
        return Some(Command::Quit);
    }
    match code {
        KeyCode::Up => Some(Command::Scroll(ScrollInput::LineUp)),
        KeyCode::Down => Some(Command::Scroll(ScrollInput::LineDown)),
        KeyCode::PageUp => Some(Command::Scroll(ScrollInput::PageUp)),
        KeyCode::PageDown => Some(Command::Scroll(ScrollInput::PageDown)),
        KeyCode::Char('s') => Some(Command::Search),
        KeyCode::Char('q') => Some(Command::Quit),
        _ => None,
    }
}

/// Raw mode delivers Ctrl-C as a key instead of SIGINT.
fn is_interrupt(code: KeyCode, modifiers: KeyModifiers) -> bool {
    code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SearchOutcome {
    Submit(String),
    Cancel,
    Quit,
}

/// Apply one key to the search input. `None` while the prompt stays open.
fn search_key(input: &mut String, code: KeyCode, modifiers: KeyModifiers) -> Option<SearchOutcome> {
    if is_interrupt(code, modifiers) {
        return Some(SearchOutcome::Quit);
    }
    match code {
        KeyCode::Enter => return Some(SearchOutcome::Submit(std::mem::take(input))),
        KeyCode::Esc => return Some(SearchOutcome::Cancel),
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Char(c) if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => input.push(c),
        _ => {}
    }
    None
}

/// Run the dashboard until the user quits.
pub fn run(
    mut dashboard: Dashboard,
    mut events: UnboundedReceiver<FetchEvent>,
    input_tick: Duration,
) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    loop {
        loop {
            match events.try_recv() {
                Ok(event) => dashboard.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(MonitorError::ChannelClosed),
            }
        }

        let height = terminal.size()?.height as usize;
        dashboard.clamp_scroll(height);
        terminal.draw(|frame| render::draw(frame, &dashboard))?;

        if !event::poll(input_tick)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match command_for(key.code, key.modifiers) {
            Some(Command::Quit) => {
                info!("Quit requested");
                return Ok(());
            }
            Some(Command::Search) => match prompt_search(&mut terminal, &dashboard)? {
                SearchOutcome::Submit(query) => dashboard.set_query(query),
                SearchOutcome::Cancel => {}
                SearchOutcome::Quit => {
                    info!("Quit requested from search prompt");
                    return Ok(());
                }
            },
            Some(Command::Scroll(input)) => dashboard.scroll(input, height),
            None => {}
        }
    }
}

/// Blocking search prompt, open until Enter, Esc or Ctrl-C.
fn prompt_search(terminal: &mut DashboardTerminal, dashboard: &Dashboard) -> Result<SearchOutcome> {
    terminal.show_cursor()?;
    let mut input = String::new();

    let result = loop {
        terminal.draw(|frame| {
            render::draw(frame, dashboard);
            render::draw_search_dialog(frame, &input);
        })?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if let Some(outcome) = search_key(&mut input, key.code, key.modifiers) {
            break outcome;
        }
    };

    terminal.hide_cursor()?;
    Ok(result)
}
