//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, background operation results, store
//! revisions and a periodic tick.

use crate::app::{App, AppEvent};
use anyhow::Result;
use crossterm::{
    event::{Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::handle_app_event;
use super::helpers;
use super::input::handle_input;
use super::render::render;

const TICK: Duration = Duration::from_millis(250);

/// Result of handling a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Keep running.
    Continue,
    /// Restore the terminal and exit.
    Quit,
}

/// Runs the TUI until the user quits or a termination signal arrives.
///
/// Kicks off the initial category and task loads, then uses
/// `tokio::select!` over:
/// - **Signals**: SIGTERM / SIGINT shut down gracefully
/// - **Terminal input**: key presses from crossterm's async event stream
/// - **Background operations**: results sent back as [`AppEvent`]s
/// - **Store revisions**: the watch channel the store publishes on
/// - **Tick**: status expiry and the midnight rollover of "today"
///
/// A panic hook restores the terminal before the default hook prints.
pub async fn run(
    app: &mut App,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    // Install panic hook BEFORE setting up terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();
    let mut tick_interval = tokio::time::interval(TICK);

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    helpers::load_categories(app, &event_tx);
    helpers::load_tasks(app, &event_tx);

    loop {
        // Drain finished operations before waiting on input so results are
        // not starved by fast typing.
        while let Ok(event) = event_rx.try_recv() {
            handle_app_event(app, event);
        }
        app.sync_snapshot();

        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind != KeyEventKind::Release => {
                        app.needs_redraw = true;
                        if handle_input(app, key.code, key.modifiers, &event_tx) == Action::Quit {
                            break;
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => app.needs_redraw = true,
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Terminal input stream failed");
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }

            Some(event) = event_rx.recv() => {
                handle_app_event(app, event);
            }

            Ok(()) = app.snapshot_rx.changed() => {
                app.sync_snapshot();
            }

            _ = tick_interval.tick() => {
                if app.clear_expired_status() {
                    app.needs_redraw = true;
                }
                if app.refresh_today() {
                    tracing::debug!(today = %app.today, "Date rolled over");
                    app.clamp_selection();
                    app.needs_redraw = true;
                }
            }
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
