//! User directory - ui-dispatch terminal host
//!
//! Mounts a component tree described in JSON and drives it from the keyboard:
//! 1. Root data fetches run in the background on start
//! 2. Every state write bumps the store version and triggers a redraw
//! 3. Keys fire the focused element's handlers (onChange / onClick)
//! 4. Handler completions land in the dispatch log shown on the status line
//!
//! # Usage
//!
//! ```sh
//! # Run the bundled user directory
//! cargo run -p user-directory
//!
//! # Run another tree
//! cargo run -p user-directory -- --config path/to/tree.json
//! ```

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::KeyCode,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use ui_dispatch::prelude::*;
use ui_dispatch::HttpTransport;
use user_directory::poller::{spawn_input_poller, TerminalInput};
use user_directory::view::{self, Cursor};
use user_directory::BUNDLED_CONFIG;

/// Run a declarative component tree in the terminal
#[derive(Parser, Debug)]
#[command(name = "user-directory")]
#[command(about = "A terminal host for ui-dispatch component trees")]
struct Args {
    /// Component tree to run (defaults to the bundled user directory)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Stop mount-time fetches after the first failure
    #[arg(long)]
    abort_on_error: bool,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();

    let source = match &args.config {
        Some(path) => std::fs::read_to_string(path)?,
        None => BUNDLED_CONFIG.to_string(),
    };
    let root = match ComponentNode::from_json_str(&source) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let interpreter = Interpreter::builder(root)
        .transport(Arc::new(HttpTransport::new()))
        .options(RendererOptions::default().abort_fetches_on_error(args.abort_on_error))
        .build();

    // ===== Terminal setup =====
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, interpreter).await;

    // ===== Cleanup =====
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

enum Input {
    Quit,
    Redraw,
    Ignored,
}

struct App {
    interpreter: Interpreter,
    cursor: Cursor,
    show_state: bool,
}

impl App {
    fn handle_key(&mut self, code: KeyCode) -> Input {
        let roots = self.interpreter.render();
        let focusables = view::focusables(&roots);
        let focused = focusables.get(self.cursor.focus).copied();

        match code {
            KeyCode::Char('q') | KeyCode::Esc => Input::Quit,
            KeyCode::Char('s') => {
                self.show_state = !self.show_state;
                Input::Redraw
            }
            KeyCode::Tab | KeyCode::BackTab if !focusables.is_empty() => {
                let len = focusables.len();
                self.cursor.focus = if code == KeyCode::Tab {
                    (self.cursor.focus + 1) % len
                } else {
                    (self.cursor.focus + len - 1) % len
                };
                self.cursor.option = focusables
                    .get(self.cursor.focus)
                    .copied()
                    .and_then(view::selected_index)
                    .unwrap_or(0);
                Input::Redraw
            }
            KeyCode::Left | KeyCode::Right => {
                let Some(select) = focused.filter(|e| e.kind == "Select") else {
                    return Input::Ignored;
                };
                let len = view::options(select).len().max(1);
                self.cursor.option = if code == KeyCode::Right {
                    (self.cursor.option + 1) % len
                } else {
                    (self.cursor.option + len - 1) % len
                };
                Input::Redraw
            }
            KeyCode::Enter => {
                let Some(element) = focused else {
                    return Input::Ignored;
                };
                let fired = if element.kind == "Select" {
                    let value = view::options(element)
                        .into_iter()
                        .nth(self.cursor.option)
                        .map(|(_, value)| value);
                    element
                        .handler(EventType::Change)
                        .cloned()
                        .zip(value)
                        .map(|(handler, value)| (handler, UiEvent::change(value)))
                } else {
                    element
                        .handler(EventType::Click)
                        .cloned()
                        .map(|handler| (handler, UiEvent::click()))
                };
                if let Some((handler, event)) = fired {
                    self.interpreter.fire(&handler, event);
                }
                Input::Ignored
            }
            _ => Input::Ignored,
        }
    }

    fn draw<B: ratatui::backend::Backend>(&self, terminal: &mut Terminal<B>) -> io::Result<()> {
        let roots = self.interpreter.render();
        let log = self.interpreter.dispatcher().dispatch_log();
        let status = match log.recent(1).next() {
            Some(entry) => format!(
                "{} {:?} ({} ago)",
                entry.name(),
                entry.status,
                entry.elapsed_display()
            ),
            None => "idle".to_string(),
        };
        let sections = self
            .show_state
            .then(|| (self.interpreter.store(), &log).debug_sections());

        let cursor = clamp(self.cursor, view::focusables(&roots).len());
        terminal.draw(|frame| {
            view::draw(frame, &roots, cursor, sections.as_deref(), &status);
        })?;
        Ok(())
    }
}

/// Keep focus in range when elements disappear between renders.
fn clamp(cursor: Cursor, focusable: usize) -> Cursor {
    Cursor {
        focus: cursor.focus.min(focusable.saturating_sub(1)),
        ..cursor
    }
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    interpreter: Interpreter,
) -> io::Result<()> {
    let mut changes = interpreter.subscribe();
    let mut app = App {
        interpreter,
        cursor: Cursor::default(),
        show_state: false,
    };
    app.interpreter.spawn_mount();

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let cancel_token = CancellationToken::new();
    let _handle = spawn_input_poller(input_tx, Duration::from_millis(16), cancel_token.clone());

    let mut should_render = true;

    loop {
        if should_render {
            app.draw(terminal)?;
            should_render = false;
        }

        tokio::select! {
            Some(input) = input_rx.recv() => {
                match input {
                    TerminalInput::Key(code) => match app.handle_key(code) {
                        Input::Quit => break,
                        Input::Redraw => should_render = true,
                        Input::Ignored => {}
                    },
                    TerminalInput::Resize => should_render = true,
                }
            }

            Ok(()) = changes.changed() => {
                should_render = true;
            }

            Some(completion) = app.interpreter.next_completion() => {
                tracing::debug!(?completion, "background work finished");
                should_render = true;
            }
        }
    }

    app.interpreter.unmount();
    cancel_token.cancel();
    Ok(())
}
