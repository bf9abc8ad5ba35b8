//! Terminal input on a background task

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Input the host reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalInput {
    Key(KeyCode),
    Resize,
}

impl TerminalInput {
    /// Key presses and resizes; releases, repeats, mouse and focus events
    /// are dropped.
    pub fn from_event(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(Self::Key(key.code)),
            Event::Resize(..) => Some(Self::Resize),
            _ => None,
        }
    }
}

/// Forward [`TerminalInput`] to `tx` every `tick` until `cancel` fires or
/// the receiver goes away.
pub fn spawn_input_poller(
    tx: mpsc::UnboundedSender<TerminalInput>,
    tick: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            while event::poll(Duration::ZERO).unwrap_or(false) {
                let Ok(event) = event::read() else { break };
                let Some(input) = TerminalInput::from_event(event) else { continue };
                if tx.send(input).is_err() {
                    tracing::debug!("input channel closed");
                    return;
                }
            }
        }
    })
}
