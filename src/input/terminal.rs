use std::io::stdout;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent as TermKeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use log::{debug, info, trace, warn};
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;

use super::{InputError, InputSource, Key, KeyEvent, Lifecycle};

/// Keyboard input from the controlling terminal, read in raw mode.
pub struct TerminalInput {
    state: Lifecycle,
    reader: Option<JoinHandle<()>>,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self {
            state: Lifecycle::Idle,
            reader: None,
        }
    }
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for TerminalInput {
    fn open(&mut self) -> Result<(), InputError> {
        self.state.check_open()?;
        enable_raw_mode()?;
        if let Err(e) = execute!(stdout(), Hide) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        self.state = Lifecycle::Open;
        info!("Terminal input opened (raw mode)");
        Ok(())
    }

    fn events(&mut self, buffer: usize) -> Result<Receiver<KeyEvent>, InputError> {
        self.state.check_events()?;
        let (tx, rx) = mpsc::channel(buffer.max(1));

        self.reader = Some(tokio::spawn(async move {
            let mut stream = EventStream::new();
            while let Some(item) = stream.next().await {
                let event = match item {
                    Ok(Event::Key(key_event)) => {
                        trace!("Key event: {:?} with modifiers {:?}", key_event.code, key_event.modifiers);
                        match map_key(&key_event) {
                            Some(key) => KeyEvent::Pressed(key),
                            None => continue,
                        }
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Terminal read failed: {}", e);
                        let _ = tx.send(KeyEvent::Failed(e.into())).await;
                        return;
                    }
                };
                if tx.send(event).await.is_err() {
                    debug!("Key receiver dropped, reader stopping");
                    return;
                }
            }
            let _ = tx.send(KeyEvent::Failed(InputError::Ended)).await;
        }));

        self.state = Lifecycle::Streaming;
        Ok(rx)
    }

    fn close(&mut self) {
        if matches!(self.state, Lifecycle::Idle | Lifecycle::Closed) {
            self.state = Lifecycle::Closed;
            return;
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        let _ = execute!(stdout(), Show);
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to leave raw mode: {}", e);
        }
        self.state = Lifecycle::Closed;
        info!("Terminal input closed");
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        self.close();
    }
}

/// Translate a terminal key press into a `Key`, or `None` for keys the loop
/// ignores. Releases are dropped; Ctrl+C counts as Escape since raw mode
/// swallows the interrupt.
pub fn map_key(event: &TermKeyEvent) -> Option<Key> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    match (event.modifiers, event.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Key::Escape),
        (_, KeyCode::Up) => Some(Key::Up),
        (_, KeyCode::Down) => Some(Key::Down),
        (_, KeyCode::Left) => Some(Key::Left),
        (_, KeyCode::Right) => Some(Key::Right),
        (_, KeyCode::Enter) => Some(Key::Enter),
        (_, KeyCode::Esc) => Some(Key::Escape),
        (_, KeyCode::Char(c)) => Some(Key::Char(c)),
        _ => None,
    }
}
