//! # Input
//!
//! Key events and the sources that produce them. A source is opened once,
//! hands out a single event stream, and is closed exactly once. Closing is
//! the only way to cancel the stream; a device problem arrives *in* the
//! stream as `KeyEvent::Failed`.

mod terminal;

use std::fmt;

use tokio::sync::mpsc::Receiver;

pub use terminal::{TerminalInput, map_key};

/// The keys the loop understands. Everything else is dropped at the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Char(char),
}

/// One input notification: a key, or the reason no more keys will come.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyEvent {
    Pressed(Key),
    Failed(InputError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The device could not be opened or reported an error.
    Device(String),
    /// The underlying stream ran dry.
    Ended,
    /// `events()` was called before `open()`.
    NotOpen,
    /// `events()` was called a second time.
    AlreadyStreaming,
    /// The source was used after `close()`.
    Closed,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Device(msg) => write!(f, "input device error: {msg}"),
            InputError::Ended => write!(f, "input stream ended"),
            InputError::NotOpen => write!(f, "input source is not open"),
            InputError::AlreadyStreaming => write!(f, "input stream already taken"),
            InputError::Closed => write!(f, "input source is closed"),
        }
    }
}

impl std::error::Error for InputError {}

impl From<std::io::Error> for InputError {
    fn from(e: std::io::Error) -> Self {
        InputError::Device(e.to_string())
    }
}

/// A producer of key events.
pub trait InputSource {
    /// Acquire the device.
    fn open(&mut self) -> Result<(), InputError>;

    /// Start producing events into a queue of `buffer` slots.
    /// The stream cannot be restarted.
    fn events(&mut self, buffer: usize) -> Result<Receiver<KeyEvent>, InputError>;

    /// Stop producing and release the device. Safe to call more than once;
    /// only the first call does anything.
    fn close(&mut self);
}

/// Where a source is in its open → stream → close life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    Idle,
    Open,
    Streaming,
    Closed,
}

impl Lifecycle {
    /// Checks that `events()` may be called, returning the error otherwise.
    pub(crate) fn check_events(self) -> Result<(), InputError> {
        match self {
            Lifecycle::Open => Ok(()),
            Lifecycle::Idle => Err(InputError::NotOpen),
            Lifecycle::Streaming => Err(InputError::AlreadyStreaming),
            Lifecycle::Closed => Err(InputError::Closed),
        }
    }

    /// Checks that `open()` may be called.
    pub(crate) fn check_open(self) -> Result<(), InputError> {
        match self {
            Lifecycle::Idle => Ok(()),
            Lifecycle::Closed => Err(InputError::Closed),
            Lifecycle::Open | Lifecycle::Streaming => {
                Err(InputError::Device("already open".to_string()))
            }
        }
    }
}
