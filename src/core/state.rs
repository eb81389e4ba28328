//! # Session State
//!
//! Everything the loop needs to remember between events. The script's own
//! board lives inside the evaluator; this is only the host side.
//!
//! ```text
//! Session
//! ├── phase: Phase        // Bootstrapping → Running → Terminated | Aborted
//! ├── quit_key: char      // rune that ends the session
//! ├── ticks: u64          // ticks seen while running
//! ├── keys: u64           // key presses seen while running
//! └── commands: u64       // commands handed to the evaluator
//! ```
//!
//! State changes only happen through `update(session, action)` in action.rs.

use crate::input::InputError;

/// Default rune that quits the session.
pub const DEFAULT_QUIT_KEY: char = 'q';

/// Bootstrapping → Running → Terminated. A fatal bootstrap failure skips
/// straight to `Aborted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Bootstrapping,
    Running,
    Terminated(ExitReason),
    Aborted,
}

/// Why the session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The quit rune was pressed.
    Quit,
    /// Escape was pressed.
    Escape,
    /// The input device failed or its stream ended.
    DeviceFailure(InputError),
}

impl ExitReason {
    /// User-initiated exits succeed; device failures do not.
    pub fn is_success(&self) -> bool {
        !matches!(self, ExitReason::DeviceFailure(_))
    }

    /// Text shown once the terminal has been handed back.
    pub fn farewell(&self) -> String {
        match self {
            ExitReason::Quit => "Bye!".to_string(),
            ExitReason::Escape => "Later!".to_string(),
            ExitReason::DeviceFailure(e) => format!("Keyboard error: {e}"),
        }
    }
}

pub struct Session {
    pub phase: Phase,
    pub quit_key: char,
    pub ticks: u64,
    pub keys: u64,
    pub commands: u64,
}

impl Session {
    pub fn new(quit_key: char) -> Self {
        Self {
            phase: Phase::Bootstrapping,
            quit_key,
            ticks: 0,
            keys: 0,
            commands: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// The exit reason, once terminated.
    pub fn exit_reason(&self) -> Option<&ExitReason> {
        match &self.phase {
            Phase::Terminated(reason) => Some(reason),
            _ => None,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_QUIT_KEY)
    }
}
