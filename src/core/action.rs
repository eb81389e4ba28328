//! # Actions
//!
//! Everything that reaches the loop becomes an `Action`.
//! A tick? That's `Action::Tick`. An arrow key? That's `Action::Key(Key::Up)`.
//!
//! The `update()` function takes the session and an action, advances the
//! session, and returns the `Effect` the loop should carry out. No side
//! effects here. Evaluation and shutdown happen in the runner.
//!
//! ```text
//! Session + Action  →  update()  →  Session' + Effect
//! ```

use log::{debug, trace};

use crate::core::command::{Command, Direction};
use crate::core::state::{ExitReason, Phase, Session};
use crate::input::{InputError, Key, KeyEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Bootstrap finished; start accepting events.
    Start,
    /// Bootstrap hit an unrecoverable error.
    Abort,
    Tick,
    Key(Key),
    InputFailed(InputError),
}

impl From<KeyEvent> for Action {
    fn from(event: KeyEvent) -> Self {
        match event {
            KeyEvent::Pressed(key) => Action::Key(key),
            KeyEvent::Failed(e) => Action::InputFailed(e),
        }
    }
}

/// What the loop should do after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Eval(Command),
    Exit(ExitReason),
}

pub fn update(session: &mut Session, action: Action) -> Effect {
    match action {
        Action::Start => {
            if session.phase == Phase::Bootstrapping {
                session.phase = Phase::Running;
            }
            Effect::None
        }
        Action::Abort => {
            if !matches!(session.phase, Phase::Terminated(_)) {
                session.phase = Phase::Aborted;
            }
            Effect::None
        }
        other if !session.is_running() => {
            trace!("Dropping {:?} outside the running phase", other);
            Effect::None
        }
        Action::Tick => {
            session.ticks += 1;
            Effect::None
        }
        Action::InputFailed(e) => terminate(session, ExitReason::DeviceFailure(e)),
        Action::Key(key) => {
            session.keys += 1;
            match key {
                Key::Char(c) if c == session.quit_key => terminate(session, ExitReason::Quit),
                Key::Escape => terminate(session, ExitReason::Escape),
                Key::Enter => issue(session, Command::Reset),
                Key::Char(_) => Effect::None,
                arrow => match Direction::from_key(&arrow) {
                    Some(dir) => issue(session, Command::Move(dir)),
                    None => Effect::None,
                },
            }
        }
    }
}

fn issue(session: &mut Session, command: Command) -> Effect {
    session.commands += 1;
    Effect::Eval(command)
}

fn terminate(session: &mut Session, reason: ExitReason) -> Effect {
    debug!("Session terminating: {:?}", reason);
    session.phase = Phase::Terminated(reason.clone());
    Effect::Exit(reason)
}
