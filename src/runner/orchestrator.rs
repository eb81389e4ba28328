use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, trace, warn};
use tokio::sync::mpsc::Receiver;

use crate::audio::{AudioError, CuePlayer, Playback};
use crate::core::action::{Action, Effect, update};
use crate::core::command::Command;
use crate::core::config::{DEFAULT_EVENT_BUFFER, DEFAULT_TICK_INTERVAL_MS, ResolvedConfig};
use crate::core::state::{DEFAULT_QUIT_KEY, ExitReason, Session};
use crate::input::{InputError, InputSource, KeyEvent};
use crate::runner::ticker::{Tick, Ticker};
use crate::script::{BOOT_LIBRARY, Evaluator};

/// Per-run knobs for the orchestrator.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Library source evaluated ahead of the game payload.
    pub library: String,
    pub tick_interval: Duration,
    pub event_buffer: usize,
    pub quit_key: char,
    /// Cue to play once at startup; `None` skips audio entirely.
    pub audio_asset: Option<PathBuf>,
    /// Treat a cue that cannot play as fatal instead of going silent.
    pub audio_required: bool,
}

impl SessionOptions {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            library: BOOT_LIBRARY.to_string(),
            tick_interval: config.tick_interval,
            event_buffer: config.event_buffer,
            quit_key: config.quit_key,
            audio_asset: config.audio_enabled.then(|| config.audio_asset.clone()),
            audio_required: config.audio_required,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            library: BOOT_LIBRARY.to_string(),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            event_buffer: DEFAULT_EVENT_BUFFER,
            quit_key: DEFAULT_QUIT_KEY,
            audio_asset: None,
            audio_required: false,
        }
    }
}

/// Failures that stop a session before it starts running.
#[derive(Debug)]
pub enum RunError {
    /// The game payload could not be read.
    Payload { path: PathBuf, source: std::io::Error },
    /// The input device could not be opened or streamed.
    Input(InputError),
    /// The startup cue failed and audio is required.
    Audio(AudioError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Payload { path, source } => {
                write!(f, "Error reading file {}: {source}", path.display())
            }
            RunError::Input(e) => write!(f, "Failed to open keyboard: {e}"),
            RunError::Audio(e) => write!(f, "Failed to play audio: {e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Payload { source, .. } => Some(source),
            RunError::Input(e) => Some(e),
            RunError::Audio(e) => Some(e),
        }
    }
}

/// The single control point of a session.
///
/// Owns the evaluator, so every evaluation happens on this task, one at a
/// time. The input reader and the ticker run as their own tasks and only
/// reach the orchestrator through their queues.
pub struct Orchestrator<E, I> {
    evaluator: E,
    input: I,
    player: Box<dyn CuePlayer>,
    options: SessionOptions,
    session: Session,
}

impl<E: Evaluator, I: InputSource> Orchestrator<E, I> {
    pub fn new(evaluator: E, input: I, player: Box<dyn CuePlayer>, options: SessionOptions) -> Self {
        let session = Session::new(options.quit_key);
        Self {
            evaluator,
            input,
            player,
            options,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Run a whole session for the payload at `game`.
    ///
    /// Returns why the session ended once running, or the bootstrap failure
    /// that kept it from running. The input source is closed and the ticker
    /// stopped on every path.
    pub async fn run(&mut self, game: &Path) -> Result<ExitReason, RunError> {
        let result = self.run_inner(game).await;
        if let Err(e) = &result {
            warn!("Session aborted: {}", e);
            update(&mut self.session, Action::Abort);
        }
        result
    }

    async fn run_inner(&mut self, game: &Path) -> Result<ExitReason, RunError> {
        info!("Loading game file: {}", game.display());
        let payload = tokio::fs::read_to_string(game)
            .await
            .map_err(|source| RunError::Payload {
                path: game.to_path_buf(),
                source,
            })?;

        if let Err(e) = self.evaluator.bootstrap(&self.options.library, &payload) {
            warn!("Bootstrap incomplete, continuing: {}", e);
        }

        let outcome = match self.input.open() {
            Ok(()) => self.run_with_input().await,
            Err(e) => Err(RunError::Input(e)),
        };
        self.input.close();
        outcome
    }

    async fn run_with_input(&mut self) -> Result<ExitReason, RunError> {
        let mut keys = self
            .input
            .events(self.options.event_buffer)
            .map_err(RunError::Input)?;
        let (mut ticker, mut ticks) = Ticker::start(self.options.tick_interval);

        self.dispatch(Command::InitialRender);
        let outcome = match self.start_cue().await {
            Ok(playback) => {
                update(&mut self.session, Action::Start);
                info!("Session running");
                let reason = self.serve(&mut keys, &mut ticks).await;
                if let Some(playback) = playback {
                    playback.stop();
                }
                Ok(reason)
            }
            Err(e) => Err(e),
        };

        ticker.stop();
        outcome
    }

    async fn start_cue(&self) -> Result<Option<Playback>, RunError> {
        let Some(asset) = &self.options.audio_asset else {
            return Ok(None);
        };
        match self.player.play_once(asset).await {
            Ok(playback) => {
                info!("Playing {} via {}", asset.display(), self.player.name());
                Ok(Some(playback))
            }
            Err(e) if self.options.audio_required => Err(RunError::Audio(e)),
            Err(e) => {
                warn!("Audio cue unavailable, continuing silently: {}", e);
                Ok(None)
            }
        }
    }

    /// Wait on whichever of tick or key is ready first until the session ends.
    async fn serve(&mut self, keys: &mut Receiver<KeyEvent>, ticks: &mut Receiver<Tick>) -> ExitReason {
        loop {
            let action = tokio::select! {
                Some(tick) = ticks.recv() => {
                    trace!("Tick at {:?}", tick.at);
                    Action::Tick
                }
                event = keys.recv() => match event {
                    Some(event) => Action::from(event),
                    None => Action::InputFailed(InputError::Ended),
                },
            };

            match update(&mut self.session, action) {
                Effect::None => {}
                Effect::Eval(command) => self.dispatch(command),
                Effect::Exit(reason) => {
                    info!(
                        "Session ended: {:?} ({} keys, {} ticks, {} commands)",
                        reason, self.session.keys, self.session.ticks, self.session.commands
                    );
                    return reason;
                }
            }
        }
    }

    /// Evaluate one command. Failures are logged and play continues.
    fn dispatch(&mut self, command: Command) {
        let source = command.source();
        debug!("Evaluating {}: {}", command, source);
        match self.evaluator.eval(&source) {
            Ok(value) if !value.is_empty() => trace!("{} returned {}", command, value),
            Ok(_) => {}
            Err(e) => warn!("Error evaluating {}: {}", command, e),
        }
    }
}
