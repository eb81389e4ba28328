//! # Audio Cues
//!
//! Fire-and-forget playback of a single asset. `play_once` returns as soon as
//! the sound is streaming; the returned [`Playback`] can report completion or
//! cut the sound short, but nothing in the loop waits on it.

#[cfg(feature = "audio")]
mod rodio_player;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use log::info;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

#[cfg(feature = "audio")]
pub use rodio_player::RodioPlayer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The asset could not be opened.
    Open { path: PathBuf, message: String },
    /// The asset is not a format the backend can decode.
    Decode { path: PathBuf, message: String },
    /// No usable output device, or the playback thread died.
    Output(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Open { path, message } => {
                write!(f, "cannot open {}: {message}", path.display())
            }
            AudioError::Decode { path, message } => {
                write!(f, "cannot decode {}: {message}", path.display())
            }
            AudioError::Output(msg) => write!(f, "audio output error: {msg}"),
        }
    }
}

impl std::error::Error for AudioError {}

/// Handle to a sound that is (or was) playing.
pub struct Playback {
    done: oneshot::Receiver<()>,
    stop: Arc<AtomicBool>,
    finished: bool,
}

impl Playback {
    pub(crate) fn new(done: oneshot::Receiver<()>, stop: Arc<AtomicBool>) -> Self {
        Self {
            done,
            stop,
            finished: false,
        }
    }

    /// A playback that has already completed.
    pub fn completed() -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(());
        Self::new(rx, Arc::new(AtomicBool::new(false)))
    }

    /// Non-blocking completion check.
    pub fn is_finished(&mut self) -> bool {
        if !self.finished {
            self.finished = !matches!(self.done.try_recv(), Err(TryRecvError::Empty));
        }
        self.finished
    }

    /// Wait until the sound has played out (or was stopped).
    pub async fn wait(self) {
        if !self.finished {
            let _ = self.done.await;
        }
    }

    /// Ask the player to cut the sound short.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

#[async_trait]
pub trait CuePlayer: Send + Sync {
    /// Returns the name of the player.
    fn name(&self) -> &str;

    /// Start playing `asset` once. Resolves when streaming has been
    /// scheduled, not when the sound ends.
    async fn play_once(&self, asset: &Path) -> Result<Playback, AudioError>;
}

/// A player that never makes a sound.
pub struct SilentPlayer;

#[async_trait]
impl CuePlayer for SilentPlayer {
    fn name(&self) -> &str {
        "silent"
    }

    async fn play_once(&self, asset: &Path) -> Result<Playback, AudioError> {
        info!("Audio is silent, skipping {}", asset.display());
        Ok(Playback::completed())
    }
}

/// The player this build can offer: rodio with the `audio` feature,
/// otherwise silence.
pub fn default_player() -> Box<dyn CuePlayer> {
    #[cfg(feature = "audio")]
    {
        Box::new(RodioPlayer::new())
    }
    #[cfg(not(feature = "audio"))]
    {
        info!("Built without the `audio` feature, cues will be silent");
        Box::new(SilentPlayer)
    }
}
