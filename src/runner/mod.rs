//! # Runner
//!
//! Wires the concrete pieces together and drives a session to its end.
//!
//! ```text
//!  TerminalInput ──keys──┐
//!                        ├──▶ Orchestrator ──eval──▶ RhaiEvaluator
//!  Ticker ───────ticks───┘         │
//!                                  └──play_once──▶ CuePlayer
//! ```

mod orchestrator;
mod ticker;

use std::path::Path;

use log::info;

use crate::audio::{self, CuePlayer, SilentPlayer};
use crate::core::config::ResolvedConfig;
use crate::core::state::ExitReason;
use crate::input::TerminalInput;
use crate::script::{Output, RhaiEvaluator};

pub use orchestrator::{Orchestrator, RunError, SessionOptions};
pub use ticker::{Tick, Ticker};

/// Run the game at `game` on the real terminal.
pub async fn run(config: &ResolvedConfig, game: &Path) -> Result<ExitReason, RunError> {
    let player: Box<dyn CuePlayer> = if config.audio_enabled {
        audio::default_player()
    } else {
        Box::new(SilentPlayer)
    };
    info!("Audio player: {}", player.name());

    let mut orchestrator = Orchestrator::new(
        RhaiEvaluator::new(Output::Terminal),
        TerminalInput::new(),
        player,
        SessionOptions::from_config(config),
    );
    orchestrator.run(game).await
}
