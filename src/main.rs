use clap::Parser;
use rulebox::core::config::{self, CliOverrides};
use rulebox::runner;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "rulebox", about = "Scriptable terminal board games")]
struct Args {
    /// Game script to load on top of the board library
    #[arg(short, long)]
    game: PathBuf,

    /// Config file to use instead of ~/.rulebox/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Sound to play once at startup
    #[arg(long)]
    audio: Option<String>,

    /// Skip the startup sound
    #[arg(long)]
    mute: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            tick_ms: self.tick_ms,
            audio_asset: self.audio.clone(),
            mute: self.mute,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let resolved = config::resolve(&file_config, &args.overrides());

    // Initialize file logger; the terminal belongs to the game
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    log::info!("Rulebox starting up with game: {}", args.game.display());
    resolved.replay_diagnostics();

    // The terminal is restored by the time run() returns
    match runner::run(&resolved, &args.game).await {
        Ok(reason) => {
            println!("{}", reason.farewell());
            if reason.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
