use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::sync::oneshot;

use super::{AudioError, CuePlayer, Playback};

/// How often the playback thread checks for a stop request.
const STOP_POLL: Duration = Duration::from_millis(50);

/// Plays through the default output device at the asset's native rate.
///
/// The output stream handle is not `Send`, so each cue owns a dedicated
/// thread that opens, decodes and streams the asset.
pub struct RodioPlayer;

impl RodioPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CuePlayer for RodioPlayer {
    fn name(&self) -> &str {
        "rodio"
    }

    async fn play_once(&self, asset: &Path) -> Result<Playback, AudioError> {
        let path = asset.to_path_buf();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        thread::Builder::new()
            .name("audio-cue".to_string())
            .spawn(move || stream_cue(path, ready_tx, done_tx, stop_flag))
            .map_err(|e| AudioError::Output(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(Playback::new(done_rx, stop)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AudioError::Output(
                "audio thread exited before playback started".to_string(),
            )),
        }
    }
}

fn stream_cue(
    path: PathBuf,
    ready: oneshot::Sender<Result<(), AudioError>>,
    done: oneshot::Sender<()>,
    stop: Arc<AtomicBool>,
) {
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            let _ = ready.send(Err(AudioError::Open {
                path,
                message: e.to_string(),
            }));
            return;
        }
    };
    let source = match Decoder::new(BufReader::new(file)) {
        Ok(s) => s,
        Err(e) => {
            let _ = ready.send(Err(AudioError::Decode {
                path,
                message: e.to_string(),
            }));
            return;
        }
    };
    // Buffering is rodio's default for the device, not a fixed 1/10 s.
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready.send(Err(AudioError::Output(e.to_string())));
            return;
        }
    };
    let sink = match Sink::try_new(&handle) {
        Ok(s) => s,
        Err(e) => {
            let _ = ready.send(Err(AudioError::Output(e.to_string())));
            return;
        }
    };

    info!(
        "Playing {} ({} Hz, {} channels)",
        path.display(),
        source.sample_rate(),
        source.channels()
    );
    sink.append(source);
    if ready.send(Ok(())).is_err() {
        warn!("Nobody is waiting for {}, stopping", path.display());
        sink.stop();
        return;
    }

    while !sink.empty() {
        if stop.load(Ordering::Relaxed) {
            debug!("Stopping {} early", path.display());
            sink.stop();
            break;
        }
        thread::sleep(STOP_POLL);
    }
    let _ = done.send(());
}
