//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;

use crate::audio::{AudioError, CuePlayer, Playback};
use crate::input::{InputError, InputSource, KeyEvent, Lifecycle};
use crate::script::{Evaluator, ScriptError};

/// Writes `contents` to a temporary game file.
pub fn payload_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write payload");
    file
}

/// An evaluator that records every call instead of running anything.
///
/// `calls()` starts with `"bootstrap"`, followed by each evaluated source.
#[derive(Default)]
pub struct RecordingEvaluator {
    calls: Arc<Mutex<Vec<String>>>,
    bootstrap: Option<(String, String)>,
    fail_bootstrap: bool,
    fail_evals: bool,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    spans: Vec<(Instant, Instant)>,
}

impl RecordingEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_bootstrap(mut self) -> Self {
        self.fail_bootstrap = true;
        self
    }

    pub fn failing_evals(mut self) -> Self {
        self.fail_evals = true;
        self
    }

    /// Block the calling thread for `delay` inside every `eval`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn bootstrapped_with(&self) -> Option<(String, String)> {
        self.bootstrap.clone()
    }

    /// Highest number of evaluations seen running at the same time.
    pub fn max_in_flight(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.max_in_flight)
    }

    /// Start and end of every `eval`, in call order.
    pub fn spans(&self) -> Vec<(Instant, Instant)> {
        self.spans.clone()
    }
}

impl Evaluator for RecordingEvaluator {
    fn bootstrap(&mut self, library: &str, payload: &str) -> Result<(), ScriptError> {
        if self.bootstrap.is_some() {
            return Err(ScriptError::AlreadyBootstrapped);
        }
        self.calls.lock().unwrap().push("bootstrap".to_string());
        self.bootstrap = Some((library.to_string(), payload.to_string()));
        if self.fail_bootstrap {
            return Err(ScriptError::Library("syntax error".to_string()));
        }
        Ok(())
    }

    fn eval(&mut self, source: &str) -> Result<String, ScriptError> {
        if self.bootstrap.is_none() {
            return Err(ScriptError::NotBootstrapped);
        }
        let start = Instant::now();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.calls.lock().unwrap().push(source.to_string());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.spans.push((start, Instant::now()));
        if self.fail_evals {
            return Err(ScriptError::Command {
                source: source.to_string(),
                message: "board not found".to_string(),
            });
        }
        Ok(String::new())
    }
}

/// An input source that plays back a fixed list of events.
///
/// After the last event the stream stays open (like an idle keyboard) unless
/// `ending()` was set.
pub struct ScriptedInput {
    events: Vec<KeyEvent>,
    fail_open: Option<InputError>,
    end: bool,
    gap: Option<Duration>,
    state: Lifecycle,
    opens: usize,
    closes: usize,
    queued: Arc<Mutex<Vec<Instant>>>,
    feeder: Option<JoinHandle<()>>,
}

impl ScriptedInput {
    pub fn new(events: Vec<KeyEvent>) -> Self {
        Self {
            events,
            fail_open: None,
            end: false,
            gap: None,
            state: Lifecycle::Idle,
            opens: 0,
            closes: 0,
            queued: Arc::new(Mutex::new(Vec::new())),
            feeder: None,
        }
    }

    pub fn failing_open(mut self, error: InputError) -> Self {
        self.fail_open = Some(error);
        self
    }

    /// Close the stream once every event has been sent.
    pub fn ending(mut self) -> Self {
        self.end = true;
        self
    }

    /// Wait `gap` before sending each event.
    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap = Some(gap);
        self
    }

    pub fn open_calls(&self) -> usize {
        self.opens
    }

    pub fn close_calls(&self) -> usize {
        self.closes
    }

    /// When each event was handed to the queue.
    pub fn queued_at(&self) -> Vec<Instant> {
        self.queued.lock().unwrap().clone()
    }
}

impl InputSource for ScriptedInput {
    fn open(&mut self) -> Result<(), InputError> {
        self.opens += 1;
        self.state.check_open()?;
        if let Some(e) = self.fail_open.clone() {
            return Err(e);
        }
        self.state = Lifecycle::Open;
        Ok(())
    }

    fn events(&mut self, buffer: usize) -> Result<Receiver<KeyEvent>, InputError> {
        self.state.check_events()?;
        self.state = Lifecycle::Streaming;

        let (tx, rx) = mpsc::channel(buffer);
        let events = self.events.clone();
        let queued = Arc::clone(&self.queued);
        let (gap, end) = (self.gap, self.end);
        self.feeder = Some(tokio::spawn(async move {
            for event in events {
                if let Some(gap) = gap {
                    tokio::time::sleep(gap).await;
                }
                queued.lock().unwrap().push(Instant::now());
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            if !end {
                std::future::pending::<()>().await;
            }
        }));
        Ok(rx)
    }

    fn close(&mut self) {
        self.closes += 1;
        if self.state == Lifecycle::Closed {
            return;
        }
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
        self.state = Lifecycle::Closed;
    }
}

/// A player whose output device is always missing.
pub struct FailingPlayer;

#[async_trait]
impl CuePlayer for FailingPlayer {
    fn name(&self) -> &str {
        "failing"
    }

    async fn play_once(&self, _asset: &Path) -> Result<Playback, AudioError> {
        Err(AudioError::Output("no output device".to_string()))
    }
}
