//! Test doubles and common utilities for the engine contract tests
//!
//! These doubles count every call so tests can assert on what the engine
//! actually did, and can be scripted to fail at any seam.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use imgwatch_core::error::{Error, Result};
use imgwatch_core::traits::{ImageSource, Notifier, SnapshotStore};
use imgwatch_core::{ImageSnapshot, WatchConfig, Watchdog, WatchdogEvent};
use tokio::sync::mpsc;

pub const TEST_URL: &str = "https://example.com/image.png";

/// A valid config with a long interval; tests shorten it as needed
pub fn test_config() -> WatchConfig {
    WatchConfig {
        image_url: TEST_URL.to_string(),
        check_interval: Duration::from_secs(60),
        storage_path: "./data".into(),
        telegram_bot_token: "123456:test-token".to_string(),
        telegram_chat_id: 42,
        log_level: "info".to_string(),
    }
}

pub fn build_watchdog(
    source: impl ImageSource + 'static,
    notifier: impl Notifier + 'static,
    store: impl SnapshotStore + 'static,
    config: WatchConfig,
) -> (Watchdog, mpsc::Receiver<WatchdogEvent>) {
    Watchdog::new(
        Box::new(source),
        Box::new(notifier),
        Box::new(store),
        config,
    )
    .expect("engine construction succeeds")
}

/// One scripted outcome of a fetch
#[derive(Debug, Clone)]
pub enum ScriptedFetch {
    /// Respond with these bytes
    Payload(Vec<u8>),
    /// Fail with a transport error
    TransportError,
}

/// An image source that replays a script of outcomes
///
/// The last script entry repeats once the script is exhausted. Tracks call
/// and concurrency counters so tests can assert on sequential execution.
#[derive(Clone)]
pub struct MockImageSource {
    script: Arc<Mutex<VecDeque<ScriptedFetch>>>,
    delay: Duration,
    fetch_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockImageSource {
    pub fn sequence(outcomes: impl IntoIterator<Item = ScriptedFetch>) -> Self {
        let script: VecDeque<ScriptedFetch> = outcomes.into_iter().collect();
        assert!(!script.is_empty(), "script needs at least one outcome");

        Self {
            script: Arc::new(Mutex::new(script)),
            delay: Duration::ZERO,
            fetch_calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source that always returns the same payload
    pub fn returning(payload: &[u8]) -> Self {
        Self::sequence([ScriptedFetch::Payload(payload.to_vec())])
    }

    /// A source whose every fetch fails at the transport layer
    pub fn failing() -> Self {
        Self::sequence([ScriptedFetch::TransportError])
    }

    /// Make every fetch take this long (for in-flight/ordering tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fetch_call_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Highest number of fetches that were ever in flight at once
    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> ScriptedFetch {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl ImageSource for MockImageSource {
    async fn fetch(&self) -> Result<ImageSnapshot> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = self.next_outcome();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match outcome {
            ScriptedFetch::Payload(bytes) => Ok(ImageSnapshot::from_bytes(&bytes, TEST_URL)),
            ScriptedFetch::TransportError => Err(Error::fetch_transport("scripted failure")),
        }
    }
}

/// A recorded delivery attempt
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub text: String,
    pub markdown: bool,
}

/// A notifier that records every attempt and can be told to fail
#[derive(Clone, Default)]
pub struct MockNotifier {
    verify_calls: Arc<AtomicUsize>,
    fail_verify: Arc<AtomicBool>,
    fail_send: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `verify()` fail (dead channel at startup)
    pub fn with_failing_verify(self) -> Self {
        self.fail_verify.store(true, Ordering::SeqCst);
        self
    }

    /// Make every `send()` fail (attempts are still recorded)
    pub fn with_failing_send(self) -> Self {
        self.fail_send.store(true, Ordering::SeqCst);
        self
    }

    pub fn verify_call_count(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn attempts(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn count_containing(&self, needle: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.text.contains(needle))
            .count()
    }

    pub fn change_attempt_count(&self) -> usize {
        self.count_containing("Image Change Detected")
    }

    pub fn startup_attempt_count(&self) -> usize {
        self.count_containing("started monitoring")
    }

    pub fn shutdown_attempt_count(&self) -> usize {
        self.count_containing("stopped monitoring")
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn verify(&self) -> Result<()> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_verify.load(Ordering::SeqCst) {
            return Err(Error::channel("scripted verification failure"));
        }
        Ok(())
    }

    async fn send(&self, text: &str, markdown: bool) -> Result<()> {
        self.sent.lock().unwrap().push(SentMessage {
            text: text.to_string(),
            markdown,
        });
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(Error::delivery("scripted delivery failure"));
        }
        Ok(())
    }
}

/// A store over an in-memory slot, with failure injection and counters
#[derive(Clone, Default)]
pub struct MockSnapshotStore {
    snapshot: Arc<Mutex<Option<ImageSnapshot>>>,
    load_calls: Arc<AtomicUsize>,
    save_calls: Arc<AtomicUsize>,
    fail_load: Arc<AtomicBool>,
    fail_save: Arc<AtomicBool>,
}

impl MockSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with a baseline snapshot
    pub fn seeded(snapshot: ImageSnapshot) -> Self {
        let store = Self::default();
        *store.snapshot.lock().unwrap() = Some(snapshot);
        store
    }

    pub fn with_failing_load(self) -> Self {
        self.fail_load.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_failing_save(self) -> Self {
        self.fail_save.store(true, Ordering::SeqCst);
        self
    }

    /// The currently stored snapshot, if any
    pub fn stored(&self) -> Option<ImageSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn load_call_count(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    pub fn save_call_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for MockSnapshotStore {
    async fn load(&self) -> Result<Option<ImageSnapshot>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(Error::store("scripted load failure"));
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn save(&self, snapshot: &ImageSnapshot) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(Error::store("scripted save failure"));
        }
        *self.snapshot.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        *self.snapshot.lock().unwrap() = None;
        Ok(())
    }
}
