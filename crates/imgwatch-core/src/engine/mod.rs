//! Core watchdog engine
//!
//! The Watchdog is responsible for:
//! - Running one poll cycle per timer tick, strictly one at a time
//! - Comparing snapshots and notifying on change
//! - Persisting the new baseline after every cycle
//! - Graceful, idempotent shutdown
//!
//! ## Cycle Flow
//!
//! ```text
//! ┌──────────────┐      ┌───────────────┐      ┌──────────────┐
//! │ ImageSource  │────▶│   Watchdog     │────▶│  Notifier    │
//! │ (fetch)      │      │ (compare)     │      │ (on change)  │
//! └──────────────┘      └───────────────┘      └──────────────┘
//!                               │
//!                               ▼
//!                       ┌──────────────┐
//!                       │ SnapshotStore│
//!                       │ (load/save)  │
//!                       └──────────────┘
//! ```
//!
//! ## Error Containment
//!
//! Every failure inside a poll cycle is contained to that cycle: the loop
//! logs it and waits for the next tick. Only pre-loop failures (invalid
//! config, unreachable notification channel) escalate out of `run`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::WatchConfig;
use crate::error::Result;
use crate::snapshot::ImageSnapshot;
use crate::traits::{ImageSource, Notifier, SnapshotStore};

/// Capacity of the event channel; events beyond this are dropped with a log
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Best-effort announcement sent once the channel is verified
const STARTUP_MESSAGE: &str = "\u{1F916} imgwatch started monitoring your image!";

/// Best-effort announcement sent by the shutdown sequence
const SHUTDOWN_MESSAGE: &str = "\u{1F6D1} imgwatch stopped monitoring.";

/// Events emitted by the Watchdog for external monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchdogEvent {
    /// Channel verified, monitoring is about to begin
    Started,

    /// The fetched image differs from the stored baseline
    ChangeDetected {
        /// URL the changed image was fetched from
        source_url: String,
    },

    /// A poll cycle ran to completion
    CheckCompleted {
        /// Whether this cycle detected a change
        changed: bool,
    },

    /// A poll cycle was aborted by a fetch or store failure
    CheckFailed {
        /// Rendered error for logging/monitoring
        error: String,
    },

    /// A notification could not be delivered (never fatal)
    NotificationFailed {
        /// Rendered error for logging/monitoring
        error: String,
    },

    /// The shutdown sequence ran
    Stopped,
}

/// Ephemeral result of one poll cycle
///
/// Used only to decide notification and logging; never persisted.
#[derive(Debug)]
pub struct CycleOutcome {
    /// The snapshot taken by this cycle
    pub snapshot: ImageSnapshot,
    /// Whether the snapshot differed from the stored baseline
    pub changed: bool,
    /// Whether a change notification was actually delivered
    pub notified: bool,
}

/// The monitoring engine
///
/// Owns the poll timer and the shutdown sequence, and coordinates the
/// fetcher, notifier, and store.
///
/// ## Lifecycle
///
/// 1. Create with [`Watchdog::new()`]
/// 2. Start with [`Watchdog::run()`] (OS signals) or
///    [`Watchdog::run_with_shutdown()`] (caller-controlled)
/// 3. The engine verifies the notification channel, announces startup, runs
///    one immediate cycle, then one cycle per tick
/// 4. On the first shutdown trigger it finishes the in-flight cycle, sends
///    the shutdown announcement, and returns
///
/// ## Concurrency
///
/// Cycles run sequentially on the caller's task; shutdown triggers are
/// observed between cycles, never preemptively. Persistence is the last
/// step of each cycle, so no partially applied state survives a shutdown.
pub struct Watchdog {
    /// Fetch-and-digest implementation
    source: Box<dyn ImageSource>,

    /// Notification transport
    notifier: Box<dyn Notifier>,

    /// Snapshot persistence
    store: Box<dyn SnapshotStore>,

    /// URL being monitored (for logging and announcements)
    image_url: String,

    /// Interval between poll cycles
    check_interval: Duration,

    /// Set by the first stop(); later calls are no-ops
    stopped: AtomicBool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<WatchdogEvent>,
}

impl Watchdog {
    /// Create a new watchdog
    ///
    /// Validates `config` and returns the engine together with the receiving
    /// end of its event channel.
    pub fn new(
        source: Box<dyn ImageSource>,
        notifier: Box<dyn Notifier>,
        store: Box<dyn SnapshotStore>,
        config: WatchConfig,
    ) -> Result<(Self, mpsc::Receiver<WatchdogEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let watchdog = Self {
            source,
            notifier,
            store,
            image_url: config.image_url,
            check_interval: config.check_interval,
            stopped: AtomicBool::new(false),
            event_tx: tx,
        };

        Ok((watchdog, rx))
    }

    /// Run the engine until an OS termination signal arrives
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine with an optional caller-supplied shutdown trigger
    ///
    /// The oneshot and OS signals are armed simultaneously; whichever fires
    /// first wins, and both paths converge on the same [`stop`](Self::stop)
    /// sequence. Pass `None` to rely on signals alone.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        info!("starting watchdog");
        info!("monitoring image: {}", self.image_url);
        info!("check interval: {:?}", self.check_interval);

        // Fail fast if the channel is dead; monitoring without a working
        // notification path is useless
        self.notifier.verify().await?;
        info!("notification channel verified");
        self.emit_event(WatchdogEvent::Started);

        if let Err(e) = self.notifier.send(STARTUP_MESSAGE, false).await {
            warn!("failed to send startup notification: {}", e);
            self.emit_event(WatchdogEvent::NotificationFailed {
                error: e.to_string(),
            });
        }

        // Initial check, before the timer is armed
        self.check_and_log().await;

        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The interval's immediate first tick is covered by the initial check
        ticker.tick().await;

        // Caller-supplied cancellation; pending forever when not provided
        let external = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(external);

        let signals = Self::termination_signal();
        tokio::pin!(signals);

        let reason = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_and_log().await;
                }
                _ = &mut external => break "shutdown requested by caller",
                signal = &mut signals => break signal,
            }
        };

        info!("{}, shutting down", reason);
        self.stop().await;
        Ok(())
    }

    /// Execute one poll cycle: fetch, compare, notify, persist
    ///
    /// Public so embedders can trigger a cycle outside the timer (the daemon
    /// never does). Errors abort this cycle only and leave stored state
    /// untouched.
    pub async fn run_check(&self) -> Result<CycleOutcome> {
        debug!("checking image for changes");

        let snapshot = self.source.fetch().await?;
        let previous = self.store.load().await?;
        let changed = snapshot.differs_from(previous.as_ref());

        let mut notified = false;
        if changed {
            info!("image change detected");
            self.emit_event(WatchdogEvent::ChangeDetected {
                source_url: snapshot.source_url.clone(),
            });

            match self
                .notifier
                .notify_change(&snapshot.source_url, snapshot.observed_at)
                .await
            {
                Ok(()) => notified = true,
                Err(e) => {
                    warn!("failed to send change notification: {}", e);
                    self.emit_event(WatchdogEvent::NotificationFailed {
                        error: e.to_string(),
                    });
                }
            }

            // The new baseline is persisted regardless of delivery outcome
            self.store.save(&snapshot).await?;
        } else {
            debug!("no changes detected");

            // Re-save so observed_at reflects this check; a failure here
            // loses only the timestamp refresh, not the baseline
            if let Err(e) = self.store.save(&snapshot).await {
                warn!("failed to refresh snapshot timestamp: {}", e);
            }
        }

        self.emit_event(WatchdogEvent::CheckCompleted { changed });
        Ok(CycleOutcome {
            snapshot,
            changed,
            notified,
        })
    }

    /// Run the shutdown sequence
    ///
    /// Idempotent: the first call sends the (best-effort) shutdown
    /// announcement and emits [`WatchdogEvent::Stopped`]; any later call
    /// returns immediately.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("stopping watchdog");
        if let Err(e) = self.notifier.send(SHUTDOWN_MESSAGE, false).await {
            warn!("failed to send shutdown notification: {}", e);
            self.emit_event(WatchdogEvent::NotificationFailed {
                error: e.to_string(),
            });
        }
        self.emit_event(WatchdogEvent::Stopped);
    }

    async fn check_and_log(&self) {
        if let Err(e) = self.run_check().await {
            error!("image check failed: {}", e);
            self.emit_event(WatchdogEvent::CheckFailed {
                error: e.to_string(),
            });
        }
    }

    fn emit_event(&self, event: WatchdogEvent) {
        use tokio::sync::mpsc::error::TrySendError;

        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("event channel full, dropping event");
            }
            // Nobody listening; events are advisory
            Err(TrySendError::Closed(_)) => {}
        }
    }

    #[cfg(unix)]
    async fn termination_signal() -> &'static str {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => "received SIGTERM",
                    _ = sigint.recv() => "received SIGINT",
                }
            }
            _ => {
                warn!("failed to install signal handlers, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
                "received ctrl-c"
            }
        }
    }

    #[cfg(not(unix))]
    async fn termination_signal() -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "received ctrl-c"
    }
}
