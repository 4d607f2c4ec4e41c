// # Notifier Trait
//
// Defines the interface for the outbound notification channel.
//
// ## Implementations
//
// - Telegram: `imgwatch-notify-telegram` crate
//
// ## Delivery Semantics
//
// Delivery is best-effort. A `Delivery` error is logged by the caller and
// never aborts the monitoring loop. Only `verify()` failures are fatal, and
// only because they are checked once at startup before the loop exists.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Trait for notification transport implementations
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Check that the channel is reachable and the credentials are valid
    ///
    /// Called once at startup so a misconfigured channel fails fast instead
    /// of silently dropping every notification.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the channel accepted the probe
    /// - `Err(Error::Channel)`: credentials rejected or backend unreachable
    async fn verify(&self) -> Result<()>;

    /// Deliver a message
    ///
    /// # Parameters
    ///
    /// - `text`: the message body
    /// - `markdown`: whether the body uses Markdown formatting
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the backend accepted the message
    /// - `Err(Error::Delivery)`: transport or backend rejection
    async fn send(&self, text: &str, markdown: bool) -> Result<()>;

    /// Deliver a formatted change alert
    ///
    /// Formatting convenience over [`send`](Notifier::send); transports only
    /// need to implement raw delivery.
    async fn notify_change(&self, source_url: &str, observed_at: DateTime<Utc>) -> Result<()> {
        let text = format!(
            "\u{1F504} *Image Change Detected*\n\n\
             \u{1F4F8} URL: {}\n\
             \u{23F0} Time: {}\n\
             \u{1F916} Watchdog is monitoring your image!",
            source_url,
            observed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );
        self.send(&text, true).await
    }
}
