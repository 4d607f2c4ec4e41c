// # Telegram Notifier
//
// This crate provides the Telegram notification transport for imgwatch.
//
// ## Responsibilities
//
// - One HTTP request per call (no retries, no queueing - delivery is
//   best-effort and the engine logs failures)
// - `verify()` probes `getMe` so bad credentials fail at startup
// - `send()` posts to `sendMessage` with an optional Markdown parse mode
//
// ## Security
//
// The bot token is part of every request URL and MUST NOT appear in logs.
// The `Debug` implementation redacts it.
//
// ## API Reference
//
// - Telegram Bot API: https://core.telegram.org/bots/api
// - `GET  /bot<token>/getMe`
// - `POST /bot<token>/sendMessage` `{"chat_id", "text", "parse_mode"?}`

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use imgwatch_core::traits::Notifier;
use imgwatch_core::{Error, Result};

/// Telegram Bot API base URL
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Telegram notification transport
pub struct TelegramNotifier {
    /// Bot token
    /// ⚠️ NEVER log this value
    bot_token: String,

    /// Chat the notifications go to
    chat_id: i64,

    /// API base URL, injectable for tests
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the bot token
impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("bot_token", &"<REDACTED>")
            .field("chat_id", &self.chat_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Body of a `sendMessage` call
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

/// The parts of a Bot API response the notifier cares about
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl ApiResponse {
    fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("no description")
    }
}

impl TelegramNotifier {
    /// Create a new notifier for the given bot and chat
    pub fn new(bot_token: impl Into<String>, chat_id: i64) -> Self {
        Self::with_base_url(bot_token, chat_id, TELEGRAM_API_BASE)
    }

    /// Create a notifier against a non-default API endpoint (for tests)
    pub fn with_base_url(
        bot_token: impl Into<String>,
        chat_id: i64,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id,
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.bot_token, method)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// Probe `getMe` to confirm the token is valid and the API reachable
    async fn verify(&self) -> Result<()> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| Error::channel(format!("failed to reach Telegram: {}", e)))?;

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::channel(format!("failed to decode Telegram response: {}", e)))?;

        if !body.ok {
            return Err(Error::channel(format!(
                "Telegram rejected the bot token: {}",
                body.description()
            )));
        }

        tracing::debug!("Telegram getMe probe succeeded");
        Ok(())
    }

    async fn send(&self, text: &str, markdown: bool) -> Result<()> {
        let payload = SendMessageRequest {
            chat_id: self.chat_id,
            text,
            parse_mode: markdown.then_some("Markdown"),
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::delivery(format!("failed to send request: {}", e)))?;

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::delivery(format!("failed to decode Telegram response: {}", e)))?;

        if !body.ok {
            return Err(Error::delivery(format!(
                "Telegram API error: {}",
                body.description()
            )));
        }

        tracing::debug!("message delivered to chat {}", self.chat_id);
        Ok(())
    }
}
