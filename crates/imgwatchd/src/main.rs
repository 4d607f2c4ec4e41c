// # imgwatchd - Image Watchdog Daemon
//
// Thin integration layer over imgwatch-core. The daemon is responsible for:
// 1. Reading configuration (optional YAML file + environment overrides)
// 2. Initializing tracing and the tokio runtime
// 3. Wiring the HTTP fetcher, Telegram notifier, and file store into the
//    engine
// 4. Running the engine until a termination signal arrives
//
// All monitoring logic lives in imgwatch-core.
//
// ## Configuration
//
// ```bash
// imgwatchd --config /etc/imgwatch/config.yaml
// ```
//
// Or environment only:
//
// ```bash
// export IMAGE_URL=https://example.com/image.png
// export TELEGRAM_BOT_TOKEN=123456:token
// export TELEGRAM_CHAT_ID=42
// export CHECK_INTERVAL=5m
// export STORAGE_PATH=/var/lib/imgwatch
//
// imgwatchd
// ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use imgwatch_core::{Error, FileSnapshotStore, WatchConfig, Watchdog};
use imgwatch_fetch_http::HttpImageSource;
use imgwatch_notify_telegram::TelegramNotifier;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum WatchdogExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WatchdogExitCode> for ExitCode {
    fn from(code: WatchdogExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Command-line arguments
struct CliArgs {
    config_path: Option<PathBuf>,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut config_path = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("{} requires a path", arg))?;
                    config_path = Some(PathBuf::from(value));
                }
                other => anyhow::bail!(
                    "unknown argument '{}' (usage: imgwatchd [--config <path>])",
                    other
                ),
            }
        }

        Ok(Self { config_path })
    }
}

fn main() -> ExitCode {
    let args = match CliArgs::parse(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument error: {}", e);
            return WatchdogExitCode::ConfigError.into();
        }
    };

    // Load configuration (file, then env overrides)
    let config = match WatchConfig::load(args.config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return WatchdogExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return WatchdogExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WatchdogExitCode::ConfigError.into();
    }

    info!("starting imgwatchd");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {}", e);
            return WatchdogExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => {
                info!("imgwatchd stopped cleanly");
                WatchdogExitCode::CleanShutdown
            }
            Err(e @ (Error::Config(_) | Error::Channel(_))) => {
                error!("startup failed: {}", e);
                WatchdogExitCode::ConfigError
            }
            Err(e) => {
                error!("watchdog failed: {}", e);
                WatchdogExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// Wire the components together and run the engine until shutdown
async fn run_daemon(config: WatchConfig) -> imgwatch_core::Result<()> {
    let source = HttpImageSource::new(&config.image_url);
    let notifier = TelegramNotifier::new(&config.telegram_bot_token, config.telegram_chat_id);
    let store = FileSnapshotStore::new(&config.storage_path);

    let (watchdog, mut events) = Watchdog::new(
        Box::new(source),
        Box::new(notifier),
        Box::new(store),
        config,
    )?;

    // Surface engine events in the logs
    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("engine event: {:?}", event);
        }
    });

    let result = watchdog.run().await;
    event_task.abort();
    result
}
