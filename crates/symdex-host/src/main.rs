//! symdex host binary: keeps the index store open for the lifetime of the
//! process.
//!
//! Loads configuration, initializes structured logging, opens the index and
//! disposes it on SIGTERM/SIGINT.

use std::path::PathBuf;
use symdex_host::config::{self, LoggingConfig};
use symdex_host::{build_index, startup_report};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "symdex.toml";

/// Where the config file path came from.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    Argument,
    Environment,
    Default,
}

impl ConfigSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Argument => "argument",
            Self::Environment => "SYMDEX_CONFIG_PATH",
            Self::Default => "default",
        }
    }
}

/// First non-blank of: CLI argument, `SYMDEX_CONFIG_PATH`, `symdex.toml`.
fn config_path() -> (PathBuf, ConfigSource) {
    let non_blank = |value: String| (!value.trim().is_empty()).then(|| PathBuf::from(value));

    std::env::args()
        .nth(1)
        .and_then(non_blank)
        .map(|path| (path, ConfigSource::Argument))
        .or_else(|| {
            std::env::var("SYMDEX_CONFIG_PATH")
                .ok()
                .and_then(non_blank)
                .map(|path| (path, ConfigSource::Environment))
        })
        .unwrap_or_else(|| (PathBuf::from(DEFAULT_CONFIG_FILE), ConfigSource::Default))
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|e| {
        eprintln!("invalid log filter {:?} ({e}), using \"info\"", logging.level);
        EnvFilter::new("info")
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let (config_path, source) = config_path();
    let config = config::load_config(Some(config_path.as_path()))
        .expect("failed to load configuration");

    init_tracing(&config.logging);
    tracing::info!(
        source = source.as_str(),
        path = %config_path.display(),
        "loaded configuration"
    );

    let index = build_index(&config);

    // Opening touches the file system and may rebuild the database.
    match tokio::task::block_in_place(|| startup_report(&index)) {
        Some(report) => match serde_json::to_string(&report) {
            Ok(json) => tracing::info!(report = %json, "index store ready"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize startup report"),
        },
        None => tracing::warn!(
            state_dir = %index.state_dir().display(),
            "index store unavailable, continuing without it"
        ),
    }

    let signal = wait_for_stop().await;
    tracing::info!(signal, "stopping");

    index.shutdown();
    tracing::info!("symdex host shut down");
}

/// Resolves with the name of the first stop signal received.
#[cfg(unix)]
async fn wait_for_stop() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.expect("failed to install SIGINT handler");
            "SIGINT"
        }
        _ = term.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_stop() -> &'static str {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    "ctrl-c"
}
