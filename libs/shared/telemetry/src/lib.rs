//! Tracing setup shared by the `capfox` server and CLI binaries.

use std::panic;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output shape. `Compact` is meant for interactive terminals, `Json`
/// for ingestion by a log collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Installs the global tracing subscriber and a panic hook that logs instead
/// of only printing to stderr. Idempotent calls after the first are a no-op
/// (the underlying `tracing_subscriber::registry().init()` would otherwise
/// panic on a second global subscriber; callers should only call this once
/// per process, which is what `main` does).
pub fn init_tracing(service_name: &str, level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{service_name}={level},tower_http=warn")));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().flatten_event(true))
                .init();
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_target(false))
                .init();
        }
    }

    install_panic_hook(service_name);
}

/// Lets a SIGHUP handler widen or narrow the log level without tearing down
/// the process's one-time global subscriber. The output format (compact vs
/// json) is fixed at startup; the filter layer is the only reloadable piece.
#[derive(Clone)]
pub struct ReloadHandle {
    handle: reload::Handle<EnvFilter, tracing_subscriber::Registry>,
    service_name: String,
}

impl ReloadHandle {
    pub fn set_level(&self, level: &str) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{}={level},tower_http=warn", self.service_name)));
        if let Err(err) = self.handle.reload(filter) {
            error!(error = %err, "failed to reload log filter");
        }
    }
}

/// Same as [`init_tracing`] but returns a [`ReloadHandle`] so a caller (the
/// server's SIGHUP handler) can change the log level at runtime.
pub fn init_tracing_reloadable(service_name: &str, level: &str, format: LogFormat) -> ReloadHandle {
    let initial = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{service_name}={level},tower_http=warn")));
    let (filter, handle) = reload::Layer::new(initial);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().flatten_event(true))
                .init();
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_target(false))
                .init();
        }
    }

    install_panic_hook(service_name);
    ReloadHandle { handle, service_name: service_name.to_string() }
}

fn install_panic_hook(service_name: &str) {
    let service = service_name.to_string();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("no panic message");
        error!(target: "panic", service = %service, location = %location, "{payload}");
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_format() {
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
