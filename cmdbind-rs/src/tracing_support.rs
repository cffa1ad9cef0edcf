//! Subscriber initialisation for programs built on the framework.
//!
//! The framework itself only emits `tracing` events (command registration,
//! resolution summaries, per-binding detail). Binaries decide whether and how
//! to print them. Log lines always go to stderr so they never mix with
//! command output on stdout.

#[cfg(feature = "tracing")]
pub use tracing::{self, debug, error, info, instrument, trace, warn};

#[cfg(feature = "tracing")]
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Log line format.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line, human-readable.
    Pretty,

    /// One line per event.
    Compact,

    /// Newline-delimited JSON.
    Json,
}

#[cfg(feature = "tracing")]
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Fixed level. `None` reads `RUST_LOG`, falling back to `info`.
    pub level: Option<tracing::Level>,

    pub format: TracingFormat,

    pub timestamps: bool,

    /// Include the module path of each event.
    pub target: bool,

    pub thread_ids: bool,
}

#[cfg(feature = "tracing")]
impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: TracingFormat::Compact,
            timestamps: false,
            target: true,
            thread_ids: false,
        }
    }
}

#[cfg(feature = "tracing")]
impl TracingConfig {
    /// Map a repeated `-v` count to a level: 0 keeps `RUST_LOG`, 1 is
    /// `debug`, 2 or more is `trace`.
    pub fn from_verbosity(count: usize) -> Self {
        let level = match count {
            0 => None,
            1 => Some(tracing::Level::DEBUG),
            _ => Some(tracing::Level::TRACE),
        };
        Self {
            level,
            ..Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        match self.level {
            Some(level) => EnvFilter::new(level.to_string()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        }
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(self.target)
            .with_thread_ids(self.thread_ids);

        match (self.format, self.timestamps) {
            (TracingFormat::Pretty, true) => base.pretty().boxed(),
            (TracingFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (TracingFormat::Compact, true) => base.compact().boxed(),
            (TracingFormat::Compact, false) => base.compact().without_time().boxed(),
            (TracingFormat::Json, true) => base.json().boxed(),
            (TracingFormat::Json, false) => base.json().without_time().boxed(),
        }
    }
}

/// Install a compact stderr subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set.
///
/// # Example
///
/// ```ignore
/// fn main() {
///     cmdbind::init_subscriber();
///     // RUST_LOG=cmdbind=trace shows every resolved token
/// }
/// ```
#[cfg(feature = "tracing")]
pub fn init_subscriber() {
    init_subscriber_with_config(TracingConfig::default());
}

/// Install a subscriber built from `config`.
///
/// Does nothing if a global subscriber is already set.
#[cfg(feature = "tracing")]
pub fn init_subscriber_with_config(config: TracingConfig) {
    let layer = config.layer().with_filter(config.filter());
    // Err only means another subscriber won the race; keep that one.
    let _ = tracing_subscriber::registry().with(layer).try_init();
}

#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() {}
