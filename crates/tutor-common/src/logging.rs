//! Subscriber setup for the host binary.
//!
//! Library crates only emit `tracing` events; the binary picks the output
//! shape once at startup.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::CommonError;

/// How events are rendered on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(CommonError::InvalidArgument(format!(
                "unknown log format '{other}' (expected pretty, compact or json)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when neither `filter` nor `RUST_LOG` is set.
    pub level: Level,
    pub format: LogFormat,
    /// Print file and line of each event.
    pub include_location: bool,
    /// Emit span enter/close events.
    pub include_span_events: bool,
    /// Directive string such as `tutor_sw=debug,reqwest=warn`. Overrides `RUST_LOG`.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            include_location: false,
            include_span_events: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Everything at debug, with locations and spans.
    pub fn debug() -> Self {
        Self {
            level: Level::DEBUG,
            include_location: true,
            include_span_events: true,
            ..Self::default()
        }
    }

    /// Info as JSON.
    pub fn production() -> Self {
        Self::default().with_format(LogFormat::Json)
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.filter = Some(directives.into());
        self
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.as_str());
        match &self.filter {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_span_events {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_span_events(self.span_events());

        match self.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Json => layer.json().boxed(),
        }
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: LogConfig) -> crate::Result<()> {
    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(config.env_filter())
        .try_init()
        .map_err(|e| CommonError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let default = LogConfig::default();
        assert_eq!(default.level, Level::INFO);
        assert_eq!(default.format, LogFormat::Pretty);
        assert!(!default.include_location);

        let debug = LogConfig::debug();
        assert_eq!(debug.level, Level::DEBUG);
        assert!(debug.include_span_events);

        assert_eq!(LogConfig::production().format, LogFormat::Json);
    }

    #[test]
    fn test_builders() {
        let config = LogConfig::default()
            .with_format(LogFormat::Compact)
            .with_filter("tutor_sw=trace");
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.filter.as_deref(), Some("tutor_sw=trace"));
        assert_eq!(config.span_events(), FmtSpan::NONE);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("Compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(CommonError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_second_init_fails() {
        let _ = init_logging(LogConfig::default());
        assert!(matches!(
            init_logging(LogConfig::default()),
            Err(CommonError::Logging(_))
        ));
    }
}
