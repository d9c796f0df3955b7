//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! LOG_LEVEL takes filter directives ("debug", "quiz=trace,info", ...); an
//! unset or unparseable value falls back to `DEFAULT_DIRECTIVES`.
//! LOG_FORMAT picks the output: "pretty" (default), "compact" or "json".
//!
//! Targets: `quiz` for session and answer events, `chinese_quiz` for the
//! server, word store and gateway.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVES: &str = "info,quiz=debug,chinese_quiz=debug,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            Some("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Filter directives and output format read through `lookup`.
pub fn log_settings<F: Fn(&str) -> Option<String>>(lookup: F) -> (String, LogFormat) {
    let directives = lookup("LOG_LEVEL")
        .filter(|d| !d.trim().is_empty() && EnvFilter::try_new(d).is_ok())
        .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_string());
    (directives, LogFormat::parse(lookup("LOG_FORMAT").as_deref()))
}

pub fn init_tracing() {
    let (directives, format) = log_settings(|key| std::env::var(key).ok());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let (directives, format) = log_settings(|_| None);
        assert_eq!(directives, DEFAULT_DIRECTIVES);
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn reads_level_and_format() {
        let (directives, format) = log_settings(|key| match key {
            "LOG_LEVEL" => Some("quiz=trace,warn".into()),
            "LOG_FORMAT" => Some(" JSON ".into()),
            _ => None,
        });
        assert_eq!(directives, "quiz=trace,warn");
        assert_eq!(format, LogFormat::Json);
    }

    #[test]
    fn bad_directives_fall_back() {
        let (directives, format) = log_settings(|key| match key {
            "LOG_LEVEL" => Some("quiz=loud".into()),
            "LOG_FORMAT" => Some("compact".into()),
            _ => None,
        });
        assert_eq!(directives, DEFAULT_DIRECTIVES);
        assert_eq!(format, LogFormat::Compact);
    }
}
