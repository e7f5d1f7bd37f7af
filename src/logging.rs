//! Structured logging set-up.

use tracing_subscriber::{EnvFilter, fmt};

/// Set to `1` to emit JSON log lines.
pub const LOG_JSON_VAR: &str = "WEBQA_LOG_JSON";

/// Maps `-v` occurrences to a default filter directive.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Installs a stderr subscriber.
///
/// `RUST_LOG` overrides the verbosity-derived default. Calling this twice is
/// harmless; the second call leaves the first subscriber in place.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = if std::env::var(LOG_JSON_VAR).ok().as_deref() == Some("1") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    // Already initialised (tests, repeated calls).
    let _ = result;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "info");
        assert_eq!(default_directive(2), "debug");
        assert_eq!(default_directive(9), "debug");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(0);
        init(2);
    }
}
