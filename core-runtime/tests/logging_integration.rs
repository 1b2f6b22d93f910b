//! Integration tests for logging system

use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};

// A process can install one global subscriber, so both outcomes are
// exercised in the same test.
#[test]
fn test_init_logging_once_per_process() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_spans(false);

    assert!(init_logging(config.clone()).is_ok());
    tracing::info!(target: "core_sync", documents = 3, "view refreshed");

    let second = init_logging(config);
    assert!(second.is_err());
}
