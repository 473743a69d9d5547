use super::src::logger::{LogLevel, Logger, NullLogger};

#[test]
fn test_levels_are_ordered() {
    assert!(LogLevel::Debug < LogLevel::Info);
    assert!(LogLevel::Info < LogLevel::Warn);
    assert!(LogLevel::Warn < LogLevel::Error);
}

#[test]
fn test_null_logger_only_enables_errors() {
    let logger = NullLogger::new();
    assert!(!logger.enabled(LogLevel::Debug));
    assert!(!logger.enabled(LogLevel::Warn));
    assert!(logger.enabled(LogLevel::Error));
}
