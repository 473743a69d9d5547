// Console Logger

use super::logger::{LogLevel, Logger};

/// Logger writing informational output to stdout and problems to stderr.
pub struct ConsoleLogger {
    level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

impl Logger for ConsoleLogger {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn debug(&self, msg: &str) {
        if self.enabled(LogLevel::Debug) {
            println!("[debug] {}", msg);
        }
    }

    fn info(&self, msg: &str) {
        if self.enabled(LogLevel::Info) {
            println!("{}", msg);
        }
    }

    fn warn(&self, msg: &str) {
        if self.enabled(LogLevel::Warn) {
            eprintln!("[warn] {}", msg);
        }
    }

    fn error(&self, msg: &str) {
        if self.enabled(LogLevel::Error) {
            eprintln!("[error] {}", msg);
        }
    }
}
