pub mod src {
    pub mod console_logger;
    pub mod logger;
}

pub use src::console_logger::ConsoleLogger;
pub use src::logger::{LogLevel, Logger, NullLogger};

#[cfg(test)]
mod test;
