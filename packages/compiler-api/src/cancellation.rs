use std::fmt;

/// Raised through `Result` when a cancellation token trips during a program
/// query. The builder leaves its state consistent when this propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationCanceled;

impl fmt::Display for OperationCanceled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation was canceled")
    }
}

impl std::error::Error for OperationCanceled {}

/// Cooperative cancellation. Long-running program queries poll the token and
/// bail out with `OperationCanceled` when it trips.
pub trait CancellationToken {
    fn is_cancellation_requested(&self) -> bool;

    fn throw_if_cancellation_requested(&self) -> Result<(), OperationCanceled> {
        if self.is_cancellation_requested() {
            Err(OperationCanceled)
        } else {
            Ok(())
        }
    }
}

/// Token that never trips.
pub struct NullCancellationToken;

impl CancellationToken for NullCancellationToken {
    fn is_cancellation_requested(&self) -> bool {
        false
    }
}
