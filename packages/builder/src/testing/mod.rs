pub mod src {
    pub mod mock_host;
    pub mod mock_program;
}

pub use src::mock_host::{CountdownCancellationToken, MockBuildHost, TriggeredCancellationToken};
pub use src::mock_program::{MockProgram, MockSourceFile};
