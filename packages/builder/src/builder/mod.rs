pub mod src {
    pub mod affected;
    pub mod program;
    pub mod state;
}

pub use src::affected::{
    done_with_affected_file, get_next_affected_file, get_semantic_diagnostics_of_file, Affected,
};
pub use src::program::{
    create_emit_and_semantic_diagnostics_builder_program,
    create_semantic_diagnostics_builder_program, AffectedDiagnostics, AffectedEmitResult,
    BuilderProgram, BuilderProgramKind,
};
pub use src::state::{create_builder_program_state, AffectedFilesBatch, BuilderProgramState};
