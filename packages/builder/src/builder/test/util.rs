use compiler_api::{BuildHost, CompilerOptions, ModuleKind, Program, SourceFile};

use crate::builder::src::affected::{done_with_affected_file, get_next_affected_file, Affected};
use crate::builder::src::state::{create_builder_program_state, BuilderProgramState};
use crate::paths::{to_canonical_path, CanonicalPath};
use crate::testing::MockBuildHost;

pub fn module_options() -> CompilerOptions {
    CompilerOptions {
        module: Some(ModuleKind::ES2015),
        ..CompilerOptions::default()
    }
}

pub fn bundled_options() -> CompilerOptions {
    CompilerOptions {
        module: Some(ModuleKind::ES2015),
        out_file: Some("/bundle.js".to_string()),
        ..CompilerOptions::default()
    }
}

pub fn host() -> MockBuildHost {
    MockBuildHost::new(true)
}

pub fn canonical(name: &str) -> CanonicalPath {
    to_canonical_path(&format!("/{}.ts", name), true)
}

pub fn affected_name(affected: &Affected) -> String {
    match affected {
        Affected::File(source_file) => source_file.file_name().to_string(),
        Affected::WholeProgram => "<whole program>".to_string(),
    }
}

/// Run the affected protocol to completion, returning the yielded names.
pub fn drain_affected(
    state: &mut BuilderProgramState,
    program: &dyn Program,
    host: &dyn BuildHost,
) -> Vec<String> {
    let mut names = Vec::new();
    while let Some(affected) = get_next_affected_file(state, program, host, None).unwrap() {
        names.push(affected_name(&affected));
        done_with_affected_file(state, &affected);
    }
    names
}

/// A fully iterated state for `program`, as a completed build leaves it.
pub fn drained_state(
    program: &dyn Program,
    host: &dyn BuildHost,
    old: Option<&BuilderProgramState>,
) -> BuilderProgramState {
    let mut state = create_builder_program_state(program, host, old);
    drain_affected(&mut state, program, host);
    state
}
