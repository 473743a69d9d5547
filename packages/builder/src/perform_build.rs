//! Perform Build
//!
//! One-shot incremental build entry point: constructs the emit builder from
//! the previous build's state, collects diagnostics in stages, emits, and
//! hands the builder back so the caller can seed the next rebuild with it.

use std::rc::Rc;

use compiler_api::{
    BuildHost, CancellationToken, Diagnostic, EmitResult, OperationCanceled, Program,
};

use crate::builder::{
    create_emit_and_semantic_diagnostics_builder_program, done_with_affected_file,
    get_next_affected_file, BuilderProgram,
};
use crate::logging::Logger;

/// Outcome of one incremental build pass.
pub struct BuildResult {
    /// Options, global, syntactic, semantic and emit diagnostics, in that
    /// order.
    pub diagnostics: Vec<Diagnostic>,
    /// `None` when emit was withheld (`noEmit`, or `noEmitOnError` with
    /// errors present).
    pub emit_result: Option<EmitResult>,
    /// The builder carrying state for the next rebuild.
    pub builder: BuilderProgram,
}

pub fn perform_incremental_build(
    program: Rc<dyn Program>,
    host: Rc<dyn BuildHost>,
    old_program: Option<BuilderProgram>,
    logger: &dyn Logger,
    cancellation: Option<&dyn CancellationToken>,
) -> Result<BuildResult, OperationCanceled> {
    let mut builder = create_emit_and_semantic_diagnostics_builder_program(
        program.clone(),
        host.clone(),
        old_program,
    );
    logger.debug(&format!(
        "{} of {} files queued for re-analysis",
        builder.state.changed_files_set.len(),
        builder.state.base.file_infos.len()
    ));

    let mut diagnostics = builder.get_options_diagnostics();
    diagnostics.extend(builder.get_global_diagnostics());
    diagnostics.extend(builder.get_syntactic_diagnostics(None));
    diagnostics.extend(builder.get_semantic_diagnostics(None, cancellation)?);

    let options = builder.get_compiler_options().clone();
    let has_errors = diagnostics.iter().any(|d| d.is_error());
    let withhold_emit = options.no_emit == Some(true)
        || (has_errors && options.no_emit_on_error == Some(true));

    let emit_result = if withhold_emit {
        if options.no_emit == Some(true) {
            logger.debug("emit disabled by options");
        } else {
            logger.warn("skipping emit: build has errors");
        }
        // Analysis is complete; commit the remaining affected iteration so
        // the returned builder can seed the next rebuild.
        while let Some(affected) =
            get_next_affected_file(&mut builder.state, &*program, &*host, cancellation)?
        {
            done_with_affected_file(&mut builder.state, &affected);
        }
        None
    } else {
        let emit_only_declarations = options.emit_declaration_only == Some(true);
        let result = builder.emit(None, None, cancellation, emit_only_declarations, None)?;
        if result.emit_skipped {
            logger.info("emit skipped");
        } else {
            logger.info(&format!("emitted {} file(s)", result.emitted_files.len()));
        }
        Some(result)
    };

    if let Some(result) = &emit_result {
        diagnostics.extend(result.diagnostics.clone());
    }

    Ok(BuildResult {
        diagnostics,
        emit_result,
        builder,
    })
}

/// Render diagnostics one per line for terminal output.
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();
    for diagnostic in diagnostics {
        match (&diagnostic.file, diagnostic.start) {
            (Some(file), Some(start)) => output.push_str(&format!(
                "{} {}: {} ({}:{})\n",
                diagnostic.category, diagnostic.code, diagnostic.message, file, start
            )),
            (Some(file), None) => output.push_str(&format!(
                "{} {}: {} ({})\n",
                diagnostic.category, diagnostic.code, diagnostic.message, file
            )),
            _ => output.push_str(&format!(
                "{} {}: {}\n",
                diagnostic.category, diagnostic.code, diagnostic.message
            )),
        }
    }
    output
}

/// Exit code for a finished build: 1 when any error diagnostic is present.
pub fn exit_code_from_result(diagnostics: &[Diagnostic]) -> i32 {
    if diagnostics.iter().any(|d| d.is_error()) {
        1
    } else {
        0
    }
}
