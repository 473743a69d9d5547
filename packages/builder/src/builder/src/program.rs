// Builder Program Façade
//
// Two variants over the same state machine: a diagnostics-only builder and
// an emit+diagnostics builder. The variant is a tag; operations specific to
// one variant fail fast on the other.

use std::rc::Rc;

use compiler_api::{
    BuildHost, CancellationToken, CompilerOptions, CustomTransformers, Diagnostic, EmitResult,
    OperationCanceled, Program, SourceFile, WriteFileCallback,
};

use crate::builder_state;

use super::affected::{
    assert_not_pending_affected, done_with_affected_file, get_next_affected_file,
    get_semantic_diagnostics_of_file, Affected,
};
use super::state::{create_builder_program_state, BuilderProgramState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderProgramKind {
    SemanticDiagnostics,
    EmitAndSemanticDiagnostics,
}

/// Diagnostics of one affected unit, tagged with which unit it was.
pub struct AffectedDiagnostics {
    pub result: Vec<Diagnostic>,
    pub affected: Affected,
}

/// Emit outcome of one affected unit, tagged with which unit it was.
pub struct AffectedEmitResult {
    pub result: EmitResult,
    pub affected: Affected,
}

pub struct BuilderProgram {
    pub kind: BuilderProgramKind,
    pub state: BuilderProgramState,
    program: Rc<dyn Program>,
    host: Rc<dyn BuildHost>,
}

/// Create the diagnostics-only builder variant.
pub fn create_semantic_diagnostics_builder_program(
    program: Rc<dyn Program>,
    host: Rc<dyn BuildHost>,
    old_program: Option<BuilderProgram>,
) -> BuilderProgram {
    create_builder_program(BuilderProgramKind::SemanticDiagnostics, program, host, old_program)
}

/// Create the emit+diagnostics builder variant.
pub fn create_emit_and_semantic_diagnostics_builder_program(
    program: Rc<dyn Program>,
    host: Rc<dyn BuildHost>,
    old_program: Option<BuilderProgram>,
) -> BuilderProgram {
    create_builder_program(
        BuilderProgramKind::EmitAndSemanticDiagnostics,
        program,
        host,
        old_program,
    )
}

fn create_builder_program(
    kind: BuilderProgramKind,
    program: Rc<dyn Program>,
    host: Rc<dyn BuildHost>,
    old_program: Option<BuilderProgram>,
) -> BuilderProgram {
    // Take the old state and release the old program handle; only the new
    // builder may keep a program alive from here on.
    let old_state = old_program.map(|old| old.state);
    let state = create_builder_program_state(&*program, &*host, old_state.as_ref());
    drop(old_state);

    BuilderProgram {
        kind,
        state,
        program,
        host,
    }
}

impl BuilderProgram {
    pub fn get_compiler_options(&self) -> &CompilerOptions {
        &self.state.compiler_options
    }

    pub fn get_source_file(&self, file_name: &str) -> Option<Rc<dyn SourceFile>> {
        self.program.get_source_file(file_name)
    }

    pub fn get_source_files(&self) -> Vec<Rc<dyn SourceFile>> {
        self.program.get_source_files()
    }

    pub fn get_options_diagnostics(&self) -> Vec<Diagnostic> {
        self.program.get_options_diagnostics()
    }

    pub fn get_global_diagnostics(&self) -> Vec<Diagnostic> {
        self.program.get_global_diagnostics()
    }

    pub fn get_syntactic_diagnostics(
        &self,
        source_file: Option<&dyn SourceFile>,
    ) -> Vec<Diagnostic> {
        self.program.get_syntactic_diagnostics(source_file)
    }

    pub fn get_current_directory(&self) -> String {
        self.assert_emit_variant("get_current_directory");
        self.program.get_current_directory()
    }

    pub fn get_all_dependencies(&self, source_file: &dyn SourceFile) -> Vec<String> {
        builder_state::get_all_dependencies(&self.state.base, &*self.program, source_file)
    }

    /// Semantic diagnostics for one file, or for the whole program when
    /// `source_file` is `None`.
    ///
    /// The diagnostics-only variant first drains the affected iterator so
    /// the cache reflects the new program. In bundled-output mode the
    /// program is consulted directly and no per-file caching happens.
    pub fn get_semantic_diagnostics(
        &mut self,
        source_file: Option<&dyn SourceFile>,
        cancellation: Option<&dyn CancellationToken>,
    ) -> Result<Vec<Diagnostic>, OperationCanceled> {
        if self.state.bundled() {
            // Single bundled output: no per-file cache to consult.
            return self.program.get_semantic_diagnostics(source_file, cancellation);
        }

        if let Some(sf) = source_file {
            let path = self.state.canonical(sf.file_name());
            assert_not_pending_affected(&self.state, &path);
            return get_semantic_diagnostics_of_file(
                &mut self.state,
                &*self.program,
                sf,
                cancellation,
            );
        }

        if self.kind == BuilderProgramKind::SemanticDiagnostics {
            // Whole-program read on the diagnostics builder: exhaust the
            // affected iteration first so the cache reflects this program.
            while let Some(affected) = get_next_affected_file(
                &mut self.state,
                &*self.program,
                &*self.host,
                cancellation,
            )? {
                done_with_affected_file(&mut self.state, &affected);
            }
        }

        assert!(
            self.state.pending_affected_path().is_none(),
            "an affected file is yielded but uncommitted; finish it before reading program diagnostics"
        );
        let mut diagnostics = Vec::new();
        for sf in self.program.get_source_files() {
            diagnostics.extend(get_semantic_diagnostics_of_file(
                &mut self.state,
                &*self.program,
                &*sf,
                cancellation,
            )?);
        }
        Ok(diagnostics)
    }

    /// Diagnostics-only variant: analyze the next affected unit and return
    /// its diagnostics. Files matched by `ignore_source_file` are committed
    /// without analysis and iteration continues.
    pub fn get_semantic_diagnostics_of_next_affected(
        &mut self,
        cancellation: Option<&dyn CancellationToken>,
        ignore_source_file: Option<&dyn Fn(&dyn SourceFile) -> bool>,
    ) -> Result<Option<AffectedDiagnostics>, OperationCanceled> {
        self.assert_diagnostics_variant("get_semantic_diagnostics_of_next_affected");
        loop {
            let affected = match get_next_affected_file(
                &mut self.state,
                &*self.program,
                &*self.host,
                cancellation,
            )? {
                Some(affected) => affected,
                None => return Ok(None),
            };

            let result = match &affected {
                Affected::WholeProgram => {
                    self.program.get_semantic_diagnostics(None, cancellation)?
                }
                Affected::File(source_file) => {
                    if let Some(ignore) = ignore_source_file {
                        if ignore(&**source_file) {
                            done_with_affected_file(&mut self.state, &affected);
                            continue;
                        }
                    }
                    get_semantic_diagnostics_of_file(
                        &mut self.state,
                        &*self.program,
                        &**source_file,
                        cancellation,
                    )?
                }
            };

            done_with_affected_file(&mut self.state, &affected);
            return Ok(Some(AffectedDiagnostics { result, affected }));
        }
    }

    /// Emit variant: emit the next affected unit.
    pub fn emit_next_affected(
        &mut self,
        write_file: Option<WriteFileCallback>,
        cancellation: Option<&dyn CancellationToken>,
        emit_only_declarations: bool,
        custom_transformers: Option<&CustomTransformers>,
    ) -> Result<Option<AffectedEmitResult>, OperationCanceled> {
        self.assert_emit_variant("emit_next_affected");
        let affected = match get_next_affected_file(
            &mut self.state,
            &*self.program,
            &*self.host,
            cancellation,
        )? {
            Some(affected) => affected,
            None => return Ok(None),
        };

        let writer = write_file.or_else(|| self.host.write_file());
        let target = affected.source_file().cloned();
        let result = self.program.emit(
            target.as_deref(),
            writer.as_ref(),
            cancellation,
            emit_only_declarations,
            custom_transformers,
        )?;

        done_with_affected_file(&mut self.state, &affected);
        Ok(Some(AffectedEmitResult { result, affected }))
    }

    /// Emit `target_source_file`, or everything that needs emitting when
    /// `None`. On the emit variant the no-target form drives the affected
    /// iterator to completion and merges the per-unit results.
    pub fn emit(
        &mut self,
        target_source_file: Option<&dyn SourceFile>,
        write_file: Option<WriteFileCallback>,
        cancellation: Option<&dyn CancellationToken>,
        emit_only_declarations: bool,
        custom_transformers: Option<&CustomTransformers>,
    ) -> Result<EmitResult, OperationCanceled> {
        if let Some(sf) = target_source_file {
            let path = self.state.canonical(sf.file_name());
            assert_not_pending_affected(&self.state, &path);
            let writer = write_file.or_else(|| self.host.write_file());
            return self.program.emit(
                Some(sf),
                writer.as_ref(),
                cancellation,
                emit_only_declarations,
                custom_transformers,
            );
        }

        if self.kind == BuilderProgramKind::EmitAndSemanticDiagnostics {
            let mut combined = EmitResult::default();
            while let Some(affected_result) = self.emit_next_affected(
                write_file.clone(),
                cancellation,
                emit_only_declarations,
                custom_transformers,
            )? {
                let result = affected_result.result;
                combined.emit_skipped |= result.emit_skipped;
                combined.diagnostics.extend(result.diagnostics);
                combined.emitted_files.extend(result.emitted_files);
                combined.source_maps.extend(result.source_maps);
            }
            return Ok(combined);
        }

        let writer = write_file.or_else(|| self.host.write_file());
        self.program.emit(
            None,
            writer.as_ref(),
            cancellation,
            emit_only_declarations,
            custom_transformers,
        )
    }

    fn assert_diagnostics_variant(&self, operation: &str) {
        assert!(
            self.kind == BuilderProgramKind::SemanticDiagnostics,
            "{} requires a semantic diagnostics builder program",
            operation
        );
    }

    fn assert_emit_variant(&self, operation: &str) {
        assert!(
            self.kind == BuilderProgramKind::EmitAndSemanticDiagnostics,
            "{} requires an emit and semantic diagnostics builder program",
            operation
        );
    }
}
