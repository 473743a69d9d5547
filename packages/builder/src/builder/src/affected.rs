// Affected-file iteration
//
// Two-phase protocol: `get_next_affected_file` yields work without mutating
// anything beyond evicting the yielded file's cached diagnostics;
// `done_with_affected_file` commits it. Cancellation between the two leaves
// the state ready to re-yield the same item.

use std::rc::Rc;

use compiler_api::{
    BuildHost, CancellationToken, Diagnostic, OperationCanceled, Program, SourceFile,
};

use crate::builder_state::{self, SignatureCache};
use crate::paths::CanonicalPath;

use super::state::{AffectedFilesBatch, BuilderProgramState};

/// The unit of work handed out by the iterator: a single source file, or the
/// whole program when the emit configuration bundles output.
#[derive(Clone)]
pub enum Affected {
    File(Rc<dyn SourceFile>),
    WholeProgram,
}

impl Affected {
    pub fn source_file(&self) -> Option<&Rc<dyn SourceFile>> {
        match self {
            Affected::File(source_file) => Some(source_file),
            Affected::WholeProgram => None,
        }
    }
}

/// Yield the next file (or whole-program unit) requiring work, or `None`
/// when nothing is pending. The same item is re-yielded until the caller
/// confirms it through `done_with_affected_file`.
pub fn get_next_affected_file(
    state: &mut BuilderProgramState,
    program: &dyn Program,
    host: &dyn BuildHost,
    cancellation: Option<&dyn CancellationToken>,
) -> Result<Option<Affected>, OperationCanceled> {
    loop {
        if state.current_batch.is_some() {
            if let Some(affected) = next_in_current_batch(state) {
                return Ok(Some(affected));
            }
            // Batch drained: the root is done and its recomputed signatures
            // become the committed ones.
            let mut batch = state.current_batch.take().expect("batch presence checked above");
            state.changed_files_set.shift_remove(&batch.changed_file_path);
            builder_state::update_signatures_from_cache(&mut state.base, &mut batch.pending_signatures);
        }

        let next_changed = match state.changed_files_set.first() {
            Some(path) => path.clone(),
            None => return Ok(None),
        };

        if state.bundled() {
            // Single bundled output: no per-file batches, the program is the
            // affected unit. done-with clears the changed set.
            return Ok(Some(Affected::WholeProgram));
        }

        let mut pending_signatures = SignatureCache::new();
        let compute_hash = |data: &str| host.create_hash(data);
        let affected_files = builder_state::get_files_affected_by(
            &state.base,
            program,
            &next_changed,
            cancellation,
            &compute_hash,
            &mut pending_signatures,
        )?;

        let files = affected_files
            .into_iter()
            .map(|source_file| (state.canonical(source_file.file_name()), source_file))
            .collect();
        if let Some(cache) = state.semantic_diagnostics_per_file.as_mut() {
            cache.shift_remove(&next_changed);
        }
        state.current_batch = Some(AffectedFilesBatch {
            changed_file_path: next_changed,
            files,
            index: 0,
            pending_signatures,
            yielded_current: false,
        });
    }
}

fn next_in_current_batch(state: &mut BuilderProgramState) -> Option<Affected> {
    let BuilderProgramState {
        current_batch,
        seen_affected_files,
        semantic_diagnostics_per_file,
        ..
    } = state;
    let batch = current_batch.as_mut()?;

    while batch.index < batch.files.len() {
        let (path, source_file) = &batch.files[batch.index];
        if !seen_affected_files.contains(path) {
            // Evict before handing out so a cancelled operation cannot leave
            // a stale cache entry behind.
            if let Some(cache) = semantic_diagnostics_per_file.as_mut() {
                cache.shift_remove(path);
            }
            batch.yielded_current = true;
            return Some(Affected::File(source_file.clone()));
        }
        batch.index += 1;
    }
    None
}

/// Commit the most recently yielded item.
pub fn done_with_affected_file(state: &mut BuilderProgramState, affected: &Affected) {
    match affected {
        Affected::WholeProgram => {
            state.changed_files_set.clear();
        }
        Affected::File(source_file) => {
            let path = state.canonical(source_file.file_name());
            state.seen_affected_files.insert(path);
            if let Some(batch) = state.current_batch.as_mut() {
                batch.index += 1;
                batch.yielded_current = false;
            }
        }
    }
}

/// Cached read of one file's semantic diagnostics; on a miss the program is
/// queried and the result stored.
pub fn get_semantic_diagnostics_of_file(
    state: &mut BuilderProgramState,
    program: &dyn Program,
    source_file: &dyn SourceFile,
    cancellation: Option<&dyn CancellationToken>,
) -> Result<Vec<Diagnostic>, OperationCanceled> {
    let path = state.canonical(source_file.file_name());
    if let Some(cache) = state.semantic_diagnostics_per_file.as_ref() {
        if let Some(cached) = cache.get(&path) {
            return Ok(cached.clone());
        }
    }

    let diagnostics = program.get_semantic_diagnostics(Some(source_file), cancellation)?;
    if let Some(cache) = state.semantic_diagnostics_per_file.as_mut() {
        cache.insert(path, diagnostics.clone());
    }
    Ok(diagnostics)
}

/// Fail fast when `path` is the yielded-but-uncommitted affected file: a
/// result cached for it now would outlive a cancellation.
pub fn assert_not_pending_affected(state: &BuilderProgramState, path: &CanonicalPath) {
    if let Some(pending) = state.pending_affected_path() {
        assert!(
            pending != path,
            "{} is the currently yielded affected file; commit it before addressing it directly",
            path
        );
    }
}
