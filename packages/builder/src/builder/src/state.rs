// Builder Program State
//
// State carried by a builder program across one program generation, and the
// diff engine that transfers cached diagnostics and signatures from the
// previous generation.

use std::rc::Rc;

use compiler_api::{BuildHost, CompilerOptions, Diagnostic, Program, SourceFile};
use indexmap::{IndexMap, IndexSet};

use crate::builder_state::{self, BuilderStateBase, SignatureCache};
use crate::paths::CanonicalPath;

/// The affected-file expansion of a single changed root, while it is being
/// iterated. Cursor, pending signatures and the root travel together so a
/// half-initialized iteration cannot exist.
pub struct AffectedFilesBatch {
    /// The changed root this batch expands.
    pub changed_file_path: CanonicalPath,
    /// Ordered affected files, root first.
    pub files: Vec<(CanonicalPath, Rc<dyn SourceFile>)>,
    /// Cursor into `files`.
    pub index: usize,
    /// Signatures recomputed for this batch; committed to the file store
    /// only when the batch drains.
    pub pending_signatures: SignatureCache,
    /// Whether `files[index]` has been handed to the caller and not yet
    /// committed via done-with.
    pub yielded_current: bool,
}

pub struct BuilderProgramState {
    pub base: BuilderStateBase,
    pub compiler_options: CompilerOptions,
    /// Roots whose affected sets still need expansion. Insertion-ordered so
    /// iteration is deterministic.
    pub changed_files_set: IndexSet<CanonicalPath>,
    pub current_batch: Option<AffectedFilesBatch>,
    /// Files already processed in this state's lifetime; a file affected by
    /// two roots is handed out once.
    pub seen_affected_files: IndexSet<CanonicalPath>,
    /// Per-file semantic diagnostics cache. Absent in bundled-output mode.
    pub semantic_diagnostics_per_file: Option<IndexMap<CanonicalPath, Vec<Diagnostic>>>,
}

impl BuilderProgramState {
    pub fn canonical(&self, file_name: &str) -> CanonicalPath {
        self.base.canonical(file_name)
    }

    /// Whether the emit configuration bundles all inputs into one output. In
    /// that mode the only affected unit is the whole program.
    pub fn bundled(&self) -> bool {
        self.compiler_options.bundled_output().is_some()
    }

    /// The most recently yielded, not yet committed affected file, if any.
    pub fn pending_affected_path(&self) -> Option<&CanonicalPath> {
        self.current_batch
            .as_ref()
            .filter(|batch| batch.yielded_current)
            .and_then(|batch| batch.files.get(batch.index))
            .map(|(path, _)| path)
    }
}

/// Build the state for `program`, transferring whatever survives from
/// `old_state`.
///
/// A file is marked changed when the old state is unusable, the file is new,
/// its version differs, its reference set differs, or one of its reference
/// targets was deleted from the program. Cached diagnostics are copied
/// forward only for files proven unchanged.
pub fn create_builder_program_state(
    program: &dyn Program,
    host: &dyn BuildHost,
    old_state: Option<&BuilderProgramState>,
) -> BuilderProgramState {
    let compiler_options = program.get_compiler_options().clone();
    let bundled = compiler_options.bundled_output().is_some();
    let case_sensitive = host.use_case_sensitive_file_names();

    let base = builder_state::create(program, case_sensitive, old_state.map(|s| &s.base));
    let use_old_state =
        builder_state::can_reuse_old_state(base.referenced_map.is_some(), old_state.map(|s| &s.base));

    let mut state = BuilderProgramState {
        base,
        compiler_options,
        changed_files_set: IndexSet::new(),
        current_batch: None,
        seen_affected_files: IndexSet::new(),
        semantic_diagnostics_per_file: (!bundled).then(IndexMap::new),
    };

    let can_copy_semantic_diagnostics = use_old_state
        && old_state.is_some_and(|old| old.semantic_diagnostics_per_file.is_some())
        && state.semantic_diagnostics_per_file.is_some();

    if use_old_state {
        let old = old_state.expect("reusable old state must be present");
        if can_copy_semantic_diagnostics {
            let old_cache = old
                .semantic_diagnostics_per_file
                .as_ref()
                .expect("diagnostics copy requires an old cache");
            assert!(
                old.changed_files_set.iter().all(|path| !old_cache.contains_key(path)),
                "changed files must not carry cached semantic diagnostics"
            );
        }
        // Roots whose expansion never completed stay pending.
        state.changed_files_set = old.changed_files_set.clone();
    }

    let mut newly_changed: Vec<CanonicalPath> = Vec::new();
    let mut copied_diagnostics: Vec<(CanonicalPath, Vec<Diagnostic>)> = Vec::new();

    for (path, info) in &state.base.file_infos {
        let changed = match old_state.filter(|_| use_old_state) {
            None => true,
            Some(old) => match old.base.file_infos.get(path) {
                None => true,
                Some(old_info) if old_info.version != info.version => true,
                Some(_) => references_changed(&old.base, &state.base, path),
            },
        };

        if changed {
            newly_changed.push(path.clone());
        } else if can_copy_semantic_diagnostics {
            let old_cache = old_state
                .and_then(|old| old.semantic_diagnostics_per_file.as_ref())
                .expect("diagnostics copy requires an old cache");
            if let Some(diagnostics) = old_cache.get(path) {
                copied_diagnostics.push((path.clone(), diagnostics.clone()));
            }
        }
    }

    state.changed_files_set.extend(newly_changed);
    if let Some(cache) = state.semantic_diagnostics_per_file.as_mut() {
        cache.extend(copied_diagnostics);
    }

    state
}

/// A file's references changed when the old and new sets differ in key
/// membership, or when a still-listed target existed in the old program but
/// was deleted from the new one (resolution for it would now fail).
fn references_changed(
    old_base: &BuilderStateBase,
    new_base: &BuilderStateBase,
    path: &CanonicalPath,
) -> bool {
    let new_references = new_base.referenced_map.as_ref().and_then(|m| m.get(path));
    let old_references = old_base.referenced_map.as_ref().and_then(|m| m.get(path));

    if !has_same_keys(new_references, old_references) {
        return true;
    }
    match new_references {
        Some(references) => references.iter().any(|target| {
            !new_base.file_infos.contains_key(target) && old_base.file_infos.contains_key(target)
        }),
        None => false,
    }
}

fn has_same_keys(
    a: Option<&IndexSet<CanonicalPath>>,
    b: Option<&IndexSet<CanonicalPath>>,
) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.len() == b.len() && a.iter().all(|key| b.contains(key)),
        _ => false,
    }
}
