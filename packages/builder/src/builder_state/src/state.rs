// Builder State
//
// Owns the per-file version/signature store and the reference graph snapshot
// for one program generation, and computes the transitive affected set of a
// changed file.

use std::rc::Rc;

use compiler_api::{CancellationToken, OperationCanceled, Program, SourceFile};
use indexmap::{IndexMap, IndexSet};

use crate::paths::{to_canonical_path, CanonicalPath};

/// Pending signature updates, keyed by canonical path. Flushed into
/// `BuilderStateBase::file_infos` only through `update_signatures_from_cache`.
pub type SignatureCache = IndexMap<CanonicalPath, String>;

/// Version and shape signature for a single program file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Opaque content identity taken from the source file.
    pub version: String,
    /// Hash of the file's externally visible declarations. `None` until the
    /// file has been analyzed in this or an ancestor state.
    pub signature: Option<String>,
}

/// Snapshot of file identities and the reference graph for one program.
#[derive(Debug, Clone)]
pub struct BuilderStateBase {
    pub case_sensitive: bool,
    /// One entry per source file of the program.
    pub file_infos: IndexMap<CanonicalPath, FileInfo>,
    /// Forward references: file -> files it directly references. Absent when
    /// the compiler options do not track module references; only non-empty
    /// sets are stored.
    pub referenced_map: Option<IndexMap<CanonicalPath, IndexSet<CanonicalPath>>>,
    /// Reverse of `referenced_map`, derived at construction.
    pub referenced_by_map: Option<IndexMap<CanonicalPath, IndexSet<CanonicalPath>>>,
}

impl BuilderStateBase {
    pub fn canonical(&self, file_name: &str) -> CanonicalPath {
        to_canonical_path(file_name, self.case_sensitive)
    }

    fn referenced_by(&self, path: &CanonicalPath) -> Vec<CanonicalPath> {
        self.referenced_by_map
            .as_ref()
            .and_then(|m| m.get(path))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// An old state is transferable only when it exists and agrees with the new
/// program on whether a reference graph is tracked.
pub fn can_reuse_old_state(new_tracks_references: bool, old: Option<&BuilderStateBase>) -> bool {
    match old {
        Some(old) => old.referenced_map.is_some() == new_tracks_references,
        None => false,
    }
}

/// Build the state for a new program, carrying shape signatures forward from
/// `old` when it is reusable. Versions always come from the new program; the
/// diff engine on top of this decides what counts as changed.
pub fn create(
    program: &dyn Program,
    case_sensitive: bool,
    old: Option<&BuilderStateBase>,
) -> BuilderStateBase {
    let tracks_references = program.get_compiler_options().tracks_references();
    let use_old_state = can_reuse_old_state(tracks_references, old);

    let mut file_infos = IndexMap::new();
    let mut referenced_map = tracks_references.then(IndexMap::<_, IndexSet<_>>::new);

    for source_file in program.get_source_files() {
        let path = to_canonical_path(source_file.file_name(), case_sensitive);
        let old_signature = if use_old_state {
            old.and_then(|o| o.file_infos.get(&path))
                .and_then(|info| info.signature.clone())
        } else {
            None
        };

        if let Some(map) = referenced_map.as_mut() {
            let references: IndexSet<CanonicalPath> = source_file
                .referenced_file_names()
                .iter()
                .map(|name| to_canonical_path(name, case_sensitive))
                .collect();
            if !references.is_empty() {
                map.insert(path.clone(), references);
            }
        }

        file_infos.insert(
            path,
            FileInfo {
                version: source_file.version(),
                signature: old_signature,
            },
        );
    }

    let referenced_by_map = referenced_map.as_ref().map(|forward| {
        let mut reverse: IndexMap<CanonicalPath, IndexSet<CanonicalPath>> = IndexMap::new();
        for (from, targets) in forward {
            for to in targets {
                reverse.entry(to.clone()).or_default().insert(from.clone());
            }
        }
        reverse
    });

    BuilderStateBase {
        case_sensitive,
        file_infos,
        referenced_map,
        referenced_by_map,
    }
}

/// Compute the ordered affected set of `changed_path`: the root plus every
/// file reachable over reverse references from a file whose shape signature
/// was invalidated by the change.
///
/// Recomputed signatures land in `out_signatures` only; `file_infos` keeps
/// the pre-batch values until `update_signatures_from_cache` commits them.
pub fn get_files_affected_by(
    state: &BuilderStateBase,
    program: &dyn Program,
    changed_path: &CanonicalPath,
    cancellation: Option<&dyn CancellationToken>,
    compute_hash: &dyn Fn(&str) -> String,
    out_signatures: &mut SignatureCache,
) -> Result<Vec<Rc<dyn SourceFile>>, OperationCanceled> {
    let files_by_path: IndexMap<CanonicalPath, Rc<dyn SourceFile>> = program
        .get_source_files()
        .into_iter()
        .map(|sf| (state.canonical(sf.file_name()), sf))
        .collect();

    let root = match files_by_path.get(changed_path) {
        Some(root) => root.clone(),
        None => return Ok(Vec::new()),
    };

    if !update_shape_signature(
        state,
        &root,
        changed_path,
        out_signatures,
        cancellation,
        compute_hash,
    )? {
        return Ok(vec![root]);
    }

    if state.referenced_map.is_none() {
        // No reference graph: the change may be visible anywhere.
        let mut result: Vec<Rc<dyn SourceFile>> = vec![root];
        for (path, sf) in &files_by_path {
            if path != changed_path {
                result.push(sf.clone());
            }
        }
        return Ok(result);
    }

    let mut seen: IndexSet<CanonicalPath> = IndexSet::new();
    seen.insert(changed_path.clone());
    let mut result: Vec<Rc<dyn SourceFile>> = vec![root];
    let mut queue = state.referenced_by(changed_path);

    while let Some(current) = queue.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(sf) = files_by_path.get(&current) {
            result.push(sf.clone());
            if update_shape_signature(
                state,
                sf,
                &current,
                out_signatures,
                cancellation,
                compute_hash,
            )? {
                queue.extend(state.referenced_by(&current));
            }
        }
    }

    Ok(result)
}

/// Recompute `source_file`'s shape signature into `cache`, reporting whether
/// it differs from the last committed signature. A path already present in
/// `cache` is up to date for this batch and reports unchanged.
fn update_shape_signature(
    state: &BuilderStateBase,
    source_file: &Rc<dyn SourceFile>,
    path: &CanonicalPath,
    cache: &mut SignatureCache,
    cancellation: Option<&dyn CancellationToken>,
    compute_hash: &dyn Fn(&str) -> String,
) -> Result<bool, OperationCanceled> {
    if cache.contains_key(path) {
        return Ok(false);
    }
    if let Some(token) = cancellation {
        token.throw_if_cancellation_requested()?;
    }

    let info = state
        .file_infos
        .get(path)
        .unwrap_or_else(|| panic!("no file info for program file {}", path));

    let latest = if source_file.is_declaration_file() {
        source_file.version()
    } else {
        compute_hash(&source_file.declaration_text())
    };
    cache.insert(path.clone(), latest.clone());

    Ok(match &info.signature {
        Some(previous) => *previous != latest,
        None => true,
    })
}

/// Flush pending signatures into the committed per-file store.
pub fn update_signatures_from_cache(state: &mut BuilderStateBase, signatures: &mut SignatureCache) {
    for (path, signature) in signatures.drain(..) {
        if let Some(info) = state.file_infos.get_mut(&path) {
            info.signature = Some(signature);
        }
    }
}

/// File names of everything `source_file` transitively references, the file
/// itself first. Without a reference graph this is every program file.
pub fn get_all_dependencies(
    state: &BuilderStateBase,
    program: &dyn Program,
    source_file: &dyn SourceFile,
) -> Vec<String> {
    let all_files = program.get_source_files();
    if state.referenced_map.is_none() {
        return all_files.iter().map(|sf| sf.file_name().to_string()).collect();
    }

    let files_by_path: IndexMap<CanonicalPath, Rc<dyn SourceFile>> = all_files
        .into_iter()
        .map(|sf| (state.canonical(sf.file_name()), sf))
        .collect();
    let referenced_map = state.referenced_map.as_ref().unwrap();

    let start = state.canonical(source_file.file_name());
    let mut seen: IndexSet<CanonicalPath> = IndexSet::new();
    let mut queue = vec![start];

    while let Some(current) = queue.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(references) = referenced_map.get(&current) {
            for target in references {
                if !seen.contains(target) {
                    queue.push(target.clone());
                }
            }
        }
    }

    seen.iter()
        .filter_map(|path| files_by_path.get(path))
        .map(|sf| sf.file_name().to_string())
        .collect()
}
