use std::io;
use std::rc::Rc;

use crate::cancellation::{CancellationToken, OperationCanceled};
use crate::node::SourceFile;
use crate::{Diagnostic, EmitResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptTarget {
    ES5,
    ES2015,
    ES2020,
    ES2022,
    ESNext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    None,
    CommonJS,
    ES2015,
    ES2020,
    ESNext,
}

/// Options recognized by the build driver. Only a handful influence the
/// builder itself; the rest are passed through to the program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerOptions {
    pub declaration: Option<bool>,
    pub emit_declaration_only: Option<bool>,
    pub module: Option<ModuleKind>,
    pub no_emit: Option<bool>,
    pub no_emit_on_error: Option<bool>,
    pub out: Option<String>,
    pub out_dir: Option<String>,
    pub out_file: Option<String>,
    pub source_map: Option<bool>,
    pub strict: Option<bool>,
    pub target: Option<ScriptTarget>,
}

impl CompilerOptions {
    /// The single bundled output path, when the emit configuration bundles
    /// all inputs into one file.
    pub fn bundled_output(&self) -> Option<&str> {
        self.out_file.as_deref().or(self.out.as_deref())
    }

    /// Whether module resolution produces a per-file reference graph. Without
    /// one, any change invalidates the whole program.
    pub fn tracks_references(&self) -> bool {
        !matches!(self.module, None | Some(ModuleKind::None))
    }
}

/// Override for where emitted output is written. Receives the output file
/// name and its contents.
pub type WriteFileCallback = Rc<dyn Fn(&str, &str) -> io::Result<()>>;

/// Factory for a custom emit transformer over output text.
pub type TransformerFactory = Rc<dyn Fn(&str) -> String>;

/// User-supplied transformer passes applied around the program's own emit
/// pipeline.
#[derive(Clone, Default)]
pub struct CustomTransformers {
    pub before: Vec<TransformerFactory>,
    pub after: Vec<TransformerFactory>,
}

/// A compilation unit produced by the compiler. One immutable snapshot; a
/// rebuild produces a fresh program.
pub trait Program {
    fn get_compiler_options(&self) -> &CompilerOptions;

    fn get_current_directory(&self) -> String;

    fn get_source_files(&self) -> Vec<Rc<dyn SourceFile>>;

    fn get_source_file(&self, file_name: &str) -> Option<Rc<dyn SourceFile>>;

    fn get_options_diagnostics(&self) -> Vec<Diagnostic>;

    fn get_global_diagnostics(&self) -> Vec<Diagnostic>;

    fn get_syntactic_diagnostics(&self, source_file: Option<&dyn SourceFile>) -> Vec<Diagnostic>;

    fn get_semantic_diagnostics(
        &self,
        source_file: Option<&dyn SourceFile>,
        cancellation: Option<&dyn CancellationToken>,
    ) -> Result<Vec<Diagnostic>, OperationCanceled>;

    fn emit(
        &self,
        target_source_file: Option<&dyn SourceFile>,
        write_file: Option<&WriteFileCallback>,
        cancellation: Option<&dyn CancellationToken>,
        emit_only_declarations: bool,
        custom_transformers: Option<&CustomTransformers>,
    ) -> Result<EmitResult, OperationCanceled>;
}

/// Host supplied by the embedder. Decides path case sensitivity, the hash
/// used for shape signatures, and optionally where emitted files go.
pub trait BuildHost {
    fn use_case_sensitive_file_names(&self) -> bool;

    /// Hash for shape signatures. Defaults to the identity of the input.
    fn create_hash(&self, data: &str) -> String {
        data.to_string()
    }

    /// Host-level writer for emitted files; overridden by a per-call
    /// `write_file` argument.
    fn write_file(&self) -> Option<WriteFileCallback> {
        None
    }
}
