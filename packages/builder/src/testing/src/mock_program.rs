// Mock program for builder tests.
//
// Programs are described with a compact graph string: "a:b,c;b;c" creates
// /a.ts importing /b.ts and /c.ts. A `*` prefix turns the import into a
// re-export. Every program query is recorded so tests can assert cache hits.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use compiler_api::{
    CancellationToken, CompilerOptions, CustomTransformers, Diagnostic, EmitResult,
    OperationCanceled, Program, SourceFile, SourceMapData, WriteFileCallback,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::paths::normalize_path;

static IMPORT_SPECIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*(?:import|export)\s+\{[^}]*\}\s+from\s+'([^']+)';?\s*$"#).unwrap()
});

#[derive(Debug, Clone)]
pub struct MockSourceFile {
    pub file_name: String,
    pub text: String,
    /// Externally visible declaration summary; changing it changes the
    /// file's shape signature.
    pub declarations: String,
    /// Explicit version token; defaults to the text itself.
    pub version: Option<String>,
}

impl MockSourceFile {
    pub fn new(
        file_name: impl Into<String>,
        text: impl Into<String>,
        declarations: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            text: text.into(),
            declarations: declarations.into(),
            version: None,
        }
    }
}

impl SourceFile for MockSourceFile {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn version(&self) -> String {
        // Identity hashing: the text is its own version token unless the
        // test pins one explicitly.
        self.version.clone().unwrap_or_else(|| self.text.clone())
    }

    fn declaration_text(&self) -> String {
        self.declarations.clone()
    }

    fn referenced_file_names(&self) -> Vec<String> {
        let dir = match self.file_name.rfind('/') {
            Some(idx) => &self.file_name[..idx],
            None => "",
        };
        IMPORT_SPECIFIER
            .captures_iter(&self.text)
            .filter_map(|caps| {
                let specifier = caps.get(1)?.as_str();
                if !specifier.starts_with('.') {
                    return None;
                }
                let joined = normalize_path(&format!("{}/{}", dir, specifier));
                Some(if joined.ends_with(".ts") {
                    joined
                } else {
                    format!("{}.ts", joined)
                })
            })
            .collect()
    }
}

pub struct MockProgram {
    options: CompilerOptions,
    current_directory: String,
    files: Vec<Rc<MockSourceFile>>,
    semantic: HashMap<String, Vec<Diagnostic>>,
    emit_skipped: bool,
    /// Recorded semantic queries; `None` marks a whole-program query.
    pub semantic_calls: RefCell<Vec<Option<String>>>,
    /// Recorded emit targets; `None` marks a whole-program emit.
    pub emit_calls: RefCell<Vec<Option<String>>>,
}

impl MockProgram {
    /// Build a program from the graph DSL. Each file gets an import line per
    /// listed dependency and a stable one-line declaration summary.
    pub fn from_graph(graph: &str, options: CompilerOptions) -> Self {
        let mut files = Vec::new();
        for segment in graph.split(';') {
            let parts: Vec<&str> = segment.split(':').collect();
            let name = parts[0];
            let deps = if parts.len() > 1 { parts[1] } else { "" };

            let mut content = String::new();
            if !deps.is_empty() {
                for dep in deps.split(',') {
                    if let Some(sym) = dep.strip_prefix('*') {
                        content.push_str(&format!("export {{{}}} from './{}';\n", sym, sym));
                    } else {
                        content.push_str(&format!("import {{{}}} from './{}';\n", dep, dep));
                    }
                }
            }

            files.push(Rc::new(MockSourceFile::new(
                format!("/{}.ts", name),
                content,
                format!("export declare const {}: number;", name),
            )));
        }

        Self {
            options,
            current_directory: "/".to_string(),
            files,
            semantic: HashMap::new(),
            emit_skipped: false,
            semantic_calls: RefCell::new(Vec::new()),
            emit_calls: RefCell::new(Vec::new()),
        }
    }

    fn file_mut(&mut self, name: &str) -> &mut MockSourceFile {
        let file_name = format!("/{}.ts", name);
        let file = self
            .files
            .iter_mut()
            .find(|f| f.file_name == file_name)
            .unwrap_or_else(|| panic!("no mock file named {}", file_name));
        Rc::get_mut(file).expect("mock files must be refined before the program is shared")
    }

    /// Replace a file's text (and therefore its version).
    pub fn with_text(mut self, name: &str, text: impl Into<String>) -> Self {
        self.file_mut(name).text = text.into();
        self
    }

    /// Append to a file's text, preserving its import lines.
    pub fn with_appended_text(mut self, name: &str, extra: &str) -> Self {
        self.file_mut(name).text.push_str(extra);
        self
    }

    /// Replace a file's declaration summary (and therefore its shape).
    pub fn with_declarations(mut self, name: &str, declarations: impl Into<String>) -> Self {
        self.file_mut(name).declarations = declarations.into();
        self
    }

    /// Pin a file's version token independently of its text.
    pub fn with_version(mut self, name: &str, version: impl Into<String>) -> Self {
        self.file_mut(name).version = Some(version.into());
        self
    }

    pub fn with_semantic_diagnostic(mut self, name: &str, message: &str) -> Self {
        let file_name = format!("/{}.ts", name);
        let diagnostic = Diagnostic::error(6000, message).with_file(file_name.clone());
        self.semantic.entry(file_name).or_default().push(diagnostic);
        self
    }

    pub fn with_emit_skipped(mut self) -> Self {
        self.emit_skipped = true;
        self
    }

    pub fn semantic_call_count(&self) -> usize {
        self.semantic_calls.borrow().len()
    }

    fn output_name(file_name: &str) -> String {
        match file_name.strip_suffix(".ts") {
            Some(stem) => format!("{}.js", stem),
            None => format!("{}.js", file_name),
        }
    }

    fn apply_transformers(text: &str, transformers: Option<&CustomTransformers>) -> String {
        let mut output = text.to_string();
        if let Some(t) = transformers {
            for factory in t.before.iter().chain(t.after.iter()) {
                output = factory(&output);
            }
        }
        output
    }
}

impl Program for MockProgram {
    fn get_compiler_options(&self) -> &CompilerOptions {
        &self.options
    }

    fn get_current_directory(&self) -> String {
        self.current_directory.clone()
    }

    fn get_source_files(&self) -> Vec<Rc<dyn SourceFile>> {
        self.files
            .iter()
            .map(|f| f.clone() as Rc<dyn SourceFile>)
            .collect()
    }

    fn get_source_file(&self, file_name: &str) -> Option<Rc<dyn SourceFile>> {
        self.files
            .iter()
            .find(|f| f.file_name == file_name)
            .map(|f| f.clone() as Rc<dyn SourceFile>)
    }

    fn get_options_diagnostics(&self) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn get_global_diagnostics(&self) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn get_syntactic_diagnostics(&self, _source_file: Option<&dyn SourceFile>) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn get_semantic_diagnostics(
        &self,
        source_file: Option<&dyn SourceFile>,
        cancellation: Option<&dyn CancellationToken>,
    ) -> Result<Vec<Diagnostic>, OperationCanceled> {
        if let Some(token) = cancellation {
            token.throw_if_cancellation_requested()?;
        }
        match source_file {
            Some(sf) => {
                self.semantic_calls
                    .borrow_mut()
                    .push(Some(sf.file_name().to_string()));
                Ok(self.semantic.get(sf.file_name()).cloned().unwrap_or_default())
            }
            None => {
                self.semantic_calls.borrow_mut().push(None);
                let mut all = Vec::new();
                for file in &self.files {
                    if let Some(diagnostics) = self.semantic.get(&file.file_name) {
                        all.extend(diagnostics.clone());
                    }
                }
                Ok(all)
            }
        }
    }

    fn emit(
        &self,
        target_source_file: Option<&dyn SourceFile>,
        write_file: Option<&WriteFileCallback>,
        cancellation: Option<&dyn CancellationToken>,
        _emit_only_declarations: bool,
        custom_transformers: Option<&CustomTransformers>,
    ) -> Result<EmitResult, OperationCanceled> {
        if let Some(token) = cancellation {
            token.throw_if_cancellation_requested()?;
        }
        self.emit_calls
            .borrow_mut()
            .push(target_source_file.map(|sf| sf.file_name().to_string()));

        if self.emit_skipped || self.options.no_emit == Some(true) {
            return Ok(EmitResult {
                emit_skipped: true,
                ..EmitResult::default()
            });
        }

        // (output name, contents, inputs feeding it)
        let mut outputs: Vec<(String, String, Vec<String>)> = Vec::new();
        if let Some(bundle) = self.options.bundled_output() {
            let mut contents = String::new();
            let mut inputs = Vec::new();
            for file in &self.files {
                contents.push_str(&file.text);
                inputs.push(file.file_name.clone());
            }
            outputs.push((bundle.to_string(), contents, inputs));
        } else if let Some(sf) = target_source_file {
            outputs.push((
                Self::output_name(sf.file_name()),
                sf.text().to_string(),
                vec![sf.file_name().to_string()],
            ));
        } else {
            for file in &self.files {
                outputs.push((
                    Self::output_name(&file.file_name),
                    file.text.clone(),
                    vec![file.file_name.clone()],
                ));
            }
        }

        let mut result = EmitResult::default();
        for (out_name, contents, inputs) in outputs {
            let contents = Self::apply_transformers(&contents, custom_transformers);
            if let Some(writer) = write_file {
                if (**writer)(&out_name, &contents).is_err() {
                    result.emit_skipped = true;
                    continue;
                }
            }
            if self.options.source_map == Some(true) {
                result.source_maps.push(SourceMapData {
                    input_source_file_names: inputs,
                    source_map: format!("{}.map", out_name),
                });
            }
            result.emitted_files.push(out_name);
        }
        Ok(result)
    }
}
