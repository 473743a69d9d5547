//! Project configuration
//!
//! Reads a `buildconfig.json` project file into root names and compiler
//! options. Parsing never fails; problems surface as error diagnostics on
//! the parsed configuration.

use std::path::Path;

use compiler_api::{CompilerOptions, Diagnostic, ModuleKind, ScriptTarget};
use serde::Deserialize;

const ERROR_UNRESOLVED_PROJECT: i32 = 5001;
const ERROR_UNREADABLE_CONFIG: i32 = 5002;
const ERROR_MALFORMED_CONFIG: i32 = 5003;
const ERROR_UNKNOWN_OPTION_VALUE: i32 = 5004;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawProject {
    files: Vec<String>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    compiler_options: RawCompilerOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawCompilerOptions {
    declaration: Option<bool>,
    emit_declaration_only: Option<bool>,
    module: Option<String>,
    no_emit: Option<bool>,
    no_emit_on_error: Option<bool>,
    out: Option<String>,
    out_dir: Option<String>,
    out_file: Option<String>,
    source_map: Option<bool>,
    strict: Option<bool>,
    target: Option<String>,
}

/// Parsed project configuration.
#[derive(Debug, Clone, Default)]
pub struct ParsedBuildConfiguration {
    /// Path of the project file this was read from.
    pub project: String,
    /// Root source file names, either listed explicitly or discovered from
    /// the include/exclude patterns.
    pub root_names: Vec<String>,
    /// Include patterns, kept for discovery and watching.
    pub include: Vec<String>,
    /// Exclude patterns.
    pub exclude: Vec<String>,
    pub options: CompilerOptions,
    /// Configuration errors.
    pub errors: Vec<Diagnostic>,
}

/// Read configuration from a project file or a directory containing
/// `buildconfig.json`, discovering root files from include patterns when no
/// explicit file list is given.
pub fn read_build_configuration(project: &str) -> ParsedBuildConfiguration {
    let project_path = Path::new(project);

    let (config_path, base_dir) = if project_path.is_dir() {
        (project_path.join("buildconfig.json"), project_path.to_path_buf())
    } else if project_path.extension().is_some_and(|ext| ext == "json") {
        let base = project_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        (project_path.to_path_buf(), base)
    } else {
        return ParsedBuildConfiguration {
            project: project.to_string(),
            errors: vec![Diagnostic::error(
                ERROR_UNRESOLVED_PROJECT,
                format!("Project path is not a directory or a .json file: {}", project),
            )],
            ..ParsedBuildConfiguration::default()
        };
    };

    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(err) => {
            return ParsedBuildConfiguration {
                project: project.to_string(),
                errors: vec![Diagnostic::error(
                    ERROR_UNREADABLE_CONFIG,
                    format!("Failed to read {}: {}", config_path.display(), err),
                )
                .with_file(config_path.to_string_lossy())],
                ..ParsedBuildConfiguration::default()
            };
        }
    };

    let mut parsed = parse_build_configuration(&content, project, &base_dir);
    if parsed.root_names.is_empty() && parsed.errors.is_empty() {
        parsed.root_names = discover_files(&base_dir, &parsed.include, &parsed.exclude);
    }
    parsed
}

/// Parse configuration text. Explicit `files` entries are resolved against
/// `base_dir`; include-pattern discovery is left to the caller since it
/// touches the file system.
pub fn parse_build_configuration(
    content: &str,
    project: &str,
    base_dir: &Path,
) -> ParsedBuildConfiguration {
    let mut errors = Vec::new();
    let content = strip_json_comments(content);

    let raw: RawProject = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(err) => {
            return ParsedBuildConfiguration {
                project: project.to_string(),
                errors: vec![Diagnostic::error(
                    ERROR_MALFORMED_CONFIG,
                    format!("Failed to parse project file: {}", err),
                )
                .with_file(project)],
                ..ParsedBuildConfiguration::default()
            };
        }
    };

    let options = lower_options(&raw.compiler_options, &mut errors);
    let root_names = raw
        .files
        .iter()
        .map(|file| base_dir.join(file).to_string_lossy().into_owned())
        .collect();

    ParsedBuildConfiguration {
        project: project.to_string(),
        root_names,
        include: raw.include.unwrap_or_else(|| vec!["**/*.ts".to_string()]),
        exclude: raw
            .exclude
            .unwrap_or_else(|| vec!["**/node_modules/**".to_string()]),
        options,
        errors,
    }
}

fn lower_options(raw: &RawCompilerOptions, errors: &mut Vec<Diagnostic>) -> CompilerOptions {
    let module = raw.module.as_deref().and_then(|value| {
        match value.to_lowercase().as_str() {
            "none" => Some(ModuleKind::None),
            "commonjs" => Some(ModuleKind::CommonJS),
            "es2015" | "es6" => Some(ModuleKind::ES2015),
            "es2020" => Some(ModuleKind::ES2020),
            "esnext" => Some(ModuleKind::ESNext),
            other => {
                errors.push(Diagnostic::error(
                    ERROR_UNKNOWN_OPTION_VALUE,
                    format!("Unknown value for 'module': {}", other),
                ));
                None
            }
        }
    });

    let target = raw.target.as_deref().and_then(|value| {
        match value.to_lowercase().as_str() {
            "es5" => Some(ScriptTarget::ES5),
            "es2015" | "es6" => Some(ScriptTarget::ES2015),
            "es2020" => Some(ScriptTarget::ES2020),
            "es2022" => Some(ScriptTarget::ES2022),
            "esnext" => Some(ScriptTarget::ESNext),
            other => {
                errors.push(Diagnostic::error(
                    ERROR_UNKNOWN_OPTION_VALUE,
                    format!("Unknown value for 'target': {}", other),
                ));
                None
            }
        }
    });

    CompilerOptions {
        declaration: raw.declaration,
        emit_declaration_only: raw.emit_declaration_only,
        module,
        no_emit: raw.no_emit,
        no_emit_on_error: raw.no_emit_on_error,
        out: raw.out.clone(),
        out_dir: raw.out_dir.clone(),
        out_file: raw.out_file.clone(),
        source_map: raw.source_map,
        strict: raw.strict,
        target,
    }
}

/// Strip `//` and `/*`-leading comment lines so hand-edited configs parse.
fn strip_json_comments(input: &str) -> String {
    let mut result = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*') {
            result.push_str(line);
            result.push('\n');
        }
    }
    result
}

/// Expand include patterns under `base_dir`, dropping excluded matches.
fn discover_files(base_dir: &Path, include: &[String], exclude: &[String]) -> Vec<String> {
    let mut files = Vec::new();

    for pattern in include {
        let full_pattern = base_dir.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        let paths = match glob::glob(&pattern_str) {
            Ok(paths) => paths,
            Err(_) => continue,
        };
        for path in paths.flatten() {
            let path_str = path.to_string_lossy().into_owned();
            let excluded = exclude.iter().any(|excl| {
                let excl_pattern = base_dir.join(excl);
                match glob::Pattern::new(&excl_pattern.to_string_lossy()) {
                    Ok(pattern) => pattern.matches(&path_str),
                    Err(_) => path_str.contains(excl.trim_matches('*').trim_matches('/')),
                }
            });
            if !excluded && path.is_file() {
                files.push(path_str);
            }
        }
    }

    files
}
