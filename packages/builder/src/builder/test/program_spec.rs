use std::cell::RefCell;
use std::rc::Rc;

use compiler_api::{Program, SourceFile, WriteFileCallback};

use super::util::{bundled_options, module_options};
use crate::builder::src::affected::Affected;
use crate::builder::src::program::{
    create_emit_and_semantic_diagnostics_builder_program,
    create_semantic_diagnostics_builder_program,
};
use crate::testing::{CountdownCancellationToken, MockBuildHost, MockProgram};

fn rc_host() -> Rc<MockBuildHost> {
    Rc::new(MockBuildHost::new(true))
}

#[test]
fn test_unchanged_rebuild_serves_diagnostics_from_cache() {
    let host = rc_host();
    let first = Rc::new(
        MockProgram::from_graph("a;b:a;c:b", module_options())
            .with_semantic_diagnostic("c", "boom"),
    );
    let mut builder =
        create_semantic_diagnostics_builder_program(first.clone(), host.clone(), None);
    let first_diagnostics = builder.get_semantic_diagnostics(None, None).unwrap();
    assert_eq!(first_diagnostics.len(), 1);
    assert_eq!(first.semantic_call_count(), 3);

    let second = Rc::new(
        MockProgram::from_graph("a;b:a;c:b", module_options())
            .with_semantic_diagnostic("c", "boom"),
    );
    let mut builder =
        create_semantic_diagnostics_builder_program(second.clone(), host, Some(builder));
    assert!(builder.state.changed_files_set.is_empty());

    let second_diagnostics = builder.get_semantic_diagnostics(None, None).unwrap();
    assert_eq!(second.semantic_call_count(), 0);
    assert_eq!(second_diagnostics, first_diagnostics);
}

#[test]
fn test_ignored_files_commit_without_analysis() {
    let host = rc_host();
    let program = Rc::new(MockProgram::from_graph("a;b;c", module_options()));
    let mut builder = create_semantic_diagnostics_builder_program(program.clone(), host, None);

    let ignore: &dyn Fn(&dyn SourceFile) -> bool = &|sf| sf.file_name() == "/b.ts";
    let mut yielded = Vec::new();
    while let Some(affected_diagnostics) = builder
        .get_semantic_diagnostics_of_next_affected(None, Some(ignore))
        .unwrap()
    {
        match &affected_diagnostics.affected {
            Affected::File(sf) => yielded.push(sf.file_name().to_string()),
            Affected::WholeProgram => yielded.push("<whole program>".to_string()),
        }
    }

    assert_eq!(yielded, vec!["/a.ts", "/c.ts"]);
    assert!(!program
        .semantic_calls
        .borrow()
        .contains(&Some("/b.ts".to_string())));
    assert!(builder.state.changed_files_set.is_empty());
}

#[test]
fn test_emit_drives_iterator_and_merges_results() {
    let host = rc_host();
    let program = Rc::new(MockProgram::from_graph("a;b:a", module_options()));
    let mut builder =
        create_emit_and_semantic_diagnostics_builder_program(program.clone(), host, None);

    let result = builder.emit(None, None, None, false, None).unwrap();

    assert!(!result.emit_skipped);
    assert_eq!(result.emitted_files, vec!["/a.js", "/b.js"]);
    assert_eq!(program.emit_calls.borrow().len(), 2);
    assert!(builder.state.changed_files_set.is_empty());

    // Nothing pending: a second emit does no work.
    let result = builder.emit(None, None, None, false, None).unwrap();
    assert!(result.emitted_files.is_empty());
    assert_eq!(program.emit_calls.borrow().len(), 2);
}

#[test]
fn test_emit_skipped_merges_with_or() {
    let host = rc_host();
    let program = Rc::new(MockProgram::from_graph("a;b", module_options()).with_emit_skipped());
    let mut builder = create_emit_and_semantic_diagnostics_builder_program(program, host, None);

    let result = builder.emit(None, None, None, false, None).unwrap();

    assert!(result.emit_skipped);
    assert!(result.emitted_files.is_empty());
}

#[test]
fn test_per_call_writer_overrides_host_writer() {
    let host_sink = Rc::new(RefCell::new(Vec::new()));
    let host = Rc::new(MockBuildHost::new(true).with_recording_writer(host_sink.clone()));
    let call_sink = Rc::new(RefCell::new(Vec::new()));
    let recorder = call_sink.clone();
    let override_writer: WriteFileCallback = Rc::new(move |file: &str, contents: &str| {
        recorder.borrow_mut().push((file.to_string(), contents.to_string()));
        Ok(())
    });

    let program = Rc::new(MockProgram::from_graph("a", module_options()));
    let mut builder = create_emit_and_semantic_diagnostics_builder_program(program, host, None);
    builder.emit(None, Some(override_writer), None, false, None).unwrap();

    assert_eq!(call_sink.borrow().len(), 1);
    assert!(host_sink.borrow().is_empty());
}

#[test]
fn test_host_writer_used_without_override() {
    let host_sink = Rc::new(RefCell::new(Vec::new()));
    let host = Rc::new(MockBuildHost::new(true).with_recording_writer(host_sink.clone()));

    let program = Rc::new(MockProgram::from_graph("a", module_options()));
    let mut builder = create_emit_and_semantic_diagnostics_builder_program(program, host, None);
    builder.emit(None, None, None, false, None).unwrap();

    assert_eq!(host_sink.borrow().len(), 1);
    assert_eq!(host_sink.borrow()[0].0, "/a.js");
}

#[test]
fn test_bundled_output_bypasses_diagnostics_cache() {
    let host = rc_host();
    let program = Rc::new(
        MockProgram::from_graph("a;b", bundled_options()).with_semantic_diagnostic("a", "boom"),
    );
    let mut builder =
        create_emit_and_semantic_diagnostics_builder_program(program.clone(), host, None);
    assert!(builder.state.semantic_diagnostics_per_file.is_none());

    let first = builder.get_semantic_diagnostics(None, None).unwrap();
    let second = builder.get_semantic_diagnostics(None, None).unwrap();

    assert_eq!(first, second);
    // Both reads went straight to the program as whole-program queries.
    assert_eq!(*program.semantic_calls.borrow(), vec![None, None]);
}

#[test]
fn test_bundled_emit_produces_single_bundle() {
    let host = rc_host();
    let program = Rc::new(MockProgram::from_graph("a;b", bundled_options()));
    let mut builder =
        create_emit_and_semantic_diagnostics_builder_program(program.clone(), host, None);

    let result = builder.emit(None, None, None, false, None).unwrap();
    assert_eq!(result.emitted_files, vec!["/bundle.js"]);
    assert_eq!(*program.emit_calls.borrow(), vec![None]);

    let result = builder.emit(None, None, None, false, None).unwrap();
    assert!(result.emitted_files.is_empty());
}

#[test]
fn test_bundled_next_affected_diagnostics_reports_whole_program() {
    let host = rc_host();
    let program = Rc::new(
        MockProgram::from_graph("a;b", bundled_options()).with_semantic_diagnostic("b", "boom"),
    );
    let mut builder = create_semantic_diagnostics_builder_program(program, host, None);

    let affected_diagnostics = builder
        .get_semantic_diagnostics_of_next_affected(None, None)
        .unwrap()
        .unwrap();
    assert!(matches!(affected_diagnostics.affected, Affected::WholeProgram));
    assert_eq!(affected_diagnostics.result.len(), 1);

    assert!(builder
        .get_semantic_diagnostics_of_next_affected(None, None)
        .unwrap()
        .is_none());
}

#[test]
fn test_builder_diagnostics_match_program_diagnostics() {
    let host = rc_host();
    let program = Rc::new(
        MockProgram::from_graph("a;b:a;c:b", module_options())
            .with_semantic_diagnostic("a", "first")
            .with_semantic_diagnostic("c", "second"),
    );
    let mut builder =
        create_emit_and_semantic_diagnostics_builder_program(program.clone(), host, None);

    let mut via_builder: Vec<String> = builder
        .get_semantic_diagnostics(None, None)
        .unwrap()
        .into_iter()
        .map(|d| d.message)
        .collect();
    let mut direct: Vec<String> = program
        .get_semantic_diagnostics(None, None)
        .unwrap()
        .into_iter()
        .map(|d| d.message)
        .collect();
    via_builder.sort();
    direct.sort();
    assert_eq!(via_builder, direct);
}

#[test]
fn test_all_dependencies_follow_references() {
    let host = rc_host();
    let program = Rc::new(MockProgram::from_graph("a:b;b:c;c;d", module_options()));
    let builder =
        create_emit_and_semantic_diagnostics_builder_program(program.clone(), host, None);

    let source_file = program.get_source_file("/a.ts").unwrap();
    let dependencies = builder.get_all_dependencies(&*source_file);

    assert_eq!(dependencies, vec!["/a.ts", "/b.ts", "/c.ts"]);
}

#[test]
fn test_targeted_emit_delegates_to_program() {
    let host = rc_host();
    let program = Rc::new(MockProgram::from_graph("a;b", module_options()));
    let mut builder =
        create_emit_and_semantic_diagnostics_builder_program(program.clone(), host, None);
    builder.emit(None, None, None, false, None).unwrap();

    let source_file = program.get_source_file("/a.ts").unwrap();
    let result = builder.emit(Some(&*source_file), None, None, false, None).unwrap();
    assert_eq!(result.emitted_files, vec!["/a.js"]);
}

#[test]
#[should_panic(expected = "currently yielded affected file")]
fn test_targeted_emit_rejects_uncommitted_affected_file() {
    let host = rc_host();
    let program = Rc::new(MockProgram::from_graph("a", module_options()));
    let mut builder =
        create_emit_and_semantic_diagnostics_builder_program(program.clone(), host, None);

    // One poll is spent computing the root's signature; the next, inside the
    // program's emit, trips. The yielded file stays uncommitted.
    let token = CountdownCancellationToken::new(1);
    assert!(builder.emit_next_affected(None, Some(&token), false, None).is_err());

    let source_file = program.get_source_file("/a.ts").unwrap();
    let _ = builder.emit(Some(&*source_file), None, None, false, None);
}

#[test]
#[should_panic(expected = "requires an emit and semantic diagnostics builder program")]
fn test_emit_next_affected_rejects_diagnostics_builder() {
    let host = rc_host();
    let program = Rc::new(MockProgram::from_graph("a", module_options()));
    let mut builder = create_semantic_diagnostics_builder_program(program, host, None);
    let _ = builder.emit_next_affected(None, None, false, None);
}

#[test]
#[should_panic(expected = "requires a semantic diagnostics builder program")]
fn test_next_affected_diagnostics_rejects_emit_builder() {
    let host = rc_host();
    let program = Rc::new(MockProgram::from_graph("a", module_options()));
    let mut builder = create_emit_and_semantic_diagnostics_builder_program(program, host, None);
    let _ = builder.get_semantic_diagnostics_of_next_affected(None, None);
}

#[test]
#[should_panic(expected = "requires an emit and semantic diagnostics builder program")]
fn test_current_directory_rejects_diagnostics_builder() {
    let host = rc_host();
    let program = Rc::new(MockProgram::from_graph("a", module_options()));
    let builder = create_semantic_diagnostics_builder_program(program, host, None);
    let _ = builder.get_current_directory();
}
