//! Test: the first failing step ends the run

use crate::helpers::*;
use marvin::core::{Event, Pipeline, PipelineContext, StepRegistry};
use marvin::execution::{ExecutionEngine, StepExecutor};

#[test]
fn test_first_failure_stops_the_pipeline() {
    let log = call_log();
    let registry = StepRegistry::new()
        .with("A", 0, recording(&log, "A", 0))
        .with("B", 1, recording(&log, "B", 2))
        .with("C", 2, recording(&log, "C", 0));

    let report = StepExecutor::new().execute(
        &Pipeline::assemble("failing", &registry),
        &mut PipelineContext::new(),
    );

    assert_pipeline_failed(&report, "B", 2);
    assert_execution_order(&report, &["A", "B"]);
    assert_eq!(report.skipped_steps(), vec!["C"]);
    assert_eq!(calls(&log), vec!["A", "B"]);
}

#[test]
fn test_first_step_failure_skips_everything_else() {
    let log = call_log();
    let registry = StepRegistry::new()
        .with("A", -10, recording(&log, "A", 127))
        .with("B", 0, recording(&log, "B", 0))
        .with("C", 10, recording(&log, "C", 1));

    let report = StepExecutor::new().execute(
        &Pipeline::assemble("failing", &registry),
        &mut PipelineContext::new(),
    );

    assert_pipeline_failed(&report, "A", 127);
    assert_eq!(report.skipped_steps(), vec!["B", "C"]);
    assert_eq!(calls(&log), vec!["A"]);
    assert_eq!(report.progress(), 1.0);
}

#[test]
fn test_engine_propagates_the_step_code() {
    let log = call_log();
    let tmp = tempfile::tempdir().unwrap();
    let engine = ExecutionEngine::new(
        vec![Box::new(Scripted {
            name: "scripted",
            steps: vec![("lint.one", -10, 0), ("lint.two", 0, 3), ("lint.three", 10, 0)],
            log: log.clone(),
        })],
        environment(tmp.path(), ""),
    );

    let report = engine.run(&Event::Lint);
    assert_pipeline_failed(&report, "lint.two", 3);
    assert_eq!(report.pipeline_name, "marvin:lint");
    assert_eq!(calls(&log), vec!["lint.one", "lint.two"]);
}

#[test]
fn test_missing_program_fails_with_code_one() {
    let tmp = tempfile::tempdir().unwrap();
    let env = environment(
        tmp.path(),
        "marvin:\n  phpunitExecutable: /nonexistent/marvin-test-phpunit\n",
    );
    let engine = ExecutionEngine::new(
        vec![Box::new(marvin::collaborators::lint::PhpunitCollaborator)],
        env,
    );

    let report = engine.run(&Event::TestUnit);
    assert_pipeline_failed(&report, "marvin.test.unit", 1);
}
