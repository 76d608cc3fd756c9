//! Test: merging contributions from several collaborators

use crate::helpers::*;
use marvin::core::{CollisionPolicy, Event, Pipeline, PipelineContext, StepRegistry};
use marvin::execution::ExecutionEngine;

#[test]
fn test_last_write_wins() {
    let log = call_log();
    let mut merged = StepRegistry::new().with("X", 1, recording(&log, "op1", 0));
    merged.merge(StepRegistry::new().with("X", 9, recording(&log, "op2", 0)));

    assert_eq!(merged.len(), 1);
    let step = merged.get("X").unwrap();
    assert_eq!(step.weight, 9);

    step.run(&mut PipelineContext::new());
    assert_eq!(calls(&log), vec!["op2"]);
}

#[test]
fn test_replaced_step_moves_to_its_new_weight() {
    let log = call_log();
    let mut merged = StepRegistry::new()
        .with("X", -100, recording(&log, "X", 0))
        .with("Y", 0, recording(&log, "Y", 0));
    merged.merge(StepRegistry::new().with("X", 100, recording(&log, "X2", 0)));

    let pipeline = Pipeline::assemble("merged", &merged);
    assert_eq!(pipeline.execution_order(), vec!["Y", "X"]);
}

#[test]
fn test_warn_policy_records_collisions() {
    let log = call_log();
    let mut merged = StepRegistry::with_policy(CollisionPolicy::Warn)
        .with("shared", 0, recording(&log, "first", 0));
    merged.merge(StepRegistry::new().with("shared", 0, recording(&log, "second", 0)));

    assert_eq!(merged.collisions().to_vec(), vec!["shared"]);
}

#[test]
fn test_later_collaborator_overrides_earlier_one() {
    let log = call_log();
    let tmp = tempfile::tempdir().unwrap();
    let engine = ExecutionEngine::new(
        vec![
            Box::new(Scripted {
                name: "base",
                steps: vec![("marvin.lint.phpcs", -200, 0), ("base.only", 0, 0)],
                log: log.clone(),
            }),
            Box::new(Scripted {
                name: "override",
                steps: vec![("marvin.lint.phpcs", 50, 0)],
                log: log.clone(),
            }),
        ],
        environment(tmp.path(), "marvin:\n  collisionPolicy: warn\n"),
    );

    let registry = engine.collect(&Event::Lint);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("marvin.lint.phpcs").map(|s| s.weight), Some(50));
    assert_eq!(registry.collisions().to_vec(), vec!["marvin.lint.phpcs"]);

    let report = engine.run(&Event::Lint);
    assert_pipeline_completed(&report);
    assert_eq!(calls(&log), vec!["base.only", "marvin.lint.phpcs"]);
}
