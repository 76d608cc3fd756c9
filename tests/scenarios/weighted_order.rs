//! Test: steps run in ascending weight order

use crate::helpers::*;
use marvin::core::{Pipeline, PipelineContext, StepRegistry};
use marvin::execution::{ExecutionEngine, StepExecutor};

#[test]
fn test_lower_weight_runs_first() {
    let log = call_log();
    let registry = StepRegistry::new()
        .with("A", 10, recording(&log, "A", 0))
        .with("B", -5, recording(&log, "B", 0))
        .with("C", -5, recording(&log, "C", 0));

    let pipeline = Pipeline::assemble("order", &registry);
    assert_eq!(pipeline.execution_order(), vec!["B", "C", "A"]);

    let report = StepExecutor::new().execute(&pipeline, &mut PipelineContext::new());
    assert_pipeline_completed(&report);
    assert_execution_order(&report, &["B", "C", "A"]);
    assert_eq!(calls(&log), vec!["B", "C", "A"]);
}

#[test]
fn test_every_step_runs_exactly_once() {
    let log = call_log();
    let registry = (0..20).fold(StepRegistry::new(), |registry, i| {
        let name = format!("step-{:02}", i);
        let weight = (i % 4) as i32 * 10 - 15;
        let op = recording(&log, &name, 0);
        registry.with(name, weight, op)
    });

    let pipeline = Pipeline::assemble("many", &registry);
    let report = StepExecutor::new().execute(&pipeline, &mut PipelineContext::new());
    assert_pipeline_completed(&report);

    let recorded = calls(&log);
    assert_eq!(recorded.len(), 20);
    assert_eq!(recorded, pipeline.execution_order());

    let weights: Vec<i32> = pipeline.steps().iter().map(|s| s.weight).collect();
    let mut sorted = weights.clone();
    sorted.sort();
    assert_eq!(weights, sorted);
}

#[test]
fn test_collaborator_steps_interleave_by_weight() {
    let log = call_log();
    let tmp = tempfile::tempdir().unwrap();
    let engine = ExecutionEngine::new(
        vec![
            Box::new(Scripted {
                name: "first",
                steps: vec![("first.late", 100, 0), ("first.early", -100, 0)],
                log: log.clone(),
            }),
            Box::new(Scripted {
                name: "second",
                steps: vec![("second.middle", 0, 0), ("second.early", -100, 0)],
                log: log.clone(),
            }),
        ],
        environment(tmp.path(), ""),
    );

    let report = engine.run(&marvin::core::Event::Lint);
    assert_pipeline_completed(&report);
    assert_eq!(
        calls(&log),
        vec!["first.early", "second.early", "second.middle", "first.late"]
    );
}

#[test]
fn test_steps_exchange_data_through_context() {
    let registry = StepRegistry::new()
        .with("consume", 20, |ctx: &mut PipelineContext| {
            match ctx.get_str("buildDir") {
                Some("/tmp/artifact/1.0.0/vanilla") => 0,
                _ => 7,
            }
        })
        .with("produce", 10, |ctx: &mut PipelineContext| {
            ctx.set("buildDir", "/tmp/artifact/1.0.0/vanilla");
            0
        });

    let mut ctx = PipelineContext::new();
    let report = StepExecutor::new().execute(&Pipeline::assemble("context", &registry), &mut ctx);
    assert_pipeline_completed(&report);
    assert_eq!(ctx.get_str("buildDir"), Some("/tmp/artifact/1.0.0/vanilla"));
}
