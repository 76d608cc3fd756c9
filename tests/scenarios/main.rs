//! Scenario tests for marvin pipelines

mod helpers;

mod artifact_build;
mod failure_handling;
mod git_hook_dispatch;
mod onboarding;
mod registry_merge;
mod weighted_order;
