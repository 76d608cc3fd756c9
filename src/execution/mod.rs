//! Pipeline execution engine

pub mod engine;
pub mod executor;

pub use engine::ExecutionEngine;
pub use executor::{EventHandler, ExecutionEvent, StepExecutor};
