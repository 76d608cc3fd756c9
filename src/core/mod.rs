//! Core domain models
//!
//! Steps, the registry collaborators fill, the pipeline assembled from it,
//! the context steps share, and the events pipelines are built for.

pub mod config;
pub mod context;
pub mod event;
pub mod pipeline;
pub mod registry;
pub mod state;
pub mod step;

pub use config::{ConfigError, ConfigLookup, MarvinConfig};
pub use context::*;
pub use event::{Event, GitHook};
pub use pipeline::*;
pub use registry::{CollisionPolicy, StepRegistry};
pub use state::*;
pub use step::*;
