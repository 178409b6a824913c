//! Caravel import engine: step runner, batch executor and fault guard.
//!
//! The engine executes an ordered table of [`Step`]s for one import job.
//! Steps pull pages from a source, transform them, and push batches at
//! the destination; the [`Runner`] drives pagination, dependency
//! ordering, and job finalization. Per-item faults are contained by
//! [`guard::protect`]; cross-item concurrency is bounded by
//! [`batch::run_batch`].

#![warn(clippy::pedantic)]

pub mod batch;
pub mod client;
pub mod context;
pub mod error;
pub mod guard;
pub mod runner;
pub mod scope;
pub mod step;
pub mod steps;

pub use context::{PageContext, StepContext};
pub use error::EngineError;
pub use runner::{RunOutcome, Runner};
pub use step::{Step, StepDescriptor, StepInput, StepName};
