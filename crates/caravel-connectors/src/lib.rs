//! Connector step bodies for the Caravel importer.
//!
//! Steps here are generic over the engine's [`SourceClient`] and
//! [`DestinationClient`](caravel_engine::client::DestinationClient)
//! traits; wiring a new third-party tool means implementing those two
//! traits and registering a step table in [`registry`]. The
//! [`fixture`] module provides an offline source and an in-memory
//! destination for local runs and tests.
//!
//! [`SourceClient`]: caravel_engine::client::SourceClient

#![warn(clippy::pedantic)]

pub mod fixture;
pub mod registry;
pub mod steps;

pub use fixture::{FixtureSource, InMemoryDestination};
pub use registry::{steps_for, StepSettings};
