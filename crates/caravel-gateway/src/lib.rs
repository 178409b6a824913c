//! Job and import-report persistence for the Caravel engine.
//!
//! Provides the [`JobGateway`] trait and an [`InMemoryGateway`]
//! implementation for job lifecycle tracking and report counter
//! updates.

#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod memory;

pub use client::JobGateway;
pub use error::{GatewayError, Result};
pub use memory::InMemoryGateway;
