//! Shared Caravel importer model types.
//!
//! Pure data types used across the gateway, engine, and connector crates:
//! jobs, import reports, destination entity payloads, and the structured
//! import error model. No I/O lives here.

#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod job;
pub mod report;
