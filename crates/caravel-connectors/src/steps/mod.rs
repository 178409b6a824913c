//! Generic step bodies, one per entity kind.
//!
//! Each step pulls one source page per invocation, transforms it, and
//! pushes it through the bounded batch executor with per-item guarding.

pub mod issues;
pub mod labels;
pub mod pages;

pub use issues::IssuesStep;
pub use labels::LabelsStep;
pub use pages::PagesStep;

/// In-flight ceiling for destination create calls within one page.
pub(crate) const DEST_CONCURRENCY: usize = 2;
