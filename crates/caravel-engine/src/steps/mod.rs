//! Steps owned by the engine itself, shared by every connector.

pub mod wait;

pub use wait::WaitForBackgroundProcessing;
