//! Shared types for the enver release catalog.
//!
//! Everything here is plain data: version ordering, release and module
//! records, stream summaries and host target detection. Network, cache and
//! filesystem logic lives in `enver-core`.

pub mod arch;
pub mod types;
pub mod version;

// Re-exports
pub use arch::*;
pub use types::*;
pub use version::{Channel, VersionId};

/// Major version of the newest engine generation.
pub const NEWEST_GENERATION: u64 = 6000;

/// Label prefixed to stream names of the newest generation.
pub const GENERATION_LABEL: &str = "Unity 6";
