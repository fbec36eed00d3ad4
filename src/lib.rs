//! Geotagger: attach GPS coordinates to photos and videos through exiftool and ImageMagick

pub mod boundary;
pub mod engine;
pub mod model;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use boundary::{Boundary, BoundaryHooks};
pub use model::{MediaItem, Registry};
pub use pipeline::{JobError, TaskEngine, ToolPaths};

/// Result alias used by public geotagger API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
