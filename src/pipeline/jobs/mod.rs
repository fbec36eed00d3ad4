//! The four units of work the task engine runs.
//!
//! Every job locks its items first, runs its tool, then posts all field updates for an item in
//! one UI task. The tool-facing parts are free functions that return plain values; the job types
//! decide what gets committed.

pub mod read_and_thumbnail;
pub mod read_metadata;
pub mod thumbnail;
pub mod write_geolocation;

use super::context::JobContext;
use super::error_handler::JobError;

pub use read_and_thumbnail::ReadMetadataAndThumbnailJob;
pub use read_metadata::{ReadMetadataJob, read_argv, read_metadata};
pub use thumbnail::{ThumbnailJob, mid_frame_index, render_thumbnail, thumbnail_argv};
pub use write_geolocation::{WriteGeolocationJob, write_argv};

/// An opaque unit of work. Errors returned here go to the submission's error handler.
pub trait Job: Send {
    fn name(&self) -> &'static str;

    fn run(self: Box<Self>, ctx: &JobContext<'_>) -> Result<(), JobError>;
}
