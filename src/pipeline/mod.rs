//! Job execution: per-item locks, worker pool, timer, the jobs themselves, error routing.

pub mod context;
pub mod error_handler;
pub mod jobs;
pub mod locks;
pub mod task_engine;
pub mod timer;

pub use context::{JobContext, PipelineResources, ToolPaths};
pub use error_handler::{ErrorHandler, JobError};
pub use jobs::{
    Job, ReadMetadataAndThumbnailJob, ReadMetadataJob, ThumbnailJob, WriteGeolocationJob,
};
pub use locks::{BatchGuard, ItemGuard, LockTable};
pub use task_engine::TaskEngine;
pub use timer::{TimerHandle, TimerTask};
