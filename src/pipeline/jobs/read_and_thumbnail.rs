use log::debug;
use std::ffi::OsString;
use std::sync::Arc;

use super::Job;
use super::read_metadata::read_metadata;
use super::thumbnail::render_thumbnail;
use crate::model::MediaItem;
use crate::pipeline::context::JobContext;
use crate::pipeline::error_handler::JobError;
use crate::types::ItemUpdate;

/// Video pipeline: read metadata first (the thumbnail frame depends on duration and frame rate),
/// then render, then commit everything to the item in a single UI task.
pub struct ReadMetadataAndThumbnailJob {
    item: Arc<MediaItem>,
    exiftool: OsString,
    convert: OsString,
}

impl ReadMetadataAndThumbnailJob {
    pub fn new(item: Arc<MediaItem>, exiftool: OsString, convert: OsString) -> Self {
        Self {
            item,
            exiftool,
            convert,
        }
    }
}

impl Job for ReadMetadataAndThumbnailJob {
    fn name(&self) -> &'static str {
        "read-metadata-and-thumbnail"
    }

    fn run(self: Box<Self>, ctx: &JobContext<'_>) -> Result<(), JobError> {
        let _guard = ctx.locks().acquire(&self.item)?;
        let path = self.item.path().to_path_buf();
        let mut update = ItemUpdate::default();

        let read = read_metadata(
            ctx.runner(),
            &self.exiftool,
            std::slice::from_ref(&path),
            |_, record| update.metadata = record,
        );
        match read {
            Ok(()) => {}
            Err(JobError::Interrupted) => return Err(JobError::Interrupted),
            // The thumbnail is still worth rendering without metadata (first frame then).
            Err(e) => ctx.report(e),
        }

        // Fall back to whatever timing the item already carries.
        let timing = update
            .metadata
            .video_timing()
            .or_else(|| self.item.video_timing());
        let thumbnail = render_thumbnail(ctx.runner(), &self.convert, &path, timing);
        match thumbnail {
            Ok(thumb) => update.thumbnail_path = Some(thumb),
            Err(JobError::Interrupted) => return Err(JobError::Interrupted),
            Err(e) => ctx.report(e),
        }

        debug!("Committing metadata and thumbnail of {}", path.display());
        let item = Arc::clone(&self.item);
        ctx.post(Box::new(move || item.apply(&update)));
        Ok(())
    }
}
