use log::debug;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Job;
use crate::engine::runner::ProcessRunner;
use crate::engine::tools::{is_thumbnail_fresh, thumbnail_path_for};
use crate::model::MediaItem;
use crate::pipeline::context::JobContext;
use crate::pipeline::error_handler::JobError;
use crate::utils::config::ThumbnailConsts;

/// Frame in the middle of a clip: `floor(duration * fps) / 2`.
pub fn mid_frame_index(duration_seconds: f64, frame_rate: f64) -> u64 {
    ((duration_seconds * frame_rate) as u64) >> 1
}

/// `convert <source[frame]> -background white -flatten -thumbnail 192x384> -quality 60% jpg:<target>`
pub fn thumbnail_argv(
    convert: &OsString,
    source: &Path,
    frame: Option<u64>,
    target: &Path,
) -> Vec<OsString> {
    let mut input = source.as_os_str().to_owned();
    if let Some(frame) = frame {
        input.push(format!("[{frame}]"));
    }
    let mut output = OsString::from("jpg:");
    output.push(target.as_os_str());

    vec![
        convert.clone(),
        input,
        "-background".into(),
        ThumbnailConsts::BACKGROUND.into(),
        "-flatten".into(),
        "-thumbnail".into(),
        ThumbnailConsts::geometry().into(),
        "-quality".into(),
        ThumbnailConsts::QUALITY.into(),
        output,
    ]
}

/// Make sure a fresh thumbnail exists for `source` and return its path.
/// `timing` is `(duration, frame_rate)` for videos; it selects the middle frame.
/// The caller must hold the item's lock.
pub fn render_thumbnail(
    runner: &ProcessRunner,
    convert: &OsString,
    source: &Path,
    timing: Option<(f64, f64)>,
) -> Result<PathBuf, JobError> {
    let target = thumbnail_path_for(source);
    if is_thumbnail_fresh(&target, source) {
        debug!("Reusing thumbnail {}", target.display());
        return Ok(target);
    }
    match std::fs::remove_file(&target) {
        Ok(()) => debug!("Removed stale thumbnail {}", target.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(JobError::filesystem(&target, e)),
    }

    let frame = timing.map(|(d, fps)| mid_frame_index(d, fps));
    let argv = thumbnail_argv(convert, source, frame, &target);
    runner.run(&argv, |_| {})?;
    Ok(target)
}

/// Renders (or reuses) the thumbnail of one item and stores its path.
pub struct ThumbnailJob {
    item: Arc<MediaItem>,
    convert: OsString,
}

impl ThumbnailJob {
    pub fn new(item: Arc<MediaItem>, convert: OsString) -> Self {
        Self { item, convert }
    }
}

impl Job for ThumbnailJob {
    fn name(&self) -> &'static str {
        "thumbnail"
    }

    fn run(self: Box<Self>, ctx: &JobContext<'_>) -> Result<(), JobError> {
        let _guard = ctx.locks().acquire(&self.item)?;
        let timing = self.item.video_timing();
        let thumbnail = render_thumbnail(ctx.runner(), &self.convert, self.item.path(), timing)?;

        let item = Arc::clone(&self.item);
        ctx.post(Box::new(move || item.set_thumbnail_path(Some(thumbnail))));
        Ok(())
    }
}
