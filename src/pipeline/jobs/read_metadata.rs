use log::debug;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use super::Job;
use crate::engine::parser::OutputParser;
use crate::engine::runner::ProcessRunner;
use crate::model::MediaItem;
use crate::pipeline::context::{JobContext, paths_of};
use crate::pipeline::error_handler::JobError;
use crate::types::MetadataRecord;

const READ_TAGS: &[&str] = &[
    "-S",
    "-gpslatitude",
    "-gpslongitude",
    "-alldates",
    "-duration",
    "-videoframerate",
];

/// `exiftool -S -gpslatitude -gpslongitude -alldates -duration -videoframerate <paths...>`
pub fn read_argv(exiftool: &OsString, paths: &[PathBuf]) -> Vec<OsString> {
    let mut argv = Vec::with_capacity(1 + READ_TAGS.len() + paths.len());
    argv.push(exiftool.clone());
    argv.extend(READ_TAGS.iter().map(OsString::from));
    argv.extend(paths.iter().map(|p| p.as_os_str().to_owned()));
    argv
}

/// Run exiftool over `paths` and hand each parsed `(path, record)` to `on_record` as soon as
/// the file's block ends. On a non-zero exit, records already emitted stay emitted and the
/// trailing block is still flushed before the error is returned.
pub fn read_metadata(
    runner: &ProcessRunner,
    exiftool: &OsString,
    paths: &[PathBuf],
    mut on_record: impl FnMut(PathBuf, MetadataRecord),
) -> Result<(), JobError> {
    if paths.is_empty() {
        return Ok(());
    }
    let single = match paths {
        [only] => Some(only.clone()),
        _ => None,
    };
    let mut parser = OutputParser::new(single);
    let status = runner.run(&read_argv(exiftool, paths), |line| {
        if let Some((path, record)) = parser.feed_line(line) {
            on_record(path, record);
        }
    });
    match status {
        Ok(()) | Err(JobError::NonZeroExit { .. }) => {
            if let Some((path, record)) = parser.finish() {
                on_record(path, record);
            }
            status
        }
        Err(e) => Err(e),
    }
}

/// Reads metadata for a batch of items with one exiftool call. Each item is released as soon
/// as its record has been posted; items exiftool says nothing about are released at the end.
pub struct ReadMetadataJob {
    items: Vec<Arc<MediaItem>>,
    exiftool: OsString,
}

impl ReadMetadataJob {
    pub fn new(items: Vec<Arc<MediaItem>>, exiftool: OsString) -> Self {
        Self { items, exiftool }
    }
}

impl Job for ReadMetadataJob {
    fn name(&self) -> &'static str {
        "read-metadata"
    }

    fn run(self: Box<Self>, ctx: &JobContext<'_>) -> Result<(), JobError> {
        let mut guard = ctx.locks().acquire_many(&self.items)?;
        let paths = paths_of(guard.items());
        let by_path: HashMap<PathBuf, Arc<MediaItem>> = guard
            .items()
            .iter()
            .map(|i| (i.path().to_path_buf(), Arc::clone(i)))
            .collect();
        debug!("Reading metadata of {} file(s)", paths.len());

        let result = read_metadata(ctx.runner(), &self.exiftool, &paths, |path, record| {
            let Some(item) = by_path.get(&path) else {
                debug!("exiftool reported unknown file {}", path.display());
                return;
            };
            let target = Arc::clone(item);
            ctx.post(Box::new(move || target.apply_metadata(&record)));
            guard.release(&path);
        });
        drop(guard);
        result
    }
}
