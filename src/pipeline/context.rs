//! Shared resources handed to every job: lock table, process runner, UI dispatcher, tool paths.

use log::{debug, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error_handler::{ErrorHandler, JobError};
use super::locks::LockTable;
use crate::engine::runner::ProcessRunner;
use crate::model::dispatcher::{Dispatcher, UiTask};
use crate::utils::config::ToolDefaults;
use crate::utils::settings::Settings;

/// Binaries the jobs invoke.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolPaths {
    pub exiftool: OsString,
    pub convert: OsString,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            exiftool: ToolDefaults::EXIFTOOL.into(),
            convert: ToolDefaults::CONVERT.into(),
        }
    }
}

impl ToolPaths {
    /// Configured paths, falling back to the default names when empty.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            exiftool: settings.exiftool().into(),
            convert: settings.convert().into(),
        }
    }

    /// Apply one-run overrides (CLI flags).
    pub fn with_overrides(mut self, exiftool: Option<&Path>, convert: Option<&Path>) -> Self {
        if let Some(p) = exiftool {
            self.exiftool = p.as_os_str().to_owned();
        }
        if let Some(p) = convert {
            self.convert = p.as_os_str().to_owned();
        }
        self
    }
}

/// Long-lived pieces shared by all workers.
#[derive(Clone)]
pub struct PipelineResources {
    pub locks: Arc<LockTable>,
    pub runner: Arc<ProcessRunner>,
    pub dispatcher: Arc<dyn Dispatcher>,
}

impl PipelineResources {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            locks: Arc::new(LockTable::new()),
            runner: Arc::new(ProcessRunner::new()),
            dispatcher,
        }
    }
}

/// What a running job sees: the shared resources plus the error handler of its submission.
pub struct JobContext<'a> {
    resources: &'a PipelineResources,
    on_error: &'a ErrorHandler,
}

impl<'a> JobContext<'a> {
    pub fn new(resources: &'a PipelineResources, on_error: &'a ErrorHandler) -> Self {
        Self {
            resources,
            on_error,
        }
    }

    pub fn locks(&self) -> &LockTable {
        &self.resources.locks
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.resources.runner
    }

    /// Queue `task` on the UI thread.
    pub fn post(&self, task: UiTask) {
        self.resources.dispatcher.post(task);
    }

    /// Route an error to the submission's handler. Interruptions only get logged.
    pub fn report(&self, err: JobError) {
        if err.is_interrupted() {
            debug!("Job interrupted");
            return;
        }
        warn!("{err}");
        (self.on_error)(err);
    }
}

/// Paths of a set of items, for argv building and logs.
pub fn paths_of<'a>(items: impl IntoIterator<Item = &'a Arc<crate::model::MediaItem>>) -> Vec<PathBuf> {
    items.into_iter().map(|i| i.path().to_path_buf()).collect()
}
