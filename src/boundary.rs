//! Entry point for a front end: turns "files added" and "put these files here" into registry
//! inserts and job submissions, and owns the pieces that live for the whole session.

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::model::{Coalescer, Dispatcher, MediaItem, Registry, UiThread};
use crate::pipeline::{
    ErrorHandler, JobError, PipelineResources, ReadMetadataAndThumbnailJob, ReadMetadataJob,
    TaskEngine, ThumbnailJob, ToolPaths, WriteGeolocationJob,
};
use crate::types::{GeoLocation, MapPosition};
use crate::utils::config::{COALESCE_INTERVAL, WORKER_POOL_SIZE};
use crate::utils::settings::{Settings, SettingsStore};

/// Callbacks into the front end. Both run on the UI thread.
#[derive(Clone)]
pub struct BoundaryHooks {
    /// A job failed in a way the user should see.
    pub on_alert: Arc<dyn Fn(&JobError) + Send + Sync>,
    /// Coalesced number of items currently being worked on.
    pub on_in_progress: Arc<dyn Fn(usize) + Send + Sync>,
}

impl Default for BoundaryHooks {
    fn default() -> Self {
        Self {
            on_alert: Arc::new(|_: &JobError| {}),
            on_in_progress: Arc::new(|_: usize| {}),
        }
    }
}

pub struct Boundary {
    store: SettingsStore,
    settings: Mutex<Settings>,
    tools: ToolPaths,
    registry: Arc<Registry>,
    engine: Arc<TaskEngine>,
    ui: Arc<UiThread>,
    on_error: ErrorHandler,
    coalescer: Coalescer,
}

impl Boundary {
    pub fn new(
        store: SettingsStore,
        settings: Settings,
        tools: ToolPaths,
        hooks: BoundaryHooks,
    ) -> Result<Self> {
        Self::with_interval(store, settings, tools, hooks, COALESCE_INTERVAL)
    }

    /// Like [`Boundary::new`] with a custom refresh interval for derived state.
    pub fn with_interval(
        store: SettingsStore,
        settings: Settings,
        tools: ToolPaths,
        hooks: BoundaryHooks,
        interval: Duration,
    ) -> Result<Self> {
        let ui = UiThread::spawn();
        let dispatcher: Arc<dyn Dispatcher> = ui.clone();
        let engine = Arc::new(
            TaskEngine::start(PipelineResources::new(Arc::clone(&dispatcher)), WORKER_POOL_SIZE)
                .context("start worker threads")?,
        );
        let registry = Registry::new();

        let on_in_progress = Arc::clone(&hooks.on_in_progress);
        let coalescer = Coalescer::attach(
            &registry,
            engine.timer(),
            Arc::clone(&dispatcher),
            interval,
            move |count| on_in_progress(count),
        );

        let on_alert = Arc::clone(&hooks.on_alert);
        let alert_dispatcher = Arc::clone(&dispatcher);
        let on_error: ErrorHandler = Arc::new(move |err: JobError| {
            let on_alert = Arc::clone(&on_alert);
            alert_dispatcher.post(Box::new(move || on_alert(&err)));
        });

        debug!("Using exiftool {:?}, convert {:?}", tools.exiftool, tools.convert);
        Ok(Self {
            store,
            settings: Mutex::new(settings),
            tools,
            registry,
            engine,
            ui,
            on_error,
            coalescer,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn engine(&self) -> &Arc<TaskEngine> {
        &self.engine
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    pub fn coalescer(&self) -> &Coalescer {
        &self.coalescer
    }

    pub fn settings(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    /// Add files to the registry and schedule their jobs: a thumbnail per image, one metadata
    /// read for all images, a combined read + thumbnail per video. With `geolocation`, the new
    /// items are then written with it (files dropped onto the map). Returns how many were new.
    pub fn add_files(&self, files: &[PathBuf], geolocation: Option<GeoLocation>) -> usize {
        if let Some(dir) = files.first().and_then(|f| f.parent()) {
            self.settings.lock().unwrap().last_image_path = Some(dir.display().to_string());
        }

        let added = self.registry.add(files);
        if added.is_empty() {
            return 0;
        }
        info!(
            "Added {} image(s) and {} video(s)",
            added.images.len(),
            added.videos.len()
        );

        for image in &added.images {
            self.submit(ThumbnailJob::new(Arc::clone(image), self.tools.convert.clone()));
        }
        if !added.images.is_empty() {
            self.submit(ReadMetadataJob::new(
                added.images.clone(),
                self.tools.exiftool.clone(),
            ));
        }
        for video in &added.videos {
            self.submit(ReadMetadataAndThumbnailJob::new(
                Arc::clone(video),
                self.tools.exiftool.clone(),
                self.tools.convert.clone(),
            ));
        }
        if let Some(geolocation) = geolocation {
            self.write(added.all(), geolocation);
        }
        added.len()
    }

    /// Write `geolocation` into the registry items at `paths`. Returns how many were selected.
    pub fn set_geolocation(&self, paths: &[PathBuf], geolocation: GeoLocation) -> usize {
        let items = self.registry.select(paths);
        let count = items.len();
        if count > 0 {
            self.write(items, geolocation);
        }
        count
    }

    fn write(&self, items: Vec<Arc<MediaItem>>, geolocation: GeoLocation) {
        self.submit(WriteGeolocationJob::new(
            items,
            geolocation,
            self.tools.exiftool.clone(),
        ));
    }

    fn submit(&self, job: impl crate::pipeline::Job + 'static) {
        self.engine.submit(Box::new(job), Arc::clone(&self.on_error));
    }

    /// Block until no job is queued or running and every resulting UI update has been applied.
    pub fn wait_idle(&self) {
        self.engine.wait_idle();
        self.ui.sync();
    }

    /// Stop all work, remember the map position, save the settings file.
    pub fn shutdown(&self, map_position: Option<MapPosition>) -> Result<()> {
        self.engine.shutdown();
        self.ui.stop();

        let mut settings = self.settings.lock().unwrap();
        if let Some(position) = map_position {
            settings.remember_map_position(&position);
        }
        self.store.save(&settings).inspect_err(|e| error!("{e:#}"))
    }
}
