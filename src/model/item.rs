//! One tracked media file and its observable metadata fields.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::observable::Observable;
use crate::engine::tools::{fs_creation_time, media_kind_for};
use crate::types::{GeoLocation, ItemUpdate, MediaKind, MetadataRecord};

/// Which observable field of an item changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemField {
    ThumbnailPath,
    Geolocation,
    CreationTimestamp,
    DurationSeconds,
    FrameRate,
    InProgress,
}

pub type FieldListener = Arc<dyn Fn(&Path, ItemField) + Send + Sync>;

/// A media file. `path` is the identity and never changes; every other field is observable.
///
/// Fields are written by completion callbacks on the UI dispatcher, except `in_progress`,
/// which the lock table flips while it holds the item's slot.
pub struct MediaItem {
    path: PathBuf,
    kind: MediaKind,
    thumbnail_path: Observable<Option<PathBuf>>,
    geolocation: Observable<Option<GeoLocation>>,
    creation_timestamp: Observable<Option<NaiveDateTime>>,
    duration_seconds: Observable<Option<f64>>,
    frame_rate: Observable<Option<f64>>,
    in_progress: Observable<bool>,
}

impl MediaItem {
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            kind,
            thumbnail_path: Observable::default(),
            geolocation: Observable::default(),
            creation_timestamp: Observable::default(),
            duration_seconds: Observable::default(),
            frame_rate: Observable::default(),
            in_progress: Observable::default(),
        }
    }

    /// Item for a file on disk: kind from the extension, timestamp seeded with the
    /// file-system creation time. `None` for unrecognized extensions.
    pub fn from_file(path: &Path) -> Option<Self> {
        let kind = media_kind_for(path)?;
        let item = Self::new(path, kind);
        item.creation_timestamp.set(fs_creation_time(path));
        Some(item)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn thumbnail_path(&self) -> Option<PathBuf> {
        self.thumbnail_path.get()
    }

    pub fn geolocation(&self) -> Option<GeoLocation> {
        self.geolocation.get()
    }

    pub fn creation_timestamp(&self) -> Option<NaiveDateTime> {
        self.creation_timestamp.get()
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration_seconds.get()
    }

    pub fn frame_rate(&self) -> Option<f64> {
        self.frame_rate.get()
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress.get()
    }

    /// Current `(duration, frame_rate)` if both are positive.
    pub fn video_timing(&self) -> Option<(f64, f64)> {
        MetadataRecord {
            duration_seconds: self.duration_seconds(),
            frame_rate: self.frame_rate(),
            ..Default::default()
        }
        .video_timing()
    }

    pub fn set_thumbnail_path(&self, path: Option<PathBuf>) {
        self.thumbnail_path.set(path);
    }

    pub fn set_geolocation(&self, geolocation: Option<GeoLocation>) {
        self.geolocation.set(geolocation);
    }

    pub fn set_creation_timestamp(&self, timestamp: Option<NaiveDateTime>) {
        self.creation_timestamp.set(timestamp);
    }

    pub(crate) fn set_in_progress(&self, in_progress: bool) {
        self.in_progress.set(in_progress);
    }

    /// Commit a parsed record. Absent values leave the current field untouched.
    pub fn apply_metadata(&self, record: &MetadataRecord) {
        if let Some(geo) = record.geolocation {
            self.geolocation.set(Some(geo));
        }
        if let Some(ts) = record.creation_timestamp {
            self.creation_timestamp.set(Some(ts));
        }
        if let Some(d) = record.duration_seconds {
            self.duration_seconds.set(Some(d));
        }
        if let Some(fps) = record.frame_rate {
            self.frame_rate.set(Some(fps));
        }
    }

    pub fn apply(&self, update: &ItemUpdate) {
        self.apply_metadata(&update.metadata);
        if let Some(thumb) = &update.thumbnail_path {
            self.thumbnail_path.set(Some(thumb.clone()));
        }
    }

    /// Forward every field change to `listener` together with this item's path.
    pub fn subscribe_fields(&self, listener: FieldListener) {
        macro_rules! forward {
            ($field:ident => $which:expr) => {{
                let listener = Arc::clone(&listener);
                let path = self.path.clone();
                self.$field.subscribe(move |_| listener(&path, $which));
            }};
        }
        forward!(thumbnail_path => ItemField::ThumbnailPath);
        forward!(geolocation => ItemField::Geolocation);
        forward!(creation_timestamp => ItemField::CreationTimestamp);
        forward!(duration_seconds => ItemField::DurationSeconds);
        forward!(frame_rate => ItemField::FrameRate);
        forward!(in_progress => ItemField::InProgress);
    }

    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            path: self.path.clone(),
            kind: self.kind,
            thumbnail_path: self.thumbnail_path(),
            geolocation: self.geolocation(),
            creation_timestamp: self.creation_timestamp(),
            duration_seconds: self.duration_seconds(),
            frame_rate: self.frame_rate(),
            in_progress: self.in_progress(),
        }
    }
}

impl fmt::Debug for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaItem")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("in_progress", &self.in_progress())
            .finish_non_exhaustive()
    }
}

/// Plain copy of an item's fields at one instant (for reports and JSON output).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub thumbnail_path: Option<PathBuf>,
    pub geolocation: Option<GeoLocation>,
    pub creation_timestamp: Option<NaiveDateTime>,
    pub duration_seconds: Option<f64>,
    pub frame_rate: Option<f64>,
    pub in_progress: bool,
}
