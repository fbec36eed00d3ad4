//! Public value types shared by the parser, jobs, registry and front end.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::utils::config::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

/// Kind of media file, derived from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify by extension (case-insensitive). `None` for anything not in the recognized sets.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// A point on the globe in decimal degrees. Only constructible in range:
/// latitude in [-90, 90], longitude in [-180, 180].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeoLocation {
    latitude: f64,
    longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        valid.then_some(GeoLocation {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Hemisphere letter for the latitude reference tag (`N` for zero).
    pub fn latitude_ref(&self) -> char {
        if self.latitude >= 0.0 { 'N' } else { 'S' }
    }

    /// Hemisphere letter for the longitude reference tag (`E` for zero).
    pub fn longitude_ref(&self) -> char {
        if self.longitude >= 0.0 { 'E' } else { 'W' }
    }
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Fields read for one file by the metadata tool. Produced by the output parser,
/// committed to an item on the UI dispatcher.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataRecord {
    pub geolocation: Option<GeoLocation>,
    pub creation_timestamp: Option<NaiveDateTime>,
    pub duration_seconds: Option<f64>,
    pub frame_rate: Option<f64>,
}

impl MetadataRecord {
    /// `(duration, frame_rate)` when both are positive, i.e. the file looks like a video.
    pub fn video_timing(&self) -> Option<(f64, f64)> {
        match (self.duration_seconds, self.frame_rate) {
            (Some(d), Some(fps)) if d > 0.0 && fps > 0.0 => Some((d, fps)),
            _ => None,
        }
    }
}

/// Everything a combined read + thumbnail pass produced for one item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemUpdate {
    pub metadata: MetadataRecord,
    pub thumbnail_path: Option<PathBuf>,
}

/// Last map centre and zoom handed over by the front end at shutdown.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MapPosition {
    pub center: Option<GeoLocation>,
    pub zoom: Option<u32>,
}
