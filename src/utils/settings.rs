//! User settings file (`~/.geotagger.toml`): tool paths, last directory, last map position.
//!
//! Missing file means empty settings. A file that exists but cannot be read or parsed is an
//! error the caller must surface at startup.

use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{GeoLocation, MapPosition};
use crate::utils::config::{PackagePaths, ToolDefaults};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exiftool_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maps_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_position: Option<LastPosition>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastPosition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u32>,
}

impl Settings {
    /// Configured exiftool binary, falling back to the bare name when unset or empty.
    pub fn exiftool(&self) -> &str {
        non_empty_or(&self.exiftool_path, ToolDefaults::EXIFTOOL)
    }

    /// Configured ImageMagick `convert` binary, falling back to the bare name.
    pub fn convert(&self) -> &str {
        non_empty_or(&self.convert_path, ToolDefaults::CONVERT)
    }

    /// Last map position as typed values. Centre only when both coordinates are present and valid.
    pub fn map_position(&self) -> MapPosition {
        let Some(pos) = &self.last_position else {
            return MapPosition::default();
        };
        let center = match (pos.latitude, pos.longitude) {
            (Some(lat), Some(lon)) => GeoLocation::new(lat, lon),
            _ => None,
        };
        MapPosition {
            center,
            zoom: pos.zoom,
        }
    }

    /// Merge the front end's final map state; absent parts keep their stored values.
    pub fn remember_map_position(&mut self, position: &MapPosition) {
        if position.center.is_none() && position.zoom.is_none() {
            return;
        }
        let last = self.last_position.get_or_insert_with(LastPosition::default);
        if let Some(center) = position.center {
            last.latitude = Some(center.latitude());
            last.longitude = Some(center.longitude());
        }
        if let Some(zoom) = position.zoom {
            last.zoom = Some(zoom);
        }
    }
}

fn non_empty_or<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}

/// Reads and writes [`Settings`] at a fixed path.
#[derive(Clone, Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.geotagger.toml`.
    pub fn in_home_dir() -> Result<Self> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(Self::new(home.join(PackagePaths::get().settings_filename())))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!("No settings at {}, using defaults", self.path.display());
            return Ok(Settings::default());
        }
        if !self.path.is_file() {
            bail!("Could not read settings file {}", self.path.display());
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Could not read settings file {}", self.path.display()))?;
        let settings = toml::from_str(&text)
            .with_context(|| format!("Could not parse settings file {}", self.path.display()))?;
        debug!("Loaded settings from {}", self.path.display());
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if self.path.exists() && !self.path.is_file() {
            bail!("Could not write settings file {}", self.path.display());
        }
        let text = toml::to_string_pretty(settings).context("serialize settings")?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("Could not write settings file {}", self.path.display()))?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
