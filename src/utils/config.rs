//! Application configuration constants.
//! Tuning, file naming and tool defaults in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    settings_filename: String,
    temp_list_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                settings_filename: format!(".{pkg}.toml"),
                temp_list_prefix: format!("{pkg}_exiftool"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Settings file name in the user's home directory (leading dot hides it on Unix).
    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }

    /// Prefix of the temporary argument file handed to exiftool with `-@`.
    pub fn temp_list_prefix(&self) -> &str {
        &self.temp_list_prefix
    }
}

// ---- External tools ----

/// Tool names used when the configured path is empty.
pub struct ToolDefaults;

impl ToolDefaults {
    pub const EXIFTOOL: &'static str = "exiftool";
    pub const CONVERT: &'static str = "convert";
}

// ---- Worker threads / scheduling ----

/// Background worker threads running jobs.
pub const WORKER_POOL_SIZE: usize = 2;

/// Derived UI state (sort order, in-progress count) refreshes at most this often.
pub const COALESCE_INTERVAL: Duration = Duration::from_millis(1000);

/// Poll interval while waiting for a child to exit (lets shutdown interrupt the wait).
pub const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(20);

// ---- Thumbnails ----

/// Thumbnail rendering parameters for `convert`.
pub struct ThumbnailConsts;

impl ThumbnailConsts {
    /// Bounding width in pixels; height bound is twice this.
    pub const WIDTH: u32 = 192;
    pub const QUALITY: &'static str = "60%";
    pub const BACKGROUND: &'static str = "white";
    /// Suffix of thumbnail files written next to their source.
    pub const SUFFIX: &'static str = "thumb";

    /// `-thumbnail` geometry: shrink only, fit into WIDTH x 2*WIDTH.
    pub fn geometry() -> String {
        format!("{}x{}>", Self::WIDTH, Self::WIDTH << 1)
    }
}

// ---- Media extensions (lowercase) ----

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "dng", "raw", "cr2", "cr3", "nef", "nrw", "arw", "srf",
    "sr2", "srw", "psd",
];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m2ts", "avi"];
