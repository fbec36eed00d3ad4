//! Line parser for `exiftool -S` output.
//!
//! Multi-file output separates files with `======== <path>` lines. The parser accumulates fields
//! for the current file and hands out a finished record whenever a boundary line (or the end of
//! the stream) is reached. Any value that fails to parse is simply absent.

use chrono::NaiveDateTime;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

use crate::engine::tools::normalize_separators;
use crate::types::{GeoLocation, MetadataRecord};

static FILE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^========\s+(.+)$").expect("valid file boundary regex"));
static LATITUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^GPSLatitude:\s+(.+)$").expect("valid latitude regex"));
static LONGITUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^GPSLongitude:\s+(.+)$").expect("valid longitude regex"));
static DATE_TIME_ORIGINAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DateTimeOriginal:\s+(.+)$").expect("valid date time original regex")
});
static CREATE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CreateDate:\s+(.+)$").expect("valid create date regex"));
static DURATION_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Duration:\s+(.+) s$").expect("valid duration seconds regex"));
static DURATION_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Duration:\s+(.+)$").expect("valid duration time regex"));
static VIDEO_FRAME_RATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^VideoFrameRate:\s+(.+)$").expect("valid video frame rate regex")
});
static DEGREES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\d+)\s+deg\s+(\d+)'\s+(\d+\.\d+)"\s+(.)$"#).expect("valid degrees regex")
});
static TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d+):(\d+(\.\d+)?)$").expect("valid time regex"));

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Degrees string such as `48 deg 51' 30.12" N` to signed decimal degrees.
/// `positive`/`negative` are the hemisphere letters (compared case-insensitively).
pub fn parse_degrees(value: &str, positive: char, negative: char) -> Option<f64> {
    let caps = DEGREES.captures(value.trim())?;
    let degrees: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    let hemisphere = caps[4].chars().next()?;
    let sign = if hemisphere.eq_ignore_ascii_case(&positive) {
        1.0
    } else if hemisphere.eq_ignore_ascii_case(&negative) {
        -1.0
    } else {
        return None;
    };
    Some(sign * (f64::from(degrees) + f64::from(minutes) / 60.0 + seconds / 3600.0))
}

/// `h:mm:ss[.fff]` to seconds.
pub fn parse_time(value: &str) -> Option<f64> {
    let caps = TIME.captures(value.trim())?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}

/// EXIF `yyyy:MM:dd HH:mm:ss`. Trailing text (sub-seconds, zone offset) is ignored.
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_and_remainder(value.trim(), EXIF_DATE_FORMAT)
        .ok()
        .map(|(dt, _)| dt)
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Raw per-file fields collected between boundaries.
#[derive(Debug, Default)]
struct Pending {
    latitude: Option<f64>,
    longitude: Option<f64>,
    date_time_original: Option<NaiveDateTime>,
    create_date: Option<NaiveDateTime>,
    duration: Option<f64>,
    frame_rate: Option<f64>,
}

impl Pending {
    fn into_record(self) -> MetadataRecord {
        let geolocation = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => GeoLocation::new(lat, lon),
            _ => None,
        };
        MetadataRecord {
            geolocation,
            creation_timestamp: self.date_time_original.or(self.create_date),
            duration_seconds: self.duration,
            frame_rate: self.frame_rate,
        }
    }
}

/// Streaming parser state: the file currently being described plus its pending fields.
#[derive(Debug, Default)]
pub struct OutputParser {
    current: Option<PathBuf>,
    pending: Pending,
}

impl OutputParser {
    /// `single`: the one file of a single-file invocation (exiftool prints no boundary line then).
    /// Pass `None` for multi-file invocations; fields seen before the first boundary are dropped.
    pub fn new(single: Option<PathBuf>) -> Self {
        Self {
            current: single,
            pending: Pending::default(),
        }
    }

    /// Feed one line. Returns the flushed `(path, record)` of the previous file when `line`
    /// starts a new file and a previous file was current.
    pub fn feed_line(&mut self, line: &str) -> Option<(PathBuf, MetadataRecord)> {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(caps) = FILE_BOUNDARY.captures(line) {
            let flushed = self.flush();
            self.current = Some(normalize_separators(&caps[1]));
            return flushed;
        }
        let p = &mut self.pending;
        if let Some(caps) = LATITUDE.captures(line) {
            p.latitude = parse_degrees(&caps[1], 'N', 'S');
        } else if let Some(caps) = LONGITUDE.captures(line) {
            p.longitude = parse_degrees(&caps[1], 'E', 'W');
        } else if let Some(caps) = DATE_TIME_ORIGINAL.captures(line) {
            p.date_time_original = parse_date_time(&caps[1]);
        } else if let Some(caps) = CREATE_DATE.captures(line) {
            p.create_date = parse_date_time(&caps[1]);
        } else if let Some(caps) = DURATION_SECONDS.captures(line) {
            p.duration = parse_number(&caps[1]);
        } else if let Some(caps) = DURATION_TIME.captures(line) {
            p.duration = parse_time(&caps[1]);
        } else if let Some(caps) = VIDEO_FRAME_RATE.captures(line) {
            p.frame_rate = parse_number(&caps[1]);
        }
        None
    }

    /// End of stream: flush whatever file is current.
    pub fn finish(mut self) -> Option<(PathBuf, MetadataRecord)> {
        self.flush()
    }

    fn flush(&mut self) -> Option<(PathBuf, MetadataRecord)> {
        let pending = std::mem::take(&mut self.pending);
        let path = self.current.take()?;
        Some((path, pending.into_record()))
    }
}

/// Parse a complete output text. Convenience for callers that already hold all of stdout.
pub fn parse_output(text: &str, single: Option<PathBuf>) -> Vec<(PathBuf, MetadataRecord)> {
    let mut parser = OutputParser::new(single);
    let mut records: Vec<_> = text.lines().filter_map(|l| parser.feed_line(l)).collect();
    records.extend(parser.finish());
    records
}
