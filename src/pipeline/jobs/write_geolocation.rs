use log::info;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use super::Job;
use crate::model::MediaItem;
use crate::pipeline::context::{JobContext, paths_of};
use crate::pipeline::error_handler::JobError;
use crate::types::GeoLocation;
use crate::utils::tempfiles::write_path_list;

/// `exiftool -P -overwrite_original -q -gpslatitude=|lat| -gpslatituderef=N|S
///  -gpslongitude=|lon| -gpslongituderef=E|W -@ <list_file>`
pub fn write_argv(exiftool: &OsString, geolocation: &GeoLocation, list_file: &Path) -> Vec<OsString> {
    vec![
        exiftool.clone(),
        "-P".into(),
        "-overwrite_original".into(),
        "-q".into(),
        format!("-gpslatitude={}", geolocation.latitude().abs()).into(),
        format!("-gpslatituderef={}", geolocation.latitude_ref()).into(),
        format!("-gpslongitude={}", geolocation.longitude().abs()).into(),
        format!("-gpslongituderef={}", geolocation.longitude_ref()).into(),
        "-@".into(),
        list_file.as_os_str().to_owned(),
    ]
}

/// Writes one geolocation into a batch of files. All-or-nothing: on failure no item changes.
pub struct WriteGeolocationJob {
    items: Vec<Arc<MediaItem>>,
    geolocation: GeoLocation,
    exiftool: OsString,
}

impl WriteGeolocationJob {
    pub fn new(items: Vec<Arc<MediaItem>>, geolocation: GeoLocation, exiftool: OsString) -> Self {
        Self {
            items,
            geolocation,
            exiftool,
        }
    }
}

impl Job for WriteGeolocationJob {
    fn name(&self) -> &'static str {
        "write-geolocation"
    }

    fn run(self: Box<Self>, ctx: &JobContext<'_>) -> Result<(), JobError> {
        let guard = ctx.locks().acquire_many(&self.items)?;
        let paths = paths_of(guard.items());
        if paths.is_empty() {
            return Ok(());
        }

        let list = write_path_list(&paths)
            .map_err(|e| JobError::filesystem(std::env::temp_dir(), e))?;
        let argv = write_argv(&self.exiftool, &self.geolocation, list.path());
        ctx.runner().run(&argv, |_| {})?;

        let items = guard.items().to_vec();
        let geolocation = self.geolocation;
        ctx.post(Box::new(move || {
            for item in &items {
                item.set_geolocation(Some(geolocation));
            }
        }));
        info!("Wrote {} to {} file(s)", self.geolocation, paths.len());
        Ok(())
    }
}
