use std::io::{self, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

use crate::utils::config::PackagePaths;

/// Write one absolute path per line into a fresh file in the system temp dir, for `exiftool -@`.
/// The file is deleted when the returned handle drops, on success and on failure alike.
pub fn write_path_list(paths: &[PathBuf]) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(PackagePaths::get().temp_list_prefix())
        .suffix(".txt")
        .tempfile()?;
    for path in paths {
        writeln!(file, "{}", path.display())?;
    }
    file.flush()?;
    Ok(file)
}
