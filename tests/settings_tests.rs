use geotagger::pipeline::ToolPaths;
use geotagger::utils::{LastPosition, Settings, SettingsStore};
use geotagger::{GeoLocation, MapPosition};
use std::ffi::OsString;
use std::fs;
use std::path::Path;

// --- load / save ---

#[test]
fn test_missing_file_is_empty_settings() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("absent.toml"));
    assert_eq!(store.load().unwrap(), Settings::default());
}

#[test]
fn test_save_then_load_uses_camel_case_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.toml"));
    let settings = Settings {
        exiftool_path: Some("/opt/exiftool".into()),
        last_image_path: Some("/photos".into()),
        last_position: Some(LastPosition {
            latitude: Some(48.85),
            longitude: Some(2.29),
            zoom: Some(12),
        }),
        ..Default::default()
    };
    store.save(&settings).unwrap();

    let text = fs::read_to_string(store.path()).unwrap();
    assert!(text.contains("exiftoolPath"));
    assert!(text.contains("lastImagePath"));
    assert!(text.contains("[lastPosition]"));
    assert!(!text.contains("convertPath"), "unset fields are omitted");

    assert_eq!(store.load().unwrap(), settings);
}

#[test]
fn test_unknown_keys_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(&path, "convertPath = \"/usr/local/bin/magick\"\ntheme = \"dark\"\n").unwrap();
    let settings = SettingsStore::new(&path).load().unwrap();
    assert_eq!(settings.convert(), "/usr/local/bin/magick");
}

#[test]
fn test_malformed_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(&path, "exiftoolPath = [unterminated").unwrap();
    let err = SettingsStore::new(&path).load().unwrap_err();
    assert!(format!("{err:#}").contains("Could not parse settings file"));
}

#[test]
fn test_directory_in_place_of_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(dir.path());
    assert!(store.load().is_err());
    assert!(store.save(&Settings::default()).is_err());
}

// --- tool paths ---

#[test]
fn test_empty_tool_paths_fall_back_to_defaults() {
    let settings = Settings {
        exiftool_path: Some("  ".into()),
        convert_path: None,
        ..Default::default()
    };
    assert_eq!(settings.exiftool(), "exiftool");
    assert_eq!(settings.convert(), "convert");
}

#[test]
fn test_tool_overrides_win_over_settings() {
    let settings = Settings {
        exiftool_path: Some("/opt/exiftool".into()),
        convert_path: Some("/opt/convert".into()),
        ..Default::default()
    };
    let tools = ToolPaths::from_settings(&settings)
        .with_overrides(Some(Path::new("/tmp/fake-exiftool")), None);
    assert_eq!(tools.exiftool, OsString::from("/tmp/fake-exiftool"));
    assert_eq!(tools.convert, OsString::from("/opt/convert"));
}

// --- map position ---

#[test]
fn test_remember_map_position_merges() {
    let mut settings = Settings::default();
    settings.remember_map_position(&MapPosition {
        center: GeoLocation::new(10.0, 20.0),
        zoom: None,
    });
    settings.remember_map_position(&MapPosition {
        center: None,
        zoom: Some(5),
    });
    let position = settings.map_position();
    assert_eq!(position.center, GeoLocation::new(10.0, 20.0));
    assert_eq!(position.zoom, Some(5));
}

#[test]
fn test_map_position_needs_valid_centre() {
    let settings = Settings {
        last_position: Some(LastPosition {
            latitude: Some(95.0),
            longitude: Some(0.0),
            zoom: Some(3),
        }),
        ..Default::default()
    };
    let position = settings.map_position();
    assert_eq!(position.center, None);
    assert_eq!(position.zoom, Some(3));
}
