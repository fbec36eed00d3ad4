pub mod config;
pub mod logger;
pub mod settings;
pub mod tempfiles;

pub use config::*;
pub use logger::{Colors, setup_logging};
pub use settings::{LastPosition, Settings, SettingsStore};
pub use tempfiles::write_path_list;
