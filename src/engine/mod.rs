//! Engine module: external tool plumbing, output parsing, and the CLI front end

pub mod arg_parser;
pub mod cli;
pub mod parser;
pub mod progress;
pub mod runner;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::{Cli, Commands, CommonArgs};
pub use cli::handle_run;
pub use parser::{OutputParser, parse_date_time, parse_degrees, parse_output, parse_time};
pub use runner::ProcessRunner;
pub use tools::{expand_paths, is_thumbnail_fresh, thumbnail_path_for};
