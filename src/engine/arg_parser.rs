use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Attach GPS coordinates to photos and videos with exiftool.
#[derive(Clone, Debug, Parser)]
#[command(name = "geotagger", version)]
#[command(about = "Read or write the GPS location of images and videos.")]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every subcommand.
#[derive(Clone, Debug, Args)]
pub struct CommonArgs {
    /// Verbose output (debug logs and a live in-progress counter).
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Settings file. Default: `.geotagger.toml` in the home directory.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// exiftool binary for this run only.
    #[arg(long, global = true, value_name = "PATH")]
    pub exiftool: Option<PathBuf>,

    /// ImageMagick convert binary for this run only.
    #[arg(long, global = true, value_name = "PATH")]
    pub convert: Option<PathBuf>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Read location, date and video timing; render thumbnails. Directories are walked.
    Read {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write a location into the given files, then report.
    Write {
        /// Latitude in decimal degrees, south negative.
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in decimal degrees, west negative.
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show settings. With `--exiftool`, `--convert` or `--maps-api-key`, store them first.
    Config {
        #[arg(long, value_name = "KEY")]
        maps_api_key: Option<String>,
    },
}
