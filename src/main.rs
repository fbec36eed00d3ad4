//! Geotagger CLI: read or write the GPS location of media files.

use anyhow::Result;
use clap::Parser;
use geotagger::engine::arg_parser::Cli;
use geotagger::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
