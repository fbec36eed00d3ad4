//! CLI command handlers: a headless front end over [`Boundary`].

use anyhow::{Result, bail};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::boundary::{Boundary, BoundaryHooks};
use crate::engine::arg_parser::{Cli, CommonArgs, Commands};
use crate::engine::progress::{create_counter, finish_counter, set_counter};
use crate::engine::tools::expand_paths;
use crate::model::{ItemSnapshot, display_order};
use crate::pipeline::{JobError, ToolPaths};
use crate::types::GeoLocation;
use crate::utils::{Colors, Settings, SettingsStore, setup_logging};

fn settings_store(common: &CommonArgs) -> Result<SettingsStore> {
    match &common.config {
        Some(path) => Ok(SettingsStore::new(path)),
        None => SettingsStore::in_home_dir(),
    }
}

pub fn handle_run(cli: &Cli) -> Result<()> {
    setup_logging(cli.common.verbose);
    let store = settings_store(&cli.common)?;
    let settings = store.load()?;

    match &cli.command {
        Commands::Read { paths, json } => run_session(&cli.common, store, settings, paths, None, *json),
        Commands::Write {
            lat,
            lon,
            paths,
            json,
        } => {
            let Some(geolocation) = GeoLocation::new(*lat, *lon) else {
                bail!("Invalid location {lat}, {lon}: latitude must be in [-90, 90], longitude in [-180, 180]");
            };
            run_session(&cli.common, store, settings, paths, Some(geolocation), *json)
        }
        Commands::Config { maps_api_key } => {
            handle_config(&cli.common, &store, settings, maps_api_key.clone())
        }
    }
}

fn handle_config(
    common: &CommonArgs,
    store: &SettingsStore,
    mut settings: Settings,
    maps_api_key: Option<String>,
) -> Result<()> {
    let mut changed = false;
    if let Some(p) = &common.exiftool {
        settings.exiftool_path = Some(p.display().to_string());
        changed = true;
    }
    if let Some(p) = &common.convert {
        settings.convert_path = Some(p.display().to_string());
        changed = true;
    }
    if let Some(key) = maps_api_key {
        settings.maps_api_key = Some(key);
        changed = true;
    }
    if changed {
        store.save(&settings)?;
        info!("Saved settings to {}", store.path().display());
    }
    println!("# {}", store.path().display());
    print!("{}", toml::to_string_pretty(&settings)?);
    Ok(())
}

/// Add the files, let every job finish, print the report, save settings.
fn run_session(
    common: &CommonArgs,
    store: SettingsStore,
    settings: Settings,
    paths: &[PathBuf],
    geolocation: Option<GeoLocation>,
    json: bool,
) -> Result<()> {
    let tools = ToolPaths::from_settings(&settings)
        .with_overrides(common.exiftool.as_deref(), common.convert.as_deref());
    let files = expand_paths(paths)?;
    debug!("{} candidate file(s)", files.len());

    let alerts = Arc::new(AtomicUsize::new(0));
    let counter = common.verbose.then(|| create_counter("In progress"));
    let hooks = BoundaryHooks {
        on_alert: {
            let alerts = Arc::clone(&alerts);
            Arc::new(move |err: &JobError| {
                alerts.fetch_add(1, Ordering::SeqCst);
                error!("{err}");
            })
        },
        on_in_progress: {
            let counter = counter.clone();
            Arc::new(move |n: usize| {
                if let Some(pb) = &counter {
                    set_counter(pb, n);
                }
            })
        },
    };

    let boundary = Arc::new(Boundary::new(store, settings, tools, hooks)?);
    {
        let engine = Arc::clone(boundary.engine());
        if let Err(e) = ctrlc::set_handler(move || {
            warn!("Interrupted, stopping");
            engine.shutdown();
        }) {
            debug!("Could not install Ctrl-C handler: {e}");
        }
    }

    let added = boundary.add_files(&files, geolocation);
    if added == 0 {
        warn!("No supported media files found");
    }
    boundary.wait_idle();
    if let Some(pb) = &counter {
        finish_counter(pb);
    }

    let interrupted = boundary.engine().is_shut_down();
    let mut items = boundary.registry().snapshot();
    items.sort_by(|a, b| display_order(a, b));
    let report: Vec<ItemSnapshot> = items.iter().map(|i| i.snapshot()).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for item in &report {
            println!("{}", format_line(item));
        }
    }

    boundary.shutdown(None)?;
    let alerts = alerts.load(Ordering::SeqCst);
    if interrupted {
        bail!("Interrupted before all files were processed");
    }
    if alerts > 0 {
        bail!("{alerts} error(s) occurred");
    }
    Ok(())
}

fn format_line(item: &ItemSnapshot) -> String {
    let location = match &item.geolocation {
        Some(geo) => Colors::colorize(Colors::LOCATED, &geo.to_string()),
        None => Colors::colorize(Colors::UNLOCATED, "no location"),
    };
    let mut line = format!("{}\t{}\t{}", item.path.display(), item.kind, location);
    if let Some(ts) = item.creation_timestamp {
        line.push_str(&format!("\t{}", ts.format("%Y-%m-%d %H:%M:%S")));
    }
    if let Some(d) = item.duration_seconds {
        line.push_str(&format!("\t{d:.2}s"));
    }
    if let Some(fps) = item.frame_rate {
        line.push_str(&format!("\t{fps} fps"));
    }
    if let Some(thumb) = &item.thumbnail_path {
        let thumb = thumb.display().to_string();
        line.push_str(&format!("\t{}", Colors::colorize(Colors::DIM, &thumb)));
    }
    line
}
