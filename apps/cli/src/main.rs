// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zonelite CLI - zone a building described as JSON floor plates.
//!
//! Reads `{"floors": [...]}` (each floor a `FloorInput`), runs every floor in
//! order and writes the `BuildingResult` as JSON. The per-floor diagnostic
//! summary goes to stderr.
//!
//! Configuration comes from `ZONELITE_*` environment variables, or from a
//! JSON `ZoningConfig` passed with `--config`. Logging is controlled by
//! `RUST_LOG`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use zonelite_zoning::{process_building, FloorInput};

mod config;

#[derive(Parser)]
#[command(name = "zonelite")]
#[command(about = "Detect zones on tolerance-noisy floor plates")]
struct Cli {
    /// Building JSON; reads stdin when omitted or "-".
    input: Option<PathBuf>,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON ZoningConfig; replaces the environment configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Indent the JSON output.
    #[arg(long)]
    pretty: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[derive(Deserialize)]
struct BuildingInput {
    floors: Vec<FloorInput>,
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))
        }
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,zonelite_zoning=info".into());
    let logger = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if cli.log_json {
        logger.json().init();
    } else {
        logger.init();
    }

    let config = config::load(cli.config.as_deref())?;
    tracing::info!(
        distance = config.tolerances.distance,
        angle = config.tolerances.angle,
        grouping = config.tolerances.grouping,
        alignment = config.tolerances.alignment,
        perimeter_offset = config.tolerances.perimeter_offset,
        reference_angle = config.reference_angle,
        "Loaded configuration"
    );

    let text = read_input(cli.input.as_ref())?;
    let building: BuildingInput = serde_json::from_str(&text)
        .context("parsing building JSON")?;
    let result = process_building(&building.floors, &config)
        .context("zoning failed")?;

    for floor in &result.floors {
        eprint!("{}", floor.result.summary);
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    match &cli.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut out = io::stdout().lock();
            out.write_all(json.as_bytes())?;
            out.write_all(b"\n")?;
        }
    }
    tracing::info!(
        regions = result.region_count(),
        floors = result.floors.len(),
        "Done"
    );
    Ok(())
}
