use anyhow::{Context, Result};
use clap::Parser;
use mapstitch::{AppConfig, LogReporter, MapSession, MapStyle, TileFetcher};
use std::path::PathBuf;

const API_KEY_VAR: &str = "MAPSTITCH_API_KEY";

/// Builds a stitched static map and writes the visible window to a PNG.
///
/// After the initial build the options are applied in a fixed order: style
/// first, then zoom steps, then pans in the order given.
#[derive(Parser, Debug)]
#[command(name = "mapstitch-app")]
#[command(about = "Stitch static-map tiles into a pannable map and save the visible window")]
struct Cli {
    /// JSON configuration file; defaults are used when omitted.
    #[arg()]
    config: Option<PathBuf>,

    /// Switch to this map type after the initial build.
    #[arg(long)]
    style: Option<MapStyle>,

    /// Zoom in one level; repeat to zoom further.
    #[arg(long = "zoom-in", action = clap::ArgAction::Count)]
    zoom_in: u8,

    /// Zoom out one level; repeat to zoom further.
    #[arg(long = "zoom-out", action = clap::ArgAction::Count)]
    zoom_out: u8,

    /// Pan the window by DX,DY pixels; may be given several times.
    #[arg(long, value_name = "DX,DY", value_parser = parse_pan, allow_hyphen_values = true)]
    pan: Vec<(i32, i32)>,

    /// Output image path.
    #[arg(short, long, default_value = "mapstitch.png")]
    out: PathBuf,
}

fn parse_pan(value: &str) -> std::result::Result<(i32, i32), String> {
    let (dx, dy) = value
        .split_once(',')
        .ok_or_else(|| format!("expected DX,DY, got '{}'", value))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<i32>()
            .map_err(|e| format!("bad pan component '{}': {}", part, e))
    };
    Ok((parse(dx)?, parse(dy)?))
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_json_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => AppConfig::default(),
    };
    if config.fetch.api_key.is_none() {
        config.fetch.api_key = std::env::var(API_KEY_VAR).ok().filter(|key| !key.is_empty());
    }
    if config.fetch.api_key.is_none() {
        log::warn!("no API key configured; set {} or fetch.api_key", API_KEY_VAR);
    }
    Ok(config)
}

fn apply(session: &mut MapSession, cli: &Cli) -> Result<()> {
    if let Some(style) = cli.style {
        session.change_style(style)?;
        log::info!("style {}", style);
    }
    for _ in 0..cli.zoom_in {
        if !session.zoom_in()? {
            log::warn!("already at maximum zoom");
            break;
        }
    }
    for _ in 0..cli.zoom_out {
        if !session.zoom_out()? {
            log::warn!("already at minimum zoom");
            break;
        }
    }
    for &(dx, dy) in &cli.pan {
        session.pan(dx, dy);
        log::info!("pan ({}, {}) -> offset {:?}", dx, dy, session.offset());
    }
    Ok(())
}

fn main() -> Result<()> {
    mapstitch::init_logging();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let fetcher = TileFetcher::new(&config.fetch)?;
    let mut session = MapSession::with_reporter(config.map.clone(), fetcher, LogReporter::default())
        .context("building map")?;

    apply(&mut session, &cli)?;

    let bounds = session.bounds();
    println!(
        "{}x{} composite, corner tiles {} .. {}, {:?}",
        session.composite().width(),
        session.composite().height(),
        bounds.northwest,
        bounds.southeast,
        session.fetcher_stats()
    );

    session
        .current_image()
        .save(&cli.out)
        .with_context(|| format!("writing {}", cli.out.display()))?;
    println!("wrote {}", cli.out.display());

    Ok(())
}
