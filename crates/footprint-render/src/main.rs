//! footprint-render: render a visited-regions map without a browser.
//!
//! Loads a boundary document (GeoJSON or TopoJSON) from disk, marks the
//! named regions visited, exports the fitted view to PNG or SVG and
//! prints a JSON summary to stdout.
//!
//! # Usage
//!
//! ```text
//! cargo run --bin footprint-render -- world.json --visited France,Poland -o trips.png
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use web_time::Instant;

use footprint_core::sync::NullSurface;
use footprint_core::{
    LoadError, LoadReport, MapConfig, MapSession, ScopeId, ScopeRequest, Size, format_percentage,
    parse_document,
};
use footprint_export::{
    ExportError, MapColors, RasterOptions, SvgOptions, export_filename, render_png, to_svg,
};

/// Render a map of visited regions from a boundary file.
#[derive(Parser)]
#[command(name = "footprint-render", version)]
struct Cli {
    /// Boundary document (GeoJSON `FeatureCollection` or TopoJSON `Topology`).
    input: PathBuf,

    /// Scope the document belongs to; selects projection and name keys.
    #[arg(long, default_value_t = ScopeId::World)]
    scope: ScopeId,

    /// Visited region names, comma separated.
    #[arg(long, value_delimiter = ',')]
    visited: Vec<String>,

    /// File with one visited region name per line (`#` starts a comment).
    #[arg(long)]
    visited_file: Option<PathBuf>,

    /// Output format. Inferred from the output extension when omitted.
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Output path. Defaults to `footprint-<scope>.<ext>`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Viewport width in pixels the map is fitted to.
    #[arg(long, default_value_t = 960.0)]
    width: f64,

    /// Viewport height in pixels the map is fitted to.
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Draw names of visited regions (SVG only).
    #[arg(long)]
    labels: bool,

    /// Leave the background transparent.
    #[arg(long)]
    transparent: bool,

    /// Map configuration as a JSON file; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum Format {
    /// Supersampled raster image.
    Png,
    /// Vector document.
    Svg,
}

impl Format {
    const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("svg") {
            Some(Self::Svg)
        } else if ext.eq_ignore_ascii_case("png") {
            Some(Self::Png)
        } else {
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum RenderError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid viewport size {width}x{height}")]
    Viewport { width: f64, height: f64 },
    #[error("cannot load boundaries: {0}")]
    Load(#[from] LoadError),
    #[error("scope {0} did not become active")]
    NotActivated(ScopeId),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Printed to stdout after a successful render.
#[derive(Debug, Serialize)]
struct Summary {
    scope: ScopeId,
    format: Format,
    output: PathBuf,
    total: usize,
    visited: usize,
    percentage: f64,
    percentage_text: String,
    unknown: Vec<String>,
}

fn read(path: &Path) -> Result<String, RenderError> {
    std::fs::read_to_string(path).map_err(|source| RenderError::Read {
        path: path.to_owned(),
        source,
    })
}

/// Names from a visited list file: one per line, blank lines and `#`
/// comments skipped.
fn parse_visited_list(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.split_once('#').map_or(line, |(name, _)| name).trim())
        .filter(|name| !name.is_empty())
}

fn collect_visited(cli: &Cli) -> Result<BTreeSet<String>, RenderError> {
    let mut names: BTreeSet<String> = cli
        .visited
        .iter()
        .map(|n| n.as_str().trim())
        .filter(|n| !n.is_empty())
        .map(str::to_owned)
        .collect();
    if let Some(path) = &cli.visited_file {
        let text = read(path)?;
        names.extend(parse_visited_list(&text).map(str::to_owned));
    }
    Ok(names)
}

/// Load `text` as `scope` into a session fitted to `size`.
fn load_session(
    config: MapConfig,
    scope: ScopeId,
    text: &str,
    size: Size,
) -> Result<MapSession, RenderError> {
    let mut session = MapSession::new(config);
    session.resize(size);
    let ScopeRequest::Fetch { ticket, source } = session.request_scope(scope) else {
        // A fresh session has nothing cached, so every scope needs a load.
        return Err(RenderError::NotActivated(scope));
    };
    match session.finish_load(ticket, parse_document(text, &source, scope)) {
        LoadReport::Activated(_) => Ok(session),
        LoadReport::Failed(err) => Err(err.into()),
        LoadReport::Discarded => Err(RenderError::NotActivated(scope)),
    }
}

/// Mark `names` visited. Returns the names that are not in the scope.
fn mark_visited(session: &mut MapSession, names: &BTreeSet<String>) -> Vec<String> {
    let mut unknown = Vec::new();
    for name in names {
        if session.collection().get(name).is_some() {
            session.toggle(name, &mut NullSurface);
        } else {
            tracing::warn!(name, "not a region of this scope");
            unknown.push(name.clone());
        }
    }
    let report = session.flush(Instant::now());
    tracing::debug!(applied = report.applied, "selection applied");
    unknown
}

fn encode(
    session: &MapSession,
    format: Format,
    labels: bool,
    colors: MapColors,
) -> Result<Vec<u8>, ExportError> {
    let scene = session.scene();
    let store = session.sync().store();
    let transform = session.transform();
    match format {
        Format::Png => {
            if labels {
                tracing::warn!("labels are only drawn in SVG output");
            }
            let options = RasterOptions {
                viewport: Some(session.viewport().size()),
                ..RasterOptions::from_config(session.config(), colors)
            };
            render_png(scene, store, &transform, &options)
        }
        Format::Svg => {
            let title = format!("{} visited", session.descriptor().label);
            let summary = session.summary();
            let options = SvgOptions {
                title: Some(&title),
                description: Some(&summary),
                labels,
                viewport: Some(session.viewport().size()),
                ..SvgOptions::from_config(session.config(), colors)
            };
            Ok(to_svg(scene, store, &transform, &options).into_bytes())
        }
    }
}

fn run(cli: &Cli) -> Result<Summary, RenderError> {
    let config = match &cli.config {
        Some(path) => MapConfig::from_json(&read(path)?)?,
        None => MapConfig::default(),
    };
    let size = Size::new(cli.width, cli.height);
    if size.is_empty() {
        return Err(RenderError::Viewport {
            width: cli.width,
            height: cli.height,
        });
    }

    let format = cli
        .format
        .or_else(|| cli.output.as_deref().and_then(Format::from_path))
        .unwrap_or(Format::Png);
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(export_filename(cli.scope, "", format.extension())));

    let text = read(&cli.input)?;
    let mut session = load_session(config, cli.scope, &text, size)?;
    let names = collect_visited(cli)?;
    let unknown = mark_visited(&mut session, &names);

    let mut colors = MapColors::default();
    if cli.transparent {
        colors.background = None;
    }
    let bytes = encode(&session, format, cli.labels, colors)?;
    std::fs::write(&output, &bytes).map_err(|source| RenderError::Write {
        path: output.clone(),
        source,
    })?;
    tracing::info!(path = %output.display(), bytes = bytes.len(), "wrote map");

    let stats = session.stats();
    Ok(Summary {
        scope: stats.scope,
        format,
        output,
        total: stats.total,
        visited: stats.visited,
        percentage: stats.percentage,
        percentage_text: format_percentage(stats.percentage),
        unknown,
    })
}

const fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level(cli.verbose))
        .init();

    let summary = match run(&cli) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing summary: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const WORLD: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"France"},
         "geometry":{"type":"Polygon","coordinates":[[[0,40],[10,40],[10,50],[0,50],[0,40]]]}},
        {"type":"Feature","properties":{"name":"Poland"},
         "geometry":{"type":"Polygon","coordinates":[[[20,40],[30,40],[30,50],[20,50],[20,40]]]}}
    ]}"#;

    #[test]
    fn visited_list_skips_blanks_and_comments() {
        let text = "France\n\n  # trips in 2019\nPoland  # twice\n   \n";
        let names: Vec<&str> = parse_visited_list(text).collect();
        assert_eq!(names, ["France", "Poland"]);
    }

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(Format::from_path(Path::new("out.SVG")), Some(Format::Svg));
        assert_eq!(Format::from_path(Path::new("out.png")), Some(Format::Png));
        assert_eq!(Format::from_path(Path::new("out")), None);
        assert_eq!(Format::from_path(Path::new("out.jpg")), None);
    }

    #[test]
    fn unknown_names_are_reported_not_marked() {
        let mut session = load_session(
            MapConfig::default(),
            ScopeId::World,
            WORLD,
            Size::new(960.0, 600.0),
        )
        .unwrap();
        let names: BTreeSet<String> = ["France", "Atlantis"].map(String::from).into();
        let unknown = mark_visited(&mut session, &names);
        assert_eq!(unknown, ["Atlantis"]);
        let stats = session.stats();
        assert_eq!((stats.visited, stats.total), (1, 2));
        assert!((stats.percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_input_is_a_load_error() {
        let err = load_session(
            MapConfig::default(),
            ScopeId::World,
            "not json",
            Size::new(960.0, 600.0),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::Load(_)));
    }

    #[test]
    fn svg_output_marks_visited_regions() {
        let mut session = load_session(
            MapConfig::default(),
            ScopeId::World,
            WORLD,
            Size::new(960.0, 600.0),
        )
        .unwrap();
        mark_visited(&mut session, &BTreeSet::from(["Poland".to_owned()]));
        let bytes = encode(&session, Format::Svg, true, MapColors::default()).unwrap();
        let svg = String::from_utf8(bytes).unwrap();
        assert_eq!(svg.matches("region visited").count(), 1);
        assert!(svg.contains("World visited"));
        assert!(svg.contains(">Poland</text>"));
    }

    #[test]
    fn verbosity_raises_the_level() {
        assert_eq!(level(0), LevelFilter::WARN);
        assert_eq!(level(2), LevelFilter::DEBUG);
        assert_eq!(level(9), LevelFilter::TRACE);
    }
}
