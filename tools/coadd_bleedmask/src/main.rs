//! Consolidate single-epoch bleed-trail footprints into coadd tile mask regions.
//! Reads `{ "<tile>": [record, ...] }` JSON and writes per-band regions as JSON.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufReader, Write},
    path::Path,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use trailmask_core::{
    read_tile_footprints, BandSummary, ConsolidatedRegion, ConsolidationParams, Consolidator, GroupingStrategy,
    TileConsolidation, TileFootprints,
};

/// Minimum cluster size used when neither a flag nor a config file sets one.
const DEFAULT_MIN_FRAME: usize = 3;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "coadd_bleedmask", about = "Consolidate bleed-trail footprints into coadd tile mask regions")]
struct Args {
    /// JSON file of bleed-trail records keyed by tile name.
    #[arg(short, long)]
    input: String,

    /// Comma-separated tiles to process (default: every tile in the input).
    #[arg(short, long, value_delimiter = ',')]
    tile: Vec<String>,

    /// Only report this band.
    #[arg(short, long)]
    band: Option<String>,

    /// Output JSON file (default: stdout).
    #[arg(short, long)]
    output: Option<String>,

    /// JSON file of consolidation parameters; explicit flags override it.
    #[arg(short, long)]
    config: Option<String>,

    /// Leave edge-bleeds out of the result.
    #[arg(long)]
    skip_edge_bleed: bool,

    /// Dec extent in pixels below which trails are discarded [default: 3.3].
    #[arg(long)]
    thin_pix: Option<f64>,

    /// Minimum number of overlapping trails for a region [default: 3].
    #[arg(long)]
    min_frame: Option<usize>,

    /// Matching radius in arcsec (accepted, currently unused) [default: 4.0].
    #[arg(long)]
    mrad: Option<f64>,

    /// Component grouping strategy.
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Abort if a cluster needs more growth passes than this.
    #[arg(long)]
    max_passes: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    FixedPoint,
    UnionFind,
}

impl From<StrategyArg> for GroupingStrategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::FixedPoint => GroupingStrategy::FixedPoint,
            StrategyArg::UnionFind => GroupingStrategy::UnionFind,
        }
    }
}

// ── Output types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TileOutput {
    bands: BTreeMap<String, Vec<ConsolidatedRegion>>,
    summaries: Vec<BandSummary>,
}

impl TileOutput {
    /// Restrict to `band` when given. A requested band with no trails still
    /// gets an (empty) entry so downstream writers see it.
    fn from_consolidation(result: TileConsolidation, band: Option<&str>) -> Self {
        let summaries: Vec<BandSummary> = result
            .summaries()
            .filter(|s| band.map_or(true, |b| s.band == b))
            .cloned()
            .collect();
        let mut bands = result.into_band_map();
        if let Some(b) = band {
            let regions = bands.remove(b).unwrap_or_default();
            bands = BTreeMap::from([(b.to_owned(), regions)]);
        }
        Self { bands, summaries }
    }
}

// ── Setup helpers ─────────────────────────────────────────────────────────────

fn setup_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("building log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("logger initialization failed: {e}"))
}

/// Config file (or built-in defaults) first, then any flags given explicitly.
fn resolve_params(args: &Args) -> Result<ConsolidationParams> {
    let mut params = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
            ConsolidationParams::from_json_str(&text).with_context(|| format!("parsing config {path}"))?
        }
        None => ConsolidationParams { min_frame: DEFAULT_MIN_FRAME, ..Default::default() },
    };

    if args.skip_edge_bleed {
        params.skip_edge_bleed = true;
    }
    if let Some(v) = args.thin_pix {
        params.thin_pix = v;
    }
    if let Some(v) = args.min_frame {
        params.min_frame = v;
    }
    if let Some(v) = args.mrad {
        params.mrad = v;
    }
    if let Some(s) = args.strategy {
        params.strategy = s.into();
    }
    if args.max_passes.is_some() {
        params.max_passes = args.max_passes;
    }
    Ok(params)
}

fn select_tiles(input: &TileFootprints, requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(input.keys().cloned().collect());
    }
    let missing: Vec<&str> = requested
        .iter()
        .filter(|t| !input.contains_key(t.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        bail!("no bleed-trail records for tile(s): {}", missing.join(", "));
    }
    Ok(requested.to_vec())
}

fn load_input(path: &Path) -> Result<TileFootprints> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_tile_footprints(BufReader::new(file)).with_context(|| format!("parsing {}", path.display()))
}

fn run(args: &Args) -> Result<BTreeMap<String, TileOutput>> {
    let params = resolve_params(args)?;
    tracing::debug!("parameters: {params:?}");
    let consolidator = Consolidator::new(params)?;

    let input = load_input(Path::new(&args.input))?;
    tracing::info!("{} tiles with bleed trails in {}", input.len(), args.input);
    let tiles = select_tiles(&input, &args.tile)?;

    let mut out = BTreeMap::new();
    for tile in tiles {
        let result = consolidator
            .consolidate(&input, &tile)
            .with_context(|| format!("consolidating tile {tile}"))?;
        out.insert(tile, TileOutput::from_consolidation(result, args.band.as_deref()));
    }
    Ok(out)
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose)?;

    let out = run(&args)?;
    let json = serde_json::to_string_pretty(&out)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {path}"))?;
            tracing::info!("wrote {} tiles -> {path}", out.len());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

// ── Unit tests ────────────────────────────────────────────────────────────────
