use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use groundmap::canvas::SAMPLE_SIZE;
use groundmap::{
    ClaimCell, ClaimOverlay, EngineConfig, MapEngine, NoiseTerrain, OwnershipKind, TileCoord,
};

#[derive(Parser, Debug)]
#[command(name = "groundmap")]
#[command(about = "Cached, incrementally rendered terrain map over a synthetic world")]
struct Args {
    /// Seed for the synthetic terrain (random if not specified)
    #[arg(short, long)]
    seed: Option<u32>,

    /// Starting zoom in blocks per pixel
    #[arg(short, long, default_value = "2")]
    zoom: i32,

    /// Cache directory (region files live under per-session subdirectories)
    #[arg(long, default_value = "groundmap_cache")]
    cache_dir: PathBuf,

    /// Optional engine config file (JSON; missing fields keep defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// World identity for session scoping
    #[arg(long, default_value = "sp_demo")]
    world: String,

    /// Dimension identity for session scoping
    #[arg(long, default_value = "overworld")]
    dimension: String,

    /// Window scale factor for the interactive viewer
    #[arg(long, default_value = "3")]
    scale: usize,

    /// Render headless and write the finished frame to this PNG
    #[arg(long)]
    export: Option<PathBuf>,

    /// Ticks to run before the export snapshot
    #[arg(long, default_value = "600")]
    ticks: u32,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match EngineConfig::load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    println!("Terrain seed: {}", seed);

    let mut engine = MapEngine::new(&args.cache_dir, config);
    engine.ensure_session(&args.world, &args.dimension);
    engine.set_overlay(demo_claims(seed));

    let mut world = NoiseTerrain::new(seed);

    if let Some(path) = &args.export {
        return export_png(&mut engine, &mut world, &args, path);
    }

    if let Err(e) = groundmap::viewer::run_viewer(&mut engine, &mut world, args.zoom, args.scale) {
        eprintln!("viewer error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// A handful of claims scattered near spawn, standing in for the snapshot
/// a claim server would push. Deterministic per terrain seed.
fn demo_claims(seed: u32) -> ClaimOverlay {
    let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
    let mut overlay = ClaimOverlay::new();

    for i in 0..12 {
        let tile = TileCoord::new(rng.gen_range(-8..=8), rng.gen_range(-8..=8));
        let (kind, owner) = if i % 3 == 0 {
            (OwnershipKind::Hostile, "Ashen Band")
        } else {
            (OwnershipKind::Friendly, "River Compact")
        };
        overlay.put(
            tile,
            ClaimCell {
                kind,
                owner: owner.to_string(),
            },
        );
    }
    overlay
}

/// Headless mode: tick until the requested tick count is spent and the
/// builder is idle, then write the display plane as a PNG.
fn export_png(
    engine: &mut MapEngine,
    world: &mut NoiseTerrain,
    args: &Args,
    path: &std::path::Path,
) -> ExitCode {
    world.set_anchor(TileCoord::new(0, 0));

    for _ in 0..args.ticks {
        engine.tick(world, args.zoom, 0, 0, false);
    }
    // let an in-flight build finish so the frame is complete
    let mut guard = 0;
    while engine.is_rebuilding() && guard < 64 {
        engine.tick(world, args.zoom, 0, 0, true);
        guard += 1;
    }

    let size = SAMPLE_SIZE as u32;
    let image = image::RgbaImage::from_fn(size, size, |x, y| {
        let argb = engine.display()[y as usize * SAMPLE_SIZE + x as usize];
        image::Rgba([
            ((argb >> 16) & 0xFF) as u8,
            ((argb >> 8) & 0xFF) as u8,
            (argb & 0xFF) as u8,
            ((argb >> 24) & 0xFF) as u8,
        ])
    });

    if let Err(e) = image.save(path) {
        eprintln!("failed to write {}: {}", path.display(), e);
        return ExitCode::FAILURE;
    }

    println!("wrote {} ({} ticks)", path.display(), args.ticks);
    println!("{}", engine.stats().summary());
    ExitCode::SUCCESS
}
