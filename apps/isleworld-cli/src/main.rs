use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec2;
use isleworld_common::{Color, Layer};
use isleworld_defs::{MapDefs, ObjectDefs};
use isleworld_kernel::{MapMsg, MapObject, Particle, Place, World, WorldConfig};
use isleworld_terrain::{GroundPatch, PatchOrder, RiverSpec};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "isleworld-cli", about = "CLI tool for isleworld maps")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// World config JSON; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Map definitions JSON; the built-in set when omitted
    #[arg(long, global = true)]
    map_defs: Option<PathBuf>,

    /// Object definitions JSON; the built-in set when omitted
    #[arg(long, global = true)]
    object_defs: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Generate terrain from a map message and print a summary
    Generate {
        #[command(flatten)]
        source: MapSource,
        /// Dump the generated terrain as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report the ground surface at a point
    Classify {
        #[command(flatten)]
        source: MapSource,
        x: f32,
        y: f32,
        #[arg(short, long, default_value = "0")]
        layer: u8,
    },
    /// Spawn the map's objects and walk a viewer across the island
    Simulate {
        #[command(flatten)]
        source: MapSource,
        #[arg(short, long, default_value = "600")]
        ticks: u64,
    },
    /// List minimap draw order
    Minimap {
        #[command(flatten)]
        source: MapSource,
    },
}

#[derive(clap::Args)]
struct MapSource {
    /// Map-load message JSON; a generated demo map when omitted
    #[arg(short, long)]
    map: Option<PathBuf>,
    /// Map name for the demo map
    #[arg(long, default_value = "main")]
    name: String,
    /// Seed for the demo map
    #[arg(short, long, default_value = "42")]
    seed: u32,
}

impl MapSource {
    fn load(&self) -> anyhow::Result<MapMsg> {
        match &self.map {
            Some(path) => {
                let data = std::fs::read_to_string(path)
                    .with_context(|| format!("reading map message {}", path.display()))?;
                MapMsg::from_json(&data)
                    .with_context(|| format!("parsing map message {}", path.display()))
            }
            None => Ok(demo_map(&self.name, self.seed)),
        }
    }
}

fn demo_map(name: &str, seed: u32) -> MapMsg {
    MapMsg {
        map_name: name.to_string(),
        seed,
        width: 720.0,
        height: 720.0,
        shore_inset: 48.0,
        grass_inset: 18.0,
        rivers: vec![
            RiverSpec {
                points: vec![
                    Vec2::new(60.0, 420.0),
                    Vec2::new(240.0, 380.0),
                    Vec2::new(420.0, 400.0),
                    Vec2::new(660.0, 340.0),
                ],
                width: 16.0,
                looped: false,
            },
            RiverSpec {
                points: vec![
                    Vec2::new(520.0, 160.0),
                    Vec2::new(580.0, 200.0),
                    Vec2::new(540.0, 260.0),
                    Vec2::new(480.0, 210.0),
                ],
                width: 6.0,
                looped: true,
            },
        ],
        places: vec![Place {
            name: "Pine Hill".into(),
            pos: Vec2::new(200.0, 200.0),
        }],
        objects: vec![
            object("house_red_01", 300.0, 250.0, 0),
            object("warehouse_01", 450.0, 560.0, 1),
            object("tree_01", 220.0, 300.0, 0),
            object("tree_01", 260.0, 520.0, 0),
            object("crate_01", 330.0, 280.0, 0),
            object("stone_01", 150.0, 560.0, 0),
            object("bunker_entrance_01", 560.0, 460.0, 0),
            object("bunker_structure_01", 560.0, 460.0, 0),
        ],
        ground_patches: vec![
            GroundPatch {
                min: Vec2::new(120.0, 120.0),
                max: Vec2::new(220.0, 170.0),
                color: Color(0x6e5c3a),
                roughness: 0.5,
                offset_dist: 4.0,
                order: PatchOrder::BelowGrid,
                use_as_map_shape: true,
            },
            GroundPatch {
                min: Vec2::new(410.0, 530.0),
                max: Vec2::new(490.0, 590.0),
                color: Color(0x4d4d4d),
                roughness: 0.2,
                offset_dist: 1.0,
                order: PatchOrder::AboveGrid,
                use_as_map_shape: false,
            },
        ],
    }
}

fn object(type_name: &str, x: f32, y: f32, ori: u8) -> MapObject {
    MapObject {
        type_name: type_name.into(),
        pos: Vec2::new(x, y),
        ori,
        scale: 1.0,
    }
}

/// Load from `path` when given, otherwise fall back to the built-in value.
fn load_or<T, E>(
    path: Option<&Path>,
    builtin: fn() -> T,
    load: impl FnOnce(&Path) -> Result<T, E>,
) -> anyhow::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match path {
        Some(path) => load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(builtin()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_or(cli.config.as_deref(), WorldConfig::default, |p| {
        WorldConfig::load(p)
    })?;
    let maps = load_or(cli.map_defs.as_deref(), MapDefs::builtin, |p| MapDefs::load(p))?;
    let objects = load_or(cli.object_defs.as_deref(), ObjectDefs::builtin, |p| {
        ObjectDefs::load(p)
    })?;

    match cli.command {
        Commands::Info => {
            println!("isleworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", isleworld_kernel::crate_info());
            println!("terrain: {}", isleworld_terrain::crate_info());
            println!("defs: {}", isleworld_defs::crate_info());
            println!("maps: {}", maps.names().collect::<Vec<_>>().join(", "));
            println!("objects: {}", objects.len());
        }
        Commands::Generate { source, json } => {
            let msg = source.load()?;
            let mut world = World::new(config);
            let map = world.load_map(&msg, &maps)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&*map.terrain)?);
                return Ok(());
            }
            let terrain = &map.terrain;
            println!("map: {} ({}x{}, seed {})", map.name(), map.width, map.height, map.seed);
            println!("shore: {} vertices", terrain.shore.len());
            println!("grass: {} vertices", terrain.grass.len());
            for (i, river) in terrain.rivers.iter().enumerate() {
                println!(
                    "river {i}: width {}, looped {}, shore {} / water {} vertices",
                    river.width,
                    river.looped,
                    river.shore_poly.len(),
                    river.water_poly.len()
                );
            }
            for shaped in map.patches.iter() {
                let (dx, dy) = shaped.patch.divisions();
                println!(
                    "patch {:?}..{:?}: {dx}x{dy} divisions, {} points",
                    shaped.patch.min,
                    shaped.patch.max,
                    shaped.points.len()
                );
            }
            println!("fingerprint: {:016x}", terrain.fingerprint());
        }
        Commands::Classify { source, x, y, layer } => {
            let msg = source.load()?;
            let mut world = World::new(config);
            world.load_map(&msg, &maps)?;
            world.spawn_map_objects(&objects)?;
            let p = Vec2::new(x, y);
            let surface = world.ground_surface(p, Layer(layer))?;
            println!("surface at ({x}, {y}) layer {layer}: {}", surface.kind);
            if let Some(river) = surface.data.river {
                println!("river: {river}");
            }
            if let Some(color) = surface.data.water_color {
                println!("water colour: {color}");
            }
            println!("in ocean: {}", world.is_in_ocean(p)?);
            println!("distance to shore: {:.2}", world.distance_to_shore(p)?);
            println!(
                "under ceiling: {}",
                world.occlusion().inside_building_ceiling(p, false)
            );
        }
        Commands::Simulate { source, ticks } => {
            let msg = source.load()?;
            let mut world = World::new(config);
            world.load_map(&msg, &maps)?;
            let spawned = world.spawn_map_objects(&objects)?;
            println!("spawned {spawned} objects");

            let (w, h) = (msg.width, msg.height);
            let dt = 1.0 / 60.0;
            let particles = [Particle {
                active: true,
                fade: false,
                alpha: 1.0,
            }];
            let mut last_surface = None;
            for tick in 0..ticks {
                let t = tick as f32 / ticks.max(1) as f32;
                let viewer = Vec2::new(w * (0.1 + 0.8 * t), h * 0.35);
                let ctx = world.tick_context(viewer, Layer::GROUND);
                if let Some(report) = world.update(dt, &ctx, &particles) {
                    tracing::debug!(
                        tick = report.tick,
                        failures = report.failures(),
                        "integrity scan"
                    );
                }
                let kind = world.ground_surface(viewer, Layer::GROUND)?.kind;
                if last_surface != Some(kind) {
                    println!("tick {tick}: viewer at ({:.1}, {:.1}) on {kind}", viewer.x, viewer.y);
                    last_surface = Some(kind);
                }
            }
            let visible = world
                .buildings()
                .active_entries()
                .filter(|(_, b)| b.ceiling_visible())
                .count();
            println!("ticks: {}", world.tick());
            println!("visible ceilings: {visible}");
            println!("integrity scans: {}", world.integrity().scans());
            println!("integrity flagged: {}", world.integrity_flagged());
        }
        Commands::Minimap { source } => {
            let msg = source.load()?;
            let mut world = World::new(config);
            world.load_map(&msg, &maps)?;
            for (object, render) in world.minimap_renders(&objects)? {
                println!(
                    "z {:>4}  {:<20} at {:?}: {} shape(s)",
                    render.z_idx,
                    object.type_name,
                    object.pos,
                    render.shapes.len()
                );
            }
            for place in &world.map()?.places {
                println!("place: {} at {:?}", place.name, place.pos);
            }
        }
    }

    Ok(())
}
