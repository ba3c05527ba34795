use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec2;
use sandbox_assets::AssetStore;
use sandbox_render::{DebugTextRenderer, RenderView, Renderer};
use sandbox_scene::TmxMapSprite;
use sandbox_tools::SceneInspector;
use sandbox_toys::{TmxMapToy, TmxMapToyConfig, ToyHost};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sandbox-cli", about = "Headless host for the toy sandbox")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load the tile-map toy, simulate it and print the final frame
    Run {
        /// Asset module directory
        #[arg(short, long, default_value = "assets/ToyAssets")]
        assets: PathBuf,
        /// JSON file overriding the toy settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "60")]
        ticks: u64,
        /// Seconds per tick
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
    },
    /// Convert a world position to map tile coordinates
    Tile {
        #[arg(short, long, default_value = "assets/ToyAssets")]
        assets: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        x: f32,
        #[arg(long, allow_hyphen_values = true)]
        y: f32,
    },
    /// Look up a tile property on a map layer
    Property {
        #[arg(short, long, default_value = "assets/ToyAssets")]
        assets: PathBuf,
        layer: String,
        name: String,
        x: u32,
        y: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            println!("sandbox-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", sandbox_common::crate_info());
            println!("tmx: {}", sandbox_tmx::crate_info());
            println!("assets: {}", sandbox_assets::crate_info());
            println!("scene: {}", sandbox_scene::crate_info());
            println!("input: {}", sandbox_input::crate_info());
            println!("render: {}", sandbox_render::crate_info());
            println!("tools: {}", sandbox_tools::crate_info());
            println!("toys: {}", sandbox_toys::crate_info());
        }
        Commands::Run {
            assets,
            config,
            ticks,
            dt,
        } => {
            let config = match config {
                Some(path) => TmxMapToyConfig::load(&path)
                    .with_context(|| format!("reading toy config {}", path.display()))?,
                None => TmxMapToyConfig::default(),
            };
            let mut host = ToyHost::new(load_assets(&assets)?);
            host.load_toy(Box::new(TmxMapToy::new(config)))?;
            println!("Loaded {}", host.toy_name().unwrap_or("-"));

            for _ in 0..ticks {
                host.step(dt)?;
            }
            tracing::info!(ticks, elapsed = host.scene().elapsed(), "simulation finished");

            let camera = host.sandbox().camera();
            let view = RenderView {
                center: camera.position,
                zoom: camera.zoom,
                ..RenderView::default()
            };
            print!("{}", DebugTextRenderer::new().render(host.scene(), &view));
            println!("{}", SceneInspector::summary(host.scene()));
            for id in SceneInspector::list_objects(host.scene()) {
                if let Some(info) = SceneInspector::inspect_object(host.scene(), id) {
                    println!("  {info}");
                }
            }
            host.unload();
        }
        Commands::Tile { assets, x, y } => {
            let store = load_assets(&assets)?;
            let map = default_map(&store)?;
            let tile = map.world_coord_to_tile(Vec2::new(x, y));
            println!("world ({x:.2}, {y:.2}) -> tile ({}, {})", tile.x, tile.y);
        }
        Commands::Property {
            assets,
            layer,
            name,
            x,
            y,
        } => {
            let store = load_assets(&assets)?;
            let map = default_map(&store)?;
            match map.tile_property(&layer, &name, x, y) {
                Some(value) => println!("{layer}[{x},{y}].{name} = {value}"),
                None => println!("{layer}[{x},{y}].{name} is not set"),
            }
        }
    }

    Ok(())
}

fn load_assets(dir: &Path) -> anyhow::Result<AssetStore> {
    let mut store = AssetStore::new();
    store
        .load_module(dir)
        .with_context(|| format!("loading asset module {}", dir.display()))?;
    Ok(store)
}

fn default_map(store: &AssetStore) -> anyhow::Result<TmxMapSprite> {
    let map = TmxMapToyConfig::default().map_ref()?;
    Ok(TmxMapSprite::new(map, store)?)
}
