use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sandbox_assets::{Asset, AssetStore, MANIFEST_FILE};
use sandbox_scene::TmxMapSprite;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for the toy sandbox")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, tests, then asset validation
    Check,
    Fmt,
    Clippy,
    Test,
    /// Load every asset module and build every map it declares
    Assets {
        #[arg(default_value = "assets")]
        root: PathBuf,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Check => {
            cargo("fmt", &["fmt", "--all", "--", "--check"])?;
            cargo("clippy", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
            cargo("test", &["test", "--workspace"])?;
            validate_assets(Path::new("assets"))?;
        }
        Commands::Fmt => cargo("fmt", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => {
            cargo("clippy", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?
        }
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Assets { root } => validate_assets(&root)?,
    }
    Ok(())
}

fn cargo(task: &str, args: &[&str]) -> Result<()> {
    println!("==> cargo {task}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {task} failed");
    }
    Ok(())
}

/// Every directory under `root` holding a manifest must load, and each of its
/// maps must build into a map sprite.
fn validate_assets(root: &Path) -> Result<()> {
    println!("==> validating asset modules in {}", root.display());
    let mut store = AssetStore::new();
    let mut modules = 0;
    for entry in std::fs::read_dir(root).with_context(|| format!("reading {}", root.display()))? {
        let dir = entry?.path();
        if !dir.join(MANIFEST_FILE).is_file() {
            continue;
        }
        let refs = store
            .load_module(&dir)
            .with_context(|| format!("loading {}", dir.display()))?;
        println!("    {}: {} assets", dir.display(), refs.len());
        modules += 1;
    }

    let maps: Vec<_> = store
        .refs()
        .filter(|r| matches!(store.get(r), Some(Asset::Map(_))))
        .cloned()
        .collect();
    for map in maps {
        let sprite = TmxMapSprite::new(map.clone(), &store).with_context(|| format!("building {map}"))?;
        let tiles: usize = sprite.layers().iter().map(|l| l.len()).sum();
        println!("    {map}: {} layers, {tiles} sprites", sprite.layers().len());
    }
    println!("    {modules} modules, {} assets", store.len());
    Ok(())
}
