//! Batch driver: parse new demos, fold them into the exported statistics
//! and regenerate the heatmap point files.
//!
//! Run with: cargo run --bin prdemo-stats -- --demos ./demos --data ./data

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use prdemo_stats::{
    build_map_list, export_map, import_document, parse_demo, parse_map_document, HeatPoint,
    MapRegistry, Provenance, StatsTree, MIN_DEMO_SIZE,
};

#[derive(Parser)]
#[command(name = "prdemo-stats")]
#[command(about = "Parse PRDemo files and roll them up into map statistics")]
struct Args {
    /// Directory holding new .PRdemo files
    #[arg(long, default_value = "./demos")]
    demos: PathBuf,

    /// Output directory for statistics and heatmap documents
    #[arg(long, default_value = "./data")]
    data: PathBuf,

    /// Map registry with scale factors and display names
    #[arg(long, default_value = "./input/maps.json")]
    maps: PathBuf,

    /// Delete demo files after a successful parse
    #[arg(long)]
    remove_parsed: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let registry = MapRegistry::load(&args.maps);
    let mut tree = StatsTree::new();

    let imported = import_existing(&mut tree, &args.data);
    tracing::info!(rounds = imported, "imported existing statistics");

    let mut parsed = 0usize;
    let mut skipped = 0usize;
    for path in walk_files(&args.demos) {
        if path.extension().map(|e| e != "PRdemo").unwrap_or(true) {
            continue;
        }
        if fs::metadata(&path).map(|m| m.len() <= MIN_DEMO_SIZE).unwrap_or(true) {
            continue;
        }
        let raw = fs::read(&path)?;
        match parse_demo(&raw, &registry) {
            Ok(record) => {
                tree.insert(record, Provenance::Fresh);
                parsed += 1;
                if args.remove_parsed {
                    let _ = fs::remove_file(&path);
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping demo");
                skipped += 1;
            }
        }
    }
    tracing::info!(parsed, skipped, "demo parsing finished");

    seed_route_heatmaps(&mut tree, &args.data);
    tree.rollup();

    for grid in tree.merge_heatmaps() {
        let dir = args.data.join(&grid.version).join(&grid.map);
        fs::create_dir_all(&dir)?;
        let points = grid.grid.to_points();
        fs::write(
            dir.join(format!("{}.json", grid.name)),
            serde_json::to_string(&points)?,
        )?;
    }

    for (version, maps) in &tree.versions {
        for (map_name, map) in maps {
            let dir = args.data.join(version).join(map_name);
            fs::create_dir_all(&dir)?;
            let doc = export_map(map);
            fs::write(
                dir.join("statistics.json"),
                serde_json::to_string_pretty(&doc)?,
            )?;
        }
    }

    let map_list = build_map_list(&tree, &registry);
    fs::create_dir_all(&args.data)?;
    fs::write(
        args.data.join("maplist.json"),
        serde_json::to_string_pretty(&map_list)?,
    )?;
    tracing::info!(maps = map_list.maps.len(), "map list written");

    Ok(())
}

/// Re-import every statistics.json below the data directory.
fn import_existing(tree: &mut StatsTree, data: &Path) -> usize {
    let mut imported = 0;
    for path in walk_files(data) {
        if path.file_name().map(|n| n != "statistics.json").unwrap_or(true) {
            continue;
        }
        let parsed = fs::read_to_string(&path)
            .map_err(prdemo_stats::Error::from)
            .and_then(|json| parse_map_document(&json));
        match parsed {
            Ok(doc) => imported += import_document(tree, &doc),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "ignoring statistics file")
            }
        }
    }
    imported
}

/// Seed each route's retained grid from its persisted point file.
fn seed_route_heatmaps(tree: &mut StatsTree, data: &Path) {
    for (version, maps) in &mut tree.versions {
        for (map_name, map) in maps {
            for mode in map.game_modes.values_mut() {
                for layer in mode.layers.values_mut() {
                    for route in layer.routes.values_mut() {
                        let path = data
                            .join(version)
                            .join(map_name)
                            .join(format!("{}.json", route.id));
                        let Ok(json) = fs::read_to_string(&path) else {
                            continue;
                        };
                        match serde_json::from_str::<Vec<HeatPoint>>(&json) {
                            Ok(points) => {
                                route.seed_heatmap(&prdemo_stats::HeatmapGrid::from_points(&points))
                            }
                            Err(error) => {
                                tracing::warn!(path = %path.display(), %error, "bad heatmap file")
                            }
                        }
                    }
                }
            }
        }
    }
}

/// All regular files below a directory, sorted for stable processing order.
fn walk_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return files;
    };
    let mut entries: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    entries.sort();
    for path in entries {
        if path.is_dir() {
            files.extend(walk_files(&path));
        } else {
            files.push(path);
        }
    }
    files
}
