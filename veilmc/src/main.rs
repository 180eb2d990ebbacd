use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use veilmc_format::persist;
use veilmc_storage::{DisguiseArchive, FileArchive};
use veilmc_world::{AnyBlock, BlockState, Coordinate, PartitionId, SpatialStateStore};

#[derive(Parser)]
#[command(name = "veilmc", about = "Offline tools for a world's block disguise data")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what a world's disguise file contains
    Inspect {
        world_folder: PathBuf,

        /// Print every entry as JSON instead of per-dimension counts
        #[arg(long)]
        json: bool,

        #[arg(long, env = "VEILMC_MOD_ID", default_value = "veilmc")]
        mod_id: String,
    },
    /// Replace a world's disguise file with an empty one
    Reset {
        world_folder: PathBuf,

        #[arg(long, env = "VEILMC_MOD_ID", default_value = "veilmc")]
        mod_id: String,
    },
}

#[derive(Serialize)]
struct EntryRow<'a> {
    dimension: PartitionId,
    pos: Coordinate,
    displayed: &'a BlockState,
    underlying: &'a BlockState,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let result = match args.command {
        Command::Inspect {
            world_folder,
            json,
            mod_id,
        } => inspect(&world_folder, &mod_id, json).await,
        Command::Reset { world_folder, mod_id } => reset(&world_folder, &mod_id).await,
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn read_store(archive: &FileArchive) -> Result<SpatialStateStore> {
    let Some(data) = archive.load().await? else {
        return Ok(SpatialStateStore::new());
    };
    // Offline there is no registry, so every identifier is accepted.
    let decoded = persist::decode_compressed(&data, &AnyBlock)
        .with_context(|| format!("{} is not a valid disguise file", archive.path().display()))?;
    if decoded.report.skipped > 0 {
        log::warn!("Skipped {} unreadable records", decoded.report.skipped);
    }
    Ok(decoded.store)
}

async fn inspect(world_folder: &Path, mod_id: &str, json: bool) -> Result<()> {
    let archive = FileArchive::new(world_folder, mod_id);
    let store = read_store(&archive).await?;

    if json {
        let rows: Vec<EntryRow> = store
            .partitions()
            .into_iter()
            .flat_map(|dimension| {
                store.entries(dimension).into_iter().map(move |(pos, entry)| EntryRow {
                    dimension,
                    pos,
                    displayed: &entry.displayed,
                    underlying: &entry.underlying,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", summary(&store, archive.path()));
    }
    Ok(())
}

fn summary(store: &SpatialStateStore, path: &Path) -> String {
    let mut out = format!("{}: {} disguises\n", path.display(), store.len());
    for dimension in store.partitions() {
        out.push_str(&format!("  dimension {}: {}\n", dimension, store.partition_len(dimension)));
    }
    out
}

async fn reset(world_folder: &Path, mod_id: &str) -> Result<()> {
    let archive = FileArchive::new(world_folder, mod_id);
    let data = persist::encode_compressed(&SpatialStateStore::new())?;
    archive.save(&data).await?;
    log::info!("Reset {}", archive.path().display());
    Ok(())
}
