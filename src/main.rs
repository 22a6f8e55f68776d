//! mcworld: command-line tools for Minecraft save files.
//!
//! Set `RUST_LOG=debug` for per-chunk logging.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use mcworld::nbt::{Document, json};
use mcworld::region::{self, RegionPos, compression, lock};
use mcworld::{FlatGenerator, Region, RegionFormat, World};

#[derive(Parser)]
#[command(name = "mcworld", about = "Inspect and build Minecraft NBT, region and world files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dump an NBT file (stdin when no file is given)
    Nbtdump {
        file: Option<PathBuf>,
        /// Input is gzip-compressed (e.g. level.dat)
        #[arg(short, long)]
        gzip: bool,
        /// Print JSON instead of the tree dump
        #[arg(short, long)]
        json: bool,
    },
    /// List the chunks stored in a region file
    Regiondump {
        file: PathBuf,
        /// Also dump each chunk's NBT tree
        #[arg(short, long)]
        verbose: bool,
    },
    /// Write a region whose every chunk is a flat bedrock and stone floor
    Mkregion {
        dst: PathBuf,
        /// Region coordinates, as `x,z`
        #[arg(value_parser = parse_pos, allow_hyphen_values = true)]
        pos: RegionPos,
    },
    /// Create a new world directory with a flat spawn region
    Mkworld {
        dir: PathBuf,
        #[arg(short, long, default_value = "mcworld")]
        name: String,
    },
}

fn parse_pos(s: &str) -> Result<RegionPos, String> {
    let (x, z) = s.split_once(',').ok_or("expected x,z")?;
    let x = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let z = z.trim().parse().map_err(|e| format!("bad z: {e}"))?;
    Ok(RegionPos::new(x, z))
}

fn now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

fn nbtdump(file: Option<PathBuf>, gzip: bool, as_json: bool) -> Result<()> {
    let raw = match &file {
        Some(path) => fs::read(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("reading stdin")?;
            buf
        }
    };
    let nbt = if gzip {
        compression::gunzip(&raw, compression::DECOMPRESS_LIMIT)?
    } else {
        raw
    };
    let doc = Document::decode(&nbt).context("decoding NBT")?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&json::to_json(&doc))?);
    } else {
        print!("{}", doc);
    }
    Ok(())
}

fn regiondump(file: PathBuf, verbose: bool) -> Result<()> {
    let region = Region::open(&file).with_context(|| format!("opening {}", file.display()))?;
    println!("Opened region: {}", file.display());

    let mut bad = 0;
    for (x, z) in region.populated() {
        let ts = region.get_timestamp(x, z)?;
        match region.get_chunk(x, z) {
            Ok(Some(chunk)) => {
                let chunk = lock(&chunk);
                let pos = chunk
                    .pos()
                    .map(|(cx, cz)| format!("{cx},{cz}"))
                    .unwrap_or_else(|| "?".into());
                println!("Got chunk x={x}, z={z} pos={pos} timestamp={ts}");
                if verbose {
                    print!("{}", chunk.document());
                }
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Slot ({}, {}) unreadable: {}", x, z, e);
                bad += 1;
            }
        }
    }
    if bad > 0 {
        bail!("{bad} unreadable chunks in {}", file.display());
    }
    Ok(())
}

fn mkregion(dst: PathBuf, pos: RegionPos) -> Result<()> {
    println!("mkregion {} {},{}", dst.display(), pos.x, pos.z);
    let mut region = Region::create(&dst, pos)
        .with_context(|| format!("creating {}", dst.display()))?;
    FlatGenerator::default().fill_region(&mut region, now())?;
    region.save()?;
    println!("{} saved", dst.display());
    Ok(())
}

fn mkworld(dir: PathBuf, name: String) -> Result<()> {
    let mut world = World::create(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let generator = FlatGenerator::default();
    let level = world.level_mut();
    level.set_name(&name)?;
    level.set_spawn(8, generator.layers().len() as i32, 8)?;
    level.set_last_played(i64::from(now()) * 1000)?;

    let region = world
        .overworld_mut()
        .new_region(0, 0, RegionFormat::McRegion)?;
    generator.fill_region(&mut lock(&region), now())?;
    world.save()?;
    println!(
        "Created world {:?} in {} ({} chunks)",
        name,
        dir.display(),
        region::SLOTS
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Nbtdump { file, gzip, json } => nbtdump(file, gzip, json),
        Command::Regiondump { file, verbose } => regiondump(file, verbose),
        Command::Mkregion { dst, pos } => mkregion(dst, pos),
        Command::Mkworld { dir, name } => mkworld(dir, name),
    }
}
