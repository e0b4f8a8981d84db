use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use crate::config::load_config;
use crate::engine::{Command, Engine};
use crate::layout::Strategy;
use crate::scene_dump::{scene_dump_string, write_scene_dump};
use crate::schema::SchemaModel;
use crate::state::MemoryLayoutStore;

#[derive(Parser, Debug)]
#[command(name = "erdc", version, about = "ER-diagram layout engine (scene dump)")]
pub struct Args {
    /// Schema model JSON file, or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Persisted layout snapshot to rehydrate before computing the scene
    #[arg(short = 'l', long = "layout")]
    pub layout: Option<PathBuf>,

    /// Auto-arrange strategy to run (layered, snowflake, compact).
    /// Without this, stored positions are kept and only missing entities
    /// are placed.
    #[arg(short = 'a', long = "arrange")]
    pub arrange: Option<String>,

    /// Config JSON/JSON5 file overlaying the engine defaults
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Output file for the scene dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let schema_text = read_input(args.input.as_deref())?;
    let schema = SchemaModel::from_json(&schema_text)?;

    // Single-shot run: the snapshot is preloaded into an in-memory store
    // so the engine rehydrates it exactly as the interactive path would.
    let mut store = MemoryLayoutStore::default();
    if let Some(path) = args.layout.as_deref() {
        store
            .entries
            .insert("cli".to_string(), std::fs::read_to_string(path)?);
    }

    let now = Instant::now();
    let mut engine = Engine::open("cli", schema, store, config, now);
    if let Some(token) = args.arrange.as_deref() {
        let strategy = Strategy::from_token(token)
            .ok_or_else(|| anyhow::anyhow!("unknown arrange strategy: {token}"))?;
        engine.apply(Command::Arrange { strategy }, now);
    }

    match args.output.as_deref() {
        Some(path) => write_scene_dump(path, engine.scene())?,
        None => println!("{}", scene_dump_string(engine.scene())?),
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
