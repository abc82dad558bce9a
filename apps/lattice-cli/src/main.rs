use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::DVec3;
use lattice_common::EngineConfig;
use lattice_ecs::components::{
    MESH_RENDERER_TID, MESH_TID, MeshComponent, Primitive, SCENE_GRAPH_TID, TRANSFORM_TID,
    TransformComponent, VertexAttribute,
};
use lattice_ecs::{NullInstanceIdProvider, World};
use lattice_memory::{BufferLayout, CompositionType};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lattice-cli", about = "CLI tool for lattice operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML engine config; defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info and the effective config
    Info,
    /// Spawn entities and run the frame loop
    Run {
        /// Number of frames to process
        #[arg(short, long, default_value = "10")]
        frames: u64,
        /// Number of entities to spawn
        #[arg(short, long, default_value = "100")]
        entities: u32,
        /// Print arena statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

const TRIANGLE: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
const NORMALS: [f32; 9] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run(config: EngineConfig, frames: u64, entities: u32, json: bool) -> anyhow::Result<()> {
    let mut world = World::with_builtin_components(config)?;

    let mut parent = None;
    for i in 0..entities {
        let uid = world
            .create_entity(&[TRANSFORM_TID, SCENE_GRAPH_TID, MESH_TID, MESH_RENDERER_TID])?
            .uid();
        if let Some(transform) = world.component_of_entity_mut::<TransformComponent>(uid, TRANSFORM_TID) {
            transform.set_translate(DVec3::new(i as f64, 0.0, 0.0));
        }
        // Chain every entity under the first one.
        match parent {
            Some(root) => world.add_child(root, uid)?,
            None => parent = Some(uid),
        }
    }

    if let Some(root) = parent {
        let primitive = Primitive::from_attributes(
            world.memory(),
            BufferLayout::Aos,
            &[
                VertexAttribute {
                    semantic: "POSITION",
                    composition: CompositionType::Vec3,
                    data: &TRIANGLE,
                },
                VertexAttribute {
                    semantic: "NORMAL",
                    composition: CompositionType::Vec3,
                    data: &NORMALS,
                },
            ],
        )?;
        if let Some(mesh) = world.component_of_entity_mut::<MeshComponent>(root, MESH_TID) {
            mesh.add_primitive(primitive);
        }
    }

    let mut provider = NullInstanceIdProvider::default();
    for _ in 0..frames {
        world.process(&mut provider)?;
    }
    tracing::info!(
        frames = world.system().frame_count(),
        entities = world.entities().entity_count(),
        dispatches = world.system().last_frame_dispatches(),
        "frame loop finished"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&world.memory().stats())?);
        return Ok(());
    }
    println!(
        "Processed {} frames over {} entities",
        world.system().frame_count(),
        world.entities().entity_count()
    );
    for stats in world.memory().stats() {
        println!(
            "  {:<16} {:>10} / {:>10} bytes used",
            stats.usage.name(),
            stats.used_byte_length,
            stats.byte_length
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("lattice-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", lattice_common::crate_info());
            println!("memory: {}", lattice_memory::crate_info());
            println!("ecs: {}", lattice_ecs::crate_info());
            print!("{}", serde_yaml::to_string(&config)?);
        }
        Commands::Run {
            frames,
            entities,
            json,
        } => {
            run(config, frames, entities, json)?;
        }
    }

    Ok(())
}
