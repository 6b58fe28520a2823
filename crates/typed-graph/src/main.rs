use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use synapse_frames::graph::{GraphSnapshot, IndexSupport};
use synapse_frames::{FramesConfig, GraphTypeRegistry, MemoryGraph, ModelSet, PropertyGraph};
use tracing::info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Snapshot path from the first argument, then env, then default
    let path: PathBuf = env::args()
        .nth(1)
        .or_else(|| env::var("FRAMES_SNAPSHOT_PATH").ok())
        .unwrap_or_else(|| "data/graph.bin".to_string())
        .into();

    let config = FramesConfig::from_env()?;
    let snapshot = GraphSnapshot::load_from_file(&path)?;
    let graph = MemoryGraph::from_snapshot(snapshot, IndexSupport::Named)?;
    info!(path = %path.display(), graph = %graph.instance_id(), "snapshot loaded");

    println!("Snapshot: {}", path.display());
    println!("Vertices: {}", graph.vertex_count());
    println!("Edges:    {}", graph.edge_count());

    // Listing only; no models are needed to read raw entries.
    let registry = GraphTypeRegistry::new(config, Arc::new(ModelSet::default()));
    let entries = registry.stored_entries(&graph)?;
    println!("Registered types: {}", entries.len());
    for entry in entries {
        println!(
            "  {:>8}  {}",
            entry.marker.to_string(),
            entry.type_name.as_deref().unwrap_or("<unnamed>")
        );
    }
    Ok(())
}
