use crate::error::Result;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexRecord {
    pub id: u64,
    pub properties: Vec<(String, Value)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: u64,
    pub out: u64,
    pub inn: u64,
    pub label: String,
    pub properties: Vec<(String, Value)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: String,
    pub value: Value,
    pub vertex: u64,
}

/// On-disk image of a `MemoryGraph`, including the registry vertices that
/// live inside it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub vertices: Vec<VertexRecord>,
    pub edges: Vec<EdgeRecord>,
    pub indices: Vec<(String, Vec<IndexEntry>)>,
    pub key_indices: Vec<String>,
    pub next_id: u64,
}

impl GraphSnapshot {
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = bincode::serialize(self)?;
        fs::write(path, data)?;
        tracing::debug!(
            path = %path.display(),
            vertices = self.vertices.len(),
            edges = self.edges.len(),
            "graph snapshot saved"
        );
        Ok(())
    }

    /// Loads a snapshot; a missing file yields an empty graph.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(GraphSnapshot::default());
        }

        let data = fs::read(path)?;
        let snapshot: GraphSnapshot = bincode::deserialize(&data)?;
        tracing::debug!(
            path = %path.display(),
            vertices = snapshot.vertices.len(),
            edges = snapshot.edges.len(),
            "graph snapshot loaded"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Direction, IndexSupport, MemoryGraph, PropertyGraph};

    #[test]
    fn snapshot_preserves_ids_and_properties() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("graph.bin");

        let g = MemoryGraph::new();
        let a = g.add_vertex()?;
        let b = g.add_vertex()?;
        let e = g.add_edge(a, b, "knows")?;
        g.set_property(a.into(), "name", Value::from("marko"))?;
        g.set_property(e.into(), "weight", Value::Double(0.5))?;
        g.to_snapshot().save_to_file(&path)?;

        let restored = MemoryGraph::from_snapshot(
            GraphSnapshot::load_from_file(&path)?,
            IndexSupport::None,
        )?;
        assert_ne!(restored.instance_id(), g.instance_id());
        assert_eq!(restored.property(a.into(), "name")?, Some(Value::from("marko")));
        assert_eq!(restored.property(e.into(), "weight")?, Some(Value::Double(0.5)));
        let out: Vec<_> = restored.adjacent_vertices(a, Direction::Out, &[])?.collect();
        assert_eq!(out, vec![b]);

        let fresh = restored.add_vertex()?;
        assert!(fresh.0 > e.0);
        Ok(())
    }

    #[test]
    fn missing_file_is_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let snapshot = GraphSnapshot::load_from_file(dir.path().join("absent.bin"))?;
        assert!(snapshot.vertices.is_empty());
        assert_eq!(snapshot.next_id, 0);
        Ok(())
    }
}
