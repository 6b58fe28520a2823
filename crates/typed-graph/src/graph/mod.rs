//! The storage contract the typed layer needs from a property graph.
//!
//! Everything here is the interface of an external collaborator: creating
//! elements, reading and writing properties, directional adjacency, a
//! filtered query primitive and optional index capabilities. `MemoryGraph`
//! is the in-process implementation used by tests and tooling.

use crate::error::{FramesError, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod memory;
pub mod query;
pub mod snapshot;

pub use memory::{IndexSupport, MemoryGraph};
pub use query::{Predicate, QueryPlan};
pub use snapshot::GraphSnapshot;

/// Lazy sequence of elements produced by a traversal step.
pub type Frontier<'g, T> = Box<dyn Iterator<Item = T> + 'g>;

/// Stable handle identifying one graph instance for the lifetime of the
/// process. Two stores opened on the same data are distinct instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub Uuid);

impl GraphId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl VertexId {
    /// The native id as a property value, the form a graph-marker takes.
    pub fn to_value(self) -> Value {
        Value::Long(self.0 as i64)
    }
}

/// A vertex or an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Vertex(VertexId),
    Edge(EdgeId),
}

impl From<VertexId> for Element {
    fn from(v: VertexId) -> Self {
        Element::Vertex(v)
    }
}

impl From<EdgeId> for Element {
    fn from(e: EdgeId) -> Self {
        Element::Edge(e)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Vertex(v) => write!(f, "v[{}]", v.0),
            Element::Edge(e) => write!(f, "e[{}]", e.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
    Both,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
            Direction::Both => Direction::Both,
        }
    }
}

/// Storage primitives of a property graph.
///
/// Adjacency calls treat an empty label slice as "every label". The index
/// methods are optional capabilities; the defaults report them as missing.
pub trait PropertyGraph: Send + Sync {
    fn instance_id(&self) -> GraphId;

    fn add_vertex(&self) -> Result<VertexId>;
    fn add_edge(&self, out: VertexId, inn: VertexId, label: &str) -> Result<EdgeId>;
    fn remove_vertex(&self, vertex: VertexId) -> Result<()>;
    fn remove_edge(&self, edge: EdgeId) -> Result<()>;

    fn property(&self, element: Element, key: &str) -> Result<Option<Value>>;
    fn set_property(&self, element: Element, key: &str, value: Value) -> Result<()>;
    fn remove_property(&self, element: Element, key: &str) -> Result<Option<Value>>;
    fn property_keys(&self, element: Element) -> Result<Vec<String>>;

    /// Returns `(out vertex, in vertex, label)`.
    fn edge_endpoints(&self, edge: EdgeId) -> Result<(VertexId, VertexId, String)>;

    fn adjacent_vertices(
        &self,
        vertex: VertexId,
        direction: Direction,
        labels: &[String],
    ) -> Result<Frontier<'_, VertexId>>;

    fn adjacent_edges(
        &self,
        vertex: VertexId,
        direction: Direction,
        labels: &[String],
    ) -> Result<Frontier<'_, EdgeId>>;

    fn vertices(&self) -> Frontier<'_, VertexId>;
    fn edges(&self) -> Frontier<'_, EdgeId>;

    /// Equality scan over vertex properties, using a key index when one
    /// exists.
    fn vertices_with(&self, key: &str, value: &Value) -> Result<Frontier<'_, VertexId>>;

    /// Runs a compiled plan and returns matching vertices.
    fn query_vertices(&self, plan: &QueryPlan) -> Result<Frontier<'_, VertexId>>;
    /// Runs a compiled plan and returns matching edges.
    fn query_edges(&self, plan: &QueryPlan) -> Result<Frontier<'_, EdgeId>>;

    /// Counts what the plan targets: edges for a vertex-centric plan,
    /// vertices otherwise.
    fn query_count(&self, plan: &QueryPlan) -> Result<usize> {
        if plan.anchor.is_some() {
            Ok(self.query_edges(plan)?.count())
        } else {
            Ok(self.query_vertices(plan)?.count())
        }
    }

    fn supports_indices(&self) -> bool {
        false
    }

    /// Looks up `key == value` in a named index. `Ok(None)` means the index
    /// does not exist.
    fn index_get(&self, _index: &str, _key: &str, _value: &Value) -> Result<Option<Vec<VertexId>>> {
        Ok(None)
    }

    fn create_index(&self, _index: &str) -> Result<()> {
        Err(FramesError::Unsupported("named indices"))
    }

    fn index_put(&self, _index: &str, _key: &str, _value: Value, _vertex: VertexId) -> Result<()> {
        Err(FramesError::Unsupported("named indices"))
    }

    fn supports_key_indices(&self) -> bool {
        false
    }

    /// Creates a key index over a vertex property. Fails with `IndexExists`
    /// when one is already present.
    fn create_key_index(&self, _key: &str) -> Result<()> {
        Err(FramesError::Unsupported("key indices"))
    }
}
