use super::query::QueryPlan;
use super::snapshot::{EdgeRecord, GraphSnapshot, IndexEntry, VertexRecord};
use super::{Direction, EdgeId, Element, Frontier, GraphId, PropertyGraph, VertexId};
use crate::error::{FramesError, Result};
use crate::value::Value;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

/// Which optional lookup capability a `MemoryGraph` advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexSupport {
    /// Only property scans.
    #[default]
    None,
    /// Named manual indices (`index_get` / `index_put`).
    Named,
    /// Automatic key indices over vertex properties.
    KeyIndex,
}

#[derive(Debug, Default)]
struct VertexData {
    properties: BTreeMap<String, Value>,
    out_edges: Vec<EdgeId>,
    in_edges: Vec<EdgeId>,
}

#[derive(Debug)]
struct EdgeData {
    out: VertexId,
    inn: VertexId,
    label: String,
    properties: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    vertices: BTreeMap<VertexId, VertexData>,
    edges: BTreeMap<EdgeId, EdgeData>,
    indices: BTreeMap<String, Vec<IndexEntry>>,
    key_indices: BTreeSet<String>,
}

impl Inner {
    fn vertex(&self, id: VertexId) -> Result<&VertexData> {
        self.vertices
            .get(&id)
            .ok_or(FramesError::ElementNotFound(Element::Vertex(id)))
    }

    fn edge(&self, id: EdgeId) -> Result<&EdgeData> {
        self.edges
            .get(&id)
            .ok_or(FramesError::ElementNotFound(Element::Edge(id)))
    }

    fn properties(&self, element: Element) -> Result<&BTreeMap<String, Value>> {
        match element {
            Element::Vertex(v) => Ok(&self.vertex(v)?.properties),
            Element::Edge(e) => Ok(&self.edge(e)?.properties),
        }
    }

    fn properties_mut(&mut self, element: Element) -> Result<&mut BTreeMap<String, Value>> {
        let found = match element {
            Element::Vertex(v) => self.vertices.get_mut(&v).map(|d| &mut d.properties),
            Element::Edge(e) => self.edges.get_mut(&e).map(|d| &mut d.properties),
        };
        found.ok_or(FramesError::ElementNotFound(element))
    }

    /// Incident edges in storage order, outgoing before incoming for `Both`.
    fn incident(&self, vertex: VertexId, direction: Direction, labels: &[String]) -> Result<Vec<EdgeId>> {
        let data = self.vertex(vertex)?;
        let lists = match direction {
            Direction::Out => vec![&data.out_edges],
            Direction::In => vec![&data.in_edges],
            Direction::Both => vec![&data.out_edges, &data.in_edges],
        };
        let mut found = Vec::new();
        for list in lists {
            for id in list.iter() {
                let edge = self.edge(*id)?;
                if labels.is_empty() || labels.iter().any(|l| *l == edge.label) {
                    found.push(*id);
                }
            }
        }
        Ok(found)
    }

    /// The vertex at the far end of `edge` when walked from `from`.
    fn far_end(&self, edge: EdgeId, from: VertexId, direction: Direction) -> Result<VertexId> {
        let data = self.edge(edge)?;
        Ok(match direction {
            Direction::Out => data.inn,
            Direction::In => data.out,
            Direction::Both if data.out == from => data.inn,
            Direction::Both => data.out,
        })
    }

    fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Anchored plan: incident edges passing the label set and predicates,
    /// before the limit is applied.
    fn anchored_edges(&self, anchor: VertexId, plan: &QueryPlan) -> Result<Vec<EdgeId>> {
        let mut matched = Vec::new();
        for id in self.incident(anchor, plan.direction, &plan.labels)? {
            let data = self.edge(id)?;
            if plan.matches(|k| data.properties.get(k)) {
                matched.push(id);
            }
        }
        Ok(matched)
    }
}

/// In-memory property graph.
///
/// Ids come from one counter shared by vertices and edges and iteration
/// follows ascending id. Each instance carries its own `GraphId`, including
/// instances rebuilt from a snapshot.
#[derive(Debug)]
pub struct MemoryGraph {
    id: GraphId,
    index_support: IndexSupport,
    inner: RwLock<Inner>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::with_index_support(IndexSupport::None)
    }

    pub fn with_index_support(index_support: IndexSupport) -> Self {
        Self {
            id: GraphId::new(),
            index_support,
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn index_support(&self) -> IndexSupport {
        self.index_support
    }

    pub fn vertex_count(&self) -> usize {
        self.inner.read().vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.read().edges.len()
    }

    /// Captures the full contents of the graph.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let inner = self.inner.read();
        GraphSnapshot {
            vertices: inner
                .vertices
                .iter()
                .map(|(id, data)| VertexRecord {
                    id: id.0,
                    properties: data.properties.clone().into_iter().collect(),
                })
                .collect(),
            edges: inner
                .edges
                .iter()
                .map(|(id, data)| EdgeRecord {
                    id: id.0,
                    out: data.out.0,
                    inn: data.inn.0,
                    label: data.label.clone(),
                    properties: data.properties.clone().into_iter().collect(),
                })
                .collect(),
            indices: inner
                .indices
                .iter()
                .map(|(name, entries)| (name.clone(), entries.clone()))
                .collect(),
            key_indices: inner.key_indices.iter().cloned().collect(),
            next_id: inner.next_id,
        }
    }

    /// Rebuilds a graph from a snapshot as a new instance.
    pub fn from_snapshot(snapshot: GraphSnapshot, index_support: IndexSupport) -> Result<Self> {
        let mut inner = Inner {
            next_id: snapshot.next_id,
            ..Inner::default()
        };
        for record in snapshot.vertices {
            inner.vertices.insert(
                VertexId(record.id),
                VertexData {
                    properties: record.properties.into_iter().collect(),
                    ..VertexData::default()
                },
            );
        }
        for record in snapshot.edges {
            let id = EdgeId(record.id);
            let (out, inn) = (VertexId(record.out), VertexId(record.inn));
            inner
                .vertices
                .get_mut(&out)
                .ok_or(FramesError::ElementNotFound(Element::Vertex(out)))?
                .out_edges
                .push(id);
            inner
                .vertices
                .get_mut(&inn)
                .ok_or(FramesError::ElementNotFound(Element::Vertex(inn)))?
                .in_edges
                .push(id);
            inner.edges.insert(
                id,
                EdgeData {
                    out,
                    inn,
                    label: record.label,
                    properties: record.properties.into_iter().collect(),
                },
            );
        }
        inner.indices = snapshot.indices.into_iter().collect();
        inner.key_indices = snapshot.key_indices.into_iter().collect();
        let max_id = inner
            .vertices
            .keys()
            .map(|v| v.0)
            .chain(inner.edges.keys().map(|e| e.0))
            .max();
        if let Some(max_id) = max_id {
            inner.next_id = inner.next_id.max(max_id + 1);
        }

        Ok(Self {
            id: GraphId::new(),
            index_support,
            inner: RwLock::new(inner),
        })
    }
}

impl PropertyGraph for MemoryGraph {
    fn instance_id(&self) -> GraphId {
        self.id
    }

    fn add_vertex(&self) -> Result<VertexId> {
        let mut inner = self.inner.write();
        let id = VertexId(inner.alloc());
        inner.vertices.insert(id, VertexData::default());
        Ok(id)
    }

    fn add_edge(&self, out: VertexId, inn: VertexId, label: &str) -> Result<EdgeId> {
        if label.is_empty() {
            return Err(FramesError::InvalidArgument("edge label must not be empty".into()));
        }
        let mut inner = self.inner.write();
        inner.vertex(out)?;
        inner.vertex(inn)?;
        let id = EdgeId(inner.alloc());
        inner.edges.insert(
            id,
            EdgeData {
                out,
                inn,
                label: label.to_string(),
                properties: BTreeMap::new(),
            },
        );
        if let Some(data) = inner.vertices.get_mut(&out) {
            data.out_edges.push(id);
        }
        if let Some(data) = inner.vertices.get_mut(&inn) {
            data.in_edges.push(id);
        }
        Ok(id)
    }

    fn remove_vertex(&self, vertex: VertexId) -> Result<()> {
        let mut inner = self.inner.write();
        let data = inner
            .vertices
            .remove(&vertex)
            .ok_or(FramesError::ElementNotFound(Element::Vertex(vertex)))?;
        for edge in data.out_edges.iter().chain(data.in_edges.iter()) {
            if let Some(removed) = inner.edges.remove(edge) {
                let other = if removed.out == vertex { removed.inn } else { removed.out };
                if let Some(other) = inner.vertices.get_mut(&other) {
                    other.out_edges.retain(|e| e != edge);
                    other.in_edges.retain(|e| e != edge);
                }
            }
        }
        for entries in inner.indices.values_mut() {
            entries.retain(|entry| entry.vertex != vertex.0);
        }
        Ok(())
    }

    fn remove_edge(&self, edge: EdgeId) -> Result<()> {
        let mut inner = self.inner.write();
        let data = inner
            .edges
            .remove(&edge)
            .ok_or(FramesError::ElementNotFound(Element::Edge(edge)))?;
        if let Some(out) = inner.vertices.get_mut(&data.out) {
            out.out_edges.retain(|e| *e != edge);
        }
        if let Some(inn) = inner.vertices.get_mut(&data.inn) {
            inn.in_edges.retain(|e| *e != edge);
        }
        Ok(())
    }

    fn property(&self, element: Element, key: &str) -> Result<Option<Value>> {
        Ok(self.inner.read().properties(element)?.get(key).cloned())
    }

    fn set_property(&self, element: Element, key: &str, value: Value) -> Result<()> {
        if key.is_empty() {
            return Err(FramesError::InvalidArgument("property key must not be empty".into()));
        }
        self.inner
            .write()
            .properties_mut(element)?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove_property(&self, element: Element, key: &str) -> Result<Option<Value>> {
        Ok(self.inner.write().properties_mut(element)?.remove(key))
    }

    fn property_keys(&self, element: Element) -> Result<Vec<String>> {
        Ok(self.inner.read().properties(element)?.keys().cloned().collect())
    }

    fn edge_endpoints(&self, edge: EdgeId) -> Result<(VertexId, VertexId, String)> {
        let inner = self.inner.read();
        let data = inner.edge(edge)?;
        Ok((data.out, data.inn, data.label.clone()))
    }

    fn adjacent_vertices(
        &self,
        vertex: VertexId,
        direction: Direction,
        labels: &[String],
    ) -> Result<Frontier<'_, VertexId>> {
        let inner = self.inner.read();
        let vertices = inner
            .incident(vertex, direction, labels)?
            .into_iter()
            .map(|edge| inner.far_end(edge, vertex, direction))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(vertices.into_iter()))
    }

    fn adjacent_edges(
        &self,
        vertex: VertexId,
        direction: Direction,
        labels: &[String],
    ) -> Result<Frontier<'_, EdgeId>> {
        let edges = self.inner.read().incident(vertex, direction, labels)?;
        Ok(Box::new(edges.into_iter()))
    }

    fn vertices(&self) -> Frontier<'_, VertexId> {
        let ids: Vec<VertexId> = self.inner.read().vertices.keys().copied().collect();
        Box::new(ids.into_iter())
    }

    fn edges(&self) -> Frontier<'_, EdgeId> {
        let ids: Vec<EdgeId> = self.inner.read().edges.keys().copied().collect();
        Box::new(ids.into_iter())
    }

    fn vertices_with(&self, key: &str, value: &Value) -> Result<Frontier<'_, VertexId>> {
        let ids: Vec<VertexId> = self
            .inner
            .read()
            .vertices
            .iter()
            .filter(|(_, data)| data.properties.get(key).is_some_and(|v| v.loose_eq(value)))
            .map(|(id, _)| *id)
            .collect();
        Ok(Box::new(ids.into_iter()))
    }

    fn query_vertices(&self, plan: &QueryPlan) -> Result<Frontier<'_, VertexId>> {
        let limit = plan.limit.unwrap_or(usize::MAX);
        let inner = self.inner.read();
        let ids = match plan.anchor {
            Some(anchor) => inner
                .anchored_edges(anchor, plan)?
                .into_iter()
                .take(limit)
                .map(|edge| inner.far_end(edge, anchor, plan.direction))
                .collect::<Result<Vec<_>>>()?,
            None => inner
                .vertices
                .iter()
                .filter(|(_, data)| plan.matches(|k| data.properties.get(k)))
                .map(|(id, _)| *id)
                .take(limit)
                .collect(),
        };
        Ok(Box::new(ids.into_iter()))
    }

    fn query_edges(&self, plan: &QueryPlan) -> Result<Frontier<'_, EdgeId>> {
        let limit = plan.limit.unwrap_or(usize::MAX);
        let inner = self.inner.read();
        let ids: Vec<EdgeId> = match plan.anchor {
            Some(anchor) => inner.anchored_edges(anchor, plan)?.into_iter().take(limit).collect(),
            None => inner
                .edges
                .iter()
                .filter(|(_, data)| plan.label_allowed(&data.label))
                .filter(|(_, data)| plan.matches(|k| data.properties.get(k)))
                .map(|(id, _)| *id)
                .take(limit)
                .collect(),
        };
        Ok(Box::new(ids.into_iter()))
    }

    fn supports_indices(&self) -> bool {
        self.index_support == IndexSupport::Named
    }

    fn index_get(&self, index: &str, key: &str, value: &Value) -> Result<Option<Vec<VertexId>>> {
        if !self.supports_indices() {
            return Ok(None);
        }
        let inner = self.inner.read();
        Ok(inner.indices.get(index).map(|entries| {
            entries
                .iter()
                .filter(|entry| entry.key == key && entry.value.loose_eq(value))
                .map(|entry| VertexId(entry.vertex))
                .collect()
        }))
    }

    fn create_index(&self, index: &str) -> Result<()> {
        if !self.supports_indices() {
            return Err(FramesError::Unsupported("named indices"));
        }
        let mut inner = self.inner.write();
        if inner.indices.contains_key(index) {
            return Err(FramesError::IndexExists(index.to_string()));
        }
        inner.indices.insert(index.to_string(), Vec::new());
        Ok(())
    }

    fn index_put(&self, index: &str, key: &str, value: Value, vertex: VertexId) -> Result<()> {
        if !self.supports_indices() {
            return Err(FramesError::Unsupported("named indices"));
        }
        let mut inner = self.inner.write();
        inner.vertex(vertex)?;
        let entries = inner
            .indices
            .get_mut(index)
            .ok_or_else(|| FramesError::InvalidArgument(format!("no index named `{index}`")))?;
        entries.push(IndexEntry {
            key: key.to_string(),
            value,
            vertex: vertex.0,
        });
        Ok(())
    }

    fn supports_key_indices(&self) -> bool {
        self.index_support == IndexSupport::KeyIndex
    }

    fn create_key_index(&self, key: &str) -> Result<()> {
        if !self.supports_key_indices() {
            return Err(FramesError::Unsupported("key indices"));
        }
        if !self.inner.write().key_indices.insert(key.to_string()) {
            return Err(FramesError::IndexExists(key.to_string()));
        }
        Ok(())
    }
}
