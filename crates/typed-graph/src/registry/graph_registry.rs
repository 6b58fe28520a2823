use super::{read_marker, MarkerKey, ResolvedType, TypeMarker, TypeRegistry};
use crate::config::FramesConfig;
use crate::error::{FramesError, Result};
use crate::graph::{Direction, Element, GraphId, PropertyGraph, VertexId};
use crate::model::{ModelSet, TypeName};
use crate::value::Value;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-instance write locks shared by every registry in the process.
/// Root creation and marker creation hold the lock of their graph.
static GRAPH_WRITERS: Lazy<DashMap<GraphId, Arc<Mutex<()>>>> = Lazy::new(DashMap::new);

fn writer_lock(graph: GraphId) -> Arc<Mutex<()>> {
    GRAPH_WRITERS.entry(graph).or_default().value().clone()
}

/// A marker vertex as found in the graph, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub marker: TypeMarker,
    pub type_name: Option<String>,
}

/// In-memory view of one graph's marker catalog.
#[derive(Debug)]
struct Catalog {
    root: VertexId,
    by_type: HashMap<TypeName, TypeMarker>,
    by_marker: HashMap<MarkerKey, TypeName>,
    /// Registration order, for stable listings.
    order: Vec<TypeName>,
    /// Stored entries this process cannot resolve; warned about once.
    skipped: HashSet<MarkerKey>,
}

impl Catalog {
    fn new(root: VertexId) -> Self {
        Self {
            root,
            by_type: HashMap::new(),
            by_marker: HashMap::new(),
            order: Vec::new(),
            skipped: HashSet::new(),
        }
    }

    fn knows(&self, key: &MarkerKey) -> bool {
        self.by_marker.contains_key(key) || self.skipped.contains(key)
    }

    fn insert(&mut self, ty: TypeName, marker: TypeMarker) {
        self.by_marker.insert(marker.key().clone(), ty.clone());
        self.by_type.insert(ty.clone(), marker);
        self.order.push(ty);
    }
}

type CatalogSlot = Arc<Mutex<Option<Catalog>>>;

/// Registry whose catalog lives in the graph it describes.
///
/// Each graph instance gets its own catalog, loaded on first use and kept
/// until [`TypeRegistry::release`] is called for that instance. Loading and
/// register-if-absent run under a per-instance mutex. Writes to the graph
/// also take a process-wide lock for the instance, and a catalog miss
/// re-reads the stored entries first, so registries sharing a graph adopt
/// each other's markers instead of creating a second one for a type.
pub struct GraphTypeRegistry {
    config: FramesConfig,
    models: Arc<ModelSet>,
    catalogs: DashMap<GraphId, CatalogSlot>,
}

impl GraphTypeRegistry {
    pub fn new(config: FramesConfig, models: Arc<ModelSet>) -> Self {
        Self {
            config,
            models,
            catalogs: DashMap::new(),
        }
    }

    pub fn config(&self) -> &FramesConfig {
        &self.config
    }

    /// Number of graph instances with a live catalog.
    pub fn open_graphs(&self) -> usize {
        self.catalogs.len()
    }

    fn slot(&self, graph: &dyn PropertyGraph) -> CatalogSlot {
        self.catalogs
            .entry(graph.instance_id())
            .or_default()
            .value()
            .clone()
    }

    /// Returns the loaded catalog in `slot`, bootstrapping it on first use.
    fn loaded<'c>(
        &self,
        graph: &dyn PropertyGraph,
        slot: &'c mut Option<Catalog>,
    ) -> Result<&'c mut Catalog> {
        let catalog = match slot.take() {
            Some(catalog) => catalog,
            None => self.bootstrap(graph)?,
        };
        Ok(slot.insert(catalog))
    }

    fn bootstrap(&self, graph: &dyn PropertyGraph) -> Result<Catalog> {
        let graph_id = graph.instance_id();
        let writer = writer_lock(graph_id);
        let _write = writer.lock();
        let Some(root) = self.locate_root(graph)? else {
            let root = self.create_root(graph)?;
            info!(graph = %graph_id, root = root.0, "created type registry root");
            return Ok(Catalog::new(root));
        };

        let mut catalog = Catalog::new(root);
        self.absorb(graph, &mut catalog)?;
        debug!(graph = %graph_id, root = root.0, types = catalog.order.len(), "type catalog loaded");
        Ok(catalog)
    }

    /// Folds marker vertices the catalog has not seen yet into it. Returns
    /// the number of newly resolved entries.
    fn absorb(&self, graph: &dyn PropertyGraph, catalog: &mut Catalog) -> Result<usize> {
        let graph_id = graph.instance_id();
        let mut added = 0;
        for entry in self.entries_of(graph, catalog.root)? {
            let key = entry.marker.key().clone();
            if catalog.knows(&key) {
                continue;
            }
            let Some(name) = entry.type_name else {
                warn!(graph = %graph_id, marker = %entry.marker, "marker vertex has no type name; skipped");
                catalog.skipped.insert(key);
                continue;
            };
            let Some(descriptor) = self.models.resolve(&name) else {
                warn!(graph = %graph_id, marker = %entry.marker, type_name = %name, "stored type is unknown to this process; skipped");
                catalog.skipped.insert(key);
                continue;
            };
            let ty = descriptor.name.clone();
            added += 1;
            if let Some(first) = catalog.by_type.get(&ty) {
                warn!(
                    graph = %graph_id,
                    type_name = %ty,
                    kept = %first,
                    alias = %entry.marker,
                    "duplicate marker vertex for type; treating as alias"
                );
                catalog.by_marker.insert(key, ty);
                continue;
            }
            catalog.insert(ty, entry.marker);
        }
        Ok(added)
    }

    /// Re-reads the stored entries of a loaded catalog, picking up markers
    /// written by other registries since it was loaded.
    fn refresh(&self, graph: &dyn PropertyGraph, catalog: &mut Catalog) -> Result<()> {
        let added = self.absorb(graph, catalog)?;
        if added > 0 {
            debug!(graph = %graph.instance_id(), added, "type catalog refreshed from graph");
        }
        Ok(())
    }

    /// Finds the registry root: named index first, then a key index backed
    /// scan, then a plain property scan.
    fn locate_root(&self, graph: &dyn PropertyGraph) -> Result<Option<VertexId>> {
        let key = &self.config.registry_root_property;
        let flag = Value::Bool(true);

        if graph.supports_indices() {
            if let Some(hits) = graph.index_get(&self.config.registry_index, key, &flag)? {
                debug!(index = %self.config.registry_index, hits = hits.len(), "registry root lookup via named index");
                return Ok(self.pick_root(graph, hits));
            }
        }

        if graph.supports_key_indices() {
            match graph.create_key_index(key) {
                Ok(()) => debug!(key = %key, "created key index for registry root"),
                Err(FramesError::IndexExists(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let hits: Vec<VertexId> = graph.vertices_with(key, &flag)?.collect();
        debug!(key = %key, hits = hits.len(), "registry root lookup via property scan");
        let root = self.pick_root(graph, hits);
        if let Some(root) = root {
            if graph.supports_indices() {
                self.index_root(graph, root)?;
            }
        }
        Ok(root)
    }

    fn pick_root(&self, graph: &dyn PropertyGraph, mut hits: Vec<VertexId>) -> Option<VertexId> {
        hits.sort();
        if hits.len() > 1 {
            warn!(
                graph = %graph.instance_id(),
                roots = hits.len(),
                kept = hits[0].0,
                "multiple type registry roots; using the first"
            );
        }
        hits.first().copied()
    }

    fn create_root(&self, graph: &dyn PropertyGraph) -> Result<VertexId> {
        let root = graph.add_vertex()?;
        graph.set_property(root.into(), &self.config.registry_root_property, Value::Bool(true))?;
        if graph.supports_indices() {
            self.index_root(graph, root)?;
        }
        Ok(root)
    }

    fn index_root(&self, graph: &dyn PropertyGraph, root: VertexId) -> Result<()> {
        let index = &self.config.registry_index;
        match graph.create_index(index) {
            Ok(()) => {}
            Err(FramesError::IndexExists(_)) => {
                let indexed = graph
                    .index_get(index, &self.config.registry_root_property, &Value::Bool(true))?
                    .unwrap_or_default();
                if indexed.contains(&root) {
                    return Ok(());
                }
            }
            Err(e) => return Err(e),
        }
        graph.index_put(index, &self.config.registry_root_property, Value::Bool(true), root)
    }

    fn entries_of(&self, graph: &dyn PropertyGraph, root: VertexId) -> Result<Vec<StoredEntry>> {
        let labels = [self.config.marker_label.clone()];
        let mut entries = Vec::new();
        for vertex in graph.adjacent_vertices(root, Direction::Out, &labels)? {
            let type_name = graph
                .property(vertex.into(), &self.config.type_name_property)?
                .and_then(|v| v.as_str().map(str::to_string));
            entries.push(StoredEntry {
                marker: TypeMarker::of_vertex(vertex),
                type_name,
            });
        }
        Ok(entries)
    }

    /// Root lookup that never writes: no key index, no index backfill.
    fn find_root(&self, graph: &dyn PropertyGraph) -> Result<Option<VertexId>> {
        let key = &self.config.registry_root_property;
        let flag = Value::Bool(true);
        if graph.supports_indices() {
            if let Some(hits) = graph.index_get(&self.config.registry_index, key, &flag)? {
                return Ok(self.pick_root(graph, hits));
            }
        }
        let hits = graph.vertices_with(key, &flag)?.collect();
        Ok(self.pick_root(graph, hits))
    }

    /// Raw listing of the marker vertices stored in `graph`, resolved or
    /// not. Read-only: the graph is left untouched even when it has no root
    /// or its root is not indexed yet.
    pub fn stored_entries(&self, graph: &dyn PropertyGraph) -> Result<Vec<StoredEntry>> {
        match self.find_root(graph)? {
            Some(root) => self.entries_of(graph, root),
            None => Ok(Vec::new()),
        }
    }
}

impl TypeRegistry for GraphTypeRegistry {
    fn type_property(&self) -> &str {
        &self.config.type_property
    }

    fn ensure_registered(&self, graph: &dyn PropertyGraph, ty: &TypeName) -> Result<TypeMarker> {
        if !self.models.contains(ty) {
            return Err(FramesError::UnknownModel(ty.to_string()));
        }
        let slot = self.slot(graph);
        let mut guard = slot.lock();
        let catalog = self.loaded(graph, &mut guard)?;
        if let Some(marker) = catalog.by_type.get(ty) {
            return Ok(marker.clone());
        }

        let writer = writer_lock(graph.instance_id());
        let _write = writer.lock();
        self.refresh(graph, catalog)?;
        if let Some(marker) = catalog.by_type.get(ty) {
            debug!(graph = %graph.instance_id(), type_name = %ty, marker = %marker, "adopted stored type marker");
            return Ok(marker.clone());
        }

        let vertex = graph.add_vertex()?;
        graph.set_property(
            vertex.into(),
            &self.config.type_name_property,
            Value::String(ty.to_string()),
        )?;
        graph.add_edge(catalog.root, vertex, &self.config.marker_label)?;
        let marker = TypeMarker::of_vertex(vertex);
        catalog.insert(ty.clone(), marker.clone());
        debug!(graph = %graph.instance_id(), type_name = %ty, marker = %marker, "registered type marker");
        Ok(marker)
    }

    fn try_resolve_type(
        &self,
        graph: &dyn PropertyGraph,
        element: Element,
    ) -> Result<Option<ResolvedType>> {
        let Some((value, key)) = read_marker(graph, element, &self.config.type_property)? else {
            return Ok(None);
        };
        let slot = self.slot(graph);
        let mut guard = slot.lock();
        let catalog = self.loaded(graph, &mut guard)?;
        if !catalog.by_marker.contains_key(&key) {
            self.refresh(graph, catalog)?;
        }
        match catalog.by_marker.get(&key) {
            // Aliases resolve to the canonical marker of their type.
            Some(ty) => Ok(Some(ResolvedType {
                marker: catalog
                    .by_type
                    .get(ty)
                    .cloned()
                    .unwrap_or(TypeMarker { value, key }),
                type_name: ty.clone(),
            })),
            None => Err(FramesError::UnknownTypeMarker {
                graph: graph.instance_id(),
                element,
                marker: value,
            }),
        }
    }

    fn catalog_for(&self, graph: &dyn PropertyGraph) -> Result<Vec<TypeName>> {
        let slot = self.slot(graph);
        let mut guard = slot.lock();
        Ok(self.loaded(graph, &mut guard)?.order.clone())
    }

    fn release(&self, graph: GraphId) -> bool {
        GRAPH_WRITERS.remove_if(&graph, |_, lock| Arc::strong_count(lock) == 1);
        self.catalogs.remove(&graph).is_some()
    }
}
