//! Typed access to a graph through an explicit registry and view factory.
//!
//! A [`FramesContext`] holds the model set, the type registry and the view
//! factory. Binding it to a graph yields a [`FramedGraph`], which resolves
//! element types, creates typed elements and runs the typed variants of the
//! traversal combinators.

use crate::config::FramesConfig;
use crate::error::Result;
use crate::graph::{Direction, EdgeId, Element, PropertyGraph, VertexId};
use crate::model::{Model, ModelSet, ModelViews, TypeName, ViewFactory};
use crate::query::{Filterable, GraphQuery, TypedQuery, VertexQuery};
use crate::registry::{GraphTypeRegistry, ResolvedType, TypeRegistry};
use crate::selector::Selector;
use crate::traversal::{Labels, Walk};
use std::sync::Arc;

/// Iterator of typed results; `Ok(None)` marks an element that could not be
/// viewed as the requested model.
pub type Typed<'g, T> = Box<dyn Iterator<Item = Result<Option<T>>> + 'g>;

/// The registry and view factory every typed operation runs against.
pub struct FramesContext<V = ModelViews> {
    models: Arc<ModelSet>,
    registry: Arc<dyn TypeRegistry>,
    views: V,
}

impl FramesContext<ModelViews> {
    pub fn new(models: Arc<ModelSet>, registry: Arc<dyn TypeRegistry>) -> Self {
        Self::with_views(models, registry, ModelViews)
    }

    /// Context backed by a [`GraphTypeRegistry`].
    pub fn with_graph_registry(config: FramesConfig, models: Arc<ModelSet>) -> Self {
        let registry = Arc::new(GraphTypeRegistry::new(config, Arc::clone(&models)));
        Self::new(models, registry)
    }
}

impl<V: ViewFactory> FramesContext<V> {
    pub fn with_views(models: Arc<ModelSet>, registry: Arc<dyn TypeRegistry>, views: V) -> Self {
        Self {
            models,
            registry,
            views,
        }
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    pub fn registry(&self) -> &dyn TypeRegistry {
        self.registry.as_ref()
    }

    pub fn bind<'g>(&'g self, graph: &'g dyn PropertyGraph) -> FramedGraph<'g, V> {
        FramedGraph {
            graph,
            context: self,
        }
    }

    /// Drops the registry's cached state for `graph`.
    pub fn release(&self, graph: &dyn PropertyGraph) -> bool {
        self.registry.release(graph.instance_id())
    }
}

/// A graph seen through a [`FramesContext`].
pub struct FramedGraph<'g, V> {
    graph: &'g dyn PropertyGraph,
    context: &'g FramesContext<V>,
}

impl<V> Clone for FramedGraph<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for FramedGraph<'_, V> {}

impl<'g, V: ViewFactory> FramedGraph<'g, V> {
    pub fn graph(&self) -> &'g dyn PropertyGraph {
        self.graph
    }

    pub fn registry(&self) -> &'g dyn TypeRegistry {
        self.context.registry.as_ref()
    }

    pub fn resolve_type(&self, element: Element) -> Result<Option<ResolvedType>> {
        self.registry().try_resolve_type(self.graph, element)
    }

    /// Views `element` as `T`. Untyped elements and incompatible types give
    /// `Ok(None)`; an unknown marker is an error.
    pub fn frame<T: Model>(&self, element: Element) -> Result<Option<T>> {
        let Some(resolved) = self.resolve_type(element)? else {
            return Ok(None);
        };
        Ok(self
            .context
            .views
            .materialize::<T>(&self.context.models, element, &resolved.type_name))
    }

    pub fn catalog(&self) -> Result<Vec<TypeName>> {
        self.registry().catalog_for(self.graph)
    }

    /// Creates a vertex stamped as `T`.
    pub fn add_vertex<T: Model>(&self) -> Result<T> {
        let marker = self
            .registry()
            .ensure_registered(self.graph, &TypeName::of::<T>())?;
        let vertex = self.graph.add_vertex()?;
        self.graph
            .set_property(vertex.into(), self.registry().type_property(), marker.value().clone())?;
        Ok(T::from_element(vertex.into()))
    }

    /// Creates an edge stamped as `T`.
    pub fn add_edge<T: Model>(&self, out: VertexId, inn: VertexId, label: &str) -> Result<T> {
        let marker = self
            .registry()
            .ensure_registered(self.graph, &TypeName::of::<T>())?;
        let edge = self.graph.add_edge(out, inn, label)?;
        self.graph
            .set_property(edge.into(), self.registry().type_property(), marker.value().clone())?;
        Ok(T::from_element(edge.into()))
    }

    /// Connects `source` to `target` through the relation member of `S`,
    /// honouring its label and direction.
    pub fn link<S: Model>(&self, source: VertexId, target: VertexId, member_ref: &str) -> Result<EdgeId> {
        let selector = Selector::resolve::<S>(member_ref)?;
        match selector.direction {
            Some(Direction::In) => self.graph.add_edge(target, source, &selector.key),
            _ => self.graph.add_edge(source, target, &selector.key),
        }
    }

    /// Every vertex stamped with exactly `T`'s marker.
    pub fn vertices_of<T: Model + 'g>(&self) -> Result<Typed<'g, T>> {
        let marker = self
            .registry()
            .ensure_registered(self.graph, &TypeName::of::<T>())?;
        let mut query = GraphQuery::new(self.graph);
        query.has(self.registry().type_property(), marker.value().clone());
        let framed = *self;
        Ok(Box::new(
            query.vertices()?.map(move |v| framed.frame::<T>(v.into())),
        ))
    }

    pub fn query(&self) -> GraphQuery<'g> {
        GraphQuery::new(self.graph)
    }

    pub fn vertex_query(&self, vertex: VertexId) -> VertexQuery<'g> {
        VertexQuery::new(self.graph, vertex)
    }

    pub fn typed_query<T: Model + 'g>(&self) -> TypedQuery<'g, T, V> {
        TypedQuery::new(*self)
    }

    /// Walks the relation `member_ref` of `S` from `source` in `direction`
    /// and frames each reached vertex as `T`.
    pub fn typed_vertices<S: Model, T: Model + 'g>(
        &self,
        source: VertexId,
        member_ref: &str,
        direction: Direction,
        branch_factor: Option<usize>,
    ) -> Result<Typed<'g, T>> {
        let walk = self.walk::<S>(member_ref, direction, branch_factor)?;
        let framed = *self;
        Ok(Box::new(
            walk.vertices(self.graph, source)?
                .map(move |v| framed.frame::<T>(v.into())),
        ))
    }

    /// Edge counterpart of [`typed_vertices`](Self::typed_vertices).
    pub fn typed_edges<S: Model, T: Model + 'g>(
        &self,
        source: VertexId,
        member_ref: &str,
        direction: Direction,
        branch_factor: Option<usize>,
    ) -> Result<Typed<'g, T>> {
        let walk = self.walk::<S>(member_ref, direction, branch_factor)?;
        let framed = *self;
        Ok(Box::new(
            walk.edges(self.graph, source)?
                .map(move |e| framed.frame::<T>(e.into())),
        ))
    }

    fn walk<S: Model>(
        &self,
        member_ref: &str,
        direction: Direction,
        branch_factor: Option<usize>,
    ) -> Result<Walk> {
        let selector = Selector::resolve::<S>(member_ref)?;
        Ok(Walk {
            direction,
            labels: Labels::Explicit(vec![selector.key]),
            branch_factor,
        })
    }

    pub fn typed_in<S: Model, T: Model + 'g>(&self, source: VertexId, member_ref: &str) -> Result<Typed<'g, T>> {
        self.typed_vertices::<S, T>(source, member_ref, Direction::In, None)
    }

    pub fn typed_out<S: Model, T: Model + 'g>(&self, source: VertexId, member_ref: &str) -> Result<Typed<'g, T>> {
        self.typed_vertices::<S, T>(source, member_ref, Direction::Out, None)
    }

    pub fn typed_both<S: Model, T: Model + 'g>(&self, source: VertexId, member_ref: &str) -> Result<Typed<'g, T>> {
        self.typed_vertices::<S, T>(source, member_ref, Direction::Both, None)
    }

    pub fn typed_in_e<S: Model, T: Model + 'g>(&self, source: VertexId, member_ref: &str) -> Result<Typed<'g, T>> {
        self.typed_edges::<S, T>(source, member_ref, Direction::In, None)
    }

    pub fn typed_out_e<S: Model, T: Model + 'g>(&self, source: VertexId, member_ref: &str) -> Result<Typed<'g, T>> {
        self.typed_edges::<S, T>(source, member_ref, Direction::Out, None)
    }

    pub fn typed_both_e<S: Model, T: Model + 'g>(&self, source: VertexId, member_ref: &str) -> Result<Typed<'g, T>> {
        self.typed_edges::<S, T>(source, member_ref, Direction::Both, None)
    }

    /// Follows a relation member in the direction its override declares,
    /// `Out` when it has none.
    pub fn related<S: Model, T: Model + 'g>(&self, source: VertexId, member_ref: &str) -> Result<Typed<'g, T>> {
        let direction = Selector::resolve::<S>(member_ref)?
            .direction
            .unwrap_or(Direction::Out);
        self.typed_vertices::<S, T>(source, member_ref, direction, None)
    }

    /// Frames an arbitrary untyped frontier, e.g. the output of a loop.
    pub fn frame_all<T, I>(&self, elements: I) -> Typed<'g, T>
    where
        T: Model + 'g,
        I: IntoIterator,
        I::IntoIter: 'g,
        I::Item: Into<Element>,
    {
        let framed = *self;
        Box::new(
            elements
                .into_iter()
                .map(move |element| framed.frame::<T>(element.into())),
        )
    }
}

/// Adapter that drops elements without a view and keeps errors.
pub struct OfType<I> {
    inner: I,
}

impl<I, T> Iterator for OfType<I>
where
    I: Iterator<Item = Result<Option<T>>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(Some(view)) => return Some(Ok(view)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

pub trait OfTypeExt<T>: Iterator<Item = Result<Option<T>>> + Sized {
    /// Keeps only the elements that materialized as the requested model.
    fn of_type(self) -> OfType<Self> {
        OfType { inner: self }
    }
}

impl<I, T> OfTypeExt<T> for I where I: Iterator<Item = Result<Option<T>>> {}

