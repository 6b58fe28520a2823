//! Fluent filter builders compiled to the storage query primitive.
//!
//! Builders mutate in place. Each terminal call runs the accumulated plan
//! again; nothing is cached between calls.

use crate::error::Result;
use crate::framed::FramedGraph;
use crate::graph::{Direction, EdgeId, Frontier, Predicate, PropertyGraph, QueryPlan, VertexId};
use crate::model::{Model, ViewFactory};
use crate::selector::Selector;
use crate::value::{Compare, Value};
use std::marker::PhantomData;

/// Predicate and limit methods shared by every builder.
pub trait Filterable {
    fn plan_mut(&mut self) -> &mut QueryPlan;

    fn has(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.has_cmp(key, Compare::Equal, value)
    }

    /// Matches elements where `key` is absent.
    fn has_null(&mut self, key: &str) -> &mut Self {
        self.plan_mut().predicates.push(Predicate::Has {
            key: key.to_string(),
            compare: Compare::Equal,
            value: None,
        });
        self
    }

    /// Matches elements where `key` is present.
    fn has_not_null(&mut self, key: &str) -> &mut Self {
        self.plan_mut().predicates.push(Predicate::Has {
            key: key.to_string(),
            compare: Compare::NotEqual,
            value: None,
        });
        self
    }

    fn has_cmp(&mut self, key: &str, compare: Compare, value: impl Into<Value>) -> &mut Self {
        self.plan_mut().predicates.push(Predicate::Has {
            key: key.to_string(),
            compare,
            value: Some(value.into()),
        });
        self
    }

    /// `low <= key < high`.
    fn interval(&mut self, key: &str, low: impl Into<Value>, high: impl Into<Value>) -> &mut Self {
        self.plan_mut().predicates.push(Predicate::Interval {
            key: key.to_string(),
            low: low.into(),
            high: high.into(),
        });
        self
    }

    fn limit(&mut self, n: usize) -> &mut Self {
        self.plan_mut().limit = Some(n);
        self
    }
}

/// Graph-wide query over all vertices or all edges.
pub struct GraphQuery<'g> {
    graph: &'g dyn PropertyGraph,
    plan: QueryPlan,
}

impl<'g> GraphQuery<'g> {
    pub fn new(graph: &'g dyn PropertyGraph) -> Self {
        Self {
            graph,
            plan: QueryPlan::default(),
        }
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    pub fn vertices(&self) -> Result<Frontier<'g, VertexId>> {
        self.graph.query_vertices(&self.plan)
    }

    pub fn edges(&self) -> Result<Frontier<'g, EdgeId>> {
        self.graph.query_edges(&self.plan)
    }

    /// Number of matching vertices.
    pub fn count(&self) -> Result<usize> {
        self.graph.query_count(&self.plan)
    }
}

impl Filterable for GraphQuery<'_> {
    fn plan_mut(&mut self) -> &mut QueryPlan {
        &mut self.plan
    }
}

/// Query over the edges incident to one vertex.
pub struct VertexQuery<'g> {
    graph: &'g dyn PropertyGraph,
    plan: QueryPlan,
}

impl<'g> VertexQuery<'g> {
    pub fn new(graph: &'g dyn PropertyGraph, vertex: VertexId) -> Self {
        Self {
            graph,
            plan: QueryPlan::anchored(vertex),
        }
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    pub fn direction(&mut self, direction: Direction) -> &mut Self {
        self.plan.direction = direction;
        self
    }

    pub fn labels<I, S>(&mut self, labels: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plan.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Vertices at the far end of the matching edges.
    pub fn vertices(&self) -> Result<Frontier<'g, VertexId>> {
        self.graph.query_vertices(&self.plan)
    }

    pub fn edges(&self) -> Result<Frontier<'g, EdgeId>> {
        self.graph.query_edges(&self.plan)
    }

    /// Number of matching edges.
    pub fn count(&self) -> Result<usize> {
        self.graph.query_count(&self.plan)
    }
}

impl Filterable for VertexQuery<'_> {
    fn plan_mut(&mut self) -> &mut QueryPlan {
        &mut self.plan
    }
}

/// Graph query whose results are framed as `T`.
pub struct TypedQuery<'g, T, V> {
    framed: FramedGraph<'g, V>,
    inner: GraphQuery<'g>,
    _model: PhantomData<fn() -> T>,
}

impl<'g, T, V> TypedQuery<'g, T, V>
where
    T: Model + 'g,
    V: ViewFactory,
{
    pub fn new(framed: FramedGraph<'g, V>) -> Self {
        Self {
            framed,
            inner: GraphQuery::new(framed.graph()),
            _model: PhantomData,
        }
    }

    /// Adds a predicate on a model member, resolved to its graph key.
    pub fn has_member(
        &mut self,
        member_ref: &str,
        compare: Compare,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        let selector = Selector::resolve::<T>(member_ref)?;
        self.inner.has_cmp(&selector.key, compare, value);
        Ok(self)
    }

    pub fn plan(&self) -> &QueryPlan {
        self.inner.plan()
    }

    pub fn vertices(&self) -> Result<impl Iterator<Item = Result<Option<T>>> + 'g> {
        let framed = self.framed;
        Ok(self
            .inner
            .vertices()?
            .map(move |v| framed.frame::<T>(v.into())))
    }

    pub fn edges(&self) -> Result<impl Iterator<Item = Result<Option<T>>> + 'g> {
        let framed = self.framed;
        Ok(self
            .inner
            .edges()?
            .map(move |e| framed.frame::<T>(e.into())))
    }

    pub fn count(&self) -> Result<usize> {
        self.inner.count()
    }
}

impl<T, V> Filterable for TypedQuery<'_, T, V> {
    fn plan_mut(&mut self) -> &mut QueryPlan {
        self.inner.plan_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;

    fn people(g: &MemoryGraph) -> Result<Vec<VertexId>> {
        let rows: [(&str, i32); 4] = [("marko", 29), ("vadas", 27), ("matthias", 28), ("peter", 35)];
        rows.iter()
            .map(|(name, age)| {
                let v = g.add_vertex()?;
                g.set_property(v.into(), "name", Value::from(*name))?;
                g.set_property(v.into(), "age", Value::Int(*age))?;
                Ok(v)
            })
            .collect()
    }

    #[test]
    fn predicates_are_conjunctive() -> Result<()> {
        let g = MemoryGraph::new();
        let ids = people(&g)?;

        let mut query = GraphQuery::new(&g);
        query.has_cmp("age", Compare::GreaterThanEqual, 28);
        assert_eq!(query.count()?, 3);
        query.has("name", "matthias");
        assert_eq!(query.vertices()?.collect::<Vec<_>>(), vec![ids[2]]);
        Ok(())
    }

    #[test]
    fn limit_truncates_without_reordering() -> Result<()> {
        let g = MemoryGraph::new();
        let ids = people(&g)?;

        assert_eq!(GraphQuery::new(&g).limit(0).vertices()?.count(), 0);
        assert_eq!(GraphQuery::new(&g).limit(2).vertices()?.collect::<Vec<_>>(), ids[..2].to_vec());
        assert_eq!(GraphQuery::new(&g).limit(100).vertices()?.collect::<Vec<_>>(), ids);
        Ok(())
    }

    #[test]
    fn null_and_interval_predicates() -> Result<()> {
        let g = MemoryGraph::new();
        let ids = people(&g)?;
        g.remove_property(ids[3].into(), "age")?;

        let absent: Vec<_> = GraphQuery::new(&g).has_null("age").vertices()?.collect();
        assert_eq!(absent, vec![ids[3]]);
        let present = GraphQuery::new(&g).has_not_null("age").count()?;
        assert_eq!(present, 3);
        let in_range: Vec<_> = GraphQuery::new(&g).interval("age", 27, 29).vertices()?.collect();
        assert_eq!(in_range, vec![ids[1], ids[2]]);
        Ok(())
    }

    #[test]
    fn vertex_query_filters_incident_edges() -> Result<()> {
        let g = MemoryGraph::new();
        let ids = people(&g)?;
        let e1 = g.add_edge(ids[0], ids[1], "knows")?;
        let e2 = g.add_edge(ids[0], ids[2], "knows")?;
        g.add_edge(ids[3], ids[0], "knows")?;
        g.add_edge(ids[0], ids[3], "created")?;
        g.set_property(e1.into(), "weight", Value::Double(0.5))?;
        g.set_property(e2.into(), "weight", Value::Double(1.0))?;

        let mut query = VertexQuery::new(&g, ids[0]);
        query.direction(Direction::Out).labels(["knows"]);
        assert_eq!(query.count()?, 2);
        assert_eq!(query.vertices()?.collect::<Vec<_>>(), vec![ids[1], ids[2]]);

        query.has_cmp("weight", Compare::GreaterThan, 0.6);
        assert_eq!(query.edges()?.collect::<Vec<_>>(), vec![e2]);

        let mut inward = VertexQuery::new(&g, ids[0]);
        inward.direction(Direction::In);
        assert_eq!(inward.vertices()?.collect::<Vec<_>>(), vec![ids[3]]);
        assert_eq!(VertexQuery::new(&g, ids[0]).limit(0).count()?, 0);
        Ok(())
    }

    #[test]
    fn repeated_terminals_rerun_the_plan() -> Result<()> {
        let g = MemoryGraph::new();
        people(&g)?;
        let mut query = GraphQuery::new(&g);
        query.has("name", "new");
        assert_eq!(query.count()?, 0);
        let v = g.add_vertex()?;
        g.set_property(v.into(), "name", Value::from("new"))?;
        assert_eq!(query.count()?, 1);
        Ok(())
    }
}
