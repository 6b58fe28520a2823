//! Untyped traversal combinators.
//!
//! Every combinator reads from the storage adjacency primitives and returns
//! a lazy [`Frontier`]. Results keep storage order; nothing is deduplicated
//! or re-sorted.
//!
//! # Branch factor
//!
//! Bounded walks cap each label's contribution and the total for a source
//! at `branch_factor`. Walks from a collection apply the per-source bound
//! and then cap the aggregate again, bounding both hub fan-out and overall
//! fan-out.
//!
//! # Labels
//!
//! [`Labels::SourceKeys`] is the default: the source vertex's own property
//! keys are used as relation labels. A source with no properties therefore
//! passes no labels, which the storage reads as "every label".

use crate::error::{FramesError, Result};
use crate::graph::{Direction, EdgeId, Frontier, PropertyGraph, VertexId};

/// Relation labels a walk may follow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Labels {
    Explicit(Vec<String>),
    /// Every label.
    Any,
    /// The property keys of the source vertex.
    #[default]
    SourceKeys,
}

impl Labels {
    pub fn of<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Labels::Explicit(labels.into_iter().map(Into::into).collect())
    }

    /// Label list handed to storage; empty means unrestricted.
    fn resolve(&self, graph: &dyn PropertyGraph, source: VertexId) -> Result<Vec<String>> {
        match self {
            Labels::Explicit(labels) if labels.is_empty() => Err(FramesError::InvalidArgument(
                "explicit label set is empty; use Labels::Any for every label".to_string(),
            )),
            Labels::Explicit(labels) => Ok(labels.clone()),
            Labels::Any => Ok(Vec::new()),
            Labels::SourceKeys => graph.property_keys(source.into()),
        }
    }
}

type Fetch<'g, T> =
    fn(&'g dyn PropertyGraph, VertexId, Direction, &[String]) -> Result<Frontier<'g, T>>;

fn fetch_vertices<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    direction: Direction,
    labels: &[String],
) -> Result<Frontier<'g, VertexId>> {
    graph.adjacent_vertices(source, direction, labels)
}

fn fetch_edges<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    direction: Direction,
    labels: &[String],
) -> Result<Frontier<'g, EdgeId>> {
    graph.adjacent_edges(source, direction, labels)
}

/// One adjacency step: a direction, a label set and an optional cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walk {
    pub direction: Direction,
    pub labels: Labels,
    pub branch_factor: Option<usize>,
}

impl Walk {
    pub fn new(direction: Direction, labels: Labels) -> Self {
        Self {
            direction,
            labels,
            branch_factor: None,
        }
    }

    pub fn out(labels: Labels) -> Self {
        Self::new(Direction::Out, labels)
    }

    pub fn inward(labels: Labels) -> Self {
        Self::new(Direction::In, labels)
    }

    pub fn both(labels: Labels) -> Self {
        Self::new(Direction::Both, labels)
    }

    pub fn bounded(mut self, branch_factor: usize) -> Self {
        self.branch_factor = Some(branch_factor);
        self
    }

    pub fn vertices<'g>(
        &self,
        graph: &'g dyn PropertyGraph,
        source: VertexId,
    ) -> Result<Frontier<'g, VertexId>> {
        self.from_source(graph, source, fetch_vertices)
    }

    pub fn edges<'g>(
        &self,
        graph: &'g dyn PropertyGraph,
        source: VertexId,
    ) -> Result<Frontier<'g, EdgeId>> {
        self.from_source(graph, source, fetch_edges)
    }

    pub fn vertices_from<'g, I>(
        &self,
        graph: &'g dyn PropertyGraph,
        sources: I,
    ) -> Result<Frontier<'g, VertexId>>
    where
        I: IntoIterator<Item = VertexId>,
    {
        self.from_sources(graph, sources, fetch_vertices)
    }

    pub fn edges_from<'g, I>(
        &self,
        graph: &'g dyn PropertyGraph,
        sources: I,
    ) -> Result<Frontier<'g, EdgeId>>
    where
        I: IntoIterator<Item = VertexId>,
    {
        self.from_sources(graph, sources, fetch_edges)
    }

    fn from_sources<'g, I, T: 'g>(
        &self,
        graph: &'g dyn PropertyGraph,
        sources: I,
        fetch: Fetch<'g, T>,
    ) -> Result<Frontier<'g, T>>
    where
        I: IntoIterator<Item = VertexId>,
    {
        let frontiers = sources
            .into_iter()
            .map(|source| self.from_source(graph, source, fetch))
            .collect::<Result<Vec<_>>>()?;
        let merged = frontiers.into_iter().flatten();
        Ok(match self.branch_factor {
            Some(k) => Box::new(merged.take(k)),
            None => Box::new(merged),
        })
    }

    fn from_source<'g, T: 'g>(
        &self,
        graph: &'g dyn PropertyGraph,
        source: VertexId,
        fetch: Fetch<'g, T>,
    ) -> Result<Frontier<'g, T>> {
        // Both is In followed by Out, with no deduplication. The branch
        // factor caps the combined result.
        if self.direction == Direction::Both {
            let inward = Walk {
                direction: Direction::In,
                ..self.clone()
            };
            let outward = Walk {
                direction: Direction::Out,
                ..self.clone()
            };
            let inn = inward.from_source(graph, source, fetch)?;
            let out = outward.from_source(graph, source, fetch)?;
            return Ok(match self.branch_factor {
                Some(k) => Box::new(inn.chain(out).take(k)),
                None => Box::new(inn.chain(out)),
            });
        }

        let labels = self.labels.resolve(graph, source)?;
        let Some(k) = self.branch_factor else {
            return fetch(graph, source, self.direction, &labels);
        };
        if labels.is_empty() {
            return Ok(Box::new(fetch(graph, source, self.direction, &[])?.take(k)));
        }
        let per_label = labels
            .iter()
            .map(|label| {
                fetch(graph, source, self.direction, std::slice::from_ref(label))
                    .map(|frontier| frontier.take(k))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(per_label.into_iter().flatten().take(k)))
    }
}

pub fn in_vertices<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    labels: Labels,
) -> Result<Frontier<'g, VertexId>> {
    Walk::inward(labels).vertices(graph, source)
}

pub fn out_vertices<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    labels: Labels,
) -> Result<Frontier<'g, VertexId>> {
    Walk::out(labels).vertices(graph, source)
}

pub fn both_vertices<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    labels: Labels,
) -> Result<Frontier<'g, VertexId>> {
    Walk::both(labels).vertices(graph, source)
}

pub fn in_edges<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    labels: Labels,
) -> Result<Frontier<'g, EdgeId>> {
    Walk::inward(labels).edges(graph, source)
}

pub fn out_edges<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    labels: Labels,
) -> Result<Frontier<'g, EdgeId>> {
    Walk::out(labels).edges(graph, source)
}

pub fn both_edges<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    labels: Labels,
) -> Result<Frontier<'g, EdgeId>> {
    Walk::both(labels).edges(graph, source)
}

pub fn in_vertices_bounded<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    branch_factor: usize,
    labels: Labels,
) -> Result<Frontier<'g, VertexId>> {
    Walk::inward(labels).bounded(branch_factor).vertices(graph, source)
}

pub fn out_vertices_bounded<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    branch_factor: usize,
    labels: Labels,
) -> Result<Frontier<'g, VertexId>> {
    Walk::out(labels).bounded(branch_factor).vertices(graph, source)
}

pub fn in_edges_bounded<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    branch_factor: usize,
    labels: Labels,
) -> Result<Frontier<'g, EdgeId>> {
    Walk::inward(labels).bounded(branch_factor).edges(graph, source)
}

pub fn out_edges_bounded<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    branch_factor: usize,
    labels: Labels,
) -> Result<Frontier<'g, EdgeId>> {
    Walk::out(labels).bounded(branch_factor).edges(graph, source)
}

pub fn both_vertices_bounded<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    branch_factor: usize,
    labels: Labels,
) -> Result<Frontier<'g, VertexId>> {
    Walk::both(labels).bounded(branch_factor).vertices(graph, source)
}

pub fn both_edges_bounded<'g>(
    graph: &'g dyn PropertyGraph,
    source: VertexId,
    branch_factor: usize,
    labels: Labels,
) -> Result<Frontier<'g, EdgeId>> {
    Walk::both(labels).bounded(branch_factor).edges(graph, source)
}

fn over(direction: Direction, labels: Labels, branch_factor: Option<usize>) -> Walk {
    Walk {
        direction,
        labels,
        branch_factor,
    }
}

/// Collection form of [`in_vertices`]; a branch factor caps every source
/// and then the aggregate.
pub fn in_vertices_all<'g>(
    graph: &'g dyn PropertyGraph,
    sources: impl IntoIterator<Item = VertexId>,
    branch_factor: Option<usize>,
    labels: Labels,
) -> Result<Frontier<'g, VertexId>> {
    over(Direction::In, labels, branch_factor).vertices_from(graph, sources)
}

pub fn out_vertices_all<'g>(
    graph: &'g dyn PropertyGraph,
    sources: impl IntoIterator<Item = VertexId>,
    branch_factor: Option<usize>,
    labels: Labels,
) -> Result<Frontier<'g, VertexId>> {
    over(Direction::Out, labels, branch_factor).vertices_from(graph, sources)
}

pub fn both_vertices_all<'g>(
    graph: &'g dyn PropertyGraph,
    sources: impl IntoIterator<Item = VertexId>,
    branch_factor: Option<usize>,
    labels: Labels,
) -> Result<Frontier<'g, VertexId>> {
    over(Direction::Both, labels, branch_factor).vertices_from(graph, sources)
}

pub fn in_edges_all<'g>(
    graph: &'g dyn PropertyGraph,
    sources: impl IntoIterator<Item = VertexId>,
    branch_factor: Option<usize>,
    labels: Labels,
) -> Result<Frontier<'g, EdgeId>> {
    over(Direction::In, labels, branch_factor).edges_from(graph, sources)
}

pub fn out_edges_all<'g>(
    graph: &'g dyn PropertyGraph,
    sources: impl IntoIterator<Item = VertexId>,
    branch_factor: Option<usize>,
    labels: Labels,
) -> Result<Frontier<'g, EdgeId>> {
    over(Direction::Out, labels, branch_factor).edges_from(graph, sources)
}

pub fn both_edges_all<'g>(
    graph: &'g dyn PropertyGraph,
    sources: impl IntoIterator<Item = VertexId>,
    branch_factor: Option<usize>,
    labels: Labels,
) -> Result<Frontier<'g, EdgeId>> {
    over(Direction::Both, labels, branch_factor).edges_from(graph, sources)
}

/// The vertex at one end of an edge: `Out` is the tail, `In` the head and
/// `Both` yields tail then head.
pub fn edge_vertices<'g>(
    graph: &'g dyn PropertyGraph,
    edge: EdgeId,
    direction: Direction,
) -> Result<Frontier<'g, VertexId>> {
    let (out, inn, _) = graph.edge_endpoints(edge)?;
    Ok(match direction {
        Direction::Out => Box::new(std::iter::once(out)),
        Direction::In => Box::new(std::iter::once(inn)),
        Direction::Both => Box::new([out, inn].into_iter()),
    })
}

/// Bounded fixed-point iteration; see [`loop_n`].
pub struct Looped<'g, T, F> {
    step: F,
    depth: usize,
    /// `levels[i]` yields elements of frontier `i`.
    levels: Vec<Frontier<'g, T>>,
}

/// Applies `step` to every element of the frontier `n` times and yields the
/// final frontier only, in the order repeated flat-mapping would produce.
///
/// There is no deduplication or cycle detection; a cyclic graph revisits
/// elements and the caller caps the result size.
pub fn loop_n<'g, T, F>(source: T, step: F, n: usize) -> Result<Looped<'g, T, F>>
where
    T: 'g,
    F: FnMut(T) -> Result<Frontier<'g, T>>,
{
    if n == 0 {
        return Err(FramesError::InvalidArgument(
            "loop iteration count must be positive".to_string(),
        ));
    }
    Ok(Looped {
        step,
        depth: n,
        levels: vec![Box::new(std::iter::once(source))],
    })
}

impl<'g, T, F> Iterator for Looped<'g, T, F>
where
    T: 'g,
    F: FnMut(T) -> Result<Frontier<'g, T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.levels.len().checked_sub(1)?;
            match self.levels[level].next() {
                None => {
                    self.levels.pop();
                }
                Some(element) if level == self.depth => return Some(Ok(element)),
                Some(element) => match (self.step)(element) {
                    Ok(next) => self.levels.push(next),
                    Err(e) => {
                        self.levels.clear();
                        return Some(Err(e));
                    }
                },
            }
        }
    }
}
