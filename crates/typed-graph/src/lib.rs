//! Typed navigation over property graphs.
//!
//! The crate layers a domain type system on top of any [`PropertyGraph`]:
//! a [`TypeRegistry`] stamps elements with type markers and resolves them
//! back, the [`traversal`] combinators walk adjacency lazily with optional
//! branch-factor bounds, and [`query`] builds filtered lookups. A
//! [`FramesContext`] bound to a graph ties all of it to concrete models.

pub mod config;
pub mod error;
pub mod framed;
pub mod graph;
pub mod model;
pub mod query;
pub mod registry;
pub mod selector;
pub mod traversal;
pub mod value;

pub use config::FramesConfig;
pub use error::{FramesError, Result};
pub use framed::{FramedGraph, FramesContext, OfTypeExt};
pub use graph::{Direction, EdgeId, Element, GraphId, MemoryGraph, PropertyGraph, VertexId};
pub use model::{MemberDescriptor, Model, ModelSet, TypeName};
pub use registry::{DictionaryTypeRegistry, GraphTypeRegistry, TypeMarker, TypeRegistry};
pub use selector::Selector;
pub use traversal::{loop_n, Labels, Walk};
pub use value::{Compare, Value};
