//! Type registry: maps domain types to the markers stamped on elements.
//!
//! Two flavours exist. [`GraphTypeRegistry`] keeps its catalog inside the
//! graph as marker vertices hanging off a registry root, and caches it per
//! graph instance. [`DictionaryTypeRegistry`] uses numeric markers handed
//! out ahead of time and never writes to the graph.

use crate::error::Result;
use crate::graph::{Element, GraphId, PropertyGraph, VertexId};
use crate::model::TypeName;
use crate::value::{NumericKey, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

pub mod dictionary;
pub mod graph_registry;

pub use dictionary::DictionaryTypeRegistry;
pub use graph_registry::{GraphTypeRegistry, StoredEntry};

/// Normalized comparison key of a marker value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    /// Any integral numeric marker, whatever its stored width.
    Numeric(i128),
    Text(String),
}

impl MarkerKey {
    /// `None` for values that cannot act as markers: bools, datetimes and
    /// fractional or non-finite numbers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(MarkerKey::Text(s.clone())),
            other => match other.numeric_key()? {
                NumericKey::Integral(i) => Some(MarkerKey::Numeric(i)),
                NumericKey::Fractional(_) => None,
            },
        }
    }
}

/// Opaque marker identifying a domain type on an element.
///
/// Equality goes through [`MarkerKey`], so a marker written as `Int(5)` and
/// one cached as `Long(5)` are the same marker.
#[derive(Debug, Clone)]
pub struct TypeMarker {
    value: Value,
    key: MarkerKey,
}

impl TypeMarker {
    pub fn new(value: Value) -> Option<Self> {
        let key = MarkerKey::from_value(&value)?;
        Some(Self { value, key })
    }

    pub fn numeric(marker: i64) -> Self {
        Self {
            value: Value::Long(marker),
            key: MarkerKey::Numeric(i128::from(marker)),
        }
    }

    /// Marker naming a marker vertex by its native id.
    pub fn of_vertex(vertex: VertexId) -> Self {
        Self {
            value: vertex.to_value(),
            key: MarkerKey::Numeric(i128::from(vertex.0)),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn key(&self) -> &MarkerKey {
        &self.key
    }
}

impl PartialEq for TypeMarker {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TypeMarker {}

impl Hash for TypeMarker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for TypeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// The outcome of a successful type lookup on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub marker: TypeMarker,
    pub type_name: TypeName,
}

pub trait TypeRegistry: Send + Sync {
    /// Property key under which elements carry their marker.
    fn type_property(&self) -> &str;

    /// Returns the marker of `ty` in `graph`, registering it first if
    /// needed.
    fn ensure_registered(&self, graph: &dyn PropertyGraph, ty: &TypeName) -> Result<TypeMarker>;

    /// `Ok(None)` when the element carries no usable marker. A marker the
    /// catalog does not know is an `UnknownTypeMarker` error.
    fn try_resolve_type(
        &self,
        graph: &dyn PropertyGraph,
        element: Element,
    ) -> Result<Option<ResolvedType>>;

    /// Every domain type currently known for `graph`.
    fn catalog_for(&self, graph: &dyn PropertyGraph) -> Result<Vec<TypeName>>;

    /// Drops any cached state held for a graph instance. Returns whether
    /// anything was held.
    fn release(&self, graph: GraphId) -> bool;

    /// Registers `ty` and writes its marker onto `element`.
    fn stamp(&self, graph: &dyn PropertyGraph, element: Element, ty: &TypeName) -> Result<TypeMarker> {
        let marker = self.ensure_registered(graph, ty)?;
        graph.set_property(element, self.type_property(), marker.value().clone())?;
        Ok(marker)
    }
}

/// Reads the marker property of an element. Absent and unusable values
/// both come back as `None`.
pub(crate) fn read_marker(
    graph: &dyn PropertyGraph,
    element: Element,
    type_property: &str,
) -> Result<Option<(Value, MarkerKey)>> {
    let Some(value) = graph.property(element, type_property)? else {
        return Ok(None);
    };
    match MarkerKey::from_value(&value) {
        Some(key) => Ok(Some((value, key))),
        None => {
            tracing::debug!(%element, %value, "type marker is not comparable; treating as untyped");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_compare_across_widths() {
        let cached = TypeMarker::numeric(5);
        let persisted = TypeMarker::new(Value::Int(5)).map(|m| m == cached);
        assert_eq!(persisted, Some(true));
        assert_eq!(TypeMarker::new(Value::Double(5.0)), Some(cached.clone()));
        assert_ne!(TypeMarker::new(Value::Long(6)), Some(cached));
    }

    #[test]
    fn unusable_values_are_not_markers() {
        assert!(TypeMarker::new(Value::Bool(true)).is_none());
        assert!(TypeMarker::new(Value::Double(5.5)).is_none());
        assert!(TypeMarker::new(Value::from("acme.Person")).is_some());
    }
}
