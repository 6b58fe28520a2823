use super::{read_marker, MarkerKey, ResolvedType, TypeMarker, TypeRegistry};
use crate::config::FramesConfig;
use crate::error::{FramesError, Result};
use crate::graph::{Element, GraphId, PropertyGraph};
use crate::model::{ModelSet, TypeName};
use std::collections::HashMap;

/// Registry over numeric markers allocated ahead of time.
///
/// The dictionary is fixed at construction and shared by every graph, since
/// none of it lives in the graph. Markers never change once assigned.
#[derive(Debug)]
pub struct DictionaryTypeRegistry {
    type_property: String,
    by_type: HashMap<TypeName, TypeMarker>,
    by_marker: HashMap<MarkerKey, TypeName>,
    order: Vec<TypeName>,
}

impl DictionaryTypeRegistry {
    pub fn new(
        config: &FramesConfig,
        models: &ModelSet,
        entries: impl IntoIterator<Item = (TypeName, i64)>,
    ) -> Result<Self> {
        let mut registry = Self {
            type_property: config.type_property.clone(),
            by_type: HashMap::new(),
            by_marker: HashMap::new(),
            order: Vec::new(),
        };
        for (ty, marker) in entries {
            if !models.contains(&ty) {
                return Err(FramesError::UnknownModel(ty.to_string()));
            }
            if registry.by_type.contains_key(&ty) {
                return Err(FramesError::DuplicateRegistration(ty.to_string()));
            }
            let marker = TypeMarker::numeric(marker);
            if let Some(owner) = registry.by_marker.get(marker.key()) {
                return Err(FramesError::InvalidArgument(format!(
                    "marker {marker} is already assigned to `{owner}`"
                )));
            }
            registry.by_marker.insert(marker.key().clone(), ty.clone());
            registry.by_type.insert(ty.clone(), marker);
            registry.order.push(ty);
        }
        Ok(registry)
    }
}

impl TypeRegistry for DictionaryTypeRegistry {
    fn type_property(&self) -> &str {
        &self.type_property
    }

    fn ensure_registered(&self, _graph: &dyn PropertyGraph, ty: &TypeName) -> Result<TypeMarker> {
        self.by_type
            .get(ty)
            .cloned()
            .ok_or_else(|| FramesError::UnregisteredType(ty.to_string()))
    }

    fn try_resolve_type(
        &self,
        graph: &dyn PropertyGraph,
        element: Element,
    ) -> Result<Option<ResolvedType>> {
        let Some((value, key)) = read_marker(graph, element, &self.type_property)? else {
            return Ok(None);
        };
        match self.by_marker.get(&key) {
            Some(ty) => Ok(Some(ResolvedType {
                marker: TypeMarker { value, key },
                type_name: ty.clone(),
            })),
            None => Err(FramesError::UnknownTypeMarker {
                graph: graph.instance_id(),
                element,
                marker: value,
            }),
        }
    }

    fn catalog_for(&self, _graph: &dyn PropertyGraph) -> Result<Vec<TypeName>> {
        Ok(self.order.clone())
    }

    fn release(&self, _graph: GraphId) -> bool {
        false
    }
}
