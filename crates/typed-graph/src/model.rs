//! Domain model descriptors and view materialization.
//!
//! Each model type implements [`Model`] and is registered into a
//! [`ModelSet`] at startup. The set is what the registry consults when it
//! turns a stored type identifier back into a known type, and what the
//! default [`ViewFactory`] uses to decide whether an element may be viewed
//! as a requested model.

use crate::error::{FramesError, Result};
use crate::graph::{Direction, Element};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// Stable, non-empty identifier of a domain type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FramesError::InvalidArgument(
                "domain type identifier must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn of<M: Model>() -> Self {
        Self(M::TYPE_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Custom label and direction for a relation member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationOverride {
    pub label: &'static str,
    pub direction: Direction,
}

/// A property or relation declared on a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub name: &'static str,
    pub relation: Option<RelationOverride>,
}

impl MemberDescriptor {
    pub const fn property(name: &'static str) -> Self {
        Self {
            name,
            relation: None,
        }
    }

    pub const fn relation(name: &'static str, label: &'static str, direction: Direction) -> Self {
        Self {
            name,
            relation: Some(RelationOverride { label, direction }),
        }
    }
}

/// A domain model type backed by a graph element.
pub trait Model: Sized {
    const TYPE_NAME: &'static str;

    fn members() -> &'static [MemberDescriptor] {
        &[]
    }

    /// Names of the types this model may be viewed as.
    fn supertypes() -> &'static [&'static str] {
        &[]
    }

    fn from_element(element: Element) -> Self;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub name: TypeName,
    pub supertypes: Vec<TypeName>,
    pub members: &'static [MemberDescriptor],
}

impl ModelDescriptor {
    pub fn of<M: Model>() -> Self {
        Self {
            name: TypeName::of::<M>(),
            supertypes: M::supertypes()
                .iter()
                .map(|s| TypeName((*s).to_string()))
                .collect(),
            members: M::members(),
        }
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// The domain types known to this process.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    models: HashMap<TypeName, ModelDescriptor>,
}

#[derive(Debug, Default)]
pub struct ModelSetBuilder {
    models: HashMap<TypeName, ModelDescriptor>,
}

impl ModelSetBuilder {
    pub fn register<M: Model>(self) -> Self {
        self.register_descriptor(ModelDescriptor::of::<M>())
    }

    pub fn register_descriptor(mut self, descriptor: ModelDescriptor) -> Self {
        self.models.insert(descriptor.name.clone(), descriptor);
        self
    }

    pub fn build(self) -> ModelSet {
        ModelSet {
            models: self.models,
        }
    }
}

impl ModelSet {
    pub fn builder() -> ModelSetBuilder {
        ModelSetBuilder::default()
    }

    pub fn resolve(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.get(&TypeName(name.to_string()))
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.models.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &TypeName> {
        self.models.keys()
    }

    /// Whether an element of type `from` may be viewed as `to`, following
    /// declared supertypes transitively.
    pub fn is_assignable(&self, from: &TypeName, to: &TypeName) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([from.clone()]);
        while let Some(current) = queue.pop_front() {
            if &current == to {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(descriptor) = self.models.get(&current) {
                queue.extend(descriptor.supertypes.iter().cloned());
            }
        }
        false
    }
}

/// Builds a typed accessor for an element whose type has been resolved.
pub trait ViewFactory: Send + Sync {
    /// `None` when the element cannot be viewed as `T`.
    fn materialize<T: Model>(&self, models: &ModelSet, element: Element, resolved: &TypeName)
        -> Option<T>;
}

/// Default factory: materializes when the resolved type is `T` or one of
/// its subtypes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelViews;

impl ViewFactory for ModelViews {
    fn materialize<T: Model>(
        &self,
        models: &ModelSet,
        element: Element,
        resolved: &TypeName,
    ) -> Option<T> {
        models
            .is_assignable(resolved, &TypeName::of::<T>())
            .then(|| T::from_element(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::VertexId;

    struct Person;
    struct Employee;
    struct Manager;

    impl Model for Person {
        const TYPE_NAME: &'static str = "test.Person";
        fn from_element(_: Element) -> Self {
            Person
        }
    }

    impl Model for Employee {
        const TYPE_NAME: &'static str = "test.Employee";
        fn supertypes() -> &'static [&'static str] {
            &["test.Person"]
        }
        fn from_element(_: Element) -> Self {
            Employee
        }
    }

    impl Model for Manager {
        const TYPE_NAME: &'static str = "test.Manager";
        fn supertypes() -> &'static [&'static str] {
            &["test.Employee"]
        }
        fn from_element(_: Element) -> Self {
            Manager
        }
    }

    fn models() -> ModelSet {
        ModelSet::builder()
            .register::<Person>()
            .register::<Employee>()
            .register::<Manager>()
            .build()
    }

    #[test]
    fn empty_type_name_is_rejected() {
        assert!(TypeName::new("").is_err());
        assert!(TypeName::new("  ").is_err());
        assert!(TypeName::new("a.B").is_ok());
    }

    #[test]
    fn assignability_is_transitive() {
        let models = models();
        let manager = TypeName::of::<Manager>();
        assert!(models.is_assignable(&manager, &TypeName::of::<Person>()));
        assert!(!models.is_assignable(&TypeName::of::<Person>(), &manager));
    }

    #[test]
    fn views_only_materialize_compatible_types() {
        let models = models();
        let element = Element::Vertex(VertexId(1));
        let person = TypeName::of::<Person>();
        assert!(ModelViews
            .materialize::<Employee>(&models, element, &person)
            .is_none());
        assert!(ModelViews
            .materialize::<Person>(&models, element, &TypeName::of::<Employee>())
            .is_some());
    }
}
