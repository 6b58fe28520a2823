//! Resolution of member references into graph keys.

use crate::error::{FramesError, Result};
use crate::graph::Direction;
use crate::model::{Model, ModelDescriptor};
use once_cell::sync::Lazy;
use regex::Regex;

/// `member` or `receiver.member`, both plain identifiers.
static MEMBER_ACCESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[A-Za-z_][A-Za-z0-9_]*\s*\.\s*)?([A-Za-z_][A-Za-z0-9_]*)\s*$")
        .expect("member access pattern compiles")
});

/// A member reference resolved against a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Member name as declared on the model.
    pub member: String,
    /// Property key or relation label to use in the graph.
    pub key: String,
    /// Direction from the relation override, if any.
    pub direction: Option<Direction>,
}

impl Selector {
    pub fn resolve<M: Model>(member_ref: &str) -> Result<Self> {
        Self::resolve_in(&ModelDescriptor::of::<M>(), member_ref)
    }

    /// Accepts a bare member name or a single receiver access such as
    /// `p.knows`. Chained paths, calls and unknown members are rejected.
    pub fn resolve_in(model: &ModelDescriptor, member_ref: &str) -> Result<Self> {
        let captures = MEMBER_ACCESS.captures(member_ref).ok_or_else(|| {
            FramesError::invalid_selector(member_ref, "expected a simple member access")
        })?;
        let name = captures
            .get(1)
            .map(|m| m.as_str())
            .ok_or_else(|| FramesError::invalid_selector(member_ref, "missing member name"))?;
        let member = model.member(name).ok_or_else(|| {
            FramesError::invalid_selector(
                member_ref,
                format!("`{}` declares no member `{name}`", model.name),
            )
        })?;

        Ok(match member.relation {
            Some(relation) => Self {
                member: name.to_string(),
                key: relation.label.to_string(),
                direction: Some(relation.direction),
            },
            None => Self {
                member: name.to_string(),
                key: name.to_string(),
                direction: None,
            },
        })
    }
}
