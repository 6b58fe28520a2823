use crate::graph::{Element, GraphId};
use crate::value::Value;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, FramesError>;

/// Errors raised by the registry, the traversal combinators and the
/// storage contract.
#[derive(Error, Debug)]
pub enum FramesError {
    /// The member reference is not a simple member access on the model.
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// An element carries a marker the catalog of its graph cannot resolve.
    /// Signals catalog drift or corruption and is never retried.
    #[error("element {element} in graph {graph} carries unknown type marker {marker:?}")]
    UnknownTypeMarker {
        graph: GraphId,
        element: Element,
        marker: Value,
    },

    /// A marker dictionary lists the same domain type twice.
    #[error("domain type `{0}` is registered more than once")]
    DuplicateRegistration(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The domain type is not part of the process's model set.
    #[error("unknown model type `{0}`")]
    UnknownModel(String),

    /// The dictionary registry holds no marker for the type.
    #[error("no marker allocated for type `{0}`")]
    UnregisteredType(String),

    #[error("element not found: {0}")]
    ElementNotFound(Element),

    #[error("index `{0}` already exists")]
    IndexExists(String),

    #[error("operation not supported by this graph: {0}")]
    Unsupported(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl FramesError {
    pub(crate) fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}
