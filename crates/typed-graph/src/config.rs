use crate::error::{FramesError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TYPE_PROPERTY: &str = "__frames_type";
pub const DEFAULT_ROOT_PROPERTY: &str = "__frames_registry_root";
pub const DEFAULT_TYPE_NAME_PROPERTY: &str = "__frames_type_name";
pub const DEFAULT_MARKER_LABEL: &str = "__frames_type_marker";
pub const DEFAULT_REGISTRY_INDEX: &str = "__frames_registry";

/// Reserved property keys and labels used by the type registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramesConfig {
    /// Property holding an element's type marker.
    pub type_property: String,
    /// Property that identifies the registry root vertex.
    pub registry_root_property: String,
    /// Property on a marker vertex holding the domain type identifier.
    pub type_name_property: String,
    /// Label of the edges from the root to its marker vertices.
    pub marker_label: String,
    /// Named index consulted first when locating the root.
    pub registry_index: String,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            type_property: DEFAULT_TYPE_PROPERTY.to_string(),
            registry_root_property: DEFAULT_ROOT_PROPERTY.to_string(),
            type_name_property: DEFAULT_TYPE_NAME_PROPERTY.to_string(),
            marker_label: DEFAULT_MARKER_LABEL.to_string(),
            registry_index: DEFAULT_REGISTRY_INDEX.to_string(),
        }
    }
}

impl FramesConfig {
    /// Reads overrides from `FRAMES_*` environment variables, keeping the
    /// default for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let var = |name: &str, default: String| std::env::var(name).unwrap_or(default);
        let config = Self {
            type_property: var("FRAMES_TYPE_PROPERTY", defaults.type_property),
            registry_root_property: var("FRAMES_ROOT_PROPERTY", defaults.registry_root_property),
            type_name_property: var("FRAMES_TYPE_NAME_PROPERTY", defaults.type_name_property),
            marker_label: var("FRAMES_MARKER_LABEL", defaults.marker_label),
            registry_index: var("FRAMES_REGISTRY_INDEX", defaults.registry_index),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("type_property", &self.type_property),
            ("registry_root_property", &self.registry_root_property),
            ("type_name_property", &self.type_name_property),
            ("marker_label", &self.marker_label),
            ("registry_index", &self.registry_index),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(FramesError::InvalidArgument(format!("{name} must not be empty")));
        }
        if self.type_property == self.registry_root_property {
            return Err(FramesError::InvalidArgument(
                "type_property and registry_root_property must differ".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_overrides_merge_with_defaults() -> Result<()> {
        let config = FramesConfig::from_json_str(r#"{ "type_property": "kind" }"#)?;
        assert_eq!(config.type_property, "kind");
        assert_eq!(config.marker_label, DEFAULT_MARKER_LABEL);
        Ok(())
    }

    #[test]
    fn rejects_empty_and_colliding_names() {
        let config = FramesConfig {
            marker_label: " ".to_string(),
            ..FramesConfig::default()
        };
        assert!(matches!(config.validate(), Err(FramesError::InvalidArgument(_))));

        let config = FramesConfig {
            type_property: DEFAULT_ROOT_PROPERTY.to_string(),
            ..FramesConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
