//! A2UI Runtime Configuration

use serde::{Deserialize, Serialize};

use super::error::A2uiResult;

/// Runtime configuration shared by every surface of a registry.
///
/// All fields are optional in JSON form:
///
/// ```rust
/// use a2ui_kit::a2ui::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json_str(r#"{"maxRenderDepth": 16}"#).unwrap();
/// assert_eq!(config.max_render_depth, 16);
/// assert!(config.repair_json);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Try to repair invalid JSON text before parsing it
    pub repair_json: bool,
    /// Maximum nesting depth of a render pass
    pub max_render_depth: usize,
    /// Emit a `DataModelChanged` event for every bound-control write
    pub emit_data_model_changes: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            repair_json: true,
            max_render_depth: 64,
            emit_data_model_changes: true,
        }
    }
}

impl RuntimeConfig {
    pub fn from_json_str(json: &str) -> A2uiResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
