//! A2UI Runtime Errors
//!
//! Every fallible operation in the runtime reports one of these kinds. None of
//! them is fatal to the registry or to a surface: after any error the caller
//! can keep feeding messages and control events.

use thiserror::Error;

/// Convenience alias used throughout the runtime.
pub type A2uiResult<T> = Result<T, A2uiError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum A2uiError {
    /// Schema violation. The whole message was rejected and prior state is unchanged.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The message targets a surface that was never begun, or begins one that is already active.
    #[error("unknown surface `{surface_id}`: {reason}")]
    UnknownSurface { surface_id: String, reason: String },

    /// The surface was torn down and accepts nothing further.
    #[error("surface `{0}` has been torn down")]
    SurfaceTornDown(String),

    /// A child or template id that has no definition at render time.
    #[error("component `{missing}` referenced by `{referenced_by}` is not defined")]
    DanglingReference {
        missing: String,
        referenced_by: String,
    },

    /// The explicit-children relation loops back on itself.
    #[error("cycle detected: {}", cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },

    /// A binding could not be read or written for the named component.
    #[error("binding error on `{component_id}`: {reason}")]
    BindingError {
        component_id: String,
        reason: String,
    },

    /// The path traverses a scalar as if it were a container, or indexes past an array.
    #[error("invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Render recursion went deeper than the configured limit.
    #[error("render depth exceeded the limit of {limit}")]
    RenderDepthExceeded { limit: usize },
}

impl A2uiError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        A2uiError::MalformedMessage(reason.into())
    }

    pub(crate) fn unknown_surface(surface_id: &str, reason: impl Into<String>) -> Self {
        A2uiError::UnknownSurface {
            surface_id: surface_id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn binding(component_id: &str, reason: impl Into<String>) -> Self {
        A2uiError::BindingError {
            component_id: component_id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        A2uiError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error aborts a whole render pass rather than a single component.
    pub fn aborts_render(&self) -> bool {
        matches!(
            self,
            A2uiError::CycleDetected { .. } | A2uiError::RenderDepthExceeded { .. }
        )
    }
}

impl From<serde_json::Error> for A2uiError {
    fn from(err: serde_json::Error) -> Self {
        A2uiError::MalformedMessage(err.to_string())
    }
}
