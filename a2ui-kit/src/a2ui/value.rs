//! A2UI Value Types
//!
//! Value references used by component properties, and the binding scope that
//! decides how a data-model path inside a template is interpreted.

use serde::{Deserialize, Serialize};

/// A property value that is either an embedded literal or a data-model path.
///
/// Exactly one of the four JSON keys must be present; anything else fails to
/// deserialize.
///
/// # Examples
///
/// ```json
/// {"literalString": "Hello World"}
/// {"literalNumber": 42}
/// {"literalBoolean": true}
/// {"path": "/user/name"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoundValue", into = "RawBoundValue")]
pub enum BoundValue {
    LiteralString(String),
    LiteralNumber(f64),
    LiteralBoolean(bool),
    /// Absolute when it starts with `/`, otherwise relative to the template element in scope
    Path(String),
}

impl BoundValue {
    pub fn literal_string(s: impl Into<String>) -> Self {
        BoundValue::LiteralString(s.into())
    }

    pub fn literal_number(n: f64) -> Self {
        BoundValue::LiteralNumber(n)
    }

    pub fn literal_boolean(b: bool) -> Self {
        BoundValue::LiteralBoolean(b)
    }

    pub fn path(p: impl Into<String>) -> Self {
        BoundValue::Path(p.into())
    }

    pub fn is_literal(&self) -> bool {
        !self.is_path()
    }

    pub fn is_path(&self) -> bool {
        matches!(self, BoundValue::Path(_))
    }

    /// Get the path if this is a path reference
    pub fn as_path(&self) -> Option<&str> {
        match self {
            BoundValue::Path(path) => Some(path),
            _ => None,
        }
    }

    /// The embedded constant as a JSON node, `None` for path references.
    pub fn literal_json(&self) -> Option<serde_json::Value> {
        match self {
            BoundValue::LiteralString(s) => Some(serde_json::Value::String(s.clone())),
            BoundValue::LiteralNumber(n) => Some(serde_json::json!(*n)),
            BoundValue::LiteralBoolean(b) => Some(serde_json::Value::Bool(*b)),
            BoundValue::Path(_) => None,
        }
    }
}

impl Default for BoundValue {
    fn default() -> Self {
        BoundValue::literal_string("")
    }
}

/// Wire shape of a value reference before the exactly-one check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBoundValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    literal_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    literal_number: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    literal_boolean: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

impl TryFrom<RawBoundValue> for BoundValue {
    type Error = String;

    fn try_from(raw: RawBoundValue) -> Result<Self, Self::Error> {
        let mut found = Vec::with_capacity(1);
        if let Some(s) = raw.literal_string {
            found.push(BoundValue::LiteralString(s));
        }
        if let Some(n) = raw.literal_number {
            found.push(BoundValue::LiteralNumber(n));
        }
        if let Some(b) = raw.literal_boolean {
            found.push(BoundValue::LiteralBoolean(b));
        }
        if let Some(p) = raw.path {
            found.push(BoundValue::Path(p));
        }

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err("value reference has none of literalString, literalNumber, literalBoolean, path".into()),
            n => Err(format!("value reference sets {n} variants, expected exactly one")),
        }
    }
}

impl From<BoundValue> for RawBoundValue {
    fn from(value: BoundValue) -> Self {
        let mut raw = RawBoundValue::default();
        match value {
            BoundValue::LiteralString(s) => raw.literal_string = Some(s),
            BoundValue::LiteralNumber(n) => raw.literal_number = Some(n),
            BoundValue::LiteralBoolean(b) => raw.literal_boolean = Some(b),
            BoundValue::Path(p) => raw.path = Some(p),
        }
        raw
    }
}

/// The kind of concrete value a property expects after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
        }
    }
}

/// Where relative paths point while rendering.
///
/// Outside any template the scope is the root. Entering a template element
/// fixes the base to `<array path>/<index>`; relative paths are appended to that
/// base while absolute paths (leading `/`) pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    indices: Vec<usize>,
}

impl BindingScope {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.base.is_none()
    }

    /// The data-model path of the array element currently in scope.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Template indices from the outermost template inward.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Scope for element `index` of the array living at the absolute `array_path`.
    pub fn enter(&self, array_path: &str, index: usize) -> Self {
        let mut indices = self.indices.clone();
        indices.push(index);
        BindingScope {
            base: Some(join_path(array_path, &index.to_string())),
            indices,
        }
    }

    /// Turn a (possibly relative) binding path into an absolute data-model path.
    ///
    /// `""` and `"."` name the element in scope itself.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with('/') {
            return path.to_string();
        }
        let base = self.base.as_deref().unwrap_or("/");
        match path {
            "" | "." => base.to_string(),
            relative => join_path(base, relative.trim_start_matches("./")),
        }
    }

    /// Suffix appended to component ids rendered inside this scope, e.g. `#0#2`.
    pub fn instance_suffix(&self) -> String {
        self.indices.iter().map(|i| format!("#{i}")).collect()
    }
}

/// Join a base path and a child path with exactly one separator.
pub(crate) fn join_path(base: &str, child: &str) -> String {
    let base = base.trim_end_matches('/');
    let child = child.trim_start_matches('/');
    if child.is_empty() {
        if base.is_empty() { "/".to_string() } else { base.to_string() }
    } else {
        format!("{base}/{child}")
    }
}
