//! A2UI Value Resolution
//!
//! Reads value references against a data model at render time and writes
//! bound control values back.

use serde_json::Value;

use super::data_model::DataModel;
use super::error::{A2uiError, A2uiResult};
use super::value::{BindingScope, BoundValue, ValueKind};

/// Read side of the data binding for one data model.
///
/// # Example
///
/// ```rust
/// use a2ui_kit::a2ui::{BindingScope, BoundValue, DataModel, ValueResolver};
/// use serde_json::json;
///
/// let mut model = DataModel::new();
/// model.merge("/items", json!([{"name": "Alice"}])).unwrap();
///
/// let scope = BindingScope::root().enter("/items", 0);
/// let resolver = ValueResolver::new(&model);
/// let name = resolver.resolve_string("label", &BoundValue::path("name"), &scope).unwrap();
/// assert_eq!(name, "Alice");
/// ```
pub struct ValueResolver<'a> {
    data_model: &'a DataModel,
}

impl<'a> ValueResolver<'a> {
    pub fn new(data_model: &'a DataModel) -> Self {
        ValueResolver { data_model }
    }

    /// Raw resolution: the literal itself, or the node at the scoped path.
    ///
    /// `Ok(None)` means the path currently has no value. A path that cannot
    /// address anything, such as one stepping through a string, is
    /// `InvalidPath`.
    pub fn resolve(&self, value: &BoundValue, scope: &BindingScope) -> A2uiResult<Option<Value>> {
        match value {
            BoundValue::Path(path) => Ok(self.data_model.try_get(&scope.resolve(path))?.cloned()),
            literal => Ok(literal.literal_json()),
        }
    }

    /// Resolve without a kind expectation. An absent path is `null`.
    pub fn resolve_or_null(
        &self,
        component_id: &str,
        value: &BoundValue,
        scope: &BindingScope,
    ) -> A2uiResult<Value> {
        let resolved = self
            .resolve(value, scope)
            .map_err(|err| as_binding_error(component_id, "read", err))?;
        Ok(resolved.unwrap_or(Value::Null))
    }

    /// Resolve to the kind a property expects.
    ///
    /// An absent path yields the kind's default so controls can bind before
    /// their data arrives. A present value of an incompatible kind, or a path
    /// that cannot be read at all, is a `BindingError` naming `component_id`.
    pub fn resolve_as(
        &self,
        component_id: &str,
        value: &BoundValue,
        scope: &BindingScope,
        kind: ValueKind,
    ) -> A2uiResult<Value> {
        let resolved = self
            .resolve(value, scope)
            .map_err(|err| as_binding_error(component_id, "read", err))?;
        let Some(resolved) = resolved else {
            return Ok(default_for(kind));
        };

        let coerced = match (kind, &resolved) {
            (ValueKind::String, Value::String(_)) => Some(resolved.clone()),
            (ValueKind::String, Value::Number(n)) => {
                n.as_f64().map(|f| Value::String(display_number(n.as_i64(), f)))
            }
            (ValueKind::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (ValueKind::Number, Value::Number(_)) => Some(resolved.clone()),
            (ValueKind::Boolean, Value::Bool(_)) => Some(resolved.clone()),
            _ => None,
        };

        coerced.ok_or_else(|| {
            A2uiError::binding(
                component_id,
                format!(
                    "{} resolved to {resolved}, expected a {}",
                    describe(value, scope),
                    kind.name()
                ),
            )
        })
    }

    pub fn resolve_string(
        &self,
        component_id: &str,
        value: &BoundValue,
        scope: &BindingScope,
    ) -> A2uiResult<String> {
        match self.resolve_as(component_id, value, scope, ValueKind::String)? {
            Value::String(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }

    pub fn resolve_number(
        &self,
        component_id: &str,
        value: &BoundValue,
        scope: &BindingScope,
    ) -> A2uiResult<f64> {
        let resolved = self.resolve_as(component_id, value, scope, ValueKind::Number)?;
        Ok(resolved.as_f64().unwrap_or_default())
    }

    pub fn resolve_boolean(
        &self,
        component_id: &str,
        value: &BoundValue,
        scope: &BindingScope,
    ) -> A2uiResult<bool> {
        let resolved = self.resolve_as(component_id, value, scope, ValueKind::Boolean)?;
        Ok(resolved.as_bool().unwrap_or_default())
    }
}

/// Write a control's new value through its bound reference.
///
/// Returns the absolute path written and the value it replaced. Writing
/// through a literal reference is a `BindingError`, never a silent no-op, and
/// so is a path that cannot hold the value.
pub fn resolve_and_write(
    data_model: &mut DataModel,
    component_id: &str,
    value: &BoundValue,
    scope: &BindingScope,
    new_value: Value,
) -> A2uiResult<(String, Option<Value>)> {
    let Some(path) = value.as_path() else {
        return Err(A2uiError::binding(
            component_id,
            "cannot write through a literal reference",
        ));
    };

    let absolute = scope.resolve(path);
    let prior = data_model
        .merge(&absolute, new_value)
        .map_err(|err| as_binding_error(component_id, "write", err))?;
    Ok((absolute, prior))
}

/// An unaddressable path becomes a `BindingError` of the component using it.
fn as_binding_error(component_id: &str, access: &str, err: A2uiError) -> A2uiError {
    match err {
        A2uiError::InvalidPath { path, reason } => {
            A2uiError::binding(component_id, format!("cannot {access} `{path}`: {reason}"))
        }
        other => other,
    }
}

fn default_for(kind: ValueKind) -> Value {
    match kind {
        ValueKind::String => Value::String(String::new()),
        ValueKind::Number => serde_json::json!(0.0),
        ValueKind::Boolean => Value::Bool(false),
    }
}

/// Integral numbers print without a fractional part.
fn display_number(as_int: Option<i64>, as_float: f64) -> String {
    match as_int {
        Some(i) => i.to_string(),
        None if as_float.fract() == 0.0 && as_float.abs() < 1e15 => format!("{}", as_float as i64),
        None => as_float.to_string(),
    }
}

fn describe(value: &BoundValue, scope: &BindingScope) -> String {
    match value.as_path() {
        Some(path) => format!("path `{}`", scope.resolve(path)),
        None => "literal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model() -> DataModel {
        let mut model = DataModel::new();
        model
            .merge(
                "/",
                json!({
                    "user": {"name": "Bob", "age": 41},
                    "count": 5.0,
                    "ready": true,
                    "items": [{"name": "Alice"}, {"name": "Bob"}]
                }),
            )
            .unwrap();
        model
    }

    #[test]
    fn test_literals_resolve_to_themselves() {
        let model = model();
        let resolver = ValueResolver::new(&model);
        let root = BindingScope::root();

        assert_eq!(
            resolver
                .resolve_string("t", &BoundValue::literal_string("Hello"), &root)
                .unwrap(),
            "Hello"
        );
        assert_eq!(
            resolver
                .resolve_number("s", &BoundValue::literal_number(2.5), &root)
                .unwrap(),
            2.5
        );
    }

    #[test]
    fn test_paths_resolve_through_scope() {
        let model = model();
        let resolver = ValueResolver::new(&model);
        let root = BindingScope::root();

        assert_eq!(
            resolver.resolve_string("t", &BoundValue::path("/user/name"), &root).unwrap(),
            "Bob"
        );

        let first = root.enter("/items", 0);
        let second = root.enter("/items", 1);
        let name = BoundValue::path("name");
        assert_eq!(resolver.resolve_string("t", &name, &first).unwrap(), "Alice");
        assert_eq!(resolver.resolve_string("t", &name, &second).unwrap(), "Bob");
        // absolute paths ignore the template element
        assert_eq!(
            resolver.resolve_string("t", &BoundValue::path("/user/name"), &first).unwrap(),
            "Bob"
        );
    }

    #[test]
    fn test_text_displays_numbers_and_booleans() {
        let model = model();
        let resolver = ValueResolver::new(&model);
        let root = BindingScope::root();

        assert_eq!(resolver.resolve_string("t", &BoundValue::path("/count"), &root).unwrap(), "5");
        assert_eq!(resolver.resolve_string("t", &BoundValue::path("/user/age"), &root).unwrap(), "41");
        assert_eq!(resolver.resolve_string("t", &BoundValue::path("/ready"), &root).unwrap(), "true");
    }

    #[test]
    fn test_absent_path_yields_default() {
        let model = model();
        let resolver = ValueResolver::new(&model);
        let root = BindingScope::root();

        assert_eq!(resolver.resolve_string("t", &BoundValue::path("/nope"), &root).unwrap(), "");
        assert!(!resolver.resolve_boolean("c", &BoundValue::path("/nope"), &root).unwrap());
    }

    #[test]
    fn test_kind_mismatch_is_binding_error() {
        let model = model();
        let resolver = ValueResolver::new(&model);
        let root = BindingScope::root();

        let err = resolver
            .resolve_number("slider", &BoundValue::path("/user/name"), &root)
            .unwrap_err();
        assert!(matches!(&err, A2uiError::BindingError { component_id, .. } if component_id == "slider"));

        assert!(resolver.resolve_string("t", &BoundValue::path("/user"), &root).is_err());
        assert!(resolver
            .resolve_boolean("c", &BoundValue::literal_string("yes"), &root)
            .is_err());
    }

    #[test]
    fn test_read_through_scalar_is_binding_error() {
        let model = model();
        let resolver = ValueResolver::new(&model);
        let root = BindingScope::root();

        let err = resolver
            .resolve_string("greeting", &BoundValue::path("/user/name/first"), &root)
            .unwrap_err();
        assert!(matches!(
            &err,
            A2uiError::BindingError { component_id, reason }
                if component_id == "greeting" && reason.contains("/user/name/first")
        ));

        // a word segment on an array, and a relative path under a scalar element
        assert!(resolver.resolve_string("t", &BoundValue::path("/items/first"), &root).is_err());
        let scope = root.enter("/count", 0);
        assert!(resolver.resolve_number("s", &BoundValue::path("value"), &scope).is_err());

        // a missing index is still just absent
        assert_eq!(resolver.resolve_string("t", &BoundValue::path("/items/9/name"), &root).unwrap(), "");
        assert!(matches!(
            resolver.resolve(&BoundValue::path("/user/name/first"), &root),
            Err(A2uiError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_resolve_or_null() {
        let model = model();
        let resolver = ValueResolver::new(&model);
        let root = BindingScope::root();

        assert_eq!(
            resolver.resolve_or_null("b", &BoundValue::path("/user/age"), &root).unwrap(),
            json!(41)
        );
        assert_eq!(
            resolver.resolve_or_null("b", &BoundValue::path("/coupon"), &root).unwrap(),
            Value::Null
        );
        assert!(matches!(
            resolver.resolve_or_null("b", &BoundValue::path("/ready/flag"), &root),
            Err(A2uiError::BindingError { .. })
        ));
    }

    #[test]
    fn test_resolve_and_write() {
        let mut model = DataModel::new();
        let (path, prior) = resolve_and_write(
            &mut model,
            "name-field",
            &BoundValue::path("/form/name"),
            &BindingScope::root(),
            json!("Carol"),
        )
        .unwrap();

        assert_eq!(path, "/form/name");
        assert_eq!(prior, None);
        assert_eq!(model.get_string("/form/name"), Some("Carol"));
    }

    #[test]
    fn test_write_through_literal_is_rejected() {
        let mut model = DataModel::new();
        let before = model.clone();
        let err = resolve_and_write(
            &mut model,
            "name-field",
            &BoundValue::literal_string("/form/name"),
            &BindingScope::root(),
            json!("Carol"),
        )
        .unwrap_err();

        assert!(matches!(err, A2uiError::BindingError { .. }));
        assert_eq!(model, before);
    }

    #[test]
    fn test_write_in_template_scope() {
        let mut model = model();
        let scope = BindingScope::root().enter("/items", 1);
        resolve_and_write(&mut model, "f", &BoundValue::path("name"), &scope, json!("Robert")).unwrap();
        assert_eq!(model.get_string("/items/1/name"), Some("Robert"));
        assert_eq!(model.get_string("/items/0/name"), Some("Alice"));
    }

    #[test]
    fn test_write_across_scalar_is_binding_error() {
        let mut model = model();
        let err = resolve_and_write(
            &mut model,
            "f",
            &BoundValue::path("/user/name/first"),
            &BindingScope::root(),
            json!("B"),
        )
        .unwrap_err();
        assert!(matches!(err, A2uiError::BindingError { .. }));
    }
}
