//! A2UI Template Expansion
//!
//! A template child specifier names one component subtree and an array in the
//! data model. Expansion yields one instance of the subtree per element, each
//! carrying the binding scope `<array path>/<index>` so relative paths inside
//! the subtree read from their own element.
//!
//! Expansion keeps no state between calls. Every call re-reads the array, so
//! the number of instances always equals the current array length.

use log::trace;
use serde_json::Value;

use super::data_model::DataModel;
use super::error::{A2uiError, A2uiResult};
use super::value::BindingScope;

/// One materialized copy of a template subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateInstance {
    /// Id of the template's root component definition
    pub component_id: String,
    /// Position in the bound array
    pub index: usize,
    /// Scope whose base is the element's absolute path
    pub scope: BindingScope,
}

impl TemplateInstance {
    /// Stable id of this instance, e.g. `row#3`.
    pub fn instance_id(&self) -> String {
        format!("{}{}", self.component_id, self.scope.instance_suffix())
    }
}

pub struct TemplateExpander<'a> {
    data_model: &'a DataModel,
}

impl<'a> TemplateExpander<'a> {
    pub fn new(data_model: &'a DataModel) -> Self {
        TemplateExpander { data_model }
    }

    /// Expand `template_id` over the array at `data_binding`.
    ///
    /// `owner_id` is the container holding the template; it is named in the
    /// `BindingError` raised when the binding is missing or not an array.
    /// A relative `data_binding` is resolved against `scope`, which is how
    /// nested templates reach into their parent's element.
    pub fn expand(
        &self,
        owner_id: &str,
        template_id: &str,
        data_binding: &str,
        scope: &BindingScope,
    ) -> A2uiResult<Vec<TemplateInstance>> {
        let array_path = scope.resolve(data_binding);
        let found = self.data_model.try_get(&array_path).map_err(|err| {
            A2uiError::binding(owner_id, format!("template data binding: {err}"))
        })?;
        let items = match found {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(A2uiError::binding(
                    owner_id,
                    format!("template data binding `{array_path}` is not an array ({other})"),
                ));
            }
            None => {
                return Err(A2uiError::binding(
                    owner_id,
                    format!("template data binding `{array_path}` does not exist"),
                ));
            }
        };

        trace!(
            "expanding template {template_id} over {array_path}: {} instances",
            items.len()
        );

        Ok((0..items.len())
            .map(|index| TemplateInstance {
                component_id: template_id.to_string(),
                index,
                scope: scope.enter(&array_path, index),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_instance_per_element() {
        let mut model = DataModel::new();
        model
            .merge("/items", json!([{"name": "Alice"}, {"name": "Bob"}]))
            .unwrap();

        let instances = TemplateExpander::new(&model)
            .expand("list", "row", "/items", &BindingScope::root())
            .unwrap();

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].instance_id(), "row#0");
        assert_eq!(instances[1].scope.resolve("name"), "/items/1/name");
        assert_eq!(model.get_string(&instances[1].scope.resolve("name")), Some("Bob"));
    }

    #[test]
    fn test_reexpansion_tracks_array_length() {
        let mut model = DataModel::new();
        model.merge("/items", json!([1, 2, 3, 4, 5])).unwrap();
        let root = BindingScope::root();
        assert_eq!(
            TemplateExpander::new(&model)
                .expand("list", "row", "/items", &root)
                .unwrap()
                .len(),
            5
        );

        model.merge("/items", json!([1, 2])).unwrap();
        let instances = TemplateExpander::new(&model)
            .expand("list", "row", "/items", &root)
            .unwrap();
        assert_eq!(instances.len(), 2);
        assert!(instances.iter().all(|i| i.index < 2));
    }

    #[test]
    fn test_missing_or_scalar_binding_is_binding_error() {
        let mut model = DataModel::new();
        model.merge("/title", json!("not a list")).unwrap();
        let expander = TemplateExpander::new(&model);
        let root = BindingScope::root();

        for binding in ["/title", "/absent", "/title/rows"] {
            let err = expander.expand("list", "row", binding, &root).unwrap_err();
            assert!(
                matches!(&err, A2uiError::BindingError { component_id, .. } if component_id == "list"),
                "unexpected error for {binding}: {err:?}"
            );
        }
    }

    #[test]
    fn test_nested_relative_binding() {
        let mut model = DataModel::new();
        model
            .merge("/groups", json!([{"tags": ["a"]}, {"tags": ["b", "c"]}]))
            .unwrap();

        let outer = TemplateExpander::new(&model)
            .expand("list", "group", "/groups", &BindingScope::root())
            .unwrap();
        let inner = TemplateExpander::new(&model)
            .expand("group", "tag", "tags", &outer[1].scope)
            .unwrap();

        assert_eq!(inner.len(), 2);
        assert_eq!(inner[1].instance_id(), "tag#1#1");
        assert_eq!(inner[1].scope.base(), Some("/groups/1/tags/1"));
    }

    #[test]
    fn test_empty_array_expands_to_nothing() {
        let mut model = DataModel::new();
        model.merge("/items", json!([])).unwrap();
        let instances = TemplateExpander::new(&model)
            .expand("list", "row", "/items", &BindingScope::root())
            .unwrap();
        assert!(instances.is_empty());
    }
}
