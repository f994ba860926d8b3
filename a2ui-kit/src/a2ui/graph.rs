//! A2UI Component Graph
//!
//! Components arrive as a flat adjacency list and may reference ids that are
//! defined later in the same batch or in a later message. The graph therefore
//! stores definitions in an arena keyed by id and resolves references only
//! when asked for children.

use std::collections::HashMap;

use super::data_model::DataModel;
use super::error::{A2uiError, A2uiResult};
use super::message::{ChildrenRef, ComponentDefinition};
use super::template::TemplateExpander;
use super::value::BindingScope;

/// A child reference resolved for one render position.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildSlot {
    pub component_id: String,
    /// Scope the child renders in; template instances get their element's scope
    pub scope: BindingScope,
}

/// Component definitions of one surface, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ComponentGraph {
    components: HashMap<String, ComponentDefinition>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a definition, returning the one it replaced.
    ///
    /// Replacement is whole: nothing of the previous definition survives.
    pub fn put(&mut self, definition: ComponentDefinition) -> Option<ComponentDefinition> {
        self.components.insert(definition.id.clone(), definition)
    }

    pub fn get(&self, id: &str) -> Option<&ComponentDefinition> {
        self.components.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.components.keys()
    }

    /// Ordered children of `id` as rendered in `scope`.
    ///
    /// Explicit lists are returned as written; a template is expanded against
    /// the data model. Leaf components have no children.
    pub fn children(
        &self,
        id: &str,
        data_model: &DataModel,
        scope: &BindingScope,
    ) -> A2uiResult<Vec<ChildSlot>> {
        let definition = self.get(id).ok_or_else(|| A2uiError::DanglingReference {
            missing: id.to_string(),
            referenced_by: "children query".to_string(),
        })?;
        Self::children_of(definition, data_model, scope)
    }

    pub(crate) fn children_of(
        definition: &ComponentDefinition,
        data_model: &DataModel,
        scope: &BindingScope,
    ) -> A2uiResult<Vec<ChildSlot>> {
        if let Some(child) = definition.component.single_child() {
            return Ok(vec![ChildSlot {
                component_id: child.to_string(),
                scope: scope.clone(),
            }]);
        }

        match definition.component.children_ref() {
            None => Ok(vec![]),
            Some(ChildrenRef::ExplicitList(ids)) => Ok(ids
                .iter()
                .map(|child| ChildSlot {
                    component_id: child.clone(),
                    scope: scope.clone(),
                })
                .collect()),
            Some(ChildrenRef::Template {
                component_id,
                data_binding,
            }) => {
                let instances = TemplateExpander::new(data_model).expand(
                    &definition.id,
                    component_id,
                    data_binding,
                    scope,
                )?;
                Ok(instances
                    .into_iter()
                    .map(|instance| ChildSlot {
                        component_id: instance.component_id,
                        scope: instance.scope,
                    })
                    .collect())
            }
        }
    }

    /// Every `(referrer, missing id)` pair reachable through static references.
    ///
    /// Explicit children, single children and template ids are checked; the
    /// result is sorted so it can be reported deterministically.
    pub fn unresolved_references(&self) -> Vec<(String, String)> {
        let mut missing = Vec::new();
        for definition in self.components.values() {
            let component = &definition.component;
            let referenced: Vec<&str> = match component.children_ref() {
                Some(ChildrenRef::ExplicitList(ids)) => ids.iter().map(String::as_str).collect(),
                Some(ChildrenRef::Template { component_id, .. }) => vec![component_id.as_str()],
                None => component.single_child().into_iter().collect(),
            };
            missing.extend(
                referenced
                    .into_iter()
                    .filter(|id| !self.contains(id))
                    .map(|id| (definition.id.clone(), id.to_string())),
            );
        }
        missing.sort();
        missing
    }
}
