//! A2UI Render Tree
//!
//! The resolved, backend-facing form of a surface: every child reference
//! followed, every template expanded and every value reference replaced by
//! the concrete value it points at.
//!
//! Problems are handled at three levels:
//! - a missing component renders as a `Placeholder` where it was referenced
//! - a binding problem replaces only the offending component by a `Placeholder`
//! - a cycle, or recursion past the depth limit, aborts the whole pass
//!
//! All non-aborting problems are also listed in `RenderSnapshot::diagnostics`.

use serde::Serialize;

use super::catalog::ComponentKind;
use super::data_model::DataModel;
use super::error::{A2uiError, A2uiResult};
use super::graph::ComponentGraph;
use super::message::*;
use super::resolver::ValueResolver;
use super::value::{BindingScope, BoundValue};

const DEFAULT_SLIDER_MIN: f64 = 0.0;
const DEFAULT_SLIDER_MAX: f64 = 100.0;

/// A resolved surface, ready for a rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub surface_id: String,
    pub root: RenderNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<SurfaceStyles>,
    /// Data model version the snapshot was resolved against
    pub data_version: u64,
    #[serde(skip)]
    pub diagnostics: Vec<A2uiError>,
}

impl RenderSnapshot {
    /// Depth-first search by instance id.
    pub fn find(&self, instance_id: &str) -> Option<&RenderNode> {
        self.root.find(instance_id)
    }

    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// One rendered component instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    /// Definition id
    pub id: String,
    /// Definition id plus `#<index>` per enclosing template, e.g. `row#2`
    pub instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Scope to hand back with control events raised on this node
    pub scope: BindingScope,
    pub component: RenderedComponent,
}

impl RenderNode {
    pub fn children(&self) -> Vec<&RenderNode> {
        match &self.component {
            RenderedComponent::Column { children, .. }
            | RenderedComponent::Row { children, .. }
            | RenderedComponent::List { children, .. } => children.iter().collect(),
            RenderedComponent::Card { child } | RenderedComponent::Button { child, .. } => {
                vec![child.as_ref()]
            }
            _ => vec![],
        }
    }

    pub fn find(&self, instance_id: &str) -> Option<&RenderNode> {
        if self.instance_id == instance_id {
            return Some(self);
        }
        self.children().into_iter().find_map(|c| c.find(instance_id))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.component, RenderedComponent::Placeholder { .. })
    }

    /// Displayed text of a Text node.
    pub fn text(&self) -> Option<&str> {
        match &self.component {
            RenderedComponent::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum RenderedComponent {
    Column {
        children: Vec<RenderNode>,
        alignment: Option<Alignment>,
        distribution: Option<Distribution>,
    },
    Row {
        children: Vec<RenderNode>,
        alignment: Option<Alignment>,
        distribution: Option<Distribution>,
    },
    List {
        children: Vec<RenderNode>,
        direction: Option<ListDirection>,
    },
    Card {
        child: Box<RenderNode>,
    },
    Text {
        text: String,
        usage_hint: Option<TextUsageHint>,
    },
    Image {
        url: String,
        fit: Option<ImageFit>,
        usage_hint: Option<ImageUsageHint>,
    },
    Button {
        child: Box<RenderNode>,
        primary: bool,
        /// Name of the action a press dispatches
        action: Option<String>,
    },
    TextField {
        text: String,
        label: Option<String>,
        placeholder: Option<String>,
        input_type: Option<TextInputType>,
        /// Absolute data path edits are written to; `None` for literal text
        binding: Option<String>,
    },
    CheckBox {
        value: bool,
        label: Option<String>,
        binding: Option<String>,
    },
    Slider {
        value: f64,
        min: f64,
        max: f64,
        step: Option<f64>,
        binding: Option<String>,
    },
    /// Stand-in for a component that could not be rendered
    Placeholder {
        reason: String,
    },
}

/// A single walk over a surface's graph.
pub(crate) struct RenderPass<'a> {
    graph: &'a ComponentGraph,
    resolver: ValueResolver<'a>,
    data_model: &'a DataModel,
    max_depth: usize,
    /// `(component id, scope)` of every node on the current path from the root
    ancestors: Vec<(String, BindingScope)>,
    diagnostics: Vec<A2uiError>,
}

impl<'a> RenderPass<'a> {
    pub(crate) fn new(graph: &'a ComponentGraph, data_model: &'a DataModel, max_depth: usize) -> Self {
        RenderPass {
            graph,
            resolver: ValueResolver::new(data_model),
            data_model,
            max_depth,
            ancestors: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Render from `root`, returning the tree and the collected diagnostics.
    pub(crate) fn run(mut self, root: &str) -> A2uiResult<(RenderNode, Vec<A2uiError>)> {
        let node = self.render_node(root, "root", &BindingScope::root())?;
        Ok((node, self.diagnostics))
    }

    fn render_node(
        &mut self,
        id: &str,
        referenced_by: &str,
        scope: &BindingScope,
    ) -> A2uiResult<RenderNode> {
        if self.ancestors.len() >= self.max_depth {
            return Err(A2uiError::RenderDepthExceeded {
                limit: self.max_depth,
            });
        }

        if let Some(start) = self
            .ancestors
            .iter()
            .position(|(ancestor, ancestor_scope)| ancestor == id && ancestor_scope == scope)
        {
            let mut cycle: Vec<String> =
                self.ancestors[start..].iter().map(|(a, _)| a.clone()).collect();
            cycle.push(id.to_string());
            return Err(A2uiError::CycleDetected { cycle });
        }

        let graph = self.graph;
        let Some(definition) = graph.get(id) else {
            let err = A2uiError::DanglingReference {
                missing: id.to_string(),
                referenced_by: referenced_by.to_string(),
            };
            return Ok(self.placeholder(id, None, scope, err));
        };

        self.ancestors.push((id.to_string(), scope.clone()));
        let built = self.build(definition, scope);
        self.ancestors.pop();

        match built {
            Ok(component) => Ok(RenderNode {
                id: id.to_string(),
                instance_id: format!("{id}{}", scope.instance_suffix()),
                weight: definition.weight,
                scope: scope.clone(),
                component,
            }),
            Err(err) if err.aborts_render() => Err(err),
            Err(err) => Ok(self.placeholder(id, definition.weight, scope, err)),
        }
    }

    fn placeholder(
        &mut self,
        id: &str,
        weight: Option<f64>,
        scope: &BindingScope,
        err: A2uiError,
    ) -> RenderNode {
        log::debug!("rendering placeholder for {id}: {err}");
        let reason = err.to_string();
        self.diagnostics.push(err);
        RenderNode {
            id: id.to_string(),
            instance_id: format!("{id}{}", scope.instance_suffix()),
            weight,
            scope: scope.clone(),
            component: RenderedComponent::Placeholder { reason },
        }
    }

    fn build(
        &mut self,
        definition: &ComponentDefinition,
        scope: &BindingScope,
    ) -> A2uiResult<RenderedComponent> {
        let id = definition.id.as_str();
        let binding = definition
            .component
            .bindable_value()
            .and_then(|value| binding_path(value, scope));
        let component = match &definition.component {
            ComponentType::Column(c) => RenderedComponent::Column {
                children: self.render_children(definition, scope)?,
                alignment: c.alignment,
                distribution: c.distribution,
            },
            ComponentType::Row(c) => RenderedComponent::Row {
                children: self.render_children(definition, scope)?,
                alignment: c.alignment,
                distribution: c.distribution,
            },
            ComponentType::List(c) => RenderedComponent::List {
                children: self.render_children(definition, scope)?,
                direction: c.direction,
            },
            ComponentType::Card(c) => RenderedComponent::Card {
                child: Box::new(self.render_node(&c.child, id, scope)?),
            },
            ComponentType::Text(c) => RenderedComponent::Text {
                text: self.resolver.resolve_string(id, &c.text, scope)?,
                usage_hint: c.usage_hint,
            },
            ComponentType::Image(c) => RenderedComponent::Image {
                url: self.resolver.resolve_string(id, &c.url, scope)?,
                fit: c.fit,
                usage_hint: c.usage_hint,
            },
            ComponentType::Button(c) => RenderedComponent::Button {
                child: Box::new(self.render_node(&c.child, id, scope)?),
                primary: c.primary.unwrap_or(false),
                action: c.action.as_ref().map(|a| a.name.clone()),
            },
            ComponentType::TextField(c) => RenderedComponent::TextField {
                text: self.resolver.resolve_string(id, &c.text, scope)?,
                label: self.optional_string(id, c.label.as_ref(), scope)?,
                placeholder: self.optional_string(id, c.placeholder.as_ref(), scope)?,
                input_type: c.input_type,
                binding,
            },
            ComponentType::CheckBox(c) => RenderedComponent::CheckBox {
                value: self.resolver.resolve_boolean(id, &c.value, scope)?,
                label: self.optional_string(id, c.label.as_ref(), scope)?,
                binding,
            },
            ComponentType::Slider(c) => RenderedComponent::Slider {
                value: self.resolver.resolve_number(id, &c.value, scope)?,
                min: c.min.unwrap_or(DEFAULT_SLIDER_MIN),
                max: c.max.unwrap_or(DEFAULT_SLIDER_MAX),
                step: c.step,
                binding,
            },
        };
        Ok(component)
    }

    fn render_children(
        &mut self,
        definition: &ComponentDefinition,
        scope: &BindingScope,
    ) -> A2uiResult<Vec<RenderNode>> {
        debug_assert!(ComponentKind::of(&definition.component).is_container());
        let slots = ComponentGraph::children_of(definition, self.data_model, scope)?;
        slots
            .iter()
            .map(|slot| self.render_node(&slot.component_id, &definition.id, &slot.scope))
            .collect()
    }

    fn optional_string(
        &self,
        id: &str,
        value: Option<&BoundValue>,
        scope: &BindingScope,
    ) -> A2uiResult<Option<String>> {
        value
            .map(|v| self.resolver.resolve_string(id, v, scope))
            .transpose()
    }
}

fn binding_path(value: &BoundValue, scope: &BindingScope) -> Option<String> {
    value.as_path().map(|p| scope.resolve(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(components: serde_json::Value) -> ComponentGraph {
        let defs: Vec<ComponentDefinition> = serde_json::from_value(components).unwrap();
        let mut graph = ComponentGraph::new();
        for def in defs {
            graph.put(def);
        }
        graph
    }

    fn render(graph: &ComponentGraph, model: &DataModel) -> A2uiResult<(RenderNode, Vec<A2uiError>)> {
        RenderPass::new(graph, model, 32).run("root")
    }

    #[test]
    fn test_template_rows_bind_to_their_element() {
        let graph = parse(json!([
            {"id": "root", "component": {"List": {"children": {"template": {"componentId": "row", "dataBinding": "/items"}}}}},
            {"id": "row", "component": {"Text": {"text": {"path": "name"}}}}
        ]));
        let mut model = DataModel::new();
        model
            .merge("/items", json!([{"name": "Alice"}, {"name": "Bob"}]))
            .unwrap();

        let (root, diagnostics) = render(&graph, &model).unwrap();
        assert!(diagnostics.is_empty());
        let rows = root.children();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].instance_id, "row#0");
        assert_eq!(rows[0].text(), Some("Alice"));
        assert_eq!(rows[1].text(), Some("Bob"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let graph = parse(json!([
            {"id": "root", "component": {"Column": {"children": {"explicitList": ["a"]}}}},
            {"id": "a", "component": {"Column": {"children": {"explicitList": ["b"]}}}},
            {"id": "b", "component": {"Row": {"children": {"explicitList": ["a"]}}}}
        ]));

        let err = render(&graph, &DataModel::new()).unwrap_err();
        assert_eq!(
            err,
            A2uiError::CycleDetected {
                cycle: vec!["a".into(), "b".into(), "a".into()]
            }
        );
    }

    #[test]
    fn test_self_reference_through_card_is_a_cycle() {
        let graph = parse(json!([
            {"id": "root", "component": {"Card": {"child": "root"}}}
        ]));
        assert!(matches!(
            render(&graph, &DataModel::new()),
            Err(A2uiError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_shared_child_is_not_a_cycle() {
        let graph = parse(json!([
            {"id": "root", "component": {"Column": {"children": {"explicitList": ["x", "y"]}}}},
            {"id": "x", "component": {"Card": {"child": "leaf"}}},
            {"id": "y", "component": {"Card": {"child": "leaf"}}},
            {"id": "leaf", "component": {"Text": {"text": {"literalString": "shared"}}}}
        ]));
        let (root, diagnostics) = render(&graph, &DataModel::new()).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(root.children().len(), 2);
    }

    #[test]
    fn test_dangling_child_renders_placeholder() {
        let graph = parse(json!([
            {"id": "root", "component": {"Column": {"children": {"explicitList": ["ok", "ghost"]}}}},
            {"id": "ok", "component": {"Text": {"text": {"literalString": "fine"}}}}
        ]));

        let (root, diagnostics) = render(&graph, &DataModel::new()).unwrap();
        let children = root.children();
        assert_eq!(children[0].text(), Some("fine"));
        assert!(children[1].is_placeholder());
        assert!(matches!(
            &diagnostics[..],
            [A2uiError::DanglingReference { missing, referenced_by }] if missing == "ghost" && referenced_by == "root"
        ));
    }

    #[test]
    fn test_binding_error_is_local() {
        let graph = parse(json!([
            {"id": "root", "component": {"Column": {"children": {"explicitList": ["list", "slider", "title"]}}}},
            {"id": "list", "component": {"List": {"children": {"template": {"componentId": "row", "dataBinding": "/notAnArray"}}}}},
            {"id": "row", "component": {"Text": {"text": {"path": "name"}}}},
            {"id": "slider", "component": {"Slider": {"value": {"path": "/title"}}}},
            {"id": "title", "component": {"Text": {"text": {"path": "/title"}}}}
        ]));
        let mut model = DataModel::new();
        model.merge("/title", json!("Hello")).unwrap();
        model.merge("/notAnArray", json!({"a": 1})).unwrap();

        let (root, diagnostics) = render(&graph, &model).unwrap();
        let children = root.children();
        assert!(children[0].is_placeholder());
        assert!(children[1].is_placeholder());
        assert_eq!(children[2].text(), Some("Hello"));
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .all(|d| matches!(d, A2uiError::BindingError { .. })));
    }

    #[test]
    fn test_read_through_scalar_renders_placeholder() {
        let graph = parse(json!([
            {"id": "root", "component": {"Column": {"children": {"explicitList": ["first", "whole"]}}}},
            {"id": "first", "component": {"Text": {"text": {"path": "/user/name/first"}}}},
            {"id": "whole", "component": {"Text": {"text": {"path": "/user/name"}}}}
        ]));
        let mut model = DataModel::new();
        model.merge("/user/name", json!("Bob")).unwrap();

        let (root, diagnostics) = render(&graph, &model).unwrap();
        let children = root.children();
        assert!(children[0].is_placeholder());
        assert_eq!(children[0].text(), None);
        assert_eq!(children[1].text(), Some("Bob"));
        assert!(matches!(
            &diagnostics[..],
            [A2uiError::BindingError { component_id, .. }] if component_id == "first"
        ));
    }

    #[test]
    fn test_depth_limit() {
        let graph = parse(json!([
            {"id": "root", "component": {"Card": {"child": "a"}}},
            {"id": "a", "component": {"Card": {"child": "b"}}},
            {"id": "b", "component": {"Text": {"text": {"literalString": "deep"}}}}
        ]));
        let model = DataModel::new();
        assert!(RenderPass::new(&graph, &model, 3).run("root").is_ok());
        assert_eq!(
            RenderPass::new(&graph, &model, 2).run("root").unwrap_err(),
            A2uiError::RenderDepthExceeded { limit: 2 }
        );
    }

    #[test]
    fn test_controls_report_absolute_bindings() {
        let graph = parse(json!([
            {"id": "root", "component": {"List": {"children": {"template": {"componentId": "field", "dataBinding": "/people"}}}}},
            {"id": "field", "component": {"TextField": {"text": {"path": "name"}, "label": {"literalString": "Name"}}}}
        ]));
        let mut model = DataModel::new();
        model.merge("/people", json!([{"name": "Ann"}])).unwrap();

        let (root, _) = render(&graph, &model).unwrap();
        match &root.children()[0].component {
            RenderedComponent::TextField { text, label, binding, .. } => {
                assert_eq!(text, "Ann");
                assert_eq!(label.as_deref(), Some("Name"));
                assert_eq!(binding.as_deref(), Some("/people/0/name"));
            }
            other => panic!("expected TextField, got {other:?}"),
        }
    }
}
