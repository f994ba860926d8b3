//! A2UI Actions
//!
//! Control events raised by a rendering backend come in as [`UiEvent`]s.
//! Edits on bound controls are written back into the data model. A button press
//! becomes an outbound `userAction` whose context is resolved against the data
//! model at that moment. Outbound events leave through an [`ActionSink`].
//! Delivery is fire-and-forget.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{A2uiError, A2uiResult};
use super::message::{ActionDefinition, ComponentType, UserAction, UserActionPayload};
use super::render::RenderNode;
use super::resolver::{ValueResolver, resolve_and_write};
use super::surface::Surface;
use super::value::{BindingScope, BoundValue, ValueKind};

/// An interaction reported by a rendering backend.
///
/// `component_id` is the definition id and `scope` the binding scope of the
/// render node the interaction happened on.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Press {
        component_id: String,
        scope: BindingScope,
    },
    TextChanged {
        component_id: String,
        scope: BindingScope,
        text: String,
    },
    CheckChanged {
        component_id: String,
        scope: BindingScope,
        value: bool,
    },
    SliderChanged {
        component_id: String,
        scope: BindingScope,
        value: f64,
    },
}

impl UiEvent {
    pub fn press(node: &RenderNode) -> Self {
        UiEvent::Press {
            component_id: node.id.clone(),
            scope: node.scope.clone(),
        }
    }

    pub fn text_changed(node: &RenderNode, text: impl Into<String>) -> Self {
        UiEvent::TextChanged {
            component_id: node.id.clone(),
            scope: node.scope.clone(),
            text: text.into(),
        }
    }

    pub fn check_changed(node: &RenderNode, value: bool) -> Self {
        UiEvent::CheckChanged {
            component_id: node.id.clone(),
            scope: node.scope.clone(),
            value,
        }
    }

    pub fn slider_changed(node: &RenderNode, value: f64) -> Self {
        UiEvent::SliderChanged {
            component_id: node.id.clone(),
            scope: node.scope.clone(),
            value,
        }
    }

    pub fn component_id(&self) -> &str {
        match self {
            UiEvent::Press { component_id, .. }
            | UiEvent::TextChanged { component_id, .. }
            | UiEvent::CheckChanged { component_id, .. }
            | UiEvent::SliderChanged { component_id, .. } => component_id,
        }
    }

    pub fn scope(&self) -> &BindingScope {
        match self {
            UiEvent::Press { scope, .. }
            | UiEvent::TextChanged { scope, .. }
            | UiEvent::CheckChanged { scope, .. }
            | UiEvent::SliderChanged { scope, .. } => scope,
        }
    }

    /// Kind of value an edit writes; `None` for a press.
    pub fn edit_kind(&self) -> Option<ValueKind> {
        match self {
            UiEvent::Press { .. } => None,
            UiEvent::TextChanged { .. } => Some(ValueKind::String),
            UiEvent::CheckChanged { .. } => Some(ValueKind::Boolean),
            UiEvent::SliderChanged { .. } => Some(ValueKind::Number),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            UiEvent::Press { .. } => "press",
            UiEvent::TextChanged { .. } => "text change",
            UiEvent::CheckChanged { .. } => "check change",
            UiEvent::SliderChanged { .. } => "slider change",
        }
    }
}

/// Message sent from the runtime to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutboundEvent {
    UserAction(UserAction),
    #[serde(rename_all = "camelCase")]
    DataModelChanged {
        surface_id: String,
        path: String,
        value: Value,
    },
}

/// Destination of outbound events.
pub trait ActionSink: Send + Sync {
    fn send(&self, event: OutboundEvent);
}

impl ActionSink for Sender<OutboundEvent> {
    fn send(&self, event: OutboundEvent) {
        if let Err(err) = Sender::send(self, event) {
            warn!("dropping outbound event, receiver is gone: {:?}", err.0);
        }
    }
}

/// Sink that keeps events in memory until a host polls them.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<OutboundEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all collected events (clears the queue)
    pub fn take(&self) -> Vec<OutboundEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActionSink for CollectingSink {
    fn send(&self, event: OutboundEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Turns [`UiEvent`]s into data model writes and outbound events.
#[derive(Clone)]
pub struct ActionDispatcher {
    sink: Arc<dyn ActionSink>,
    emit_data_model_changes: bool,
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("emit_data_model_changes", &self.emit_data_model_changes)
            .finish_non_exhaustive()
    }
}

impl ActionDispatcher {
    pub fn new(sink: Arc<dyn ActionSink>, emit_data_model_changes: bool) -> Self {
        ActionDispatcher {
            sink,
            emit_data_model_changes,
        }
    }

    /// Apply `event` to `surface`, hand the outbound events it produced to the
    /// sink and return copies for the caller's bookkeeping.
    ///
    /// A write through a literal reference, or an event that does not fit the
    /// component's kind, is a `BindingError` and changes nothing. The sink runs
    /// while the caller still holds `surface`; [`SurfaceHandle::handle_event`]
    /// releases the surface lock before delivering.
    ///
    /// [`SurfaceHandle::handle_event`]: super::surface::SurfaceHandle::handle_event
    pub fn dispatch(&self, surface: &mut Surface, event: &UiEvent) -> A2uiResult<Vec<OutboundEvent>> {
        let outbound = self.apply(surface, event)?;
        self.deliver(&outbound);
        Ok(outbound)
    }

    /// Apply `event` to `surface` without delivering anything.
    pub(crate) fn apply(&self, surface: &mut Surface, event: &UiEvent) -> A2uiResult<Vec<OutboundEvent>> {
        surface.ensure_active()?;

        let component_id = event.component_id();
        let component = surface
            .graph
            .get(component_id)
            .map(|definition| definition.component.clone())
            .ok_or_else(|| A2uiError::DanglingReference {
                missing: component_id.to_string(),
                referenced_by: format!("{} event", event.name()),
            })?;

        match event.edit_kind() {
            None => self.press(surface, event, &component),
            Some(kind) => self.edit(surface, event, kind, &component),
        }
    }

    /// Hand `events` to the sink in order.
    pub fn deliver(&self, events: &[OutboundEvent]) {
        for event in events {
            self.sink.send(event.clone());
        }
    }

    fn press(
        &self,
        surface: &Surface,
        event: &UiEvent,
        component: &ComponentType,
    ) -> A2uiResult<Vec<OutboundEvent>> {
        let ComponentType::Button(button) = component else {
            return Err(mismatch(event, component));
        };
        let component_id = event.component_id();
        match &button.action {
            Some(action) => Ok(vec![self.user_action(surface, component_id, action, event.scope())?]),
            None => {
                debug!("button {component_id} has no action, press ignored");
                Ok(vec![])
            }
        }
    }

    /// Write an edit through the component's bindable property.
    fn edit(
        &self,
        surface: &mut Surface,
        event: &UiEvent,
        kind: ValueKind,
        component: &ComponentType,
    ) -> A2uiResult<Vec<OutboundEvent>> {
        let component_id = event.component_id();
        let slot = component
            .kind()
            .bindable_slot()
            .filter(|slot| slot.kind == kind)
            .ok_or_else(|| mismatch(event, component))?;
        let bound = component
            .bindable_value()
            .ok_or_else(|| mismatch(event, component))?;

        let value = match (event, component) {
            (UiEvent::TextChanged { text, .. }, _) => Value::String(text.clone()),
            (UiEvent::CheckChanged { value, .. }, _) => Value::Bool(*value),
            (UiEvent::SliderChanged { value, .. }, ComponentType::Slider(slider)) => {
                if !value.is_finite() {
                    return Err(A2uiError::binding(
                        component_id,
                        format!("slider value {value} is not a finite number"),
                    ));
                }
                let clamped = match (slider.min, slider.max) {
                    (Some(min), Some(max)) if min <= max => value.clamp(min, max),
                    _ => *value,
                };
                serde_json::json!(clamped)
            }
            _ => return Err(mismatch(event, component)),
        };

        debug!("{component_id} edits its {} property", slot.property);
        self.write(surface, component_id, bound, event.scope(), value)
    }

    /// Build the `userAction` for a press, resolving context at trigger time.
    ///
    /// An absent context path sends `null`; a path that cannot be read fails
    /// the press.
    fn user_action(
        &self,
        surface: &Surface,
        component_id: &str,
        action: &ActionDefinition,
        scope: &BindingScope,
    ) -> A2uiResult<OutboundEvent> {
        let resolver = ValueResolver::new(&surface.data_model);
        let context = action
            .context
            .iter()
            .map(|item| {
                let value = resolver.resolve_or_null(component_id, &item.value, scope)?;
                Ok((item.key.clone(), value))
            })
            .collect::<A2uiResult<IndexMap<String, Value>>>()?;

        info!(
            "surface {} dispatching action {} from {component_id}",
            surface.id, action.name
        );

        Ok(OutboundEvent::UserAction(UserAction {
            surface_id: surface.id.clone(),
            action: UserActionPayload {
                name: action.name.clone(),
                context,
            },
            component_id: Some(format!("{component_id}{}", scope.instance_suffix())),
        }))
    }

    fn write(
        &self,
        surface: &mut Surface,
        component_id: &str,
        bound: &BoundValue,
        scope: &BindingScope,
        value: Value,
    ) -> A2uiResult<Vec<OutboundEvent>> {
        let (path, prior) =
            resolve_and_write(&mut surface.data_model, component_id, bound, scope, value.clone())?;

        if prior.as_ref() == Some(&value) {
            debug!("write of {path} by {component_id} changed nothing");
            return Ok(vec![]);
        }
        debug!("{component_id} wrote {path} on surface {}", surface.id);

        if !self.emit_data_model_changes {
            return Ok(vec![]);
        }
        Ok(vec![OutboundEvent::DataModelChanged {
            surface_id: surface.id.clone(),
            path,
            value,
        }])
    }
}

fn mismatch(event: &UiEvent, component: &ComponentType) -> A2uiError {
    A2uiError::binding(
        event.component_id(),
        format!(
            "a {} event does not apply to a {}",
            event.name(),
            component.kind().name()
        ),
    )
}
