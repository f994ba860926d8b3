//! A2UI Surface
//!
//! A surface owns one component graph and one data model and moves through
//! `Uninitialized -> Active -> TornDown`. Protocol messages and control
//! events are applied through a [`SurfaceHandle`], which serializes them on
//! a per-surface lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};

use super::action::{ActionDispatcher, OutboundEvent, UiEvent};
use super::config::RuntimeConfig;
use super::data_model::DataModel;
use super::error::{A2uiError, A2uiResult};
use super::graph::ComponentGraph;
use super::message::*;
use super::render::{RenderPass, RenderSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// Waiting for `beginRendering`
    Uninitialized,
    Active,
    /// Terminal; every further message is rejected
    TornDown,
}

/// Event emitted when a surface is created
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceCreatedEvent {
    pub surface_id: String,
}

/// Event emitted when components were upserted
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceUpdatedEvent {
    pub surface_id: String,
    pub updated_components: Vec<String>,
}

/// Event emitted when a surface is torn down
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDeletedEvent {
    pub surface_id: String,
}

/// Event emitted when the data model changed
#[derive(Debug, Clone, PartialEq)]
pub struct DataModelUpdatedEvent {
    pub surface_id: String,
    pub updated_paths: Vec<String>,
}

/// What applying a message did, for hosts deciding when to re-render.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    SurfaceCreated(SurfaceCreatedEvent),
    SurfaceUpdated(SurfaceUpdatedEvent),
    SurfaceDeleted(SurfaceDeletedEvent),
    DataModelUpdated(DataModelUpdatedEvent),
}

impl SurfaceEvent {
    pub fn surface_id(&self) -> &str {
        match self {
            SurfaceEvent::SurfaceCreated(e) => &e.surface_id,
            SurfaceEvent::SurfaceUpdated(e) => &e.surface_id,
            SurfaceEvent::SurfaceDeleted(e) => &e.surface_id,
            SurfaceEvent::DataModelUpdated(e) => &e.surface_id,
        }
    }
}

/// One UI surface with its component graph and data model.
#[derive(Debug, Clone)]
pub struct Surface {
    pub(crate) id: String,
    state: SurfaceState,
    /// Fixed by `beginRendering`
    root: Option<String>,
    styles: Option<SurfaceStyles>,
    pub(crate) graph: ComponentGraph,
    pub(crate) data_model: DataModel,
    config: RuntimeConfig,
}

impl Surface {
    pub fn new(id: impl Into<String>, config: RuntimeConfig) -> Self {
        Surface {
            id: id.into(),
            state: SurfaceState::Uninitialized,
            root: None,
            styles: None,
            graph: ComponentGraph::new(),
            data_model: DataModel::new(),
            config,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn styles(&self) -> Option<&SurfaceStyles> {
        self.styles.as_ref()
    }

    pub fn graph(&self) -> &ComponentGraph {
        &self.graph
    }

    pub fn data_model(&self) -> &DataModel {
        &self.data_model
    }

    pub fn ensure_active(&self) -> A2uiResult<()> {
        match self.state {
            SurfaceState::Active => Ok(()),
            SurfaceState::Uninitialized => Err(A2uiError::unknown_surface(
                &self.id,
                "no beginRendering received",
            )),
            SurfaceState::TornDown => Err(A2uiError::SurfaceTornDown(self.id.clone())),
        }
    }

    /// Apply one protocol message.
    ///
    /// A rejected message leaves the surface exactly as it was.
    pub fn apply(&mut self, message: &A2uiMessage) -> A2uiResult<Vec<SurfaceEvent>> {
        if message.surface_id() != self.id {
            return Err(A2uiError::unknown_surface(
                message.surface_id(),
                format!("message routed to surface `{}`", self.id),
            ));
        }
        if self.state == SurfaceState::TornDown {
            return Err(A2uiError::SurfaceTornDown(self.id.clone()));
        }

        match message {
            A2uiMessage::BeginRendering(msg) => self.begin_rendering(msg),
            A2uiMessage::SurfaceUpdate(msg) => self.surface_update(msg),
            A2uiMessage::DataModelUpdate(msg) => self.data_model_update(msg),
            A2uiMessage::DeleteSurface(_) => Ok(self.tear_down().into_iter().collect()),
        }
    }

    /// Resolve the whole surface from its root.
    ///
    /// Dangling references and binding errors are rendered as placeholders
    /// and listed in the snapshot's diagnostics. A cycle or excessive depth
    /// fails the pass; the surface stays usable either way.
    pub fn render(&self) -> A2uiResult<RenderSnapshot> {
        self.ensure_active()?;
        let root = self.root.as_deref().unwrap_or_default();

        let (node, diagnostics) =
            RenderPass::new(&self.graph, &self.data_model, self.config.max_render_depth)
                .run(root)?;

        if !diagnostics.is_empty() {
            debug!(
                "surface {} rendered with {} diagnostics",
                self.id,
                diagnostics.len()
            );
        }

        Ok(RenderSnapshot {
            surface_id: self.id.clone(),
            root: node,
            styles: self.styles.clone(),
            data_version: self.data_model.version(),
            diagnostics,
        })
    }

    /// Move to `TornDown` and drop all owned state.
    ///
    /// Returns the deletion event, or `None` if already torn down.
    pub fn tear_down(&mut self) -> Option<SurfaceEvent> {
        if self.state == SurfaceState::TornDown {
            return None;
        }
        info!("surface {} torn down", self.id);
        self.state = SurfaceState::TornDown;
        self.graph = ComponentGraph::new();
        self.data_model = DataModel::new();
        Some(SurfaceEvent::SurfaceDeleted(SurfaceDeletedEvent {
            surface_id: self.id.clone(),
        }))
    }

    fn begin_rendering(&mut self, msg: &BeginRendering) -> A2uiResult<Vec<SurfaceEvent>> {
        if self.state == SurfaceState::Active {
            return Err(A2uiError::unknown_surface(&self.id, "surface is already active"));
        }

        info!("surface {} begins rendering from {}", self.id, msg.root);
        self.state = SurfaceState::Active;
        self.root = Some(msg.root.clone());
        self.styles = msg.styles.clone();

        Ok(vec![SurfaceEvent::SurfaceCreated(SurfaceCreatedEvent {
            surface_id: self.id.clone(),
        })])
    }

    fn surface_update(&mut self, msg: &SurfaceUpdate) -> A2uiResult<Vec<SurfaceEvent>> {
        self.ensure_active()?;

        let mut updated_ids = Vec::with_capacity(msg.components.len());
        for component in &msg.components {
            updated_ids.push(component.id.clone());
            self.graph.put(component.clone());
        }

        let pending = self.graph.unresolved_references();
        if !pending.is_empty() {
            debug!(
                "surface {} has {} references awaiting definitions",
                self.id,
                pending.len()
            );
        }

        Ok(vec![SurfaceEvent::SurfaceUpdated(SurfaceUpdatedEvent {
            surface_id: self.id.clone(),
            updated_components: updated_ids,
        })])
    }

    fn data_model_update(&mut self, msg: &DataModelUpdate) -> A2uiResult<Vec<SurfaceEvent>> {
        self.ensure_active()?;

        let updated_paths = self.data_model.apply_update(&msg.path, &msg.contents)?;

        Ok(vec![SurfaceEvent::DataModelUpdated(DataModelUpdatedEvent {
            surface_id: self.id.clone(),
            updated_paths,
        })])
    }
}

/// Shared, sequenced access to one surface.
///
/// Every mutation and every render takes the same lock, so a protocol update
/// and a control write to the same path are totally ordered. Handles of
/// different surfaces never contend.
#[derive(Debug, Clone)]
pub struct SurfaceHandle {
    inner: Arc<Mutex<Surface>>,
}

impl SurfaceHandle {
    pub fn new(surface: Surface) -> Self {
        SurfaceHandle {
            inner: Arc::new(Mutex::new(surface)),
        }
    }

    /// Lock the surface. A poisoned lock is recovered; surface state is only
    /// changed after validation so it is never left half-applied.
    pub fn lock(&self) -> MutexGuard<'_, Surface> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn state(&self) -> SurfaceState {
        self.lock().state
    }

    pub fn apply(&self, message: &A2uiMessage) -> A2uiResult<Vec<SurfaceEvent>> {
        self.lock().apply(message)
    }

    /// Apply a control event under the lock, then deliver its outbound events
    /// with the lock released so a sink may call back into this surface.
    pub fn handle_event(
        &self,
        dispatcher: &ActionDispatcher,
        event: &UiEvent,
    ) -> A2uiResult<Vec<OutboundEvent>> {
        let outbound = dispatcher.apply(&mut self.lock(), event)?;
        dispatcher.deliver(&outbound);
        Ok(outbound)
    }

    /// Render under the lock; the returned snapshot is immutable and detached.
    pub fn render(&self) -> A2uiResult<RenderSnapshot> {
        self.lock().render()
    }

    pub fn tear_down(&self) -> Option<SurfaceEvent> {
        self.lock().tear_down()
    }
}
