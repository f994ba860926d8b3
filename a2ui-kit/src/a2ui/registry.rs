//! A2UI Surface Registry
//!
//! Maps surface ids to live surfaces. A registry is an ordinary value owned
//! by the host and shared by reference (usually behind an `Arc`); there is no
//! global instance.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::{info, warn};

use super::action::{ActionDispatcher, ActionSink, OutboundEvent, UiEvent};
use super::config::RuntimeConfig;
use super::error::{A2uiError, A2uiResult};
use super::message::A2uiMessage;
use super::render::RenderSnapshot;
use super::surface::{Surface, SurfaceEvent, SurfaceHandle};

/// Process-scoped registry of surfaces.
///
/// The registry lock only guards the id map. Message application happens on
/// the per-surface lock, so different surfaces proceed in parallel.
///
/// Deleting a surface frees its id: a later `beginRendering` for the same id
/// starts a fresh surface, while handles to the deleted one stay torn down.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use a2ui_kit::a2ui::{CollectingSink, RuntimeConfig, SurfaceRegistry};
///
/// let registry = SurfaceRegistry::new(RuntimeConfig::default(), Arc::new(CollectingSink::new()));
/// let begin = serde_json::from_str(
///     r#"{"beginRendering": {"surfaceId": "main", "root": "root"}}"#,
/// ).unwrap();
/// registry.apply(&begin).unwrap();
/// assert_eq!(registry.surface_ids(), vec!["main".to_string()]);
/// ```
#[derive(Debug)]
pub struct SurfaceRegistry {
    config: RuntimeConfig,
    dispatcher: ActionDispatcher,
    surfaces: RwLock<HashMap<String, SurfaceHandle>>,
}

impl SurfaceRegistry {
    pub fn new(config: RuntimeConfig, sink: Arc<dyn ActionSink>) -> Self {
        let dispatcher = ActionDispatcher::new(sink, config.emit_data_model_changes);
        SurfaceRegistry {
            config,
            dispatcher,
            surfaces: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Route a message to its surface, creating the surface on `beginRendering`.
    pub fn apply(&self, message: &A2uiMessage) -> A2uiResult<Vec<SurfaceEvent>> {
        let surface_id = message.surface_id();
        match message {
            A2uiMessage::BeginRendering(_) => self.begin(surface_id, message),
            A2uiMessage::DeleteSurface(_) => self.teardown(surface_id),
            _ => self.lookup(surface_id)?.apply(message),
        }
    }

    pub fn get(&self, surface_id: &str) -> Option<SurfaceHandle> {
        self.read().get(surface_id).cloned()
    }

    /// Ids of the active surfaces, sorted.
    pub fn surface_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tear a surface down and forget its id. Holders of its handle see
    /// `SurfaceTornDown` from then on.
    pub fn teardown(&self, surface_id: &str) -> A2uiResult<Vec<SurfaceEvent>> {
        let handle = self
            .write()
            .remove(surface_id)
            .ok_or_else(|| A2uiError::unknown_surface(surface_id, "no such surface"))?;
        Ok(handle.tear_down().into_iter().collect())
    }

    /// Tear down every surface, returning how many were active.
    pub fn shutdown(&self) -> usize {
        let handles: Vec<SurfaceHandle> = self.write().drain().map(|(_, handle)| handle).collect();
        for handle in &handles {
            handle.tear_down();
        }
        if !handles.is_empty() {
            info!("registry shut down {} surfaces", handles.len());
        }
        handles.len()
    }

    /// Feed a control event to a surface.
    pub fn handle_event(&self, surface_id: &str, event: &UiEvent) -> A2uiResult<Vec<OutboundEvent>> {
        self.lookup(surface_id)?.handle_event(&self.dispatcher, event)
    }

    pub fn render(&self, surface_id: &str) -> A2uiResult<RenderSnapshot> {
        self.lookup(surface_id)?.render()
    }

    fn begin(&self, surface_id: &str, message: &A2uiMessage) -> A2uiResult<Vec<SurfaceEvent>> {
        let mut surfaces = self.write();
        if surfaces.contains_key(surface_id) {
            return Err(A2uiError::unknown_surface(surface_id, "surface is already active"));
        }

        let mut surface = Surface::new(surface_id, self.config.clone());
        let events = surface.apply(message)?;
        surfaces.insert(surface_id.to_string(), SurfaceHandle::new(surface));
        Ok(events)
    }

    fn lookup(&self, surface_id: &str) -> A2uiResult<SurfaceHandle> {
        if let Some(handle) = self.read().get(surface_id) {
            return Ok(handle.clone());
        }
        warn!("message for unknown surface {surface_id}");
        Err(A2uiError::unknown_surface(
            surface_id,
            "no beginRendering received",
        ))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, SurfaceHandle>> {
        self.surfaces.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, SurfaceHandle>> {
        self.surfaces.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SurfaceRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2ui::action::CollectingSink;
    use crate::a2ui::surface::SurfaceState;
    use serde_json::json;

    fn registry() -> (SurfaceRegistry, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::new());
        (SurfaceRegistry::new(RuntimeConfig::default(), sink.clone()), sink)
    }

    fn message(value: serde_json::Value) -> A2uiMessage {
        serde_json::from_value(value).unwrap()
    }

    fn begin(id: &str) -> A2uiMessage {
        message(json!({"beginRendering": {"surfaceId": id, "root": "root"}}))
    }

    #[test]
    fn test_unknown_surface() {
        let (registry, _) = registry();
        let update = message(json!({"surfaceUpdate": {"surfaceId": "ghost", "components": []}}));
        assert!(matches!(
            registry.apply(&update),
            Err(A2uiError::UnknownSurface { surface_id, .. }) if surface_id == "ghost"
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_repeated_begin() {
        let (registry, _) = registry();
        registry.apply(&begin("main")).unwrap();
        assert!(matches!(
            registry.apply(&begin("main")),
            Err(A2uiError::UnknownSurface { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_surfaces_are_independent() {
        let (registry, _) = registry();
        registry.apply(&begin("a")).unwrap();
        registry.apply(&begin("b")).unwrap();
        registry
            .apply(&message(json!({"dataModelUpdate": {"surfaceId": "a", "contents": [
                {"key": "x", "valueNumber": 1}
            ]}})))
            .unwrap();

        let a = registry.get("a").unwrap();
        let b = registry.get("b").unwrap();
        assert_eq!(a.lock().data_model().get_number("/x"), Some(1.0));
        assert_eq!(b.lock().data_model().get("/x"), None);
    }

    #[test]
    fn test_teardown_frees_the_id() {
        let (registry, _) = registry();
        registry.apply(&begin("main")).unwrap();
        let handle = registry.get("main").unwrap();

        let events = registry
            .apply(&message(json!({"deleteSurface": {"surfaceId": "main"}})))
            .unwrap();
        assert!(matches!(&events[..], [SurfaceEvent::SurfaceDeleted(_)]));
        assert_eq!(handle.state(), SurfaceState::TornDown);
        assert!(registry.get("main").is_none());

        for rejected in [
            registry.apply(&message(json!({"surfaceUpdate": {"surfaceId": "main", "components": []}}))),
            registry.teardown("main"),
        ] {
            assert!(matches!(
                rejected,
                Err(A2uiError::UnknownSurface { surface_id, .. }) if surface_id == "main"
            ));
        }
        // the deleted instance rejects everything, whoever still holds it
        assert_eq!(
            handle.apply(&begin("main")).unwrap_err(),
            A2uiError::SurfaceTornDown("main".into())
        );
        assert!(matches!(handle.render(), Err(A2uiError::SurfaceTornDown(_))));
    }

    #[test]
    fn test_begin_after_delete_starts_fresh() {
        let (registry, _) = registry();
        registry.apply(&begin("main")).unwrap();
        registry
            .apply(&message(json!({"dataModelUpdate": {"surfaceId": "main", "contents": [
                {"key": "stale", "valueString": "old"}
            ]}})))
            .unwrap();
        let old = registry.get("main").unwrap();
        registry.teardown("main").unwrap();

        let events = registry.apply(&begin("main")).unwrap();
        assert!(matches!(&events[..], [SurfaceEvent::SurfaceCreated(e)] if e.surface_id == "main"));
        assert_eq!(registry.surface_ids(), vec!["main".to_string()]);

        let fresh = registry.get("main").unwrap();
        assert_eq!(fresh.state(), SurfaceState::Active);
        assert_eq!(fresh.lock().data_model().get("/stale"), None);
        assert_eq!(old.state(), SurfaceState::TornDown);
    }

    #[test]
    fn test_shutdown() {
        let (registry, _) = registry();
        registry.apply(&begin("a")).unwrap();
        registry.apply(&begin("b")).unwrap();
        let a = registry.get("a").unwrap();

        assert_eq!(registry.shutdown(), 2);
        assert!(registry.surface_ids().is_empty());
        assert_eq!(a.state(), SurfaceState::TornDown);
        assert_eq!(registry.shutdown(), 0);
    }

    #[test]
    fn test_registry_usable_after_errors() {
        let (registry, _) = registry();
        let _ = registry.apply(&message(json!({"surfaceUpdate": {"surfaceId": "x", "components": []}})));
        registry.apply(&begin("x")).unwrap();
        registry
            .apply(&message(json!({"surfaceUpdate": {"surfaceId": "x", "components": [
                {"id": "root", "component": {"Text": {"text": {"literalString": "ok"}}}}
            ]}})))
            .unwrap();
        assert_eq!(registry.render("x").unwrap().root.text(), Some("ok"));
    }
}
