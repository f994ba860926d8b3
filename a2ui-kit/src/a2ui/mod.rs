//! A2UI Protocol Runtime
//!
//! A2UI (Agent-to-UI) is a declarative JSON protocol for AI agents to generate
//! rich, interactive UIs. This module keeps the state of every surface the
//! agent describes and resolves it into a render tree a backend can draw.
//!
//! # Architecture
//!
//! ```text
//! A2UI JSON Messages          UiEvents (backend)
//!        ↓                          ↓
//! A2uiMessageProcessor       ActionDispatcher ──→ ActionSink (controller)
//!        ↓                          ↓
//!   SurfaceRegistry ──→ SurfaceHandle (per-surface lock)
//!                               ↓
//!                   ┌───────────┴───────────┐
//!                   │                       │
//!            ComponentGraph            DataModel
//!                   │                       │
//!                   └──── TemplateExpander ─┘
//!                         ValueResolver
//!                               ↓
//!                        RenderSnapshot
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use a2ui_kit::a2ui::*;
//!
//! let sink = Arc::new(CollectingSink::new());
//! let registry = Arc::new(SurfaceRegistry::new(RuntimeConfig::default(), sink.clone()));
//! let processor = A2uiMessageProcessor::new(registry.clone());
//!
//! processor.process_json(r#"[
//!     {"beginRendering": {"surfaceId": "main", "root": "name"}},
//!     {"surfaceUpdate": {"surfaceId": "main", "components": [
//!         {"id": "name", "component": {"TextField": {"text": {"path": "/user/name"}}}}
//!     ]}}
//! ]"#);
//!
//! let snapshot = registry.render("main").unwrap();
//! let edit = UiEvent::text_changed(&snapshot.root, "Carol");
//! registry.handle_event("main", &edit).unwrap();
//!
//! let surface = registry.get("main").unwrap();
//! assert_eq!(surface.lock().data_model().get_string("/user/name"), Some("Carol"));
//! assert_eq!(sink.take().len(), 1);
//! ```

mod action;
mod catalog;
mod config;
mod data_model;
mod error;
mod graph;
mod message;
mod processor;
mod registry;
mod render;
mod repair;
mod resolver;
mod surface;
mod template;
mod value;

pub use action::*;
pub use catalog::*;
pub use config::*;
pub use data_model::*;
pub use error::*;
pub use graph::*;
pub use message::*;
pub use processor::*;
pub use registry::*;
pub use render::*;
pub use repair::*;
pub use resolver::*;
pub use surface::*;
pub use template::*;
pub use value::*;
