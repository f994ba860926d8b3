//! # Description
//!
//! A2UI Kit is a Rust crate containing the runtime of the A2UI (Agent-to-UI)
//! protocol: the state an agent builds up over a stream of declarative JSON
//! messages, and the resolved render tree a UI backend draws from it.
//!
//! # Features
//!
//! - Flat component graph with forward references and last-write-wins updates.
//! - JSON data model with pointer-style paths, deep merges and change tracking.
//! - Data-driven templates with relative bindings scoped to each array element.
//! - Two-way binding of text fields, check boxes and sliders.
//! - Button actions resolved against the data model at press time.
//! - Lenient ingestion of truncated or commented JSON from language models.
//!
//! Pixel rendering and transport are left to the host. See the [`a2ui`]
//! module for the runtime itself.

pub mod a2ui;
