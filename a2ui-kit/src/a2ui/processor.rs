//! A2UI Message Processor
//!
//! Turns producer text into protocol messages and routes them to the
//! registry. Each message is applied whole or not at all; one bad message in
//! a batch does not block the others.

use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use super::error::{A2uiError, A2uiResult};
use super::message::A2uiMessage;
use super::registry::SurfaceRegistry;
use super::repair::repair_json;
use super::surface::SurfaceEvent;

/// Result of processing one chunk of producer text.
#[derive(Debug, Default)]
pub struct ProcessOutcome {
    /// Events of the messages that applied, in order
    pub events: Vec<SurfaceEvent>,
    /// Errors of the messages that did not
    pub errors: Vec<A2uiError>,
}

impl ProcessOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, result: A2uiResult<Vec<SurfaceEvent>>) {
        match result {
            Ok(events) => self.events.extend(events),
            Err(err) => {
                warn!("rejected message: {err}");
                self.errors.push(err);
            }
        }
    }
}

/// The A2UI message processor.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use a2ui_kit::a2ui::{A2uiMessageProcessor, CollectingSink, RuntimeConfig, SurfaceRegistry};
///
/// let registry = Arc::new(SurfaceRegistry::new(
///     RuntimeConfig::default(),
///     Arc::new(CollectingSink::new()),
/// ));
/// let processor = A2uiMessageProcessor::new(registry.clone());
///
/// let outcome = processor.process_json(r#"[
///     {"beginRendering": {"surfaceId": "main", "root": "root"}},
///     {"surfaceUpdate": {"surfaceId": "main", "components": [
///         {"id": "root", "component": {"Text": {"text": {"literalString": "Hello"}}}}
///     ]}}
/// ]"#);
/// assert!(outcome.is_ok());
/// assert_eq!(registry.render("main").unwrap().root.text(), Some("Hello"));
/// ```
#[derive(Debug, Clone)]
pub struct A2uiMessageProcessor {
    registry: Arc<SurfaceRegistry>,
}

impl A2uiMessageProcessor {
    pub fn new(registry: Arc<SurfaceRegistry>) -> Self {
        A2uiMessageProcessor { registry }
    }

    pub fn registry(&self) -> &Arc<SurfaceRegistry> {
        &self.registry
    }

    /// Process a single A2UI message
    pub fn process_message(&self, message: &A2uiMessage) -> A2uiResult<Vec<SurfaceEvent>> {
        debug!("applying {} to {}", message.kind(), message.surface_id());
        self.registry.apply(message)
    }

    /// Process multiple messages in order, continuing past rejected ones.
    pub fn process_messages<'a>(
        &self,
        messages: impl IntoIterator<Item = &'a A2uiMessage>,
    ) -> ProcessOutcome {
        let mut outcome = ProcessOutcome::default();
        for message in messages {
            outcome.record(self.process_message(message));
        }
        outcome
    }

    /// Parse and process producer text: a JSON array of messages or one message.
    ///
    /// Array elements are parsed individually, so a malformed element is
    /// reported as `MalformedMessage` while its siblings still apply. Invalid
    /// text is repaired first when the registry's config allows it.
    pub fn process_json(&self, json: &str) -> ProcessOutcome {
        let text = if self.registry.config().repair_json {
            repair_json(json)
        } else {
            json.into()
        };

        let mut outcome = ProcessOutcome::default();
        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                outcome.record(Err(A2uiError::malformed(format!("invalid JSON: {err}"))));
                return outcome;
            }
        };

        match value {
            Value::Array(elements) => {
                for (i, element) in elements.into_iter().enumerate() {
                    let result = serde_json::from_value::<A2uiMessage>(element)
                        .map_err(|err| A2uiError::malformed(format!("message[{i}]: {err}")))
                        .and_then(|message| self.process_message(&message));
                    outcome.record(result);
                }
            }
            single => {
                let result = serde_json::from_value::<A2uiMessage>(single)
                    .map_err(A2uiError::from)
                    .and_then(|message| self.process_message(&message));
                outcome.record(result);
            }
        }
        outcome
    }
}
