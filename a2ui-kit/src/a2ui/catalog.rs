//! A2UI Component Catalog
//!
//! The closed set of component kinds the runtime understands, with the facts
//! the runtime needs about each: its wire name, whether it has children, and
//! which property (if any) is two-way bindable.

use super::message::{ChildrenRef, ComponentType};
use super::value::{BoundValue, ValueKind};

/// Component kind identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    // Layout
    Column,
    Row,
    List,
    Card,

    // Display
    Text,
    Image,

    // Interactive
    Button,
    TextField,
    CheckBox,
    Slider,
}

/// The two-way bindable property of an input component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindableSlot {
    /// Property name on the wire
    pub property: &'static str,
    /// Kind of value written through it
    pub kind: ValueKind,
}

impl ComponentKind {
    /// Protocol name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Column => "Column",
            ComponentKind::Row => "Row",
            ComponentKind::List => "List",
            ComponentKind::Card => "Card",
            ComponentKind::Text => "Text",
            ComponentKind::Image => "Image",
            ComponentKind::Button => "Button",
            ComponentKind::TextField => "TextField",
            ComponentKind::CheckBox => "CheckBox",
            ComponentKind::Slider => "Slider",
        }
    }

    /// Parse from the protocol name
    pub fn from_name(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.name() == s)
    }

    pub fn all() -> &'static [ComponentKind] {
        &[
            ComponentKind::Column,
            ComponentKind::Row,
            ComponentKind::List,
            ComponentKind::Card,
            ComponentKind::Text,
            ComponentKind::Image,
            ComponentKind::Button,
            ComponentKind::TextField,
            ComponentKind::CheckBox,
            ComponentKind::Slider,
        ]
    }

    /// Kinds that reference other components (children list or single child)
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            ComponentKind::Column
                | ComponentKind::Row
                | ComponentKind::List
                | ComponentKind::Card
                | ComponentKind::Button
        )
    }

    pub fn bindable_slot(&self) -> Option<BindableSlot> {
        match self {
            ComponentKind::TextField => Some(BindableSlot {
                property: "text",
                kind: ValueKind::String,
            }),
            ComponentKind::CheckBox => Some(BindableSlot {
                property: "value",
                kind: ValueKind::Boolean,
            }),
            ComponentKind::Slider => Some(BindableSlot {
                property: "value",
                kind: ValueKind::Number,
            }),
            _ => None,
        }
    }

    pub fn of(component: &ComponentType) -> Self {
        match component {
            ComponentType::Column(_) => ComponentKind::Column,
            ComponentType::Row(_) => ComponentKind::Row,
            ComponentType::List(_) => ComponentKind::List,
            ComponentType::Card(_) => ComponentKind::Card,
            ComponentType::Text(_) => ComponentKind::Text,
            ComponentType::Image(_) => ComponentKind::Image,
            ComponentType::Button(_) => ComponentKind::Button,
            ComponentType::TextField(_) => ComponentKind::TextField,
            ComponentType::CheckBox(_) => ComponentKind::CheckBox,
            ComponentType::Slider(_) => ComponentKind::Slider,
        }
    }
}

impl ComponentType {
    pub fn kind(&self) -> ComponentKind {
        ComponentKind::of(self)
    }

    /// The reference behind the bindable property, for input components.
    pub fn bindable_value(&self) -> Option<&BoundValue> {
        match self {
            ComponentType::TextField(c) => Some(&c.text),
            ComponentType::CheckBox(c) => Some(&c.value),
            ComponentType::Slider(c) => Some(&c.value),
            _ => None,
        }
    }

    /// Children specifier of list-style containers.
    pub fn children_ref(&self) -> Option<&ChildrenRef> {
        match self {
            ComponentType::Column(c) => Some(&c.children),
            ComponentType::Row(c) => Some(&c.children),
            ComponentType::List(c) => Some(&c.children),
            _ => None,
        }
    }

    /// Single child id of Card and Button.
    pub fn single_child(&self) -> Option<&str> {
        match self {
            ComponentType::Card(c) => Some(&c.child),
            ComponentType::Button(c) => Some(&c.child),
            _ => None,
        }
    }
}
