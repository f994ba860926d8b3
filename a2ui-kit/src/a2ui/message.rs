//! A2UI Protocol Message Types
//!
//! This module defines the Rust types for the A2UI protocol messages.
//! Messages are serialized/deserialized using serde_json; any shape outside
//! the schema (unknown component type, value reference with zero or several
//! variants, data entry without exactly one value) fails to deserialize.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use super::value::BoundValue;

/// Lenient f64 deserializer: accepts numbers and ignores other types.
fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let val = Option::<serde_json::Value>::deserialize(d)?.and_then(|v| v.as_f64());
    Ok(val)
}

/// Inbound A2UI message.
///
/// Each variant corresponds to one of the protocol message types a producer
/// may send; they are applied per surface, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum A2uiMessage {
    /// Initialize a new UI surface
    BeginRendering(BeginRendering),

    /// Add or replace components in the graph
    SurfaceUpdate(SurfaceUpdate),

    /// Merge values into the data model
    DataModelUpdate(DataModelUpdate),

    /// Tear a surface down
    DeleteSurface(DeleteSurface),
}

impl A2uiMessage {
    /// Get the surface ID this message applies to
    pub fn surface_id(&self) -> &str {
        match self {
            A2uiMessage::BeginRendering(m) => &m.surface_id,
            A2uiMessage::SurfaceUpdate(m) => &m.surface_id,
            A2uiMessage::DataModelUpdate(m) => &m.surface_id,
            A2uiMessage::DeleteSurface(m) => &m.surface_id,
        }
    }

    /// Protocol name of the message, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            A2uiMessage::BeginRendering(_) => "beginRendering",
            A2uiMessage::SurfaceUpdate(_) => "surfaceUpdate",
            A2uiMessage::DataModelUpdate(_) => "dataModelUpdate",
            A2uiMessage::DeleteSurface(_) => "deleteSurface",
        }
    }
}

/// Initialize a new UI surface.
///
/// # Example JSON
///
/// ```text
/// {
///   "beginRendering": {
///     "surfaceId": "main",
///     "root": "root-column",
///     "styles": {"primaryColor": "#007BFF"}
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginRendering {
    pub surface_id: String,

    /// ID of the root component, fixed for the surface's lifetime
    pub root: String,

    #[serde(default)]
    pub styles: Option<SurfaceStyles>,
}

/// Style hints carried through to the render snapshot untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceStyles {
    #[serde(default)]
    pub primary_color: Option<String>,

    #[serde(default)]
    pub font: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Add or replace components in the surface.
///
/// # Example JSON
///
/// ```text
/// {
///   "surfaceUpdate": {
///     "surfaceId": "main",
///     "components": [
///       {
///         "id": "root",
///         "component": {
///           "Column": {
///             "children": {"explicitList": ["header", "content"]}
///           }
///         }
///       }
///     ]
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceUpdate {
    pub surface_id: String,

    /// Components to upsert; ids not listed are unaffected
    pub components: Vec<ComponentDefinition>,
}

/// A single component definition in the adjacency list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    /// Unique within a surface; resubmitting it replaces the whole definition
    pub id: String,

    /// Optional flex weight for Row/Column layouts
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    pub component: ComponentType,
}

impl ComponentDefinition {
    pub fn new(id: impl Into<String>, component: ComponentType) -> Self {
        ComponentDefinition {
            id: id.into(),
            weight: None,
            component,
        }
    }
}

/// The closed set of component types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentType {
    // Layout
    Column(ColumnComponent),
    Row(RowComponent),
    List(ListComponent),
    Card(CardComponent),

    // Display
    Text(TextComponent),
    Image(ImageComponent),

    // Interactive
    Button(ButtonComponent),
    TextField(TextFieldComponent),
    CheckBox(CheckBoxComponent),
    Slider(SliderComponent),
}

/// Children reference - either explicit list or template-based
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChildrenRef {
    /// Ordered child component IDs
    ExplicitList(Vec<String>),

    /// One instance of `component_id` per element of the array at `data_binding`
    Template {
        #[serde(rename = "componentId")]
        component_id: String,
        #[serde(rename = "dataBinding")]
        data_binding: String,
    },
}

impl Default for ChildrenRef {
    fn default() -> Self {
        ChildrenRef::ExplicitList(vec![])
    }
}

// ============================================================================
// Layout Components
// ============================================================================

/// Vertical layout container
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnComponent {
    #[serde(default)]
    pub children: ChildrenRef,

    #[serde(default)]
    pub alignment: Option<Alignment>,

    #[serde(default)]
    pub distribution: Option<Distribution>,
}

/// Horizontal layout container
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowComponent {
    #[serde(default)]
    pub children: ChildrenRef,

    #[serde(default)]
    pub alignment: Option<Alignment>,

    #[serde(default)]
    pub distribution: Option<Distribution>,
}

/// Scrollable list container, usually template-driven
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListComponent {
    #[serde(default)]
    pub children: ChildrenRef,

    #[serde(default)]
    pub direction: Option<ListDirection>,
}

/// Card container wrapping a single child
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardComponent {
    pub child: String,
}

// ============================================================================
// Display Components
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextComponent {
    #[serde(default)]
    pub text: BoundValue,

    /// Usage hint for styling (h1, h2, body, caption, ...)
    #[serde(default)]
    pub usage_hint: Option<TextUsageHint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageComponent {
    pub url: BoundValue,

    #[serde(default)]
    pub fit: Option<ImageFit>,

    #[serde(default)]
    pub usage_hint: Option<ImageUsageHint>,
}

// ============================================================================
// Interactive Components
// ============================================================================

/// Clickable button; its content is another component
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonComponent {
    pub child: String,

    #[serde(default)]
    pub primary: Option<bool>,

    /// Action dispatched on press
    #[serde(default)]
    pub action: Option<ActionDefinition>,
}

/// Text input; `text` is two-way when it is a path
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFieldComponent {
    pub text: BoundValue,

    #[serde(default)]
    pub label: Option<BoundValue>,

    #[serde(default)]
    pub placeholder: Option<BoundValue>,

    #[serde(default)]
    pub input_type: Option<TextInputType>,
}

/// Checkbox; `value` is two-way when it is a path
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBoxComponent {
    pub value: BoundValue,

    #[serde(default)]
    pub label: Option<BoundValue>,
}

/// Numeric slider; `value` is two-way when it is a path
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderComponent {
    pub value: BoundValue,

    #[serde(default)]
    pub min: Option<f64>,

    #[serde(default)]
    pub max: Option<f64>,

    #[serde(default)]
    pub step: Option<f64>,
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    #[default]
    Start,
    Center,
    End,
    Stretch,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Distribution {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListDirection {
    #[default]
    Vertical,
    Horizontal,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextUsageHint {
    H1,
    H2,
    H3,
    H4,
    H5,
    #[default]
    Body,
    Caption,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageFit {
    #[default]
    Contain,
    Cover,
    Fill,
    None,
    ScaleDown,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageUsageHint {
    Icon,
    Avatar,
    SmallFeature,
    #[default]
    MediumFeature,
    LargeFeature,
    Header,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextInputType {
    #[default]
    ShortText,
    LongText,
    Number,
    Date,
    Obscured,
    #[serde(other)]
    Unknown,
}

// ============================================================================
// Actions
// ============================================================================

/// Action attached to a button
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    /// Action name (e.g., "addToCart", "submit")
    pub name: String,

    /// Entries resolved at trigger time, in declaration order
    #[serde(default)]
    pub context: Vec<ActionContextItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionContextItem {
    pub key: String,
    pub value: BoundValue,
}

/// Outbound action event (sent from client to controller)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAction {
    pub surface_id: String,

    pub action: UserActionPayload,

    /// Instance id of the component that fired it
    #[serde(default)]
    pub component_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActionPayload {
    pub name: String,

    /// Context values resolved from the data model, in declaration order
    #[serde(default)]
    pub context: IndexMap<String, serde_json::Value>,
}

// ============================================================================
// Data Model
// ============================================================================

/// Merge values into the data model.
///
/// # Example JSON
///
/// ```text
/// {
///   "dataModelUpdate": {
///     "surfaceId": "main",
///     "path": "/",
///     "contents": [
///       {"key": "products", "valueArray": [...]}
///     ]
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataModelUpdate {
    pub surface_id: String,

    /// Base path; each entry merges at `path/key`
    #[serde(default = "default_path")]
    pub path: String,

    pub contents: Vec<DataContent>,
}

fn default_path() -> String {
    "/".to_string()
}

/// A keyed data entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDataContent")]
pub struct DataContent {
    pub key: String,

    #[serde(flatten)]
    pub value: DataValue,
}

impl DataContent {
    pub fn new(key: impl Into<String>, value: DataValue) -> Self {
        DataContent {
            key: key.into(),
            value,
        }
    }
}

/// Typed data value; exactly one `value*` key on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDataValue")]
pub enum DataValue {
    ValueString(String),
    ValueNumber(f64),
    ValueBoolean(bool),
    ValueMap(Vec<DataContent>),
    ValueArray(Vec<DataValue>),
}

impl DataValue {
    /// Convert to the JSON node stored in the data model
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            DataValue::ValueString(s) => serde_json::Value::String(s.clone()),
            DataValue::ValueNumber(n) => serde_json::json!(n),
            DataValue::ValueBoolean(b) => serde_json::Value::Bool(*b),
            DataValue::ValueMap(contents) => serde_json::Value::Object(
                contents
                    .iter()
                    .map(|c| (c.key.clone(), c.value.to_json()))
                    .collect(),
            ),
            DataValue::ValueArray(items) => {
                serde_json::Value::Array(items.iter().map(DataValue::to_json).collect())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataValue {
    #[serde(default)]
    value_string: Option<String>,
    #[serde(default)]
    value_number: Option<f64>,
    #[serde(default)]
    value_boolean: Option<bool>,
    #[serde(default)]
    value_map: Option<Vec<DataContent>>,
    #[serde(default)]
    value_array: Option<Vec<DataValue>>,
}

impl TryFrom<RawDataValue> for DataValue {
    type Error = String;

    fn try_from(raw: RawDataValue) -> Result<Self, Self::Error> {
        let candidates = [
            raw.value_string.map(DataValue::ValueString),
            raw.value_number.map(DataValue::ValueNumber),
            raw.value_boolean.map(DataValue::ValueBoolean),
            raw.value_map.map(DataValue::ValueMap),
            raw.value_array.map(DataValue::ValueArray),
        ];
        let mut present = candidates.into_iter().flatten();
        match (present.next(), present.next()) {
            (Some(value), None) => Ok(value),
            (None, _) => Err("data entry has no value* field".to_string()),
            (Some(_), Some(_)) => Err("data entry sets more than one value* field".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDataContent {
    key: String,
    #[serde(flatten)]
    value: RawDataValue,
}

impl TryFrom<RawDataContent> for DataContent {
    type Error = String;

    fn try_from(raw: RawDataContent) -> Result<Self, Self::Error> {
        let value = DataValue::try_from(raw.value).map_err(|e| format!("key `{}`: {e}", raw.key))?;
        Ok(DataContent { key: raw.key, value })
    }
}

/// Tear a surface down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSurface {
    pub surface_id: String,
}
