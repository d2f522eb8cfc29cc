//! Exchange-format codec for whole scenes.
//!
//! A document is only a serialization container: it is built from the live
//! store and scene state on save, and taken apart again on load.

use crate::element::{Element, new_element_id};
use crate::error::{CommandError, CommandResult};
use crate::scene::{SceneState, Theme, Viewport};
use crate::store::ElementStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Format tag written to the `type` field.
pub const DOCUMENT_TYPE: &str = "excalidraw";
/// Format version written to the `version` field.
pub const DOCUMENT_VERSION: u32 = 2;
/// Producer identifier written to the `source` field.
pub const DOCUMENT_SOURCE: &str = "drawbridge";

/// Document-level settings stored alongside the elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub theme: Theme,
    pub viewport: Viewport,
    pub grid_size: Option<f64>,
    pub export_with_dark_mode: bool,
}

/// The on-disk representation of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    #[serde(rename = "type")]
    pub format: String,
    pub version: u32,
    pub source: String,
    pub elements: Vec<Element>,
    pub app_state: AppState,
}

impl SceneDocument {
    /// Snapshot the current store and scene state.
    pub fn from_scene(store: &ElementStore, scene: &SceneState) -> Self {
        Self {
            format: DOCUMENT_TYPE.to_string(),
            version: DOCUMENT_VERSION,
            source: DOCUMENT_SOURCE.to_string(),
            elements: store.iter().cloned().collect(),
            app_state: AppState {
                theme: scene.theme,
                viewport: scene.viewport,
                grid_size: None,
                export_with_dark_mode: scene.theme == Theme::Dark,
            },
        }
    }

    /// Serialize the document to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// An element candidate that failed validation during decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedElement {
    /// Position in the source `elements` array.
    pub index: usize,
    pub reason: String,
}

/// Result of decoding a document leniently.
#[derive(Debug, Clone, Default)]
pub struct DecodedDocument {
    /// Elements that passed validation, in file order.
    pub elements: Vec<Element>,
    pub skipped: Vec<SkippedElement>,
    pub theme: Option<Theme>,
    pub viewport: Option<Viewport>,
}

/// Decode a document, validating each element on its own.
///
/// Fails only when the text is not JSON or `elements` is missing or not an
/// array. Invalid elements are reported in [`DecodedDocument::skipped`];
/// elements without an `id` receive a fresh one; elements flagged
/// `isDeleted` are skipped.
pub fn decode(text: &str) -> CommandResult<DecodedDocument> {
    let data: Value =
        serde_json::from_str(text).map_err(|e| CommandError::Parse(format!("Invalid JSON: {}", e)))?;

    let candidates = data
        .get("elements")
        .and_then(Value::as_array)
        .ok_or_else(|| CommandError::Parse("Missing 'elements' array".to_string()))?;

    let mut decoded = DecodedDocument::default();
    for (index, candidate) in candidates.iter().enumerate() {
        match decode_element(candidate) {
            Ok(element) => decoded.elements.push(element),
            Err(reason) => decoded.skipped.push(SkippedElement { index, reason }),
        }
    }

    if let Some(app_state) = data.get("appState") {
        decoded.theme = app_state
            .get("theme")
            .and_then(|theme| serde_json::from_value(theme.clone()).ok());
        decoded.viewport = decode_viewport(app_state);
    }

    Ok(decoded)
}

fn decode_element(candidate: &Value) -> Result<Element, String> {
    let Value::Object(fields) = candidate else {
        return Err("element is not an object".to_string());
    };
    if fields.get("isDeleted").and_then(Value::as_bool).unwrap_or(false) {
        return Err("element is marked deleted".to_string());
    }

    let needs_id = match fields.get("id") {
        Some(Value::String(id)) => id.is_empty(),
        None | Some(Value::Null) => true,
        Some(_) => return Err("element id is not a string".to_string()),
    };

    let mut fields: Map<String, Value> = fields.clone();
    if needs_id {
        fields.insert("id".to_string(), Value::String(new_element_id()));
    }
    Element::from_fields(fields).map_err(|e| e.to_string())
}

/// Read the viewport, falling back to the editor's native scroll/zoom keys.
fn decode_viewport(app_state: &Value) -> Option<Viewport> {
    if let Some(viewport) = app_state.get("viewport") {
        return serde_json::from_value(viewport.clone()).ok();
    }

    let x = app_state.get("scrollX").and_then(Value::as_f64)?;
    let y = app_state.get("scrollY").and_then(Value::as_f64)?;
    let zoom = app_state
        .get("zoom")
        .and_then(|zoom| zoom.get("value").or(Some(zoom)))
        .and_then(Value::as_f64)
        .unwrap_or(1.0);
    Some(Viewport { x, y, zoom })
}
