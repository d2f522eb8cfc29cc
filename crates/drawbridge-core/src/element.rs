//! Scene element definitions.

use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = String;

/// Generate a fresh element identifier.
pub fn new_element_id() -> ElementId {
    Uuid::new_v4().to_string()
}

/// Kind of element, matching the exchange format's `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Rectangle,
    Ellipse,
    Diamond,
    Arrow,
    Line,
    Freedraw,
    Text,
    /// Text attached to a diagram node or edge.
    Label,
    Image,
    Frame,
    MagicFrame,
    Embeddable,
    Iframe,
}

impl ElementKind {
    /// The tag used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Rectangle => "rectangle",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Diamond => "diamond",
            ElementKind::Arrow => "arrow",
            ElementKind::Line => "line",
            ElementKind::Freedraw => "freedraw",
            ElementKind::Text => "text",
            ElementKind::Label => "label",
            ElementKind::Image => "image",
            ElementKind::Frame => "frame",
            ElementKind::MagicFrame => "magicframe",
            ElementKind::Embeddable => "embeddable",
            ElementKind::Iframe => "iframe",
        }
    }

    /// Whether the element is drawn from its `points` list.
    pub fn is_linear(&self) -> bool {
        matches!(
            self,
            ElementKind::Arrow | ElementKind::Line | ElementKind::Freedraw
        )
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Font family, either a numeric identifier or a family name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontFamily {
    Id(u32),
    Name(String),
}

/// A single drawable unit of the scene.
///
/// The common attributes are typed; anything else the client sends is kept
/// in [`Element::extra`] and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Vertices relative to (`x`, `y`), for lines, arrows and free-draw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    /// Attributes not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    /// Create a bare element of the given kind at a position.
    pub fn new(kind: ElementKind, x: f64, y: f64) -> Self {
        Self {
            id: new_element_id(),
            kind,
            x,
            y,
            width: None,
            height: None,
            points: None,
            background_color: None,
            stroke_color: None,
            stroke_width: None,
            roughness: None,
            opacity: None,
            text: None,
            font_size: None,
            font_family: None,
            locked: None,
            extra: Map::new(),
        }
    }

    /// Set the extents (builder style).
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Validate a raw attribute map into an element.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(fields))
    }

    /// Serialize back into a flat attribute map.
    pub fn to_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            // Element always serializes as a struct.
            _ => Ok(Map::new()),
        }
    }

    /// Axis-aligned bounding box in scene coordinates.
    ///
    /// Point-based elements use the extent of their vertices; everything else
    /// spans `width` x `height` from its origin, with missing extents as zero.
    pub fn bounds(&self) -> Rect {
        if let Some(points) = self.points.as_deref().filter(|p| !p.is_empty()) {
            let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
            let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
            for [px, py] in points {
                x0 = x0.min(*px);
                y0 = y0.min(*py);
                x1 = x1.max(*px);
                y1 = y1.max(*py);
            }
            return Rect::new(self.x + x0, self.y + y0, self.x + x1, self.y + y1);
        }
        let width = self.width.unwrap_or(0.0);
        let height = self.height.unwrap_or(0.0);
        Rect::new(self.x, self.y, self.x + width, self.y + height).abs()
    }

    /// Whether `locked` is explicitly set.
    pub fn is_locked(&self) -> bool {
        self.locked == Some(true)
    }

    /// Move the element by an offset. Points are relative, so they follow.
    pub fn translate(&mut self, offset: Vec2) {
        self.x += offset.x;
        self.y += offset.y;
    }
}

/// Strict equality between a stored attribute and an expected filter value.
///
/// Numbers compare by value so that `10` matches a stored `10.0`.
pub fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| values_match(a, b))
        }
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_from_fields_requires_position() {
        let err = Element::from_fields(fields(json!({"id": "a", "type": "rectangle", "x": 1})))
            .unwrap_err();
        assert!(err.to_string().contains("`y`"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result = Element::from_fields(fields(json!({"id": "a", "type": "blob", "x": 0, "y": 0})));
        assert!(result.is_err());
    }

    #[test]
    fn test_mistyped_attribute_rejected() {
        let result = Element::from_fields(fields(
            json!({"id": "a", "type": "text", "x": 0, "y": 0, "fontSize": "big"}),
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_font_family_number_or_name() {
        let numeric = Element::from_fields(fields(
            json!({"id": "a", "type": "text", "x": 0, "y": 0, "fontFamily": 1}),
        ))
        .unwrap();
        assert_eq!(numeric.font_family, Some(FontFamily::Id(1)));

        let named = Element::from_fields(fields(
            json!({"id": "b", "type": "text", "x": 0, "y": 0, "fontFamily": "Virgil"}),
        ))
        .unwrap();
        assert_eq!(named.font_family, Some(FontFamily::Name("Virgil".to_string())));
    }

    #[test]
    fn test_extra_attributes_round_trip() {
        let element = Element::from_fields(fields(json!({
            "id": "a", "type": "diamond", "x": 0, "y": 0,
            "roundness": {"type": 3}, "seed": 42
        })))
        .unwrap();
        assert_eq!(element.extra.get("seed"), Some(&json!(42)));

        let back = element.to_fields().unwrap();
        assert_eq!(back.get("roundness"), Some(&json!({"type": 3})));
        assert_eq!(back.get("type"), Some(&json!("diamond")));
    }

    #[test]
    fn test_kind_tags() {
        let element = Element::new(ElementKind::MagicFrame, 0.0, 0.0);
        let fields = element.to_fields().unwrap();
        assert_eq!(fields.get("type"), Some(&json!("magicframe")));
        assert!(ElementKind::Freedraw.is_linear());
        assert!(!ElementKind::Label.is_linear());
    }

    #[test]
    fn test_bounds_from_size() {
        let rect = Element::new(ElementKind::Rectangle, 10.0, 20.0).with_size(100.0, 50.0);
        assert_eq!(rect.bounds(), Rect::new(10.0, 20.0, 110.0, 70.0));

        let bare = Element::new(ElementKind::Text, 5.0, 5.0);
        assert_eq!(bare.bounds(), Rect::new(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn test_bounds_from_points() {
        let mut arrow = Element::new(ElementKind::Arrow, 100.0, 100.0);
        arrow.points = Some(vec![[0.0, 0.0], [-20.0, 40.0], [60.0, 10.0]]);
        assert_eq!(arrow.bounds(), Rect::new(80.0, 100.0, 160.0, 140.0));
    }

    #[test]
    fn test_translate_moves_origin() {
        let mut element = Element::new(ElementKind::Ellipse, 1.0, 2.0);
        element.translate(Vec2::new(3.0, -2.0));
        assert!((element.x - 4.0).abs() < f64::EPSILON);
        assert!(element.y.abs() < f64::EPSILON);
    }

    #[test]
    fn test_values_match_numbers_by_value() {
        assert!(values_match(&json!(10.0), &json!(10)));
        assert!(!values_match(&json!(10.5), &json!(10)));
        assert!(values_match(&json!(true), &json!(true)));
        assert!(!values_match(&json!(1), &json!(true)));
        assert!(!values_match(&json!("10"), &json!(10)));
    }
}
