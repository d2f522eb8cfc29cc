//! Document-level ambient state: theme, viewport and selection.

use crate::element::ElementId;
use serde::{Deserialize, Serialize};

/// Color theme of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Visible region of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Scene state, independent of the elements themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneState {
    pub theme: Theme,
    pub viewport: Viewport,
    /// Selected element IDs, without duplicates, in selection order.
    selected_elements: Vec<ElementId>,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Replace the selection.
    pub fn select(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.selected_elements.clear();
        for id in ids {
            if !self.selected_elements.contains(&id) {
                self.selected_elements.push(id);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_elements.clear();
    }

    /// Drop a single ID from the selection, if present.
    pub fn deselect(&mut self, id: &str) {
        self.selected_elements.retain(|selected| selected != id);
    }

    pub fn selection(&self) -> &[ElementId] {
        &self.selected_elements
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_elements.iter().any(|selected| selected == id)
    }

    /// Restore every field to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let scene = SceneState::new();
        assert_eq!(scene.theme, Theme::Light);
        assert_eq!(scene.viewport, Viewport { x: 0.0, y: 0.0, zoom: 1.0 });
        assert!(scene.selection().is_empty());
    }

    #[test]
    fn test_select_replaces_and_dedups() {
        let mut scene = SceneState::new();
        scene.select(vec!["a".to_string(), "b".to_string()]);
        scene.select(vec!["c".to_string(), "c".to_string(), "a".to_string()]);
        assert_eq!(scene.selection(), &["c".to_string(), "a".to_string()]);
        assert!(!scene.is_selected("b"));

        scene.deselect("c");
        assert_eq!(scene.selection(), &["a".to_string()]);
    }

    #[test]
    fn test_reset() {
        let mut scene = SceneState::new();
        scene.set_theme(Theme::Dark);
        scene.set_viewport(Viewport { x: 5.0, y: 6.0, zoom: 2.0 });
        scene.select(vec!["a".to_string()]);

        scene.reset();
        assert_eq!(scene, SceneState::default());
    }

    #[test]
    fn test_serialized_shape() {
        let mut scene = SceneState::new();
        scene.set_theme(Theme::Dark);
        scene.select(vec!["a".to_string()]);
        let value = serde_json::to_value(&scene).unwrap();
        assert_eq!(
            value,
            json!({
                "theme": "dark",
                "viewport": {"x": 0.0, "y": 0.0, "zoom": 1.0},
                "selectedElements": ["a"]
            })
        );
    }
}
