//! The element store: the authoritative collection of scene elements.

use crate::element::{Element, ElementId, ElementKind, new_element_id, values_match};
use crate::error::{CommandError, CommandResult};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Keyed collection of elements, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    /// All elements, keyed by ID.
    elements: HashMap<ElementId, Element>,
    /// Insertion order of element IDs.
    order: Vec<ElementId>,
}

impl ElementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `fields` and store them under a freshly generated ID.
    ///
    /// Any `id` key in `fields` is ignored; the store assigns identifiers.
    pub fn create(&mut self, mut fields: Map<String, Value>) -> CommandResult<ElementId> {
        let id = new_element_id();
        fields.insert("id".to_string(), Value::String(id.clone()));
        let element =
            Element::from_fields(fields).map_err(|e| CommandError::Validation(e.to_string()))?;
        self.insert(element)?;
        Ok(id)
    }

    /// Store an element that already carries its own ID.
    pub fn insert(&mut self, element: Element) -> CommandResult<()> {
        if self.elements.contains_key(&element.id) {
            return Err(CommandError::Validation(format!(
                "duplicate element id: {}",
                element.id
            )));
        }
        self.order.push(element.id.clone());
        self.elements.insert(element.id.clone(), element);
        Ok(())
    }

    /// Shallow-merge `partial` into an existing element.
    ///
    /// Present keys overwrite (an explicit `null` clears an optional
    /// attribute), absent keys are kept. The merged record is validated
    /// before it replaces the stored one.
    pub fn update(&mut self, id: &str, partial: Map<String, Value>) -> CommandResult<Element> {
        let current = self
            .elements
            .get(id)
            .ok_or_else(|| CommandError::element_not_found(id))?;

        let mut merged = current
            .to_fields()
            .map_err(|e| CommandError::Serialization(e.to_string()))?;
        for (key, value) in partial {
            if key == "id" {
                continue;
            }
            merged.insert(key, value);
        }

        let element =
            Element::from_fields(merged).map_err(|e| CommandError::Validation(e.to_string()))?;
        self.elements.insert(id.to_string(), element.clone());
        Ok(element)
    }

    /// Remove an element. Group membership is left alone.
    pub fn delete(&mut self, id: &str) -> CommandResult<Element> {
        let removed = self
            .elements
            .remove(id)
            .ok_or_else(|| CommandError::element_not_found(id))?;
        self.order.retain(|existing| existing != id);
        Ok(removed)
    }

    /// Get an element by ID.
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    /// Check whether an element exists.
    pub fn has(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    /// Elements matching an optional kind and a set of attribute values.
    ///
    /// A filter key the element does not carry never matches.
    pub fn query(
        &self,
        kind: Option<ElementKind>,
        filter: &Map<String, Value>,
    ) -> CommandResult<Vec<&Element>> {
        let mut matches = Vec::new();
        for element in self.iter() {
            if kind.is_some_and(|kind| element.kind != kind) {
                continue;
            }
            if !filter.is_empty() {
                let fields = element
                    .to_fields()
                    .map_err(|e| CommandError::Serialization(e.to_string()))?;
                let all_match = filter.iter().all(|(key, expected)| {
                    fields
                        .get(key)
                        .is_some_and(|actual| values_match(actual, expected))
                });
                if !all_match {
                    continue;
                }
            }
            matches.push(element);
        }
        Ok(matches)
    }

    /// Set `locked` on every listed element that exists.
    /// Unknown IDs are skipped. Returns the number of elements touched.
    pub fn set_locked(&mut self, ids: &[ElementId], locked: bool) -> usize {
        let mut touched = 0;
        for id in ids {
            if let Some(element) = self.elements.get_mut(id) {
                element.locked = Some(locked);
                touched += 1;
            }
        }
        touched
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.order.clear();
    }

    /// Elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Get the number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
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
    fn test_create_assigns_fresh_ids() {
        let mut store = ElementStore::new();
        let a = store
            .create(fields(json!({"type": "rectangle", "x": 10, "y": 20})))
            .unwrap();
        let b = store
            .create(fields(json!({"type": "rectangle", "x": 10, "y": 20})))
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);

        let stored = store.get(&a).unwrap();
        assert!((stored.x - 10.0).abs() < f64::EPSILON);
        assert!((stored.y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_create_ignores_client_id() {
        let mut store = ElementStore::new();
        let id = store
            .create(fields(json!({"id": "mine", "type": "text", "x": 0, "y": 0})))
            .unwrap();
        assert_ne!(id, "mine");
        assert!(!store.has("mine"));
    }

    #[test]
    fn test_create_rejects_missing_fields() {
        let mut store = ElementStore::new();
        let result = store.create(fields(json!({"type": "rectangle", "x": 1})));
        assert!(matches!(result, Err(CommandError::Validation(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut store = ElementStore::new();
        let element = Element::new(ElementKind::Line, 0.0, 0.0);
        store.insert(element.clone()).unwrap();
        assert!(store.insert(element).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut store = ElementStore::new();
        let mut element = Element::new(ElementKind::Rectangle, 1.0, 2.0);
        element.id = "e1".to_string();
        element.stroke_color = Some("red".to_string());
        store.insert(element).unwrap();

        let updated = store.update("e1", fields(json!({"x": 5}))).unwrap();
        assert!((updated.x - 5.0).abs() < f64::EPSILON);
        assert!((updated.y - 2.0).abs() < f64::EPSILON);
        assert_eq!(updated.stroke_color.as_deref(), Some("red"));
        assert_eq!(store.get("e1"), Some(&updated));
    }

    #[test]
    fn test_update_null_clears_attribute() {
        let mut store = ElementStore::new();
        let mut element = Element::new(ElementKind::Rectangle, 0.0, 0.0);
        element.id = "e1".to_string();
        element.background_color = Some("#ffc9c9".to_string());
        store.insert(element).unwrap();

        let updated = store
            .update("e1", fields(json!({"backgroundColor": null})))
            .unwrap();
        assert_eq!(updated.background_color, None);
    }

    #[test]
    fn test_update_cannot_change_id() {
        let mut store = ElementStore::new();
        let mut element = Element::new(ElementKind::Text, 0.0, 0.0);
        element.id = "e1".to_string();
        store.insert(element).unwrap();

        let updated = store.update("e1", fields(json!({"id": "other"}))).unwrap();
        assert_eq!(updated.id, "e1");
        assert!(store.has("e1"));
        assert!(!store.has("other"));
    }

    #[test]
    fn test_invalid_update_leaves_store_unchanged() {
        let mut store = ElementStore::new();
        let mut element = Element::new(ElementKind::Text, 3.0, 4.0);
        element.id = "e1".to_string();
        store.insert(element.clone()).unwrap();

        let result = store.update("e1", fields(json!({"x": "left"})));
        assert!(matches!(result, Err(CommandError::Validation(_))));
        assert_eq!(store.get("e1"), Some(&element));
    }

    #[test]
    fn test_missing_update_and_delete() {
        let mut store = ElementStore::new();
        store.insert(Element::new(ElementKind::Text, 0.0, 0.0)).unwrap();

        assert!(matches!(
            store.update("missing", Map::new()),
            Err(CommandError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete("missing"),
            Err(CommandError::NotFound { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_preserves_order_of_rest() {
        let mut store = ElementStore::new();
        let ids: Vec<_> = (0..3)
            .map(|i| {
                store
                    .create(fields(json!({"type": "ellipse", "x": i, "y": 0})))
                    .unwrap()
            })
            .collect();
        store.delete(&ids[1]).unwrap();

        let remaining: Vec<_> = store.iter().map(|e| e.id.clone()).collect();
        assert_eq!(remaining, vec![ids[0].clone(), ids[2].clone()]);
    }

    #[test]
    fn test_query_by_kind_and_filter() {
        let mut store = ElementStore::new();
        let rect = store
            .create(fields(json!({"type": "rectangle", "x": 10, "y": 20, "strokeColor": "red"})))
            .unwrap();
        store
            .create(fields(json!({"type": "ellipse", "x": 10, "y": 20, "strokeColor": "red"})))
            .unwrap();
        store
            .create(fields(json!({"type": "rectangle", "x": 0, "y": 0})))
            .unwrap();

        let rects = store.query(Some(ElementKind::Rectangle), &Map::new()).unwrap();
        assert_eq!(rects.len(), 2);

        let red_rects = store
            .query(Some(ElementKind::Rectangle), &fields(json!({"strokeColor": "red"})))
            .unwrap();
        assert_eq!(red_rects.len(), 1);
        assert_eq!(red_rects[0].id, rect);

        let at_ten = store.query(None, &fields(json!({"x": 10}))).unwrap();
        assert_eq!(at_ten.len(), 2);

        assert_eq!(store.query(None, &Map::new()).unwrap().len(), 3);
    }

    #[test]
    fn test_query_locked_is_strict() {
        let mut store = ElementStore::new();
        let locked = store
            .create(fields(json!({"type": "rectangle", "x": 0, "y": 0, "locked": true})))
            .unwrap();
        store
            .create(fields(json!({"type": "rectangle", "x": 0, "y": 0, "locked": false})))
            .unwrap();
        store
            .create(fields(json!({"type": "rectangle", "x": 0, "y": 0})))
            .unwrap();

        let result = store.query(None, &fields(json!({"locked": true}))).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, locked);
    }

    #[test]
    fn test_set_locked_skips_unknown_ids() {
        let mut store = ElementStore::new();
        let id = store
            .create(fields(json!({"type": "rectangle", "x": 0, "y": 0})))
            .unwrap();

        let touched = store.set_locked(&[id.clone(), "ghost".to_string()], true);
        assert_eq!(touched, 1);
        assert!(store.get(&id).unwrap().is_locked());

        store.set_locked(&[id.clone()], false);
        assert_eq!(store.get(&id).unwrap().locked, Some(false));
    }

    #[test]
    fn test_clear() {
        let mut store = ElementStore::new();
        store.insert(Element::new(ElementKind::Text, 0.0, 0.0)).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.iter().count(), 0);
    }
}
