use crate::common::widget_number;
use crate::dashboard::widgets::WidgetRegistry;
use crate::error::DashboardError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

fn default_next_widget_id() -> u64 {
    1
}

/// One persisted widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WidgetEntry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub minimized: bool,
    #[serde(default)]
    pub state: Value,
}

/// The blob stored under the dashboard storage key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    #[serde(default)]
    pub widgets: Vec<WidgetEntry>,
    #[serde(default = "default_next_widget_id")]
    pub next_widget_id: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            widgets: Vec::new(),
            next_widget_id: default_next_widget_id(),
        }
    }
}

impl DashboardState {
    pub fn parse(content: &str) -> Result<Self, DashboardError> {
        serde_json::from_str(content).map_err(|e| DashboardError::StorageCorrupt(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, DashboardError> {
        serde_json::to_string(self).map_err(|e| DashboardError::Storage(e.into()))
    }

    /// Drop entries that cannot be restored and repair the id counter.
    /// Returns one warning per dropped entry.
    pub fn sanitize(&mut self, registry: &WidgetRegistry) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();
        self.widgets.retain(|entry| {
            if entry.kind.is_empty() {
                warnings.push(format!("widget '{}' has no type and was dropped", entry.id));
                return false;
            }
            if !registry.contains(&entry.kind) {
                tracing::warn!(widget = %entry.kind, "unknown dashboard widget dropped");
                warnings.push(format!("unknown dashboard widget '{}' dropped", entry.kind));
                return false;
            }
            if widget_number(&entry.id) == Some(u64::MAX) {
                warnings.push(format!("widget id '{}' is out of range and was dropped", entry.id));
                return false;
            }
            if !entry.id.is_empty() && !seen.insert(entry.id.clone()) {
                warnings.push(format!("duplicate widget id '{}' dropped", entry.id));
                return false;
            }
            true
        });
        let above_max = self
            .widgets
            .iter()
            .filter_map(|entry| widget_number(&entry.id))
            .max()
            .map_or(1, |max| max.saturating_add(1));
        self.next_widget_id = self.next_widget_id.max(above_max).max(1);
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::dashboard::widgets::WidgetEnv;
    use serde_json::json;
    use std::sync::Arc;

    fn registry() -> WidgetRegistry {
        WidgetRegistry::with_defaults(WidgetEnv::offline(Arc::new(SystemClock)))
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = DashboardState::parse("{not json").unwrap_err();
        assert!(matches!(err, DashboardError::StorageCorrupt(_)));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let state = DashboardState::parse("{}").unwrap();
        assert_eq!(state, DashboardState::default());
    }

    #[test]
    fn sanitize_drops_unknown_empty_and_duplicate_entries() {
        let mut state: DashboardState = serde_json::from_value(json!({
            "widgets": [
                {"type": "todo", "id": "widget-1", "title": "A", "state": {}},
                {"type": "clock", "id": "widget-2", "title": "B", "state": {}},
                {"id": "widget-3", "title": "C"},
                {"type": "notes", "id": "widget-1", "title": "D", "state": {}},
                {"type": "notes", "id": "widget-7", "title": "E", "state": {}}
            ],
            "nextWidgetId": 2
        }))
        .unwrap();
        let warnings = state.sanitize(&registry());
        assert_eq!(warnings.len(), 3);
        let ids: Vec<&str> = state.widgets.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["widget-1", "widget-7"]);
        assert_eq!(state.next_widget_id, 8);
    }

    #[test]
    fn minimized_is_omitted_unless_set() {
        let entry = WidgetEntry {
            kind: "todo".into(),
            id: "widget-1".into(),
            title: "T".into(),
            minimized: false,
            state: json!({}),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value.get("minimized"), None);
        assert_eq!(value["type"], json!("todo"));
    }

    #[test]
    fn sanitize_drops_ids_at_the_end_of_the_counter_range() {
        let mut state: DashboardState = serde_json::from_value(json!({
            "widgets": [
                {"type": "todo", "id": "widget-18446744073709551615", "title": "A", "state": {}},
                {"type": "todo", "id": "widget-4", "title": "B", "state": {}}
            ],
            "nextWidgetId": 5
        }))
        .unwrap();
        let warnings = state.sanitize(&registry());
        assert_eq!(warnings.len(), 1);
        assert_eq!(state.widgets.len(), 1);
        assert_eq!(state.widgets[0].id, "widget-4");
        assert_eq!(state.next_widget_id, 5);
    }
}
