use chrono::NaiveDate;
use organizer::clock::FixedClock;
use organizer::common::input::FieldText;
use organizer::dashboard::widgets::{
    NotesCommand, WidgetCommand, WidgetConfig, WidgetEnv, WidgetRegistry,
};
use organizer::dashboard::{Dashboard, STORAGE_KEY};
use organizer::storage::{FileStore, KeyValueStore, MemoryStore};
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

fn registry() -> WidgetRegistry {
    let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    WidgetRegistry::with_defaults(WidgetEnv::offline(Arc::new(clock)).with_seed(3))
}

fn summary(dash: &Dashboard) -> Vec<(String, String, String, bool)> {
    dash.widgets()
        .iter()
        .map(|w| {
            (
                w.id().to_string(),
                w.kind().to_string(),
                w.title().to_string(),
                w.is_minimized(),
            )
        })
        .collect()
}

#[test]
fn three_widgets_survive_a_restart() {
    let dir = tempdir().unwrap();
    let before = {
        let store = FileStore::new(dir.path()).unwrap();
        let mut dash = Dashboard::load(registry(), Box::new(store));
        dash.add_widget("todo", WidgetConfig::default()).unwrap();
        dash.add_widget("notes", WidgetConfig::default().with_title("Journal"))
            .unwrap();
        dash.add_widget("calendar", WidgetConfig::default()).unwrap();
        dash.apply("widget-2", WidgetCommand::ToggleMinimize);
        summary(&dash)
    };

    let store = FileStore::new(dir.path()).unwrap();
    assert!(store.path_for(STORAGE_KEY).exists());
    let dash = Dashboard::load(registry(), Box::new(store));
    assert!(!dash.is_first_run());
    assert_eq!(summary(&dash), before);
    assert_eq!(dash.next_widget_id(), 4);
    assert!(dash.warnings.is_empty());
}

#[test]
fn serialize_then_deserialize_reproduces_layout() {
    let mut dash = Dashboard::new(registry(), Box::new(MemoryStore::new()));
    for kind in ["tasks", "habits", "quote", "todo"] {
        dash.add_widget(kind, WidgetConfig::default()).unwrap();
    }
    dash.remove_widget("widget-2");
    let blob = dash.serialize().to_json().unwrap();

    let mut copy = Dashboard::new(registry(), Box::new(MemoryStore::new()));
    copy.deserialize(&blob);
    assert_eq!(summary(&copy), summary(&dash));
    assert_eq!(copy.next_widget_id(), dash.next_widget_id());
}

#[test]
fn widget_data_is_restored() {
    let store = MemoryStore::new();
    let mut dash = Dashboard::new(registry(), Box::new(store.clone()));
    dash.add_widget("notes", WidgetConfig::default()).unwrap();
    let add = NotesCommand::Add {
        title: FieldText::optional("title", ""),
        content: FieldText::parse("content", "remember the milk").unwrap(),
        tags: vec!["home".into()],
    };
    assert!(dash.apply("widget-1", WidgetCommand::Notes(add)));

    let restored = Dashboard::load(registry(), Box::new(store));
    let state = restored.widget("widget-1").unwrap().state();
    assert_eq!(state["notes"][0]["title"], "New note");
    assert_eq!(state["notes"][0]["content"], "remember the milk");
    assert_eq!(state["notes"][0]["tags"], json!(["home"]));
}

#[test]
fn unknown_entries_are_skipped_and_the_rest_load() {
    let mut store = MemoryStore::new();
    let blob = json!({
        "widgets": [
            {"type": "todo", "id": "widget-1", "title": "Groceries", "state": {}},
            {"type": "stock-ticker", "id": "widget-2", "title": "Stocks", "state": {}},
            {"type": "quote", "id": "widget-5", "title": "Daily", "minimized": true,
             "state": {"currentQuote": "Keep going - Anonymous"}}
        ],
        "nextWidgetId": 3
    });
    store.set(STORAGE_KEY, &blob.to_string()).unwrap();

    let mut dash = Dashboard::load(registry(), Box::new(store));
    let ids: Vec<&str> = dash.widgets().iter().map(|w| w.id()).collect();
    assert_eq!(ids, vec!["widget-1", "widget-5"]);
    assert_eq!(dash.warnings.len(), 1);
    assert!(dash.widget("widget-5").unwrap().is_minimized());
    assert_eq!(
        dash.widget("widget-5").unwrap().state()["currentQuote"],
        "Keep going - Anonymous"
    );
    assert_eq!(dash.next_widget_id(), 6);
    let added = dash.add_widget("todo", WidgetConfig::default()).unwrap();
    assert_eq!(added.id(), "widget-6");
}

#[test]
fn malformed_widget_state_falls_back_to_defaults() {
    let store = MemoryStore::new();
    store.insert(
        STORAGE_KEY,
        &json!({
            "widgets": [{"type": "tasks", "id": "widget-1", "title": "T", "state": "oops"}],
            "nextWidgetId": 2
        })
        .to_string(),
    );
    let dash = Dashboard::load(registry(), Box::new(store));
    let state = dash.widget("widget-1").unwrap().state();
    assert_eq!(state["tasks"], json!([]));
    assert_eq!(state["nextId"], 1);
}

#[test]
fn seeding_does_not_repeat_after_the_user_empties_the_dashboard() {
    let store = MemoryStore::new();
    let mut dash = Dashboard::load(registry(), Box::new(store.clone()));
    assert_eq!(dash.seed_defaults(&["tasks", "calendar"]), 2);
    dash.reset();

    let mut again = Dashboard::load(registry(), Box::new(store));
    assert_eq!(again.seed_defaults(&["tasks", "calendar"]), 0);
    assert!(again.is_empty());
    assert_eq!(again.next_widget_id(), 3);
}
