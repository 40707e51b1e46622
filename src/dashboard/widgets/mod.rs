use crate::clock::Clock;
use crate::common::input::FieldText;
use crate::dashboard::remote::{Fetcher, OfflineFetcher, RemoteConfig};
use crate::error::DashboardError;
use chrono::{NaiveDate, NaiveDateTime};
use eframe::egui;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{thread_rng, Rng, SeedableRng};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

mod calendar;
mod habits;
mod news;
mod notes;
mod quote;
mod tasks;
mod todo;
mod weather;

pub use calendar::{CalendarCommand, CalendarEvent, CalendarState, CalendarWidget};
pub use habits::{HabitsCommand, HabitsState, HabitsWidget};
pub use news::{Article, NewsCategory, NewsCommand, NewsState, NewsWidget, NEWS_DISPLAY_LIMIT};
pub use notes::{Note, NoteFilter, NotesCommand, NotesState, NotesWidget};
pub use quote::{Quote, QuoteState, QuoteWidget, QUOTES};
pub use tasks::{Priority, Task, TaskCounts, TaskFilter, TasksCommand, TasksState, TasksWidget};
pub use todo::{TodoCommand, TodoItem, TodoState, TodoWidget};
pub use weather::{WeatherCommand, WeatherReport, WeatherState, WeatherWidget};

/// Built-in widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Tasks,
    Todo,
    Notes,
    Habits,
    Calendar,
    Quote,
    Weather,
    News,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 8] = [
        WidgetKind::Tasks,
        WidgetKind::Todo,
        WidgetKind::Notes,
        WidgetKind::Habits,
        WidgetKind::Calendar,
        WidgetKind::Quote,
        WidgetKind::Weather,
        WidgetKind::News,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Tasks => "tasks",
            WidgetKind::Todo => "todo",
            WidgetKind::Notes => "notes",
            WidgetKind::Habits => "habits",
            WidgetKind::Calendar => "calendar",
            WidgetKind::Quote => "quote",
            WidgetKind::Weather => "weather",
            WidgetKind::News => "news",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            WidgetKind::Tasks => "My tasks",
            WidgetKind::Todo => "To-do list",
            WidgetKind::Notes => "My notes",
            WidgetKind::Habits => "Habit tracker",
            WidgetKind::Calendar => "Calendar",
            WidgetKind::Quote => "Random quote",
            WidgetKind::Weather => "Weather",
            WidgetKind::News => "Latest news",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collaborators handed to every widget constructor.
#[derive(Clone)]
pub struct WidgetEnv {
    pub clock: Arc<dyn Clock>,
    pub fetcher: Arc<dyn Fetcher>,
    pub remote: RemoteConfig,
    pub rng_seed: Option<u64>,
}

impl WidgetEnv {
    pub fn new(clock: Arc<dyn Clock>, fetcher: Arc<dyn Fetcher>, remote: RemoteConfig) -> Self {
        Self {
            clock,
            fetcher,
            remote,
            rng_seed: None,
        }
    }

    /// Environment without network access.
    pub fn offline(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, Arc::new(OfflineFetcher), RemoteConfig::default())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

/// Per-frame information passed to [`Widget::render`].
#[derive(Debug, Clone, Copy)]
pub struct WidgetContext<'a> {
    pub id: &'a str,
    pub now: NaiveDateTime,
    pub today: NaiveDate,
}

/// User intent produced by rendering a widget.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCommand {
    ToggleMinimize,
    Rename(FieldText),
    Refresh,
    Close,
    Tasks(TasksCommand),
    Todo(TodoCommand),
    Notes(NotesCommand),
    Habits(HabitsCommand),
    Calendar(CalendarCommand),
    Weather(WeatherCommand),
    News(NewsCommand),
}

/// Widget trait implemented by all dashboard widgets.
pub trait Widget: Send {
    /// Draw the widget body. Never mutates persisted state; user actions
    /// come back as a command for the dashboard to apply.
    fn render(&mut self, ui: &mut egui::Ui, ctx: &WidgetContext<'_>) -> Option<WidgetCommand>;

    /// Snapshot of the persisted state.
    fn state(&self) -> Value;

    /// Apply a widget specific command. Returns `true` when state changed.
    fn apply(&mut self, command: WidgetCommand) -> bool;

    /// Widget specific refresh.
    fn update(&mut self) -> bool {
        false
    }

    /// Drain finished background work. Returns `true` when state changed.
    fn poll(&mut self) -> bool {
        false
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn destroy(&mut self) {}
}

/// Optional overrides for [`WidgetRegistry::create`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetConfig {
    pub id: Option<String>,
    pub title: Option<String>,
    pub minimized: bool,
    pub state: Option<Value>,
}

impl WidgetConfig {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn minimized(mut self, minimized: bool) -> Self {
        self.minimized = minimized;
        self
    }
}

/// A constructed widget together with the fields every kind shares.
pub struct WidgetInstance {
    id: String,
    kind: String,
    title: String,
    minimized: bool,
    widget: Box<dyn Widget>,
    destroyed: bool,
}

impl WidgetInstance {
    fn new(id: String, kind: &str, title: String, minimized: bool, widget: Box<dyn Widget>) -> Self {
        Self {
            id,
            kind: kind.to_string(),
            title,
            minimized,
            widget,
            destroyed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_busy(&self) -> bool {
        self.widget.is_busy()
    }

    pub fn state(&self) -> Value {
        self.widget.state()
    }

    /// Apply a command. `Close` is left to the owning dashboard.
    pub fn apply(&mut self, command: WidgetCommand) -> bool {
        if self.destroyed {
            return false;
        }
        match command {
            WidgetCommand::ToggleMinimize => {
                self.minimized = !self.minimized;
                true
            }
            WidgetCommand::Rename(title) => {
                if title.as_str() == self.title {
                    return false;
                }
                self.title = title.into_inner();
                true
            }
            WidgetCommand::Refresh => self.widget.update(),
            WidgetCommand::Close => false,
            other => self.widget.apply(other),
        }
    }

    pub fn poll(&mut self) -> bool {
        !self.destroyed && self.widget.poll()
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.widget.destroy();
        self.destroyed = true;
        tracing::debug!(id = %self.id, kind = %self.kind, "widget destroyed");
    }

    /// Draw the header controls and, unless minimized, the widget body.
    pub fn show(&mut self, ui: &mut egui::Ui, ctx: &WidgetContext<'_>) -> Option<WidgetCommand> {
        let mut command = None;
        ui.horizontal(|ui| {
            ui.strong(&self.title);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("x").on_hover_text("Close").clicked() {
                    command = Some(WidgetCommand::Close);
                }
                let toggle = if self.minimized { "+" } else { "-" };
                if ui
                    .small_button(toggle)
                    .on_hover_text("Minimize")
                    .clicked()
                {
                    command = Some(WidgetCommand::ToggleMinimize);
                }
                if ui.small_button("⟳").on_hover_text("Refresh").clicked() {
                    command = Some(WidgetCommand::Refresh);
                }
                if self.widget.is_busy() {
                    ui.spinner();
                }
            });
        });
        if !self.minimized {
            ui.separator();
            if let Some(cmd) = self.widget.render(ui, ctx) {
                command = Some(cmd);
            }
        }
        command
    }
}

impl fmt::Debug for WidgetInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetInstance")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("minimized", &self.minimized)
            .finish()
    }
}

type WidgetCtor = dyn Fn(&Value, &WidgetEnv) -> Box<dyn Widget> + Send + Sync;

/// Descriptor for building widgets from persisted JSON state.
#[derive(Clone)]
pub struct WidgetDescriptor {
    ctor: Arc<WidgetCtor>,
    default_title: String,
}

pub type WidgetFactory = WidgetDescriptor;

impl WidgetDescriptor {
    pub fn new<T: Widget + 'static, C: DeserializeOwned + Default + 'static>(
        default_title: &str,
        build: fn(C, &WidgetEnv) -> T,
    ) -> Self {
        Self {
            ctor: Arc::new(move |v: &Value, env: &WidgetEnv| {
                let cfg = if v.is_null() {
                    C::default()
                } else {
                    match serde_json::from_value::<C>(v.clone()) {
                        Ok(cfg) => cfg,
                        Err(e) => {
                            tracing::warn!("unreadable widget state, using defaults: {e}");
                            C::default()
                        }
                    }
                };
                Box::new(build(cfg, env))
            }),
            default_title: default_title.to_string(),
        }
    }

    pub fn create(&self, state: &Value, env: &WidgetEnv) -> Box<dyn Widget> {
        (self.ctor)(state, env)
    }

    pub fn default_title(&self) -> &str {
        &self.default_title
    }
}

#[derive(Clone)]
pub struct WidgetRegistry {
    map: HashMap<String, WidgetDescriptor>,
    env: WidgetEnv,
}

impl WidgetRegistry {
    /// Empty registry.
    pub fn new(env: WidgetEnv) -> Self {
        Self {
            map: HashMap::new(),
            env,
        }
    }

    pub fn with_defaults(env: WidgetEnv) -> Self {
        let mut reg = Self::new(env);
        reg.register(
            WidgetKind::Tasks.as_str(),
            WidgetFactory::new(WidgetKind::Tasks.default_title(), TasksWidget::new),
        );
        reg.register(
            WidgetKind::Todo.as_str(),
            WidgetFactory::new(WidgetKind::Todo.default_title(), TodoWidget::new),
        );
        reg.register(
            WidgetKind::Notes.as_str(),
            WidgetFactory::new(WidgetKind::Notes.default_title(), NotesWidget::new),
        );
        reg.register(
            WidgetKind::Habits.as_str(),
            WidgetFactory::new(WidgetKind::Habits.default_title(), HabitsWidget::new),
        );
        reg.register(
            WidgetKind::Calendar.as_str(),
            WidgetFactory::new(WidgetKind::Calendar.default_title(), CalendarWidget::new),
        );
        reg.register(
            WidgetKind::Quote.as_str(),
            WidgetFactory::new(WidgetKind::Quote.default_title(), QuoteWidget::new),
        );
        reg.register(
            WidgetKind::Weather.as_str(),
            WidgetFactory::new(WidgetKind::Weather.default_title(), WeatherWidget::new),
        );
        reg.register(
            WidgetKind::News.as_str(),
            WidgetFactory::new(WidgetKind::News.default_title(), NewsWidget::new),
        );
        reg
    }

    /// Register a factory, replacing any previous one under the same name.
    pub fn register(&mut self, name: &str, factory: WidgetFactory) {
        self.map.insert(name.to_string(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn default_title(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(|d| d.default_title())
    }

    pub fn env(&self) -> &WidgetEnv {
        &self.env
    }

    pub fn create(&self, name: &str, config: WidgetConfig) -> Result<WidgetInstance, DashboardError> {
        let descriptor = self
            .map
            .get(name)
            .ok_or_else(|| DashboardError::UnknownWidgetType(name.to_string()))?;
        let id = config
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| self.random_id());
        let title = config
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| descriptor.default_title().to_string());
        let state = config.state.unwrap_or(Value::Null);
        let widget = descriptor.create(&state, &self.env);
        Ok(WidgetInstance::new(id, name, title, config.minimized, widget))
    }

    fn random_id(&self) -> String {
        let millis = self.env.clock.now().and_utc().timestamp_millis();
        let suffix: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        format!("widget-{millis}-{suffix}")
    }
}

/// Single line text field with an action button. Returns `true` when the
/// button is clicked or Enter is pressed inside the field.
pub(crate) fn input_row(ui: &mut egui::Ui, buffer: &mut String, hint: &str, button: &str) -> bool {
    let mut submitted = false;
    ui.horizontal(|ui| {
        let resp = ui.add(egui::TextEdit::singleline(buffer).hint_text(hint));
        if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submitted = true;
        }
        if ui.button(button).clicked() {
            submitted = true;
        }
    });
    submitted
}

/// Deserialize a list item by item, skipping entries that do not parse so one
/// damaged item does not discard the rest of a widget's state.
pub(crate) fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("skipping unreadable stored item: {e}");
                None
            }
        })
        .collect())
}

/// Widgets persist `Value`s; a failure here would mean a non-string map key.
pub(crate) fn to_state<T: serde::Serialize>(state: &T) -> Value {
    serde_json::to_value(state).unwrap_or_else(|e| {
        tracing::error!("failed to serialize widget state: {e}");
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use serde_json::json;

    fn env() -> WidgetEnv {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        WidgetEnv::offline(Arc::new(FixedClock::on(today))).with_seed(7)
    }

    #[test]
    fn kinds_round_trip_through_tags() {
        for kind in WidgetKind::ALL {
            assert_eq!(WidgetKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(WidgetKind::parse("clock"), None);
    }

    #[test]
    fn defaults_register_every_kind() {
        let reg = WidgetRegistry::with_defaults(env());
        assert_eq!(reg.names().len(), WidgetKind::ALL.len());
        assert_eq!(reg.default_title("habits"), Some("Habit tracker"));
    }

    #[test]
    fn create_fills_missing_fields() {
        let reg = WidgetRegistry::with_defaults(env());
        let widget = reg.create("todo", WidgetConfig::default()).unwrap();
        assert!(widget.id().starts_with("widget-"));
        assert_eq!(widget.title(), "To-do list");
        assert_eq!(widget.kind(), "todo");
        assert!(!widget.is_minimized());
    }

    #[test]
    fn unparsable_state_falls_back_to_defaults() {
        let reg = WidgetRegistry::with_defaults(env());
        let widget = reg
            .create(
                "todo",
                WidgetConfig::default().with_state(json!({"tasks": "nope"})),
            )
            .unwrap();
        assert_eq!(widget.state()["tasks"], json!([]));
    }

    #[test]
    fn one_damaged_item_keeps_its_siblings() {
        let reg = WidgetRegistry::with_defaults(env());
        let widget = reg
            .create(
                "todo",
                WidgetConfig::default().with_state(json!({
                    "tasks": [{"id": "x", "text": "bad"}, {"id": 2, "text": "Milk"}],
                    "nextId": 3
                })),
            )
            .unwrap();
        let tasks = widget.state()["tasks"].as_array().cloned().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["text"], json!("Milk"));
        assert_eq!(widget.state()["nextId"], json!(3));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let reg = WidgetRegistry::with_defaults(env());
        let err = reg.create("clock", WidgetConfig::default()).unwrap_err();
        assert!(matches!(err, DashboardError::UnknownWidgetType(t) if t == "clock"));
    }

    #[test]
    fn register_overwrites_previous_factory() {
        let mut reg = WidgetRegistry::new(env());
        reg.register("todo", WidgetFactory::new("First", TodoWidget::new));
        reg.register("todo", WidgetFactory::new("Second", TodoWidget::new));
        assert_eq!(reg.default_title("todo"), Some("Second"));
        assert_eq!(reg.names(), vec!["todo".to_string()]);
    }

    #[test]
    fn instance_handles_shared_commands() {
        let reg = WidgetRegistry::with_defaults(env());
        let mut widget = reg
            .create("notes", WidgetConfig::default().with_id("widget-1"))
            .unwrap();
        assert!(widget.apply(WidgetCommand::ToggleMinimize));
        assert!(widget.is_minimized());
        let title = FieldText::parse("title", "Ideas").unwrap();
        assert!(widget.apply(WidgetCommand::Rename(title.clone())));
        assert!(!widget.apply(WidgetCommand::Rename(title)));
        assert_eq!(widget.title(), "Ideas");
        assert!(!widget.apply(WidgetCommand::Close));
        widget.destroy();
        widget.destroy();
        assert!(widget.is_destroyed());
        assert!(!widget.apply(WidgetCommand::ToggleMinimize));
    }

    #[test]
    fn show_renders_headless() {
        let reg = WidgetRegistry::with_defaults(env());
        for kind in WidgetKind::ALL {
            let mut widget = reg.create(kind.as_str(), WidgetConfig::default()).unwrap();
            let ctx = WidgetContext {
                id: "widget-1",
                now: reg.env().clock.now(),
                today: reg.env().today(),
            };
            egui::__run_test_ui(|ui| {
                let _ = widget.show(ui, &ctx);
            });
        }
    }
}
