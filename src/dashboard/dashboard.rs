use crate::dashboard::config::{DashboardState, WidgetEntry};
use crate::dashboard::widgets::{
    WidgetCommand, WidgetConfig, WidgetContext, WidgetInstance, WidgetRegistry,
};
use crate::error::DashboardError;
use crate::storage::KeyValueStore;
use eframe::egui;

/// Key under which the whole dashboard is persisted.
pub const STORAGE_KEY: &str = "dashboardState";

/// Minimum column width used when laying out widget panels.
const COLUMN_WIDTH: f32 = 320.0;

pub struct Dashboard {
    widgets: Vec<WidgetInstance>,
    next_widget_id: u64,
    registry: WidgetRegistry,
    store: Box<dyn KeyValueStore>,
    first_run: bool,
    pub warnings: Vec<String>,
}

impl Dashboard {
    /// Empty dashboard. Nothing is read from `store`.
    pub fn new(registry: WidgetRegistry, store: Box<dyn KeyValueStore>) -> Self {
        Self {
            widgets: Vec::new(),
            next_widget_id: 1,
            registry,
            store,
            first_run: false,
            warnings: Vec::new(),
        }
    }

    /// Restore the dashboard persisted in `store`. Unreadable or corrupt
    /// state yields an empty dashboard.
    pub fn load(registry: WidgetRegistry, store: Box<dyn KeyValueStore>) -> Self {
        let mut dashboard = Self::new(registry, store);
        match dashboard.store.get(STORAGE_KEY) {
            Ok(Some(blob)) => dashboard.deserialize(&blob),
            Ok(None) => {
                tracing::info!("no saved dashboard found");
                dashboard.first_run = true;
            }
            Err(e) => tracing::error!("failed to read dashboard state: {e}"),
        }
        dashboard
    }

    /// `true` when [`Dashboard::load`] found no saved state.
    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    /// Add the given widget kinds on a first run. Returns how many were added.
    pub fn seed_defaults<S: AsRef<str>>(&mut self, kinds: &[S]) -> usize {
        if !self.first_run {
            return 0;
        }
        self.first_run = false;
        let mut added = 0;
        for kind in kinds {
            match self.add_widget(kind.as_ref(), WidgetConfig::default()) {
                Ok(_) => added += 1,
                Err(e) => tracing::warn!("default widget skipped: {e}"),
            }
        }
        added
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn widgets(&self) -> &[WidgetInstance] {
        &self.widgets
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetInstance> {
        self.widgets.iter().find(|w| w.id() == id)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn next_widget_id(&self) -> u64 {
        self.next_widget_id
    }

    /// Create a widget of `kind` with a freshly issued id and append it.
    /// On failure nothing changes, including the id counter.
    pub fn add_widget(
        &mut self,
        kind: &str,
        config: WidgetConfig,
    ) -> Result<&WidgetInstance, DashboardError> {
        let following = self
            .next_widget_id
            .checked_add(1)
            .ok_or(DashboardError::IdsExhausted)?;
        let id = format!("widget-{}", self.next_widget_id);
        let widget = self.registry.create(
            kind,
            WidgetConfig {
                id: Some(id),
                ..config
            },
        )?;
        self.next_widget_id = following;
        tracing::info!(id = %widget.id(), kind, "widget added");
        self.widgets.push(widget);
        self.persist();
        let idx = self.widgets.len() - 1;
        Ok(&self.widgets[idx])
    }

    /// Destroy and remove the widget. Unknown ids are ignored.
    pub fn remove_widget(&mut self, id: &str) -> bool {
        let Some(pos) = self.widgets.iter().position(|w| w.id() == id) else {
            return false;
        };
        let mut widget = self.widgets.remove(pos);
        widget.destroy();
        tracing::info!(id, "widget removed");
        self.persist();
        true
    }

    /// Destroy every widget. The id counter keeps counting.
    pub fn reset(&mut self) {
        for widget in &mut self.widgets {
            widget.destroy();
        }
        self.widgets.clear();
        tracing::info!("dashboard reset");
        self.persist();
    }

    /// Route a command to the widget with `id`. Returns `true` when
    /// something changed; changes are persisted immediately.
    pub fn apply(&mut self, id: &str, command: WidgetCommand) -> bool {
        if matches!(command, WidgetCommand::Close) {
            return self.remove_widget(id);
        }
        let Some(widget) = self.widgets.iter_mut().find(|w| w.id() == id) else {
            tracing::debug!(id, "command for unknown widget ignored");
            return false;
        };
        let changed = widget.apply(command);
        if changed {
            self.persist();
        }
        changed
    }

    /// Drain finished background work and persist if any widget changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        for widget in &mut self.widgets {
            changed |= widget.poll();
        }
        if changed {
            self.persist();
        }
        changed
    }

    pub fn has_pending_fetches(&self) -> bool {
        self.widgets.iter().any(|w| w.is_busy())
    }

    pub fn serialize(&self) -> DashboardState {
        DashboardState {
            widgets: self
                .widgets
                .iter()
                .map(|w| WidgetEntry {
                    kind: w.kind().to_string(),
                    id: w.id().to_string(),
                    title: w.title().to_string(),
                    minimized: w.is_minimized(),
                    state: w.state(),
                })
                .collect(),
            next_widget_id: self.next_widget_id,
        }
    }

    /// Replace the current widgets with the ones stored in `blob`.
    /// Entries that cannot be restored are skipped with a warning.
    pub fn deserialize(&mut self, blob: &str) {
        for widget in &mut self.widgets {
            widget.destroy();
        }
        self.widgets.clear();
        self.warnings.clear();

        let mut state = match DashboardState::parse(blob) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("{e}; starting with an empty dashboard");
                self.warnings.push(e.to_string());
                self.next_widget_id = 1;
                return;
            }
        };
        self.warnings = state.sanitize(&self.registry);
        for w in &self.warnings {
            tracing::warn!("{w}");
        }
        self.next_widget_id = state.next_widget_id;

        for entry in state.widgets {
            let config = WidgetConfig {
                id: Some(entry.id),
                title: Some(entry.title),
                minimized: entry.minimized,
                state: Some(entry.state),
            };
            match self.registry.create(&entry.kind, config) {
                Ok(widget) => self.widgets.push(widget),
                Err(e) => {
                    tracing::warn!("{e}");
                    self.warnings.push(e.to_string());
                }
            }
        }
        tracing::info!(count = self.widgets.len(), "dashboard restored");
    }

    /// Write the current state to the store.
    pub fn save(&mut self) -> Result<(), DashboardError> {
        let json = self.serialize().to_json()?;
        self.store.set(STORAGE_KEY, &json)?;
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(e) = self.save() {
            tracing::error!("failed to save dashboard: {e}");
        }
    }

    /// Draw every widget in columns. Returns the commands the user issued,
    /// keyed by widget id, for the caller to [`apply`](Self::apply).
    pub fn ui(&mut self, ui: &mut egui::Ui) -> Vec<(String, WidgetCommand)> {
        let mut commands = Vec::new();
        if self.widgets.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.weak("No widgets yet. Add one from the toolbar.");
            });
            return commands;
        }
        let now = self.registry.env().clock.now();
        let today = now.date();
        let cols = ((ui.available_width() / COLUMN_WIDTH).floor() as usize).clamp(1, 4);
        ui.columns(cols, |columns| {
            for (idx, widget) in self.widgets.iter_mut().enumerate() {
                let col = &mut columns[idx % cols];
                let id = widget.id().to_string();
                let ctx = WidgetContext {
                    id: &id,
                    now,
                    today,
                };
                egui::Frame::group(col.style()).show(col, |ui| {
                    ui.push_id(&id, |ui| {
                        if let Some(command) = widget.show(ui, &ctx) {
                            commands.push((id.clone(), command));
                        }
                    });
                });
                col.add_space(8.0);
            }
        });
        commands
    }
}
