use crate::dashboard::widgets::WidgetConfig;
use crate::dashboard::Dashboard;
use eframe::egui;
use std::time::Duration;

/// How often the UI wakes up while a widget is waiting on the network.
const FETCH_REPAINT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResult {
    None,
    Confirmed,
    Cancelled,
}

/// Modal asking the user to confirm clearing the dashboard.
#[derive(Debug, Default)]
pub struct ResetConfirmation {
    open: bool,
}

impl ResetConfirmation {
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn ui(&mut self, ctx: &egui::Context) -> ConfirmationResult {
        if !self.open {
            return ConfirmationResult::None;
        }
        let mut result = ConfirmationResult::None;
        let mut open = true;
        egui::Window::new("Reset dashboard")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label("Remove every widget and its data?");
                ui.colored_label(egui::Color32::YELLOW, "This action cannot be undone.");
                ui.horizontal(|ui| {
                    if ui.button("Reset").clicked() {
                        result = ConfirmationResult::Confirmed;
                    }
                    if ui.button("Cancel").clicked() {
                        result = ConfirmationResult::Cancelled;
                    }
                });
            });
        if result != ConfirmationResult::None {
            self.open = false;
        }
        if !open {
            self.open = false;
            if result == ConfirmationResult::None {
                result = ConfirmationResult::Cancelled;
            }
        }
        result
    }
}

pub struct DashboardApp {
    dashboard: Dashboard,
    selected_kind: String,
    confirm_reset: ResetConfirmation,
    error: Option<String>,
}

impl DashboardApp {
    pub fn new(dashboard: Dashboard) -> Self {
        let selected_kind = dashboard
            .registry()
            .names()
            .into_iter()
            .next()
            .unwrap_or_default();
        Self {
            dashboard,
            selected_kind,
            confirm_reset: ResetConfirmation::default(),
            error: None,
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    fn kind_label(&self, kind: &str) -> String {
        self.dashboard
            .registry()
            .default_title(kind)
            .map(str::to_string)
            .unwrap_or_else(|| kind.to_string())
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Organizer");
            ui.separator();
            let selected = self.kind_label(&self.selected_kind);
            let choices: Vec<(String, String)> = self
                .dashboard
                .registry()
                .names()
                .into_iter()
                .map(|kind| {
                    let label = self.kind_label(&kind);
                    (kind, label)
                })
                .collect();
            egui::ComboBox::from_id_source("add_widget_kind")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for (kind, label) in choices {
                        ui.selectable_value(&mut self.selected_kind, kind, label);
                    }
                });
            if ui.button("Add widget").clicked() {
                let kind = self.selected_kind.clone();
                match self.dashboard.add_widget(&kind, WidgetConfig::default()) {
                    Ok(_) => self.error = None,
                    Err(e) => self.error = Some(e.to_string()),
                }
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let reset = ui.add_enabled(!self.dashboard.is_empty(), egui::Button::new("Reset"));
                if reset.clicked() {
                    self.confirm_reset.open();
                }
                if self.dashboard.has_pending_fetches() {
                    ui.spinner();
                }
            });
        });
        if let Some(err) = &self.error {
            ui.colored_label(egui::Color32::RED, err);
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.dashboard.tick();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));

        let commands = egui::CentralPanel::default()
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| self.dashboard.ui(ui))
                    .inner
            })
            .inner;
        for (id, command) in commands {
            self.dashboard.apply(&id, command);
        }

        if self.confirm_reset.ui(ctx) == ConfirmationResult::Confirmed {
            self.dashboard.reset();
        }

        if self.dashboard.has_pending_fetches() {
            ctx.request_repaint_after(FETCH_REPAINT);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.dashboard.save() {
            tracing::error!("failed to save dashboard on exit: {e}");
        }
    }
}
