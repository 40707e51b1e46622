use super::{to_state, Widget, WidgetCommand, WidgetContext, WidgetEnv};
use crate::clock::Clock;
use crate::common::input::{EventTime, FieldText};
use crate::common::{issue_id, next_free_id};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use eframe::egui;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `HH:MM`, absent for all-day events.
    #[serde(default)]
    pub time: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarState {
    pub current_date: Option<NaiveDate>,
    #[serde(deserialize_with = "super::lenient_items")]
    pub events: Vec<CalendarEvent>,
    pub next_event_id: u32,
}

impl Default for CalendarState {
    fn default() -> Self {
        Self {
            current_date: None,
            events: Vec::new(),
            next_event_id: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalendarCommand {
    PreviousMonth,
    NextMonth,
    AddEvent {
        title: FieldText,
        description: Option<FieldText>,
        time: Option<EventTime>,
        date: Option<NaiveDate>,
    },
    DeleteEvent(u32),
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[derive(Default)]
struct EventDraft {
    title: String,
    time: String,
    description: String,
    error: Option<String>,
}

pub struct CalendarWidget {
    month: NaiveDate,
    events: Vec<CalendarEvent>,
    next_event_id: u32,
    clock: Arc<dyn Clock>,
    selected: Option<NaiveDate>,
    draft: EventDraft,
}

impl CalendarWidget {
    pub fn new(state: CalendarState, env: &WidgetEnv) -> Self {
        let month = first_of_month(state.current_date.unwrap_or_else(|| env.today()));
        let next_event_id = next_free_id(state.next_event_id, state.events.iter().map(|e| e.id));
        Self {
            month,
            events: state.events,
            next_event_id,
            clock: Arc::clone(&env.clock),
            selected: None,
            draft: EventDraft::default(),
        }
    }

    /// First day of the displayed month.
    pub fn displayed_month(&self) -> NaiveDate {
        self.month
    }

    pub fn month_label(&self) -> String {
        self.month.format("%B %Y").to_string()
    }

    pub fn month_days(&self) -> Vec<NaiveDate> {
        self.month
            .iter_days()
            .take_while(|d| d.month() == self.month.month())
            .collect()
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    /// Events on `date`, all-day events first, then by time.
    pub fn events_on(&self, date: NaiveDate) -> Vec<&CalendarEvent> {
        let mut events: Vec<&CalendarEvent> =
            self.events.iter().filter(|e| e.date == date).collect();
        events.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
        events
    }

    pub fn has_events(&self, date: NaiveDate) -> bool {
        self.events.iter().any(|e| e.date == date)
    }

    fn shift_month(&mut self, forward: bool) -> bool {
        let months = Months::new(1);
        let shifted = if forward {
            self.month.checked_add_months(months)
        } else {
            self.month.checked_sub_months(months)
        };
        match shifted {
            Some(month) => {
                self.month = month;
                true
            }
            None => false,
        }
    }

    fn apply_command(&mut self, command: CalendarCommand) -> bool {
        match command {
            CalendarCommand::PreviousMonth => self.shift_month(false),
            CalendarCommand::NextMonth => self.shift_month(true),
            CalendarCommand::AddEvent {
                title,
                description,
                time,
                date,
            } => {
                let Some(id) = issue_id(&mut self.next_event_id) else {
                    tracing::warn!("event ids exhausted; add ignored");
                    return false;
                };
                self.events.push(CalendarEvent {
                    id,
                    title: title.into_inner(),
                    description: description.map(FieldText::into_inner).unwrap_or_default(),
                    time: time.map(|t| t.to_string()),
                    date: date.unwrap_or_else(|| self.clock.today()),
                    created_at: self.clock.now(),
                });
                true
            }
            CalendarCommand::DeleteEvent(id) => {
                let before = self.events.len();
                self.events.retain(|e| e.id != id);
                before != self.events.len()
            }
        }
    }

    fn render_grid(&mut self, ui: &mut egui::Ui, ctx: &WidgetContext<'_>) {
        let lead = self.month.weekday().num_days_from_monday() as usize;
        let selected = self.selected.unwrap_or(ctx.today);
        egui::Grid::new((ctx.id, "calendar_grid"))
            .spacing([4.0, 2.0])
            .show(ui, |ui| {
                for name in ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"] {
                    ui.weak(name);
                }
                ui.end_row();
                for _ in 0..lead {
                    ui.label("");
                }
                for (idx, day) in self.month_days().into_iter().enumerate() {
                    let mut text = egui::RichText::new(day.day().to_string());
                    if day == ctx.today {
                        text = text.strong();
                    }
                    if self.has_events(day) {
                        text = text.underline();
                    }
                    if ui.selectable_label(day == selected, text).clicked() {
                        self.selected = Some(day);
                    }
                    if (lead + idx + 1) % 7 == 0 {
                        ui.end_row();
                    }
                }
            });
    }

    fn render_form(&mut self, ui: &mut egui::Ui, date: NaiveDate) -> Option<CalendarCommand> {
        let mut command = None;
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.draft.title).hint_text("Event"));
            ui.add(
                egui::TextEdit::singleline(&mut self.draft.time)
                    .hint_text("HH:MM")
                    .desired_width(48.0),
            );
        });
        ui.add(egui::TextEdit::singleline(&mut self.draft.description).hint_text("Description"));
        if ui.button("Add event").clicked() {
            let parsed = FieldText::parse("event title", &self.draft.title)
                .and_then(|title| EventTime::parse(&self.draft.time).map(|time| (title, time)));
            match parsed {
                Ok((title, time)) => {
                    command = Some(CalendarCommand::AddEvent {
                        title,
                        description: FieldText::optional("description", &self.draft.description),
                        time,
                        date: Some(date),
                    });
                    self.draft = EventDraft::default();
                }
                Err(e) => self.draft.error = Some(e.to_string()),
            }
        }
        if let Some(err) = &self.draft.error {
            ui.colored_label(egui::Color32::RED, err);
        }
        command
    }
}

impl Widget for CalendarWidget {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &WidgetContext<'_>) -> Option<WidgetCommand> {
        let mut command = None;
        ui.horizontal(|ui| {
            if ui.button("<").clicked() {
                command = Some(CalendarCommand::PreviousMonth);
            }
            ui.strong(self.month_label());
            if ui.button(">").clicked() {
                command = Some(CalendarCommand::NextMonth);
            }
        });
        self.render_grid(ui, ctx);
        ui.separator();
        let date = self.selected.unwrap_or(ctx.today);
        ui.label(format!("Events on {}", date.format("%d.%m.%Y")));
        let events: Vec<CalendarEvent> = self.events_on(date).into_iter().cloned().collect();
        if events.is_empty() {
            ui.weak("No events");
        }
        for event in &events {
            ui.horizontal(|ui| {
                ui.monospace(event.time.as_deref().unwrap_or("All day"));
                ui.label(&event.title);
                if !event.description.is_empty() {
                    ui.weak(&event.description);
                }
                if ui.small_button("x").clicked() {
                    command = Some(CalendarCommand::DeleteEvent(event.id));
                }
            });
        }
        if let Some(cmd) = self.render_form(ui, date) {
            command = Some(cmd);
        }
        command.map(WidgetCommand::Calendar)
    }

    fn state(&self) -> Value {
        let state = CalendarState {
            current_date: Some(self.month),
            events: self.events.clone(),
            next_event_id: self.next_event_id,
        };
        to_state(&state)
    }

    fn apply(&mut self, command: WidgetCommand) -> bool {
        match command {
            WidgetCommand::Calendar(cmd) => self.apply_command(cmd),
            _ => false,
        }
    }
}
