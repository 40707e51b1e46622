use super::{input_row, to_state, Widget, WidgetCommand, WidgetContext, WidgetEnv};
use crate::clock::Clock;
use crate::common::input::FieldText;
use crate::common::{issue_id, next_free_id};
use crate::habits::analytics::{self, HabitSummary};
use crate::habits::{Frequency, Habit, HabitSnapshot};
use chrono::NaiveDate;
use eframe::egui;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct HabitsState {
    #[serde(deserialize_with = "super::lenient_items")]
    pub habits: Vec<HabitSnapshot>,
    pub next_id: u32,
}

impl Default for HabitsState {
    fn default() -> Self {
        Self {
            habits: Vec::new(),
            next_id: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HabitsCommand {
    Add {
        title: FieldText,
        frequency: Frequency,
    },
    Toggle(u32),
    Rename {
        id: u32,
        title: FieldText,
    },
    Delete(u32),
}

pub struct HabitsWidget {
    habits: Vec<Habit>,
    next_id: u32,
    clock: Arc<dyn Clock>,
    draft: String,
    draft_frequency: Frequency,
}

impl HabitsWidget {
    pub fn new(state: HabitsState, env: &WidgetEnv) -> Self {
        let habits: Vec<Habit> = state.habits.into_iter().map(Habit::from_snapshot).collect();
        let next_id = next_free_id(state.next_id, habits.iter().map(|h| h.id));
        Self {
            habits,
            next_id,
            clock: Arc::clone(&env.clock),
            draft: String::new(),
            draft_frequency: Frequency::Daily,
        }
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn habit(&self, id: u32) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    pub fn summary(&self, today: NaiveDate) -> HabitSummary {
        analytics::summarize(&self.habits, today)
    }

    fn apply_command(&mut self, command: HabitsCommand) -> bool {
        match command {
            HabitsCommand::Add { title, frequency } => {
                let Some(id) = issue_id(&mut self.next_id) else {
                    tracing::warn!("habit ids exhausted; add ignored");
                    return false;
                };
                self.habits.push(Habit::new(id, title.into_inner(), frequency));
                true
            }
            HabitsCommand::Toggle(id) => {
                let today = self.clock.today();
                match self.habits.iter_mut().find(|h| h.id == id) {
                    Some(habit) => {
                        let completed = analytics::toggle_completion(habit, today);
                        tracing::debug!(habit = id, completed, "habit toggled");
                        true
                    }
                    None => false,
                }
            }
            HabitsCommand::Rename { id, title } => {
                match self.habits.iter_mut().find(|h| h.id == id) {
                    Some(habit) if habit.title != title.as_str() => {
                        habit.title = title.into_inner();
                        true
                    }
                    _ => false,
                }
            }
            HabitsCommand::Delete(id) => {
                let before = self.habits.len();
                self.habits.retain(|h| h.id != id);
                before != self.habits.len()
            }
        }
    }

    fn render_stats(&self, ui: &mut egui::Ui, today: NaiveDate) {
        let summary = self.summary(today);
        ui.horizontal(|ui| {
            ui.label(format!("Current streak: {}", summary.best_current_streak));
            ui.separator();
            ui.label(format!("Best: {}", summary.longest_streak));
            ui.separator();
            ui.label(format!("Today: {}%", summary.today_rate));
        });
        ui.horizontal(|ui| {
            for day in analytics::weekly_overview(&self.habits, today) {
                ui.vertical(|ui| {
                    ui.small(day.date.format("%a").to_string());
                    ui.add(
                        egui::ProgressBar::new(day.rate as f32 / 100.0)
                            .desired_width(28.0)
                            .text(format!("{}", day.rate)),
                    );
                });
            }
        });
    }
}

impl Widget for HabitsWidget {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &WidgetContext<'_>) -> Option<WidgetCommand> {
        let mut command = None;
        self.render_stats(ui, ctx.today);
        ui.separator();
        egui::ComboBox::from_id_source((ctx.id, "habit_frequency"))
            .selected_text(self.draft_frequency.label())
            .show_ui(ui, |ui| {
                for freq in [Frequency::Daily, Frequency::Weekly] {
                    ui.selectable_value(&mut self.draft_frequency, freq, freq.label());
                }
            });
        if input_row(ui, &mut self.draft, "New habit", "Add") {
            if let Ok(title) = FieldText::parse("habit", &self.draft) {
                command = Some(HabitsCommand::Add {
                    title,
                    frequency: self.draft_frequency,
                });
                self.draft.clear();
            }
        }
        if self.habits.is_empty() {
            ui.weak("No habits tracked yet");
        }
        for habit in &self.habits {
            ui.horizontal(|ui| {
                let mut done = habit.completed_today(ctx.today);
                if ui.checkbox(&mut done, &habit.title).changed() {
                    command = Some(HabitsCommand::Toggle(habit.id));
                }
                ui.weak(habit.frequency.label());
                ui.label(format!("🔥 {}", habit.current_streak(ctx.today)));
                ui.weak(format!("{}%", analytics::completion_rate(habit)));
                if habit.frequency == Frequency::Weekly {
                    ui.weak(format!(
                        "{} this week",
                        analytics::completions_in_week(habit, ctx.today)
                    ));
                }
                if ui.small_button("x").clicked() {
                    command = Some(HabitsCommand::Delete(habit.id));
                }
            });
        }
        command.map(WidgetCommand::Habits)
    }

    fn state(&self) -> Value {
        let today = self.clock.today();
        let state = HabitsState {
            habits: self.habits.iter().map(|h| h.snapshot(today)).collect(),
            next_id: self.next_id,
        };
        to_state(&state)
    }

    fn apply(&mut self, command: WidgetCommand) -> bool {
        match command {
            WidgetCommand::Habits(cmd) => self.apply_command(cmd),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use serde_json::json;

    fn setup() -> (HabitsWidget, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()));
        let env = WidgetEnv::offline(clock.clone());
        (HabitsWidget::new(HabitsState::default(), &env), clock)
    }

    fn cmd(c: HabitsCommand) -> WidgetCommand {
        WidgetCommand::Habits(c)
    }

    #[test]
    fn toggle_reports_derived_fields_in_state() {
        let (mut w, _) = setup();
        let title = FieldText::parse("habit", "Read").unwrap();
        w.apply(cmd(HabitsCommand::Add {
            title,
            frequency: Frequency::Daily,
        }));
        assert!(w.apply(cmd(HabitsCommand::Toggle(1))));
        let state = w.state();
        assert_eq!(state["habits"][0]["currentStreak"], json!(1));
        assert_eq!(state["habits"][0]["completedToday"], json!(true));
        assert_eq!(state["habits"][0]["frequency"], json!("daily"));
        assert_eq!(state["nextId"], json!(2));
    }

    #[test]
    fn streak_carries_across_days() {
        let (mut w, clock) = setup();
        let title = FieldText::parse("habit", "Walk").unwrap();
        w.apply(cmd(HabitsCommand::Add {
            title,
            frequency: Frequency::Daily,
        }));
        for _ in 0..3 {
            w.apply(cmd(HabitsCommand::Toggle(1)));
            clock.advance_days(1);
        }
        let today = clock.today();
        assert_eq!(w.habit(1).unwrap().current_streak(today), 3);
        assert!(!w.habit(1).unwrap().completed_today(today));
        assert_eq!(w.summary(today).longest_streak, 3);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let (mut w, _) = setup();
        assert!(!w.apply(cmd(HabitsCommand::Toggle(5))));
        assert!(!w.apply(cmd(HabitsCommand::Delete(5))));
        let title = FieldText::parse("habit", "x").unwrap();
        assert!(!w.apply(cmd(HabitsCommand::Rename { id: 5, title })));
    }

    #[test]
    fn restores_from_state() {
        let state: HabitsState = serde_json::from_value(json!({
            "habits": [{
                "id": 3,
                "title": "Stretch",
                "frequency": "weekly",
                "currentStreak": 10,
                "longestStreak": 4,
                "completedToday": true,
                "history": [{"date": "2024-05-06", "completed": true}]
            }]
        }))
        .unwrap();
        let env = WidgetEnv::offline(Arc::new(FixedClock::on(
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        )));
        let w = HabitsWidget::new(state, &env);
        let out = w.state();
        assert_eq!(out["nextId"], json!(4));
        assert_eq!(out["habits"][0]["currentStreak"], json!(1));
        assert_eq!(out["habits"][0]["longestStreak"], json!(4));
        assert_eq!(out["habits"][0]["completedToday"], json!(false));
    }

    #[test]
    fn add_is_refused_once_ids_run_out() {
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()));
        let env = WidgetEnv::offline(clock);
        let state: HabitsState = serde_json::from_value(json!({
            "habits": [{"id": u32::MAX, "title": "x"}],
            "nextId": 1
        }))
        .unwrap();
        let mut w = HabitsWidget::new(state, &env);
        let title = FieldText::parse("habit", "Second").unwrap();
        assert!(!w.apply(cmd(HabitsCommand::Add {
            title,
            frequency: Frequency::Daily,
        })));
        assert_eq!(w.habits().len(), 1);
    }
}
