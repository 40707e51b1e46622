use super::{input_row, to_state, Widget, WidgetCommand, WidgetContext, WidgetEnv};
use crate::clock::Clock;
use crate::common::input::FieldText;
use crate::common::{issue_id, next_free_id};
use chrono::NaiveDateTime;
use eframe::egui;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoState {
    #[serde(deserialize_with = "super::lenient_items")]
    pub tasks: Vec<TodoItem>,
    pub next_id: u32,
}

impl Default for TodoState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TodoCommand {
    Add(FieldText),
    Toggle(u32),
    Delete(u32),
}

pub struct TodoWidget {
    state: TodoState,
    clock: Arc<dyn Clock>,
    draft: String,
}

impl TodoWidget {
    pub fn new(mut state: TodoState, env: &WidgetEnv) -> Self {
        state.next_id = next_free_id(state.next_id, state.tasks.iter().map(|t| t.id));
        Self {
            state,
            clock: Arc::clone(&env.clock),
            draft: String::new(),
        }
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.state.tasks
    }

    /// `(completed, total)`
    pub fn totals(&self) -> (usize, usize) {
        let done = self.state.tasks.iter().filter(|t| t.completed).count();
        (done, self.state.tasks.len())
    }

    fn apply_command(&mut self, command: TodoCommand) -> bool {
        match command {
            TodoCommand::Add(text) => {
                let Some(id) = issue_id(&mut self.state.next_id) else {
                    tracing::warn!("to-do ids exhausted; add ignored");
                    return false;
                };
                self.state.tasks.push(TodoItem {
                    id,
                    text: text.into_inner(),
                    completed: false,
                    created_at: self.clock.now(),
                });
                true
            }
            TodoCommand::Toggle(id) => {
                match self.state.tasks.iter_mut().find(|t| t.id == id) {
                    Some(item) => {
                        item.completed = !item.completed;
                        true
                    }
                    None => false,
                }
            }
            TodoCommand::Delete(id) => {
                let before = self.state.tasks.len();
                self.state.tasks.retain(|t| t.id != id);
                before != self.state.tasks.len()
            }
        }
    }
}

impl Widget for TodoWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &WidgetContext<'_>) -> Option<WidgetCommand> {
        let mut command = None;
        if input_row(ui, &mut self.draft, "What needs doing?", "Add") {
            if let Ok(text) = FieldText::parse("todo", &self.draft) {
                command = Some(TodoCommand::Add(text));
                self.draft.clear();
            }
        }
        if self.state.tasks.is_empty() {
            ui.weak("Nothing to do");
        }
        for item in &self.state.tasks {
            ui.horizontal(|ui| {
                let mut done = item.completed;
                if ui.checkbox(&mut done, &item.text).changed() {
                    command = Some(TodoCommand::Toggle(item.id));
                }
                if ui.small_button("x").clicked() {
                    command = Some(TodoCommand::Delete(item.id));
                }
            });
        }
        let (done, total) = self.totals();
        if total > 0 {
            ui.label(format!("{done}/{total} done"));
        }
        command.map(WidgetCommand::Todo)
    }

    fn state(&self) -> Value {
        to_state(&self.state)
    }

    fn apply(&mut self, command: WidgetCommand) -> bool {
        match command {
            WidgetCommand::Todo(cmd) => self.apply_command(cmd),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;
    use serde_json::json;

    fn widget(state: TodoState) -> TodoWidget {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        TodoWidget::new(state, &WidgetEnv::offline(Arc::new(FixedClock::on(today))))
    }

    #[test]
    fn next_id_is_bumped_past_stored_items() {
        let state: TodoState = serde_json::from_value(json!({
            "tasks": [{"id": 4, "text": "a"}, {"id": 2, "text": "b"}],
            "nextId": 1
        }))
        .unwrap();
        let mut w = widget(state);
        let text = FieldText::parse("todo", "c").unwrap();
        assert!(w.apply(WidgetCommand::Todo(TodoCommand::Add(text))));
        assert_eq!(w.items().last().map(|t| t.id), Some(5));
    }

    #[test]
    fn toggle_and_delete() {
        let mut w = widget(TodoState::default());
        for t in ["milk", "bread"] {
            let text = FieldText::parse("todo", t).unwrap();
            w.apply(WidgetCommand::Todo(TodoCommand::Add(text)));
        }
        assert!(w.apply(WidgetCommand::Todo(TodoCommand::Toggle(1))));
        assert_eq!(w.totals(), (1, 2));
        assert!(w.apply(WidgetCommand::Todo(TodoCommand::Delete(1))));
        assert!(!w.apply(WidgetCommand::Todo(TodoCommand::Delete(1))));
        assert_eq!(w.totals(), (0, 1));
    }

    #[test]
    fn ignores_commands_for_other_kinds() {
        let mut w = widget(TodoState::default());
        assert!(!w.apply(WidgetCommand::Refresh));
    }
}
