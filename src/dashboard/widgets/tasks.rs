use super::{input_row, to_state, Widget, WidgetCommand, WidgetContext, WidgetEnv};
use crate::clock::Clock;
use crate::common::input::FieldText;
use crate::common::{issue_id, next_free_id, percentage};
use chrono::{NaiveDate, NaiveDateTime};
use eframe::egui;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    All,
    Active,
    Completed,
}

impl Default for TaskFilter {
    fn default() -> Self {
        TaskFilter::All
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl Priority {
    fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
}

impl Task {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.map_or(false, |due| due < today)
    }
}

fn default_categories() -> Vec<String> {
    ["Work", "Personal", "Health", "Learning"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TasksState {
    #[serde(deserialize_with = "super::lenient_items")]
    pub tasks: Vec<Task>,
    pub categories: Vec<String>,
    pub next_id: u32,
    pub filter: TaskFilter,
}

impl Default for TasksState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            categories: default_categories(),
            next_id: 1,
            filter: TaskFilter::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TasksCommand {
    Add {
        text: FieldText,
        category: Option<String>,
    },
    Toggle(u32),
    Edit {
        id: u32,
        text: FieldText,
    },
    Delete(u32),
    ClearCompleted,
    SetFilter(TaskFilter),
    SetDueDate {
        id: u32,
        due: Option<NaiveDate>,
    },
    SetPriority {
        id: u32,
        priority: Priority,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub all: usize,
    pub active: usize,
    pub completed: usize,
}

pub struct TasksWidget {
    state: TasksState,
    clock: Arc<dyn Clock>,
    draft: String,
    draft_category: usize,
    editing: Option<(u32, String)>,
}

impl TasksWidget {
    pub fn new(mut state: TasksState, env: &WidgetEnv) -> Self {
        if state.categories.is_empty() {
            state.categories = default_categories();
        }
        state.next_id = next_free_id(state.next_id, state.tasks.iter().map(|t| t.id));
        Self {
            state,
            clock: Arc::clone(&env.clock),
            draft: String::new(),
            draft_category: 0,
            editing: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn filter(&self) -> TaskFilter {
        self.state.filter
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.state
            .tasks
            .iter()
            .filter(|t| match self.state.filter {
                TaskFilter::All => true,
                TaskFilter::Active => !t.completed,
                TaskFilter::Completed => t.completed,
            })
            .collect()
    }

    pub fn counts(&self) -> TaskCounts {
        let completed = self.state.tasks.iter().filter(|t| t.completed).count();
        TaskCounts {
            all: self.state.tasks.len(),
            active: self.state.tasks.len() - completed,
            completed,
        }
    }

    pub fn completion_percentage(&self) -> u8 {
        let counts = self.counts();
        percentage(counts.completed, counts.all)
    }

    pub fn overdue(&self, today: NaiveDate) -> Vec<&Task> {
        self.state
            .tasks
            .iter()
            .filter(|t| t.is_overdue(today))
            .collect()
    }

    fn task_mut(&mut self, id: u32) -> Option<&mut Task> {
        self.state.tasks.iter_mut().find(|t| t.id == id)
    }

    fn add(&mut self, text: FieldText, category: Option<String>) -> bool {
        let Some(id) = issue_id(&mut self.state.next_id) else {
            tracing::warn!("task ids exhausted; add ignored");
            return false;
        };
        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .or_else(|| self.state.categories.first().cloned())
            .unwrap_or_default();
        if !category.is_empty() && !self.state.categories.contains(&category) {
            self.state.categories.push(category.clone());
        }
        self.state.tasks.push(Task {
            id,
            text: text.into_inner(),
            category,
            completed: false,
            created_at: self.clock.now(),
            due_date: None,
            priority: Priority::Normal,
        });
        true
    }

    fn apply_command(&mut self, command: TasksCommand) -> bool {
        match command {
            TasksCommand::Add { text, category } => {
                self.add(text, category)
            }
            TasksCommand::Toggle(id) => match self.task_mut(id) {
                Some(task) => {
                    task.completed = !task.completed;
                    true
                }
                None => false,
            },
            TasksCommand::Edit { id, text } => match self.task_mut(id) {
                Some(task) if task.text != text.as_str() => {
                    task.text = text.into_inner();
                    true
                }
                _ => false,
            },
            TasksCommand::Delete(id) => {
                let before = self.state.tasks.len();
                self.state.tasks.retain(|t| t.id != id);
                before != self.state.tasks.len()
            }
            TasksCommand::ClearCompleted => {
                let before = self.state.tasks.len();
                self.state.tasks.retain(|t| !t.completed);
                before != self.state.tasks.len()
            }
            TasksCommand::SetFilter(filter) => {
                let changed = self.state.filter != filter;
                self.state.filter = filter;
                changed
            }
            TasksCommand::SetDueDate { id, due } => match self.task_mut(id) {
                Some(task) if task.due_date != due => {
                    task.due_date = due;
                    true
                }
                _ => false,
            },
            TasksCommand::SetPriority { id, priority } => match self.task_mut(id) {
                Some(task) if task.priority != priority => {
                    task.priority = priority;
                    true
                }
                _ => false,
            },
        }
    }

    fn render_filters(&self, ui: &mut egui::Ui) -> Option<TasksCommand> {
        let counts = self.counts();
        let mut command = None;
        ui.horizontal(|ui| {
            for (filter, label) in [
                (TaskFilter::All, format!("All ({})", counts.all)),
                (TaskFilter::Active, format!("Active ({})", counts.active)),
                (TaskFilter::Completed, format!("Done ({})", counts.completed)),
            ] {
                if ui
                    .selectable_label(self.state.filter == filter, label)
                    .clicked()
                {
                    command = Some(TasksCommand::SetFilter(filter));
                }
            }
        });
        command
    }

    fn render_task(&mut self, ui: &mut egui::Ui, task: &Task, today: NaiveDate) -> Option<TasksCommand> {
        let mut command = None;
        ui.horizontal(|ui| {
            let mut done = task.completed;
            if ui.checkbox(&mut done, "").changed() {
                command = Some(TasksCommand::Toggle(task.id));
            }
            let mut finished = false;
            match &mut self.editing {
                Some((id, buffer)) if *id == task.id => {
                    if ui.text_edit_singleline(buffer).lost_focus() {
                        if let Ok(text) = FieldText::parse("task", buffer) {
                            command = Some(TasksCommand::Edit { id: task.id, text });
                        }
                        finished = true;
                    }
                }
                _ => {
                    let text = if task.completed {
                        egui::RichText::new(&task.text).strikethrough()
                    } else {
                        egui::RichText::new(&task.text)
                    };
                    if ui
                        .add(egui::Label::new(text).sense(egui::Sense::click()))
                        .double_clicked()
                    {
                        self.editing = Some((task.id, task.text.clone()));
                    }
                }
            }
            if finished {
                self.editing = None;
            }
            ui.weak(&task.category);
            if let Some(due) = task.due_date {
                let label = due.format("%d.%m.%Y").to_string();
                if task.is_overdue(today) {
                    ui.colored_label(egui::Color32::RED, label);
                } else {
                    ui.label(label);
                }
            }
            egui::ComboBox::from_id_source(("task_priority", task.id))
                .selected_text(task.priority.label())
                .width(70.0)
                .show_ui(ui, |ui| {
                    for priority in [Priority::Low, Priority::Normal, Priority::High] {
                        if ui
                            .selectable_label(task.priority == priority, priority.label())
                            .clicked()
                        {
                            command = Some(TasksCommand::SetPriority {
                                id: task.id,
                                priority,
                            });
                        }
                    }
                });
            if ui.small_button("Delete").clicked() {
                command = Some(TasksCommand::Delete(task.id));
            }
        });
        command
    }
}

impl Widget for TasksWidget {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &WidgetContext<'_>) -> Option<WidgetCommand> {
        let mut command = None;
        ui.horizontal(|ui| {
            let selected = self
                .state
                .categories
                .get(self.draft_category)
                .cloned()
                .unwrap_or_default();
            egui::ComboBox::from_id_source((ctx.id, "task_category"))
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for (idx, cat) in self.state.categories.iter().enumerate() {
                        ui.selectable_value(&mut self.draft_category, idx, cat);
                    }
                });
        });
        if input_row(ui, &mut self.draft, "New task", "Add") {
            if let Ok(text) = FieldText::parse("task", &self.draft) {
                command = Some(TasksCommand::Add {
                    text,
                    category: self.state.categories.get(self.draft_category).cloned(),
                });
                self.draft.clear();
            }
        }
        if let Some(cmd) = self.render_filters(ui) {
            command = Some(cmd);
        }
        let visible: Vec<Task> = self.visible_tasks().into_iter().cloned().collect();
        if visible.is_empty() {
            ui.weak(match self.state.filter {
                TaskFilter::Completed => "No completed tasks",
                TaskFilter::Active => "No active tasks",
                TaskFilter::All => "No tasks yet",
            });
        }
        for task in &visible {
            if let Some(cmd) = self.render_task(ui, task, ctx.today) {
                command = Some(cmd);
            }
        }
        let counts = self.counts();
        if counts.all > 0 {
            let pct = self.completion_percentage();
            ui.add(egui::ProgressBar::new(pct as f32 / 100.0).text(format!("{pct}% done")));
        }
        if counts.completed > 0 && ui.button("Clear completed").clicked() {
            command = Some(TasksCommand::ClearCompleted);
        }
        command.map(WidgetCommand::Tasks)
    }

    fn state(&self) -> Value {
        to_state(&self.state)
    }

    fn apply(&mut self, command: WidgetCommand) -> bool {
        match command {
            WidgetCommand::Tasks(cmd) => self.apply_command(cmd),
            _ => false,
        }
    }
}
