use super::{to_state, Widget, WidgetCommand, WidgetContext, WidgetEnv};
use crate::clock::Clock;
use crate::common::input::FieldText;
use crate::common::{issue_id, next_free_id, parse_tags};
use chrono::NaiveDateTime;
use eframe::egui;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

const UNTITLED: &str = "New note";
const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoteFilter {
    All,
    Favorites,
}

impl Default for NoteFilter {
    fn default() -> Self {
        NoteFilter::All
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NotesState {
    #[serde(deserialize_with = "super::lenient_items")]
    pub notes: Vec<Note>,
    pub next_id: u32,
    pub current_filter: NoteFilter,
}

impl Default for NotesState {
    fn default() -> Self {
        Self {
            notes: Vec::new(),
            next_id: 1,
            current_filter: NoteFilter::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotesCommand {
    Add {
        title: Option<FieldText>,
        content: FieldText,
        tags: Vec<String>,
    },
    Edit {
        id: u32,
        title: Option<FieldText>,
        content: FieldText,
        tags: Vec<String>,
    },
    Delete(u32),
    ToggleFavorite(u32),
    SetFilter(NoteFilter),
}

#[derive(Default)]
struct NoteDraft {
    title: String,
    content: String,
    tags: String,
}

impl NoteDraft {
    fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            tags: note.tags.join(", "),
        }
    }

    fn parts(&self) -> Option<(Option<FieldText>, FieldText, Vec<String>)> {
        let content = FieldText::parse("content", &self.content).ok()?;
        Some((
            FieldText::optional("title", &self.title),
            content,
            parse_tags(&self.tags),
        ))
    }
}

pub struct NotesWidget {
    state: NotesState,
    clock: Arc<dyn Clock>,
    draft: NoteDraft,
    editing: Option<(u32, NoteDraft)>,
}

impl NotesWidget {
    pub fn new(mut state: NotesState, env: &WidgetEnv) -> Self {
        state.next_id = next_free_id(state.next_id, state.notes.iter().map(|n| n.id));
        Self {
            state,
            clock: Arc::clone(&env.clock),
            draft: NoteDraft::default(),
            editing: None,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.state.notes
    }

    pub fn visible_notes(&self) -> Vec<&Note> {
        self.state
            .notes
            .iter()
            .filter(|n| self.state.current_filter == NoteFilter::All || n.favorite)
            .collect()
    }

    fn note_mut(&mut self, id: u32) -> Option<&mut Note> {
        self.state.notes.iter_mut().find(|n| n.id == id)
    }

    fn apply_command(&mut self, command: NotesCommand) -> bool {
        let now = self.clock.now();
        match command {
            NotesCommand::Add {
                title,
                content,
                tags,
            } => {
                let Some(id) = issue_id(&mut self.state.next_id) else {
                    tracing::warn!("note ids exhausted; add ignored");
                    return false;
                };
                let note = Note {
                    id,
                    title: title.map_or_else(|| UNTITLED.to_string(), FieldText::into_inner),
                    content: content.into_inner(),
                    tags,
                    favorite: false,
                    created_at: now,
                    updated_at: now,
                };
                self.state.notes.insert(0, note);
                true
            }
            NotesCommand::Edit {
                id,
                title,
                content,
                tags,
            } => match self.note_mut(id) {
                Some(note) => {
                    if let Some(title) = title {
                        note.title = title.into_inner();
                    }
                    note.content = content.into_inner();
                    note.tags = tags;
                    note.updated_at = now;
                    true
                }
                None => false,
            },
            NotesCommand::Delete(id) => {
                let before = self.state.notes.len();
                self.state.notes.retain(|n| n.id != id);
                before != self.state.notes.len()
            }
            NotesCommand::ToggleFavorite(id) => match self.note_mut(id) {
                Some(note) => {
                    note.favorite = !note.favorite;
                    note.updated_at = now;
                    true
                }
                None => false,
            },
            NotesCommand::SetFilter(filter) => {
                let changed = self.state.current_filter != filter;
                self.state.current_filter = filter;
                changed
            }
        }
    }

    fn draft_ui(ui: &mut egui::Ui, draft: &mut NoteDraft) {
        ui.add(egui::TextEdit::singleline(&mut draft.title).hint_text("Title"));
        ui.add(
            egui::TextEdit::multiline(&mut draft.content)
                .hint_text("Write something...")
                .desired_rows(3),
        );
        ui.add(egui::TextEdit::singleline(&mut draft.tags).hint_text("Tags, comma separated"));
    }

    fn render_note(&mut self, ui: &mut egui::Ui, note: &Note) -> Option<NotesCommand> {
        let mut command = None;
        let mut cancelled = false;
        ui.group(|ui| {
            if let Some((id, draft)) = &mut self.editing {
                if *id == note.id {
                    Self::draft_ui(ui, draft);
                    ui.horizontal(|ui| {
                        if ui.button("Save").clicked() {
                            if let Some((title, content, tags)) = draft.parts() {
                                command = Some(NotesCommand::Edit {
                                    id: note.id,
                                    title,
                                    content,
                                    tags,
                                });
                            }
                        }
                        if ui.button("Cancel").clicked() {
                            cancelled = true;
                        }
                    });
                    return;
                }
            }
            ui.horizontal(|ui| {
                let star = if note.favorite { "★" } else { "☆" };
                if ui.small_button(star).clicked() {
                    command = Some(NotesCommand::ToggleFavorite(note.id));
                }
                ui.strong(&note.title);
            });
            let preview: String = note.content.chars().take(PREVIEW_CHARS).collect();
            ui.label(preview);
            if !note.tags.is_empty() {
                ui.weak(format!("#{}", note.tags.join(" #")));
            }
            ui.horizontal(|ui| {
                ui.weak(note.updated_at.format("%d.%m.%Y").to_string());
                if ui.small_button("Edit").clicked() {
                    self.editing = Some((note.id, NoteDraft::from_note(note)));
                }
                if ui.small_button("Delete").clicked() {
                    command = Some(NotesCommand::Delete(note.id));
                }
            });
        });
        if cancelled {
            self.editing = None;
        }
        command
    }
}

impl Widget for NotesWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &WidgetContext<'_>) -> Option<WidgetCommand> {
        let mut command = None;
        egui::CollapsingHeader::new("New note").show(ui, |ui| {
            Self::draft_ui(ui, &mut self.draft);
            if ui.button("Add note").clicked() {
                if let Some((title, content, tags)) = self.draft.parts() {
                    command = Some(NotesCommand::Add {
                        title,
                        content,
                        tags,
                    });
                    self.draft = NoteDraft::default();
                }
            }
        });
        ui.horizontal(|ui| {
            for (filter, label) in [(NoteFilter::All, "All"), (NoteFilter::Favorites, "Favorites")] {
                if ui
                    .selectable_label(self.state.current_filter == filter, label)
                    .clicked()
                {
                    command = Some(NotesCommand::SetFilter(filter));
                }
            }
        });
        let visible: Vec<Note> = self.visible_notes().into_iter().cloned().collect();
        if visible.is_empty() {
            ui.weak(match self.state.current_filter {
                NoteFilter::Favorites => "No favorite notes",
                NoteFilter::All => "No notes yet",
            });
        }
        let mut close_editor = false;
        for note in &visible {
            if let Some(cmd) = self.render_note(ui, note) {
                close_editor |= matches!(cmd, NotesCommand::Edit { .. });
                command = Some(cmd);
            }
        }
        if close_editor {
            self.editing = None;
        }
        command.map(WidgetCommand::Notes)
    }

    fn state(&self) -> Value {
        to_state(&self.state)
    }

    fn apply(&mut self, command: WidgetCommand) -> bool {
        match command {
            WidgetCommand::Notes(cmd) => self.apply_command(cmd),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;

    fn setup() -> (NotesWidget, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()));
        let env = WidgetEnv::offline(clock.clone());
        (NotesWidget::new(NotesState::default(), &env), clock)
    }

    fn add(w: &mut NotesWidget, title: &str, content: &str, tags: &str) {
        let cmd = NotesCommand::Add {
            title: FieldText::optional("title", title),
            content: FieldText::parse("content", content).unwrap(),
            tags: parse_tags(tags),
        };
        assert!(w.apply(WidgetCommand::Notes(cmd)));
    }

    #[test]
    fn new_notes_go_first_with_default_title() {
        let (mut w, _) = setup();
        add(&mut w, "Groceries", "eggs", "home, ,food");
        add(&mut w, "  ", "remember this", "");
        assert_eq!(w.notes()[0].title, UNTITLED);
        assert_eq!(w.notes()[1].title, "Groceries");
        assert_eq!(w.notes()[1].tags, vec!["home", "food"]);
    }

    #[test]
    fn favorite_toggle_bumps_updated_at_and_filters() {
        let (mut w, clock) = setup();
        add(&mut w, "a", "one", "");
        add(&mut w, "b", "two", "");
        let created = w.notes()[0].updated_at;
        clock.advance_days(1);
        assert!(w.apply(WidgetCommand::Notes(NotesCommand::ToggleFavorite(1))));
        let note = w.notes().iter().find(|n| n.id == 1).unwrap();
        assert!(note.favorite);
        assert!(note.updated_at > created);
        w.apply(WidgetCommand::Notes(NotesCommand::SetFilter(NoteFilter::Favorites)));
        let ids: Vec<u32> = w.visible_notes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn edit_keeps_title_when_not_given() {
        let (mut w, _) = setup();
        add(&mut w, "Plan", "draft", "");
        let cmd = NotesCommand::Edit {
            id: 1,
            title: None,
            content: FieldText::parse("content", "final").unwrap(),
            tags: vec!["work".into()],
        };
        assert!(w.apply(WidgetCommand::Notes(cmd)));
        assert_eq!(w.notes()[0].title, "Plan");
        assert_eq!(w.notes()[0].content, "final");
        assert!(!w.apply(WidgetCommand::Notes(NotesCommand::Delete(42))));
    }
}
