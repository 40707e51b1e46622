use super::{to_state, Widget, WidgetCommand, WidgetContext, WidgetEnv};
use eframe::egui;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

impl Quote {
    /// Persisted form: `text - author`.
    pub fn line(&self) -> String {
        format!("{} - {}", self.text, self.author)
    }
}

pub const QUOTES: &[Quote] = &[
    Quote {
        text: "The only way to do great work is to love what you do.",
        author: "Steve Jobs",
    },
    Quote {
        text: "Innovation distinguishes between a leader and a follower.",
        author: "Steve Jobs",
    },
    Quote {
        text: "The future belongs to those who believe in the beauty of their dreams.",
        author: "Eleanor Roosevelt",
    },
    Quote {
        text: "Success is going from failure to failure without losing enthusiasm.",
        author: "Winston Churchill",
    },
    Quote {
        text: "There is only one way to avoid criticism: do nothing, say nothing, and be nothing.",
        author: "Aristotle",
    },
    Quote {
        text: "Your time is limited, so don't waste it living someone else's life.",
        author: "Steve Jobs",
    },
    Quote {
        text: "Life is what happens to you while you're busy making other plans.",
        author: "John Lennon",
    },
    Quote {
        text: "The two most important days in your life are the day you are born and the day you find out why.",
        author: "Mark Twain",
    },
];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteState {
    pub current_quote: Option<String>,
}

pub struct QuoteWidget {
    current: String,
    rng: StdRng,
}

impl QuoteWidget {
    pub fn new(state: QuoteState, env: &WidgetEnv) -> Self {
        let mut rng = env.rng();
        let current = state
            .current_quote
            .filter(|q| !q.trim().is_empty())
            .or_else(|| QUOTES.choose(&mut rng).map(Quote::line))
            .unwrap_or_default();
        Self { current, rng }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Pick a different bundled quote. Returns `false` when there is none.
    pub fn next_quote(&mut self) -> bool {
        let candidates: Vec<String> = QUOTES
            .iter()
            .map(Quote::line)
            .filter(|line| *line != self.current)
            .collect();
        match candidates.choose(&mut self.rng) {
            Some(line) => {
                self.current = line.clone();
                true
            }
            None => false,
        }
    }
}

impl Widget for QuoteWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &WidgetContext<'_>) -> Option<WidgetCommand> {
        let (text, author) = self
            .current
            .rsplit_once(" - ")
            .unwrap_or((self.current.as_str(), ""));
        ui.label(egui::RichText::new(format!("\u{201c}{text}\u{201d}")).italics());
        if !author.is_empty() {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                ui.weak(author);
            });
        }
        if ui.button("Another quote").clicked() {
            return Some(WidgetCommand::Refresh);
        }
        None
    }

    fn state(&self) -> Value {
        to_state(&QuoteState {
            current_quote: Some(self.current.clone()),
        })
    }

    fn apply(&mut self, _command: WidgetCommand) -> bool {
        false
    }

    fn update(&mut self) -> bool {
        self.next_quote()
    }
}
