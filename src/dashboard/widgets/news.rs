use super::{to_state, Widget, WidgetCommand, WidgetContext, WidgetEnv};
use crate::clock::Clock;
use crate::dashboard::remote::{Fetcher, RemoteConfig, RemoteFetch, RemoteStatus};
use crate::error::FetchError;
use chrono::Duration;
use eframe::egui;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Only this many articles are shown at once.
pub const NEWS_DISPLAY_LIMIT: usize = 5;

const PUB_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    Technology,
    Business,
    Sports,
    Health,
    Science,
    Entertainment,
}

impl Default for NewsCategory {
    fn default() -> Self {
        NewsCategory::Technology
    }
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 6] = [
        NewsCategory::Technology,
        NewsCategory::Business,
        NewsCategory::Sports,
        NewsCategory::Health,
        NewsCategory::Science,
        NewsCategory::Entertainment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::Technology => "technology",
            NewsCategory::Business => "business",
            NewsCategory::Sports => "sports",
            NewsCategory::Health => "health",
            NewsCategory::Science => "science",
            NewsCategory::Entertainment => "entertainment",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            NewsCategory::Technology => "Technology",
            NewsCategory::Business => "Business",
            NewsCategory::Sports => "Sports",
            NewsCategory::Health => "Health",
            NewsCategory::Science => "Science",
            NewsCategory::Entertainment => "Entertainment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "source_id")]
    pub source: String,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// Articles from a newsdata.io `news` response. Malformed entries are skipped.
pub fn articles_from_response(value: Value) -> Result<Vec<Article>, FetchError> {
    let results = match value.get("results") {
        Some(Value::Array(items)) => items.clone(),
        _ => return Err(FetchError::Decode("response has no results".into())),
    };
    Ok(results
        .into_iter()
        .filter_map(|item| serde_json::from_value::<Article>(item).ok())
        .filter(|a| !a.title.trim().is_empty())
        .collect())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsState {
    pub news_data: Vec<Article>,
    pub error: Option<String>,
    pub category: NewsCategory,
    pub use_demo_data: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewsCommand {
    SetCategory(NewsCategory),
    Retry,
    UseDemoData,
}

pub struct NewsWidget {
    state: NewsState,
    clock: Arc<dyn Clock>,
    fetcher: Arc<dyn Fetcher>,
    remote: RemoteConfig,
    fetch: RemoteFetch,
    started: bool,
}

impl NewsWidget {
    pub fn new(state: NewsState, env: &WidgetEnv) -> Self {
        Self {
            state,
            clock: Arc::clone(&env.clock),
            fetcher: Arc::clone(&env.fetcher),
            remote: env.remote.clone(),
            fetch: RemoteFetch::default(),
            started: false,
        }
    }

    pub fn category(&self) -> NewsCategory {
        self.state.category
    }

    pub fn articles(&self) -> &[Article] {
        &self.state.news_data
    }

    pub fn displayed(&self) -> &[Article] {
        let end = self.state.news_data.len().min(NEWS_DISPLAY_LIMIT);
        &self.state.news_data[..end]
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn uses_demo_data(&self) -> bool {
        self.state.use_demo_data
    }

    pub fn status(&self) -> RemoteStatus<'_, [Article]> {
        if self.fetch.is_in_flight() {
            RemoteStatus::Loading
        } else if let Some(message) = &self.state.error {
            RemoteStatus::Failed { message }
        } else if self.state.news_data.is_empty() {
            RemoteStatus::Idle
        } else {
            RemoteStatus::Ready(self.displayed())
        }
    }

    fn request(&mut self) -> bool {
        self.started = true;
        if self.fetch.is_in_flight() {
            return false;
        }
        let had_error = self.state.error.take().is_some();
        match self.remote.news_url(self.state.category.as_str()) {
            Ok(url) => {
                tracing::debug!(category = self.state.category.as_str(), "fetching news");
                self.fetch.start(&self.fetcher, url);
                had_error
            }
            Err(e) => {
                self.state.error = Some(e.to_string());
                true
            }
        }
    }

    fn apply_result(&mut self, result: Result<Value, FetchError>) {
        let articles = result.and_then(articles_from_response);
        match articles {
            Ok(articles) if articles.is_empty() => {
                self.state.news_data.clear();
                self.state.error = Some("No news found for the selected category".into());
            }
            Ok(articles) => {
                self.state.news_data = articles;
                self.state.error = None;
                self.state.use_demo_data = false;
            }
            Err(e) => {
                tracing::error!(category = self.state.category.as_str(), "news fetch failed: {e}");
                self.state.error = Some(e.to_string());
            }
        }
    }

    /// Swap in bundled articles dated relative to now.
    fn show_demo(&mut self) {
        let now = self.clock.now();
        self.fetch.forget();
        self.state.use_demo_data = true;
        self.state.error = None;
        self.state.news_data = DEMO_ARTICLES
            .iter()
            .enumerate()
            .map(|(age, (title, description, source))| Article {
                title: title.to_string(),
                description: Some(description.to_string()),
                source: source.to_string(),
                pub_date: Some(
                    (now - Duration::days(age as i64))
                        .format(PUB_DATE_FORMAT)
                        .to_string(),
                ),
                link: None,
            })
            .collect();
    }
}

const DEMO_ARTICLES: [(&str, &str, &str); 5] = [
    (
        "AI helps scientists speed up research",
        "New machine learning models are accelerating discoveries in medicine and materials science.",
        "Science Daily",
    ),
    (
        "Spacecraft reaches orbit around a distant planet",
        "The spacecraft entered a stable orbit and will study the composition of the planet's atmosphere.",
        "Space Research",
    ),
    (
        "Breakthrough in quantum computing",
        "Researchers announced a processor with a record number of qubits.",
        "Future Tech",
    ),
    (
        "Renewable energy sets new records",
        "Solar and wind reached their largest share of the global energy mix to date.",
        "Green Tech",
    ),
    (
        "New gene therapy shows promising results",
        "A new gene editing method may help treat inherited diseases, early trials show.",
        "Medical Innovations",
    ),
];

impl Widget for NewsWidget {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &WidgetContext<'_>) -> Option<WidgetCommand> {
        let mut command = None;
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_source((ctx.id, "news_category"))
                .selected_text(self.state.category.label())
                .show_ui(ui, |ui| {
                    for category in NewsCategory::ALL {
                        if ui
                            .selectable_label(self.state.category == category, category.label())
                            .clicked()
                        {
                            command = Some(NewsCommand::SetCategory(category));
                        }
                    }
                });
            if ui.button("Refresh").clicked() {
                command = Some(NewsCommand::Retry);
            }
        });
        match self.status() {
            RemoteStatus::Loading | RemoteStatus::Idle => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading news...");
                });
            }
            RemoteStatus::Failed { message } => {
                ui.colored_label(egui::Color32::RED, format!("Error: {message}"));
                ui.horizontal(|ui| {
                    if ui.button("Try again").clicked() {
                        command = Some(NewsCommand::Retry);
                    }
                    if ui.button("Use demo data").clicked() {
                        command = Some(NewsCommand::UseDemoData);
                    }
                });
            }
            RemoteStatus::Ready(articles) => {
                for article in articles {
                    ui.group(|ui| {
                        ui.strong(&article.title);
                        ui.label(
                            article
                                .description
                                .as_deref()
                                .unwrap_or("No description"),
                        );
                        ui.horizontal(|ui| {
                            ui.weak(&article.source);
                            if let Some(date) = &article.pub_date {
                                ui.weak(date.split(' ').next().unwrap_or(date));
                            }
                            if let Some(link) = article.link.as_deref().filter(|l| l.starts_with("http")) {
                                ui.hyperlink_to("Read more", link);
                            }
                        });
                    });
                }
                if self.state.use_demo_data {
                    ui.weak("Showing demo data");
                }
            }
        }
        command.map(WidgetCommand::News)
    }

    fn state(&self) -> Value {
        to_state(&self.state)
    }

    fn apply(&mut self, command: WidgetCommand) -> bool {
        match command {
            WidgetCommand::News(NewsCommand::SetCategory(category)) => {
                let changed = self.state.category != category;
                self.state.category = category;
                self.request() || changed
            }
            WidgetCommand::News(NewsCommand::Retry) => self.request(),
            WidgetCommand::News(NewsCommand::UseDemoData) => {
                self.show_demo();
                true
            }
            _ => false,
        }
    }

    fn update(&mut self) -> bool {
        self.request()
    }

    fn poll(&mut self) -> bool {
        if !self.started {
            self.started = true;
            let needs_data = self.state.news_data.is_empty()
                && self.state.error.is_none()
                && !self.state.use_demo_data;
            return needs_data && self.request();
        }
        match self.fetch.poll() {
            Some(result) => {
                self.apply_result(result);
                true
            }
            None => false,
        }
    }

    fn is_busy(&self) -> bool {
        self.fetch.is_in_flight()
    }

    fn destroy(&mut self) {
        self.fetch.forget();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;
    use serde_json::json;

    fn widget() -> NewsWidget {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        NewsWidget::new(NewsState::default(), &WidgetEnv::offline(Arc::new(clock)))
    }

    #[test]
    fn parses_results_and_skips_broken_entries() {
        let articles = articles_from_response(json!({
            "status": "success",
            "results": [
                {"title": "One", "source_id": "wire", "pubDate": "2024-05-09 10:00:00", "link": "https://a"},
                {"description": "no title"},
                {"title": "Two", "description": null}
            ]
        }))
        .unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].source, "wire");
        assert_eq!(articles[1].description, None);
    }

    #[test]
    fn empty_result_is_an_error() {
        let mut w = widget();
        w.apply_result(Ok(json!({"results": []})));
        assert!(w.error().is_some());
        assert!(matches!(w.status(), RemoteStatus::Failed { .. }));
    }

    #[test]
    fn only_first_five_are_displayed() {
        let mut w = widget();
        let results: Vec<Value> = (0..8).map(|i| json!({"title": format!("n{i}")})).collect();
        w.apply_result(Ok(json!({ "results": results })));
        assert_eq!(w.articles().len(), 8);
        assert_eq!(w.displayed().len(), NEWS_DISPLAY_LIMIT);
    }

    #[test]
    fn demo_data_clears_error_and_is_dated_from_now() {
        let mut w = widget();
        w.apply_result(Err(FetchError::Status(500)));
        assert!(w.apply(WidgetCommand::News(NewsCommand::UseDemoData)));
        assert!(w.uses_demo_data());
        assert!(w.error().is_none());
        assert_eq!(w.articles().len(), 5);
        assert_eq!(
            w.articles()[1].pub_date.as_deref(),
            Some("2024-05-09 12:00:00")
        );
        assert_eq!(w.state()["useDemoData"], json!(true));
    }

    #[test]
    fn stored_articles_skip_the_initial_fetch() {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        let state = NewsState {
            news_data: vec![Article {
                title: "Cached".into(),
                description: None,
                source: "x".into(),
                pub_date: None,
                link: None,
            }],
            ..NewsState::default()
        };
        let mut w = NewsWidget::new(state, &WidgetEnv::offline(Arc::new(clock)));
        assert!(!w.poll());
        assert!(!w.is_busy());
    }
}
