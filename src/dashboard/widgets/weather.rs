use super::{to_state, Widget, WidgetCommand, WidgetContext, WidgetEnv};
use crate::common::input::FieldText;
use crate::dashboard::remote::{Fetcher, RemoteConfig, RemoteFetch, RemoteStatus};
use crate::error::FetchError;
use eframe::egui;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Weather conditions mapped out of the provider response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub city: String,
    pub temperature: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    humidity: f64,
    #[serde(default)]
    pressure: f64,
}

#[derive(Deserialize, Default)]
struct OwmWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Deserialize)]
struct OwmCondition {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Deserialize)]
struct OwmResponse {
    #[serde(default)]
    name: Option<String>,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    #[serde(default)]
    wind: OwmWind,
}

impl WeatherReport {
    /// Map an OpenWeatherMap `weather` response.
    pub fn from_response(value: Value, requested_city: &str) -> Result<Self, FetchError> {
        let resp: OwmResponse =
            serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))?;
        let condition = resp.weather.into_iter().next();
        Ok(Self {
            city: resp
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| requested_city.to_string()),
            temperature: resp.main.temp,
            feels_like: resp.main.feels_like,
            humidity: resp.main.humidity,
            pressure: resp.main.pressure,
            wind_speed: resp.wind.speed,
            description: condition
                .as_ref()
                .map(|c| c.description.clone())
                .unwrap_or_default(),
            icon: condition.map(|c| c.icon).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherState {
    pub city: Option<String>,
    pub weather_data: Option<WeatherReport>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherCommand {
    SetCity(FieldText),
    Retry,
}

pub struct WeatherWidget {
    city: String,
    report: Option<WeatherReport>,
    error: Option<String>,
    fetcher: Arc<dyn Fetcher>,
    remote: RemoteConfig,
    fetch: RemoteFetch,
    started: bool,
    city_draft: String,
}

impl WeatherWidget {
    pub fn new(state: WeatherState, env: &WidgetEnv) -> Self {
        let city = state
            .city
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| env.remote.default_city.clone());
        Self {
            city_draft: city.clone(),
            city,
            report: state.weather_data,
            error: state.error,
            fetcher: Arc::clone(&env.fetcher),
            remote: env.remote.clone(),
            fetch: RemoteFetch::default(),
            started: false,
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn report(&self) -> Option<&WeatherReport> {
        self.report.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> RemoteStatus<'_, WeatherReport> {
        if self.fetch.is_in_flight() {
            RemoteStatus::Loading
        } else if let Some(message) = &self.error {
            RemoteStatus::Failed { message }
        } else if let Some(report) = &self.report {
            RemoteStatus::Ready(report)
        } else {
            RemoteStatus::Idle
        }
    }

    /// Start a fetch for the current city. Suppressed while one is running.
    fn request(&mut self) -> bool {
        self.started = true;
        if self.fetch.is_in_flight() {
            return false;
        }
        let had_error = self.error.take().is_some();
        match self.remote.weather_url(&self.city) {
            Ok(url) => {
                tracing::debug!(city = %self.city, "fetching weather");
                self.fetch.start(&self.fetcher, url);
                had_error
            }
            Err(e) => {
                self.error = Some(e.to_string());
                true
            }
        }
    }

    fn apply_result(&mut self, result: Result<Value, FetchError>) {
        match result.and_then(|value| WeatherReport::from_response(value, &self.city)) {
            Ok(report) => {
                self.report = Some(report);
                self.error = None;
            }
            Err(e) => {
                tracing::error!(city = %self.city, "weather fetch failed: {e}");
                self.error = Some(e.to_string());
            }
        }
    }

    fn render_report(ui: &mut egui::Ui, report: &WeatherReport) {
        ui.heading(format!("{}°C", report.temperature.round()));
        if !report.description.is_empty() {
            ui.label(&report.description);
        }
        egui::Grid::new(("weather_details", &report.city)).show(ui, |ui| {
            ui.weak("Feels like");
            ui.label(format!("{}°C", report.feels_like.round()));
            ui.end_row();
            ui.weak("Humidity");
            ui.label(format!("{}%", report.humidity));
            ui.end_row();
            ui.weak("Pressure");
            ui.label(format!("{} hPa", report.pressure));
            ui.end_row();
            ui.weak("Wind");
            ui.label(format!("{} m/s", report.wind_speed));
            ui.end_row();
        });
    }
}

impl Widget for WeatherWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &WidgetContext<'_>) -> Option<WidgetCommand> {
        let mut command = None;
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.city_draft).desired_width(120.0));
            if ui.button("Set city").clicked() {
                if let Ok(city) = FieldText::parse("city", &self.city_draft) {
                    command = Some(WeatherCommand::SetCity(city));
                }
            }
        });
        ui.strong(&self.city);
        match self.status() {
            RemoteStatus::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading weather...");
                });
            }
            RemoteStatus::Failed { message } => {
                ui.colored_label(egui::Color32::RED, format!("Error: {message}"));
                if ui.button("Try again").clicked() {
                    command = Some(WeatherCommand::Retry);
                }
            }
            RemoteStatus::Ready(report) => Self::render_report(ui, report),
            RemoteStatus::Idle => {
                ui.weak("No data yet");
            }
        }
        command.map(WidgetCommand::Weather)
    }

    fn state(&self) -> Value {
        to_state(&WeatherState {
            city: Some(self.city.clone()),
            weather_data: self.report.clone(),
            error: self.error.clone(),
        })
    }

    fn apply(&mut self, command: WidgetCommand) -> bool {
        match command {
            WidgetCommand::Weather(WeatherCommand::SetCity(city)) => {
                let changed = city.as_str() != self.city;
                self.city = city.into_inner();
                self.city_draft = self.city.clone();
                self.request() || changed
            }
            WidgetCommand::Weather(WeatherCommand::Retry) => self.request(),
            _ => false,
        }
    }

    fn update(&mut self) -> bool {
        self.request()
    }

    fn poll(&mut self) -> bool {
        if !self.started {
            return self.request();
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
    use std::time::Duration;

    fn sample() -> Value {
        json!({
            "name": "Oslo",
            "main": {"temp": 3.6, "feels_like": 0.2, "humidity": 81, "pressure": 1012},
            "weather": [{"description": "light snow", "icon": "13d"}],
            "wind": {"speed": 4.1}
        })
    }

    #[test]
    fn maps_provider_response() {
        let report = WeatherReport::from_response(sample(), "oslo").unwrap();
        assert_eq!(report.city, "Oslo");
        assert_eq!(report.temperature, 3.6);
        assert_eq!(report.humidity, 81.0);
        assert_eq!(report.description, "light snow");
        assert_eq!(report.wind_speed, 4.1);
    }

    #[test]
    fn response_without_main_is_a_decode_error() {
        let err = WeatherReport::from_response(json!({"cod": "404"}), "x").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    struct Canned(Value);

    impl Fetcher for Canned {
        fn fetch_json(&self, _url: &str) -> Result<Value, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn first_poll_starts_fetch_and_result_is_applied() {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        let env = WidgetEnv::new(
            Arc::new(clock),
            Arc::new(Canned(sample())),
            RemoteConfig::default(),
        );
        let mut w = WeatherWidget::new(WeatherState::default(), &env);
        assert_eq!(w.city(), "Moscow");
        assert_eq!(w.status(), RemoteStatus::Idle);
        w.poll();
        assert!(w.is_busy());
        let result = w.fetch.wait(Duration::from_secs(5)).expect("fetch result");
        w.apply_result(result);
        assert_eq!(w.report().map(|r| r.city.as_str()), Some("Oslo"));
        assert!(w.error().is_none());
        assert_eq!(w.state()["weatherData"]["temperature"], json!(3.6));
    }

    #[test]
    fn blank_stored_city_uses_default() {
        let env = WidgetEnv::offline(Arc::new(FixedClock::on(
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        )));
        let state = WeatherState {
            city: Some("   ".into()),
            ..WeatherState::default()
        };
        assert_eq!(WeatherWidget::new(state, &env).city(), "Moscow");
    }
}
