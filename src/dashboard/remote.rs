//! Network plumbing for widgets backed by remote JSON APIs.
//!
//! Requests run on a short-lived worker thread and hand their result back
//! over a channel. Widgets drain it from `poll()` on the UI thread.

use crate::error::FetchError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use url::Url;

pub type FetchResult = Result<Value, FetchError>;

pub trait Fetcher: Send + Sync {
    fn fetch_json(&self, url: &str) -> FetchResult;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("organizer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_json(&self, url: &str) -> FetchResult {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let text = resp
            .text()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Fetcher that always fails. Used when the HTTP client cannot be built.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

impl Fetcher for OfflineFetcher {
    fn fetch_json(&self, _url: &str) -> FetchResult {
        Err(FetchError::Transport("network access is unavailable".into()))
    }
}

/// A single outstanding request. At most one is in flight at a time.
#[derive(Default)]
pub struct RemoteFetch {
    pending: Option<Receiver<FetchResult>>,
}

impl RemoteFetch {
    /// Start fetching `url` unless a request is already running.
    /// Returns `false` when the call was suppressed.
    pub fn start(&mut self, fetcher: &Arc<dyn Fetcher>, url: String) -> bool {
        if self.pending.is_some() {
            return false;
        }
        let (tx, rx) = mpsc::channel();
        let fallback = tx.clone();
        let fetcher = Arc::clone(fetcher);
        let spawned = thread::Builder::new()
            .name("widget-fetch".into())
            .spawn(move || {
                let result = fetcher.fetch_json(&url);
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            tracing::error!("failed to spawn fetch worker: {e}");
            let _ = fallback.send(Err(FetchError::Transport(e.to_string())));
        }
        self.pending = Some(rx);
        true
    }

    /// Take the result if the request has finished.
    pub fn poll(&mut self) -> Option<FetchResult> {
        let rx = self.pending.as_ref()?;
        match rx.try_recv() {
            Ok(result) => {
                self.pending = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                Some(Err(FetchError::Transport("fetch worker exited".into())))
            }
        }
    }

    /// Block until the request finishes or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<FetchResult> {
        let rx = self.pending.as_ref()?;
        match rx.recv_timeout(timeout) {
            Ok(result) => {
                self.pending = None;
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.pending = None;
                Some(Err(FetchError::Transport("fetch worker exited".into())))
            }
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the outstanding request. A late result is discarded.
    pub fn forget(&mut self) {
        self.pending = None;
    }
}

/// What a remote-backed widget should show right now.
#[derive(Debug, PartialEq)]
pub enum RemoteStatus<'a, T: ?Sized> {
    Idle,
    Loading,
    Failed { message: &'a str },
    Ready(&'a T),
}

/// Endpoints and credentials for the remote-backed widgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RemoteConfig {
    pub weather_endpoint: String,
    pub weather_api_key: Option<String>,
    pub news_endpoint: String,
    pub news_api_key: Option<String>,
    pub news_language: String,
    pub default_city: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            weather_endpoint: "https://api.openweathermap.org/data/2.5/weather".into(),
            weather_api_key: None,
            news_endpoint: "https://newsdata.io/api/1/news".into(),
            news_api_key: None,
            news_language: "en".into(),
            default_city: "Moscow".into(),
        }
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, FetchError> {
    Url::parse(endpoint).map_err(|e| FetchError::InvalidUrl(format!("{endpoint}: {e}")))
}

impl RemoteConfig {
    pub fn weather_url(&self, city: &str) -> Result<String, FetchError> {
        let mut url = parse_endpoint(&self.weather_endpoint)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("q", city);
            if let Some(key) = self.weather_api_key.as_deref().filter(|k| !k.is_empty()) {
                query.append_pair("appid", key);
            }
            query.append_pair("units", "metric");
        }
        Ok(url.into())
    }

    pub fn news_url(&self, category: &str) -> Result<String, FetchError> {
        let mut url = parse_endpoint(&self.news_endpoint)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = self.news_api_key.as_deref().filter(|k| !k.is_empty()) {
                query.append_pair("apikey", key);
            }
            query.append_pair("category", category);
            query.append_pair("language", &self.news_language);
        }
        Ok(url.into())
    }
}
