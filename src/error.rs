use thiserror::Error;

/// Failures surfaced by dashboard lifecycle and persistence operations.
///
/// None of these are fatal: callers log them and keep the dashboard in a
/// renderable state.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("unknown widget type '{0}'")]
    UnknownWidgetType(String),

    #[error("no widget ids left to issue")]
    IdsExhausted,

    #[error("stored dashboard state is corrupt: {0}")]
    StorageCorrupt(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Network failure reported by a [`Fetcher`](crate::dashboard::remote::Fetcher).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Rejected user input. Raised while building a command, never while applying one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("'{0}' is not a valid HH:MM time")]
    InvalidTime(String),
}
