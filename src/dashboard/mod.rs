pub mod config;
pub mod dashboard;
pub mod remote;
pub mod widgets;

pub use config::{DashboardState, WidgetEntry};
pub use dashboard::{Dashboard, STORAGE_KEY};
pub use remote::{Fetcher, HttpFetcher, OfflineFetcher, RemoteConfig};
pub use widgets::{WidgetCommand, WidgetConfig, WidgetEnv, WidgetFactory, WidgetRegistry};
