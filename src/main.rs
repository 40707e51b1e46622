use organizer::clock::SystemClock;
use organizer::dashboard::remote::{Fetcher, HttpFetcher, OfflineFetcher};
use organizer::dashboard::widgets::{WidgetEnv, WidgetRegistry};
use organizer::dashboard::Dashboard;
use organizer::gui::DashboardApp;
use organizer::settings::Settings;
use organizer::storage::FileStore;
use organizer::logging;

use eframe::egui;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load("settings.json")?;
    logging::init(settings.debug_logging, settings.log_file.as_deref());

    let data_dir = settings.resolved_data_dir();
    let store = FileStore::new(&data_dir)?;
    tracing::info!(dir = %data_dir.display(), "using data directory");

    let fetcher: Arc<dyn Fetcher> = match HttpFetcher::new(settings.http_timeout()) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            tracing::error!("http client unavailable, remote widgets run offline: {e}");
            Arc::new(OfflineFetcher)
        }
    };
    let mut env = WidgetEnv::new(Arc::new(SystemClock), fetcher, settings.remote_config());
    if let Some(seed) = settings.quote_seed {
        env = env.with_seed(seed);
    }
    let registry = WidgetRegistry::with_defaults(env);

    let mut dashboard = Dashboard::load(registry, Box::new(store));
    let seeded = dashboard.seed_defaults(settings.default_widgets.as_slice());
    if seeded > 0 {
        tracing::info!(seeded, "added default widgets");
    }

    let (width, height) = settings.window_size;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([360.0, 280.0]),
        ..Default::default()
    };
    let app = DashboardApp::new(dashboard);
    eframe::run_native(
        "Organizer",
        native_options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the dashboard window: {e}"))
}
