#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use agency_timeline::app::SchedulerApp;
use agency_timeline::error::{AppError, AppResult};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> AppResult<()> {
    init_tracing();

    // Remote writes run here; the UI thread stays outside the runtime.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("timeline-io")
        .enable_time()
        .build()?;
    let handle = runtime.handle().clone();
    info!(version = env!("CARGO_PKG_VERSION"), "starting Agency Timeline");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 760.0])
            .with_min_inner_size([800.0, 480.0])
            .with_title("Agency Timeline"),
        ..Default::default()
    };

    eframe::run_native(
        "Agency Timeline",
        options,
        Box::new(move |cc| Ok(Box::new(SchedulerApp::new(cc, handle)))),
    )
    .map_err(|e| AppError::Runtime(e.to_string()))?;

    runtime.shutdown_timeout(std::time::Duration::from_secs(2));
    Ok(())
}
