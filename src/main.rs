mod audio;
mod config;
mod consts;
mod error;
mod gui;
mod permission;
mod reading;
mod session;

use config::MeterConfig;
use log::{debug, info};
use permission::{CapturePermission, HostPermission};
use reading::ReadingCell;
use session::Session;
use std::sync::Arc;

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting up...");

    // === Shared State ===
    let readings = ReadingCell::new();
    let session = Arc::new(Session::new(readings));
    let permission: Arc<dyn CapturePermission> = Arc::new(HostPermission::default());
    let config = MeterConfig::default();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([820.0, 560.0])
            .with_title("Sound Meter"),
        ..Default::default()
    };

    debug!("Launching GUI...");
    let result = {
        let session = session.clone();
        eframe::run_native(
            "Sound Meter",
            options,
            Box::new(move |_cc| Ok(Box::new(gui::AppState::new(config, session, permission)))),
        )
    };

    debug!("Stopping capture session...");
    session.stop();

    info!("Clean shutdown complete");

    result
}
