use crate::audio::audio_stream;
use crate::config::{APP_VERSION, MeterConfig};
use crate::permission::{CapturePermission, ensure_capture_permission};
use crate::reading::ReadingCell;
use crate::session::{Session, SessionStatus};
use eframe::egui;
use log::{debug, info};
use std::sync::{Arc, Mutex, PoisonError};

use super::components::{
    band_color, bar_fraction, level_band, render_alert_banner, render_config_panel,
    render_level_bar, render_readout,
};

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(0x0D, 0x0D, 0x0D);
const BAR_ANIMATION_SECS: f32 = 0.25;
const ALERT_ANIMATION_SECS: f32 = 0.3;
const COLOR_ANIMATION_SECS: f32 = 0.3;

pub struct AppState {
    active_config: MeterConfig,
    pending_config: MeterConfig, // Local copy for the settings panel
    devices: Vec<String>,
    session: Arc<Session>,
    readings: ReadingCell,
    permission: Arc<dyn CapturePermission>,
    start_failure: Arc<Mutex<Option<String>>>,
}

impl eframe::App for AppState {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.render_top_panel(ctx);
        self.render_settings_panel(ctx);
        self.render_meter(ctx);

        ctx.request_repaint();
    }
}

impl AppState {
    pub fn new(
        config: MeterConfig,
        session: Arc<Session>,
        permission: Arc<dyn CapturePermission>,
    ) -> Self {
        debug!("Initializing GUI state...");

        let devices = audio_stream::input_device_names();
        debug!("Found {} audio input devices", devices.len());

        let selected_device = config
            .device_name
            .clone()
            .or_else(audio_stream::default_input_device_name)
            .unwrap_or_else(|| "None".to_string());
        info!("Selected initial audio device: {selected_device}");

        let state = Self {
            active_config: config.clone(),
            pending_config: config,
            devices,
            readings: session.readings().clone(),
            session,
            permission,
            start_failure: Arc::new(Mutex::new(None)),
        };
        state.start_recording();
        state
    }

    /// Starts capturing with the active config once permission is held.
    fn start_recording(&self) {
        let session = self.session.clone();
        let config = self.active_config.clone();
        let failure = self.start_failure.clone();
        *failure.lock().unwrap_or_else(PoisonError::into_inner) = None;

        ensure_capture_permission(self.permission.as_ref(), move |permitted| {
            let result =
                permitted.and_then(|()| session.start(move || audio_stream::open_input(&config)));
            if let Err(err) = result {
                *failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(err.to_string());
            }
        });
    }

    fn apply_settings(&mut self) {
        debug!("Applying settings - Config: {:?}", self.pending_config);

        self.session.stop();
        self.active_config = self.pending_config.clone();

        debug!("Reloading audio input with new settings...");
        self.start_recording();
        info!("Settings applied");
    }

    fn reset_to_default(&mut self) {
        debug!("Resetting config to defaults");
        self.pending_config = MeterConfig::default();
    }

    fn disable_apply_button(&self) -> bool {
        self.pending_config == self.active_config
    }

    fn render_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(format!("Sound Meter {APP_VERSION}"));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match self.session.status() {
                        SessionStatus::Recording => {
                            ui.colored_label(egui::Color32::GREEN, "Listening");
                        }
                        SessionStatus::Idle => {
                            ui.colored_label(egui::Color32::RED, "Not Listening");
                        }
                    }
                });
            });

            let failure = self
                .start_failure
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(failure) = failure {
                ui.colored_label(egui::Color32::LIGHT_RED, failure);
            }
            ui.add_space(4.0);
        });
    }

    fn render_settings_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("settings_panel")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                render_config_panel(ui, &mut self.pending_config, &self.devices);

                ui.horizontal(|ui| {
                    ui.add_enabled_ui(!self.disable_apply_button(), |ui| {
                        if ui.button("Apply Settings").clicked() {
                            self.apply_settings();
                        }
                    });

                    if ui.button("↺ Reset to Default").clicked() {
                        self.reset_to_default();
                    }
                });
            });
    }

    fn render_meter(&mut self, ctx: &egui::Context) {
        let reading = self.readings.observe();

        let fraction = ctx.animate_value_with_time(
            egui::Id::new("level_bar"),
            bar_fraction(reading.decibels),
            BAR_ANIMATION_SECS,
        );
        let alert_fade = ctx.animate_bool_with_time(
            egui::Id::new("alert_banner"),
            reading.threshold_exceeded,
            ALERT_ANIMATION_SECS,
        );
        let band = ctx.animate_value_with_time(
            egui::Id::new("level_color"),
            level_band(reading.decibels),
            COLOR_ANIMATION_SECS,
        );
        let color = band_color(band);

        egui::CentralPanel::default()
            .frame(
                egui::Frame::default()
                    .fill(BACKGROUND)
                    .inner_margin(24.0),
            )
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(24.0);
                    ui.label(
                        egui::RichText::new("SOUND METER")
                            .size(32.0)
                            .strong()
                            .color(egui::Color32::WHITE),
                    );

                    ui.add_space(48.0);
                    render_readout(ui, reading.decibels, color);

                    ui.add_space(48.0);
                    render_level_bar(ui, fraction, color);

                    ui.add_space(48.0);
                    render_alert_banner(ui, reading.threshold_exceeded, alert_fade);
                });
            });
    }
}
