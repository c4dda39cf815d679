use eframe::egui;

use crate::config::MeterConfig;

pub fn render_config_panel(ui: &mut egui::Ui, config: &mut MeterConfig, devices: &[String]) {
    ui.label(egui::RichText::new("Configuration").size(16.0));
    ui.add_space(8.0);

    egui::CollapsingHeader::new("Audio Input")
        .default_open(true)
        .show(ui, |ui| {
            ui.add_space(4.0);
            egui::Grid::new("input_settings_grid")
                .num_columns(2)
                .spacing([20.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Device:");
                    egui::ComboBox::from_id_salt("device_selector")
                        .selected_text(config.device_name.as_deref().unwrap_or("System default"))
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut config.device_name, None, "System default");
                            for name in devices {
                                ui.selectable_value(
                                    &mut config.device_name,
                                    Some(name.clone()),
                                    name,
                                );
                            }
                        });
                    ui.end_row();

                    ui.label("Block Size:")
                        .on_hover_text("Samples per reading (larger = steadier, slower meter)");
                    ui.add(
                        egui::Slider::new(&mut config.block_size, 256..=8192).suffix(" samples"),
                    );
                    ui.end_row();

                    ui.label("Sample Rate:");
                    ui.label(format!("{} Hz", config.sample_rate));
                    ui.end_row();
                });
        });

    ui.add_space(12.0);
}
