use eframe::egui;

const ALERT_COLOR: egui::Color32 = egui::Color32::from_rgb(0xFF, 0x17, 0x44);
const CALM_TEXT_COLOR: egui::Color32 = egui::Color32::from_rgb(0xB0, 0xBE, 0xC5);

/// `fade` runs from 0.0 (no alert) to 1.0 (alert fully shown).
pub fn render_alert_banner(ui: &mut egui::Ui, threshold_exceeded: bool, fade: f32) {
    let (response, painter) =
        ui.allocate_painter(egui::vec2(ui.available_width(), 50.0), egui::Sense::hover());
    let rect = response.rect;

    painter.rect_filled(rect, 12.0, ALERT_COLOR.gamma_multiply(fade.clamp(0.0, 1.0)));

    let (text, font, color) = if threshold_exceeded {
        (
            "⚠ TOO LOUD! Lower the noise!",
            egui::FontId::proportional(20.0),
            egui::Color32::WHITE,
        )
    } else {
        (
            "Environment is safe",
            egui::FontId::proportional(16.0),
            CALM_TEXT_COLOR,
        )
    };

    painter.text(rect.center(), egui::Align2::CENTER_CENTER, text, font, color);
}
