use crate::consts;
use eframe::egui;

pub const QUIET_COLOR: egui::Color32 = egui::Color32::from_rgb(0x64, 0xFF, 0xDA);
pub const MODERATE_COLOR: egui::Color32 = egui::Color32::from_rgb(0xFF, 0xC1, 0x07);
pub const LOUD_COLOR: egui::Color32 = egui::Color32::from_rgb(0xFF, 0x52, 0x52);

const TRACK_COLOR: egui::Color32 = egui::Color32::from_rgb(0x1C, 0x1C, 0x1C);
const BAR_HEIGHT: f32 = 40.0;
const BAR_ROUNDING: f32 = 20.0;

/// Color band of a level: 0.0 quiet, 1.0 moderate, 2.0 loud.
pub fn level_band(decibels: f32) -> f32 {
    if decibels < consts::QUIET_BAND_MAX_DB {
        0.0
    } else if decibels < consts::MODERATE_BAND_MAX_DB {
        1.0
    } else {
        2.0
    }
}

/// Color at a (possibly mid-transition) band position, blending between neighbours.
pub fn band_color(band: f32) -> egui::Color32 {
    let band = band.clamp(0.0, 2.0);
    if band <= 1.0 {
        blend(QUIET_COLOR, MODERATE_COLOR, band)
    } else {
        blend(MODERATE_COLOR, LOUD_COLOR, band - 1.0)
    }
}

fn blend(from: egui::Color32, to: egui::Color32, t: f32) -> egui::Color32 {
    let channel = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
    egui::Color32::from_rgb(
        channel(from.r(), to.r()),
        channel(from.g(), to.g()),
        channel(from.b(), to.b()),
    )
}

/// Portion of the bar to fill for a level, 0.0 to 1.0.
pub fn bar_fraction(decibels: f32) -> f32 {
    (decibels / consts::MAX_DB).clamp(0.0, 1.0)
}

pub fn render_readout(ui: &mut egui::Ui, decibels: f32, color: egui::Color32) {
    ui.label(
        egui::RichText::new(format!("{decibels:.1} dB"))
            .size(48.0)
            .strong()
            .color(color),
    );
}

pub fn render_level_bar(ui: &mut egui::Ui, fraction: f32, color: egui::Color32) {
    let (response, painter) = ui.allocate_painter(
        egui::vec2(ui.available_width(), BAR_HEIGHT),
        egui::Sense::hover(),
    );

    let rect = response.rect;
    painter.rect_filled(rect, BAR_ROUNDING, TRACK_COLOR);

    let filled_width = rect.width() * fraction.clamp(0.0, 1.0);
    if filled_width > 0.0 {
        let filled = egui::Rect::from_min_size(rect.min, egui::vec2(filled_width, rect.height()));
        painter.rect_filled(filled, BAR_ROUNDING, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_bands_switch_at_forty_and_seventy() {
        assert_eq!(level_band(0.0), 0.0);
        assert_eq!(level_band(39.9), 0.0);
        assert_eq!(level_band(40.0), 1.0);
        assert_eq!(level_band(69.9), 1.0);
        assert_eq!(level_band(70.0), 2.0);
        assert_eq!(level_band(120.0), 2.0);
        assert_eq!(band_color(level_band(20.0)), QUIET_COLOR);
        assert_eq!(band_color(level_band(55.0)), MODERATE_COLOR);
        assert_eq!(band_color(level_band(95.0)), LOUD_COLOR);
    }

    #[test]
    fn band_transitions_blend_between_neighbours() {
        assert_eq!(band_color(0.0), QUIET_COLOR);
        assert_eq!(band_color(1.0), MODERATE_COLOR);
        assert_eq!(band_color(2.0), LOUD_COLOR);
        assert_eq!(band_color(0.5), egui::Color32::from_rgb(0xB2, 0xE0, 0x71));
        assert_eq!(band_color(1.5), egui::Color32::from_rgb(0xFF, 0x8A, 0x2D));
        assert_eq!(band_color(-1.0), QUIET_COLOR);
        assert_eq!(band_color(7.0), LOUD_COLOR);
    }

    #[test]
    fn bar_fills_proportionally_to_the_scale() {
        assert_eq!(bar_fraction(0.0), 0.0);
        assert_eq!(bar_fraction(60.0), 0.5);
        assert_eq!(bar_fraction(120.0), 1.0);
        assert_eq!(bar_fraction(150.0), 1.0);
        assert_eq!(bar_fraction(-3.0), 0.0);
    }
}
