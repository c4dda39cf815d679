mod alert_banner;
mod config_panel;
mod level_meter;

pub use alert_banner::render_alert_banner;
pub use config_panel::render_config_panel;
pub use level_meter::{band_color, bar_fraction, level_band, render_level_bar, render_readout};
