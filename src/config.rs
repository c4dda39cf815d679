use crate::consts;

pub const APP_VERSION: &str = "v0.1.0";

#[derive(Clone, PartialEq, Debug)]
pub struct MeterConfig {
    /// Sample rate in Hz requested from the input device.
    /// Devices that can't run at this rate fall back to their default.
    pub sample_rate: u32,

    /// Maximum number of samples returned by one block read.
    /// Larger = steadier readings but a slower meter.
    /// 2048 samples at 44.1kHz = ~46ms of audio
    pub block_size: usize,

    /// Name of the input device to capture from. `None` uses the host default.
    pub device_name: Option<String>,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            sample_rate: consts::SAMPLE_RATE,
            block_size: consts::BLOCK_SIZE,
            device_name: None,
        }
    }
}
