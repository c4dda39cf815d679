//! Failures of the capture side of the meter. The estimator itself never fails.

use thiserror::Error;

pub type MeterResult<T> = Result<T, MeterError>;

#[derive(Debug, Error)]
pub enum MeterError {
    /// Capture permission was refused. Recording is never entered.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// No usable input device, or the device refused to open.
    #[error("audio input device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The input stream stopped delivering samples.
    #[error("audio input stream ended")]
    StreamEnded,

    #[error("failed to spawn acquisition thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

impl MeterError {
    pub fn device(err: impl std::fmt::Display) -> Self {
        Self::DeviceUnavailable(err.to_string())
    }
}
