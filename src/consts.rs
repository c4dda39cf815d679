/// Capture sample rate in Hz. The stream is opened as mono 16-bit PCM at this rate.
pub const SAMPLE_RATE: u32 = 44100;

/// Number of samples requested per block read.
/// 2048 samples at 44.1kHz = ~46ms of audio
pub const BLOCK_SIZE: usize = 2048;

/// Amplitude treated as full scale when mapping RMS to decibels.
pub const REFERENCE_AMPLITUDE: f64 = 32767.0;

/// Offset added to the dBFS value so typical room noise lands mid-scale.
/// Heuristic, not an SPL calibration.
pub const DB_OFFSET: f64 = 90.0;

/// Lower bound of the displayed decibel range. Silence maps here.
pub const MIN_DB: f32 = 0.0;

/// Upper bound of the displayed decibel range.
pub const MAX_DB: f32 = 120.0;

/// Readings strictly above this level raise the loudness alert.
pub const ALERT_THRESHOLD_DB: f32 = 80.0;

/// Below this level the meter is drawn in the "quiet" color.
pub const QUIET_BAND_MAX_DB: f32 = 40.0;

/// Below this level (and above the quiet band) the meter is drawn in the "moderate" color.
pub const MODERATE_BAND_MAX_DB: f32 = 70.0;

/// Chunks buffered between the capture callback and the reader before new ones are dropped.
pub const CHANNEL_CAPACITY: usize = 64;

/// Longest a single block read waits for samples before reporting a
/// zero-sample read, so the acquisition loop can notice a stop request.
pub const READ_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);
