//! cpal-backed capture. The cpal callback pushes mono chunks into a bounded
//! channel and [`CpalSource::read_block`] pulls them back out as blocks.
//! Stream errors are recorded in a shared failure slot rather than sent
//! through the channel, so a full channel can't swallow them.

use super::source::{SampleBlock, SampleSource};
use crate::config::MeterConfig;
use crate::consts;
use crate::error::{MeterError, MeterResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SampleRate, SupportedStreamConfigRange};
use log::{debug, error, info, warn};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Set once by the stream's error callback; never cleared.
#[derive(Clone, Default)]
struct CaptureFailure(Arc<Mutex<Option<String>>>);

impl CaptureFailure {
    fn record(&self, reason: String) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(reason);
        }
    }

    fn reason(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Reader side of the capture channel: turns callback-sized chunks into blocks.
struct CaptureFeed {
    receiver: Receiver<Vec<i16>>,
    failure: CaptureFailure,
    pending: Vec<i16>,
    block_size: usize,
    closed: bool,
}

impl CaptureFeed {
    fn new(receiver: Receiver<Vec<i16>>, failure: CaptureFailure, block_size: usize) -> Self {
        Self {
            receiver,
            failure,
            pending: Vec::with_capacity(block_size),
            block_size: block_size.max(1),
            closed: false,
        }
    }

    fn check_failure(&self) -> MeterResult<()> {
        match self.failure.reason() {
            Some(reason) => {
                warn!("Audio input failed: {reason}");
                Err(MeterError::StreamEnded)
            }
            None => Ok(()),
        }
    }

    /// Waits up to `wait` for samples. Nothing arriving in time is a
    /// zero-sample read, which gives the caller a chance to check for stop.
    fn read_block(&mut self, wait: Duration) -> MeterResult<SampleBlock> {
        if self.closed {
            return Err(MeterError::StreamEnded);
        }
        self.check_failure()?;

        if self.pending.is_empty() {
            match self.receiver.recv_timeout(wait) {
                Ok(samples) => self.pending.extend_from_slice(&samples),
                Err(RecvTimeoutError::Timeout) => {
                    self.check_failure()?;
                    return Ok(Vec::new());
                }
                Err(RecvTimeoutError::Disconnected) => return Err(MeterError::StreamEnded),
            }
        }

        // Top up with whatever else is already waiting, without blocking again
        while self.pending.len() < self.block_size {
            match self.receiver.try_recv() {
                Ok(samples) => self.pending.extend_from_slice(&samples),
                Err(_) => break,
            }
        }

        let take = self.pending.len().min(self.block_size);
        Ok(self.pending.drain(..take).collect())
    }

    fn close(&mut self) {
        self.closed = true;
        self.pending.clear();
    }
}

pub struct CpalSource {
    stream: Option<cpal::Stream>,
    feed: CaptureFeed,
}

impl CpalSource {
    fn new(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        sample_format: SampleFormat,
        block_size: usize,
    ) -> Result<Self, anyhow::Error> {
        let (sender, receiver) = mpsc::sync_channel(consts::CHANNEL_CAPACITY);
        let failure = CaptureFailure::default();

        let stream = match sample_format {
            SampleFormat::I16 => build_stream::<i16>(device, config, sender, failure.clone())?,
            SampleFormat::F32 => build_stream::<f32>(device, config, sender, failure.clone())?,
            SampleFormat::U16 => build_stream::<u16>(device, config, sender, failure.clone())?,
            SampleFormat::I32 => build_stream::<i32>(device, config, sender, failure.clone())?,
            other => return Err(anyhow::anyhow!("Unsupported sample format {other}")),
        };

        stream.play()?;

        Ok(Self {
            stream: Some(stream),
            feed: CaptureFeed::new(receiver, failure, block_size),
        })
    }
}

impl SampleSource for CpalSource {
    fn read_block(&mut self) -> MeterResult<SampleBlock> {
        self.feed.read_block(consts::READ_POLL_INTERVAL)
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                debug!("Pausing input stream before close failed: {err}");
            }
            drop(stream);
            info!("Audio input closed");
        }
        self.feed.close();
    }
}

impl Drop for CpalSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens the configured input device (or the host default) as a mono 16-bit source.
pub fn open_input(config: &MeterConfig) -> MeterResult<CpalSource> {
    let host = cpal::default_host();
    let device = find_device(&host, config.device_name.as_deref())?;
    let device_name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());
    info!("Opening audio input device: {device_name}");

    let (stream_config, sample_format) = negotiate_config(&device, config.sample_rate)?;
    debug!(
        "Input stream config: channels={}, sample_rate={}, format={sample_format}",
        stream_config.channels, stream_config.sample_rate.0
    );

    CpalSource::new(&device, &stream_config, sample_format, config.block_size)
        .map_err(MeterError::device)
}

pub fn input_device_names() -> Vec<String> {
    cpal::default_host()
        .input_devices()
        .ok()
        .map(|iter| iter.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

pub fn default_input_device_name() -> Option<String> {
    cpal::default_host()
        .default_input_device()
        .and_then(|d| d.name().ok())
}

fn find_device(host: &cpal::Host, name: Option<&str>) -> MeterResult<cpal::Device> {
    match name {
        Some(name) => host
            .input_devices()
            .map_err(MeterError::device)?
            .find(|d| d.name().ok().as_deref() == Some(name))
            .ok_or_else(|| MeterError::DeviceUnavailable(format!("no input device named {name}"))),
        None => host
            .default_input_device()
            .ok_or_else(|| MeterError::DeviceUnavailable("no default input device".to_string())),
    }
}

fn negotiate_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> MeterResult<(cpal::StreamConfig, SampleFormat)> {
    let wanted = SampleRate(sample_rate);
    let ranges: Vec<SupportedStreamConfigRange> = device
        .supported_input_configs()
        .map(|iter| iter.collect())
        .unwrap_or_default();

    if let Some(range) = pick_config_range(&ranges, wanted) {
        let supported = range.clone().with_sample_rate(wanted);
        return Ok((supported.config(), supported.sample_format()));
    }

    let fallback = device.default_input_config().map_err(MeterError::device)?;
    warn!(
        "Input device can't capture at {sample_rate} Hz, using its default of {} Hz",
        fallback.sample_rate().0
    );
    Ok((fallback.config(), fallback.sample_format()))
}

fn is_supported_format(format: SampleFormat) -> bool {
    matches!(
        format,
        SampleFormat::I16 | SampleFormat::F32 | SampleFormat::U16 | SampleFormat::I32
    )
}

/// Picks the range closest to mono 16-bit at `wanted`. Ranges that can't run
/// at that rate or deliver a format we convert from are ignored.
fn pick_config_range(
    ranges: &[SupportedStreamConfigRange],
    wanted: SampleRate,
) -> Option<&SupportedStreamConfigRange> {
    ranges
        .iter()
        .filter(|r| r.min_sample_rate() <= wanted && wanted <= r.max_sample_rate())
        .filter(|r| r.channels() > 0 && is_supported_format(r.sample_format()))
        .min_by_key(|r| {
            (
                r.channels() != 1,
                r.sample_format() != SampleFormat::I16,
                r.channels(),
            )
        })
}

/// Averages interleaved frames down to one channel of i16.
fn downmix_to_mono<T>(data: &[T], channels: usize) -> Vec<i16>
where
    T: Sample,
    i16: FromSample<T>,
{
    if channels <= 1 {
        return data.iter().map(|&s| s.to_sample::<i16>()).collect();
    }

    data.chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s.to_sample::<i16>())).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sender: SyncSender<Vec<i16>>,
    failure: CaptureFailure,
) -> Result<cpal::Stream, anyhow::Error>
where
    T: Sample + cpal::SizedSample,
    i16: FromSample<T>,
{
    let channels = usize::from(config.channels);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mono = downmix_to_mono(data, channels);
            if let Err(TrySendError::Full(_)) = sender.try_send(mono) {
                debug!("Reader is behind, dropping captured chunk");
            }
        },
        move |err| {
            error!("Stream error: {err}");
            failure.record(err.to_string());
        },
        None,
    )?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::SupportedBufferSize;

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn prefers_mono_i16_at_requested_rate() {
        let ranges = vec![
            range(2, 8000, 96000, SampleFormat::I16),
            range(1, 8000, 96000, SampleFormat::F32),
            range(1, 8000, 96000, SampleFormat::I16),
        ];

        let picked = pick_config_range(&ranges, SampleRate(44100)).unwrap();
        assert_eq!(picked.channels(), 1);
        assert_eq!(picked.sample_format(), SampleFormat::I16);
    }

    #[test]
    fn mono_beats_sixteen_bit() {
        let ranges = vec![
            range(2, 44100, 48000, SampleFormat::I16),
            range(1, 44100, 48000, SampleFormat::F32),
        ];

        let picked = pick_config_range(&ranges, SampleRate(44100)).unwrap();
        assert_eq!(picked.channels(), 1);
        assert_eq!(picked.sample_format(), SampleFormat::F32);
    }

    #[test]
    fn skips_ranges_without_the_rate_or_format() {
        let ranges = vec![
            range(1, 48000, 48000, SampleFormat::I16),
            range(1, 8000, 96000, SampleFormat::U8),
        ];
        assert!(pick_config_range(&ranges, SampleRate(44100)).is_none());

        let ranges = vec![
            range(1, 48000, 48000, SampleFormat::I16),
            range(4, 8000, 96000, SampleFormat::I16),
        ];
        assert_eq!(
            pick_config_range(&ranges, SampleRate(44100))
                .unwrap()
                .channels(),
            4
        );
    }

    #[test]
    fn mono_passes_samples_through() {
        let data: Vec<i16> = vec![0, 1, -1, i16::MAX, i16::MIN];
        assert_eq!(downmix_to_mono(&data, 1), data);
    }

    #[test]
    fn stereo_frames_are_averaged() {
        let data: Vec<i16> = vec![100, 300, -1000, 1000, i16::MAX, i16::MAX, i16::MIN, i16::MIN];
        assert_eq!(downmix_to_mono(&data, 2), vec![200, 0, i16::MAX, i16::MIN]);
    }

    #[test]
    fn trailing_partial_frame_is_dropped() {
        let data: Vec<i16> = vec![10, 20, 30, 40, 50];
        assert_eq!(downmix_to_mono(&data, 2), vec![15, 35]);
    }

    #[test]
    fn float_silence_stays_silent() {
        let data = vec![0.0f32; 8];
        assert_eq!(downmix_to_mono(&data, 2), vec![0; 4]);
    }

    const WAIT: Duration = Duration::from_millis(5);

    fn feed(block_size: usize) -> (SyncSender<Vec<i16>>, CaptureFailure, CaptureFeed) {
        let (sender, receiver) = mpsc::sync_channel(consts::CHANNEL_CAPACITY);
        let failure = CaptureFailure::default();
        let feed = CaptureFeed::new(receiver, failure.clone(), block_size);
        (sender, failure, feed)
    }

    #[test]
    fn short_chunk_comes_back_as_a_partial_block() {
        let (sender, _failure, mut feed) = feed(256);
        sender.send(vec![7; 100]).unwrap();

        assert_eq!(feed.read_block(WAIT).unwrap(), vec![7; 100]);
        assert!(feed.read_block(WAIT).unwrap().is_empty());
    }

    #[test]
    fn queued_samples_are_split_into_blocks() {
        let (sender, _failure, mut feed) = feed(256);
        sender.send(vec![1; 300]).unwrap();
        sender.send(vec![2; 300]).unwrap();

        let first = feed.read_block(WAIT).unwrap();
        let second = feed.read_block(WAIT).unwrap();
        let third = feed.read_block(WAIT).unwrap();

        assert_eq!(first, vec![1; 256]);
        assert_eq!(second.len(), 256);
        assert_eq!(&second[..44], &[1; 44][..]);
        assert_eq!(&second[44..], &[2; 212][..]);
        assert_eq!(third, vec![2; 88]);
    }

    #[test]
    fn recorded_failure_ends_the_stream_even_with_a_full_channel() {
        let (sender, failure, mut feed) = feed(256);
        for _ in 0..consts::CHANNEL_CAPACITY {
            sender.try_send(vec![1; 16]).unwrap();
        }
        assert!(sender.try_send(vec![1; 16]).is_err());

        failure.record("device unplugged".to_string());

        assert!(matches!(feed.read_block(WAIT), Err(MeterError::StreamEnded)));
        drop(sender);
    }

    #[test]
    fn failure_while_waiting_ends_the_stream() {
        let (_sender, failure, mut feed) = feed(256);
        assert!(feed.read_block(WAIT).unwrap().is_empty());

        failure.record("device unplugged".to_string());
        assert!(matches!(feed.read_block(WAIT), Err(MeterError::StreamEnded)));
    }

    #[test]
    fn first_failure_reason_is_kept() {
        let failure = CaptureFailure::default();
        failure.record("first".to_string());
        failure.record("second".to_string());
        assert_eq!(failure.reason().as_deref(), Some("first"));
    }

    #[test]
    fn disconnected_channel_ends_after_pending_samples() {
        let (sender, _failure, mut feed) = feed(4);
        sender.send(vec![3; 6]).unwrap();
        drop(sender);

        assert_eq!(feed.read_block(WAIT).unwrap(), vec![3; 4]);
        assert_eq!(feed.read_block(WAIT).unwrap(), vec![3; 2]);
        assert!(matches!(feed.read_block(WAIT), Err(MeterError::StreamEnded)));
    }

    #[test]
    fn reads_after_close_end_the_stream() {
        let (sender, _failure, mut feed) = feed(256);
        sender.send(vec![5; 32]).unwrap();

        feed.close();
        feed.close();

        assert!(matches!(feed.read_block(WAIT), Err(MeterError::StreamEnded)));
    }
}

