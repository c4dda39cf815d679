//! Block loudness estimation: RMS amplitude, decibel mapping and alert classification.

use crate::consts;
use crate::reading::Reading;

/// Root-mean-square amplitude of a block of 16-bit samples.
///
/// Squares are accumulated in `i64`, which holds the sum for any block that
/// fits in memory. An empty block has amplitude 0.
pub fn rms_amplitude(block: &[i16]) -> f64 {
    if block.is_empty() {
        return 0.0;
    }

    let sum_squares: i64 = block
        .iter()
        .map(|&s| {
            let s = i64::from(s);
            s * s
        })
        .sum();

    (sum_squares as f64 / block.len() as f64).sqrt()
}

/// Maps an RMS amplitude onto the meter's 0-120 decibel scale.
///
/// `20 * log10(amplitude / 32767) + 90`, clamped. Non-positive amplitudes are
/// silence and map to exactly 0.
pub fn amplitude_to_db(amplitude: f64) -> f32 {
    if amplitude.is_nan() || amplitude <= 0.0 {
        return consts::MIN_DB;
    }

    let db = 20.0 * (amplitude / consts::REFERENCE_AMPLITUDE).log10() + consts::DB_OFFSET;
    (db as f32).clamp(consts::MIN_DB, consts::MAX_DB)
}

/// Whether a level raises the loudness alert. Exactly 80 dB does not.
pub fn is_alert(decibels: f32) -> bool {
    decibels > consts::ALERT_THRESHOLD_DB
}

/// Estimates the loudness of one block. Total over every block, including the empty one.
pub fn estimate(block: &[i16]) -> Reading {
    let decibels = amplitude_to_db(rms_amplitude(block));

    Reading {
        decibels,
        threshold_exceeded: is_alert(decibels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(value: i16, len: usize) -> Vec<i16> {
        vec![value; len]
    }

    #[test]
    fn empty_block_is_silent() {
        let reading = estimate(&[]);
        assert_eq!(reading.decibels, 0.0);
        assert!(!reading.threshold_exceeded);
        assert_eq!(rms_amplitude(&[]), 0.0);
    }

    #[test]
    fn all_zero_block_is_silent() {
        let reading = estimate(&uniform(0, 4096));
        assert_eq!(reading.decibels, 0.0);
        assert!(!reading.threshold_exceeded);
    }

    #[test]
    fn full_scale_reads_ninety() {
        for value in [i16::MAX, -i16::MAX] {
            let reading = estimate(&uniform(value, 2048));
            assert_eq!(reading.decibels, 90.0);
            assert!(reading.threshold_exceeded);
        }
    }

    #[test]
    fn alternating_ten_thousand_reads_just_under_alert() {
        let block: Vec<i16> = (0..1000)
            .map(|i| if i % 2 == 0 { 10_000 } else { -10_000 })
            .collect();

        assert_eq!(rms_amplitude(&block), 10_000.0);

        let reading = estimate(&block);
        let expected = 20.0 * (10_000.0f64 / 32767.0).log10() + 90.0;
        assert!((f64::from(reading.decibels) - expected).abs() < 1e-3);
        assert!((reading.decibels - 79.69).abs() < 0.01);
        assert!(!reading.threshold_exceeded);
    }

    #[test]
    fn extreme_mixed_samples_stay_in_range() {
        let block: Vec<i16> = (0..65_536)
            .map(|i| if i % 3 == 0 { i16::MIN } else { i16::MAX })
            .collect();

        let reading = estimate(&block);
        assert!(reading.decibels.is_finite());
        assert!((0.0..=120.0).contains(&reading.decibels));
        assert!(reading.decibels > 90.0);

        let reading = estimate(&uniform(i16::MIN, 2048));
        assert!((0.0..=120.0).contains(&reading.decibels));
    }

    #[test]
    fn tiny_amplitudes_clamp_to_floor() {
        // 20*log10(1/32767) + 90 is about -0.3, below the floor.
        assert_eq!(estimate(&[1, -1, 1, -1]).decibels, 0.0);
        assert_eq!(amplitude_to_db(-5.0), 0.0);
        assert_eq!(amplitude_to_db(f64::NAN), 0.0);
    }

    #[test]
    fn huge_amplitudes_clamp_to_ceiling() {
        assert_eq!(amplitude_to_db(1.0e9), 120.0);
    }

    #[test]
    fn louder_uniform_blocks_never_read_lower() {
        let mut previous = 0.0f32;
        for value in (1..=i16::MAX).step_by(97).chain([i16::MAX]) {
            let db = estimate(&uniform(value, 256)).decibels;
            assert!(
                db >= previous,
                "{value} gave {db} dB, below previous {previous} dB"
            );
            previous = db;
        }
    }

    #[test]
    fn alert_threshold_is_strict() {
        assert!(!is_alert(80.0));
        assert!(is_alert(80.0001));
        assert!(!is_alert(0.0));
        assert!(is_alert(120.0));
    }

    #[test]
    fn classification_follows_published_level() {
        for value in (0..=i16::MAX).step_by(311) {
            let reading = estimate(&uniform(value, 64));
            assert_eq!(reading.threshold_exceeded, reading.decibels > 80.0);
        }
    }
}
