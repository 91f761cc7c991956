//! Small shared helpers: pitch conversions, window tables, time units.

pub mod pitch;
pub mod window;

// -------------------------------------------------------------------------------------------------

/// Convert a duration in milliseconds to a whole sample frame count at the given sample rate.
///
/// Negative durations clamp to zero.
#[inline]
pub fn ms_to_samples(milliseconds: f32, sample_rate: u32) -> u32 {
    debug_assert!(sample_rate > 0, "Invalid sample rate");
    (milliseconds.max(0.0) / 1000.0 * sample_rate as f32) as u32
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_to_samples() {
        assert_eq!(ms_to_samples(20.0, 44100), 882);
        assert_eq!(ms_to_samples(200.0, 44100), 8820);
        assert_eq!(ms_to_samples(1000.0, 48000), 48000);
        assert_eq!(ms_to_samples(0.0, 44100), 0);
        assert_eq!(ms_to_samples(-5.0, 44100), 0);
    }
}
