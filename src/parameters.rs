//! Live synthesis parameters and their documented valid ranges.

use std::ops::RangeInclusive;

use crate::{
    grain::{envelope::EnvelopeKind, oscillator::WaveformKind},
    utils::pitch::hz_to_midi,
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Number of hourly frequency bands per day.
pub const HOURS_PER_DAY: usize = 24;

/// Valid cloud window duration range in milliseconds.
pub const CLOUD_DURATION_RANGE: RangeInclusive<f32> = 100.0..=500.0;

/// Valid grain duration range in milliseconds.
pub const GRAIN_DURATION_RANGE: RangeInclusive<f32> = 10.0..=50.0;

// -------------------------------------------------------------------------------------------------

/// Frequency band of one hour-of-day, as MIDI note number bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub low: f32,
    pub high: f32,
}

impl FrequencyBand {
    /// Create a validated band with `low < high`.
    pub fn new(low: f32, high: f32) -> Result<Self, Error> {
        let band = Self { low, high };
        band.validate()?;
        Ok(band)
    }

    /// Validate the band bounds.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.low.is_finite() || !self.high.is_finite() || self.low >= self.high {
            return Err(Error::ParameterError(format!(
                "Band bounds must be finite MIDI notes with low < high, but are: {} / {}",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// Parameters controlling a [`DaySequencer`](crate::DaySequencer) and all of
/// its clouds and grains.
///
/// Fields are public and can be freely tweaked; [`Self::validate`] checks all
/// of them at once and is invoked when a sequencer is constructed.
#[derive(Debug, Clone)]
pub struct SequencerParameters {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Duration of each hourly cloud window in milliseconds (100.0 - 500.0).
    pub cloud_duration: f32,
    /// Duration of each grain in milliseconds (10.0 - 50.0).
    pub grain_duration: f32,
    /// Waveform shape used by all grains.
    pub waveform: WaveformKind,
    /// Amplitude envelope policy used by all grains.
    pub envelope: EnvelopeKind,
    /// Per-hour frequency bands as MIDI note bounds.
    pub bands: [FrequencyBand; HOURS_PER_DAY],
}

impl Default for SequencerParameters {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            cloud_duration: 200.0,
            grain_duration: 20.0,
            waveform: WaveformKind::Sine,
            envelope: EnvelopeKind::LinearAdsr,
            bands: default_bands(),
        }
    }
}

impl SequencerParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate all parameters.
    pub fn validate(&self) -> Result<(), Error> {
        if self.sample_rate == 0 {
            return Err(Error::ParameterError(
                "Sample rate must be greater than zero".to_string(),
            ));
        }
        if !CLOUD_DURATION_RANGE.contains(&self.cloud_duration) {
            return Err(Error::ParameterError(format!(
                "Cloud duration must be between {:?} ms, but is: {}",
                CLOUD_DURATION_RANGE, self.cloud_duration
            )));
        }
        if !GRAIN_DURATION_RANGE.contains(&self.grain_duration) {
            return Err(Error::ParameterError(format!(
                "Grain duration must be between {:?} ms, but is: {}",
                GRAIN_DURATION_RANGE, self.grain_duration
            )));
        }
        for band in &self.bands {
            band.validate()?;
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// The default hourly band layout: 24 equal-width MIDI bands spanning 400 Hz to
/// 10 kHz, with one semitone of padding between neighbouring bands.
pub fn default_bands() -> [FrequencyBand; HOURS_PER_DAY] {
    let min_midi = hz_to_midi(400.0);
    let max_midi = hz_to_midi(10_000.0);
    let padding = 1.0;
    let bandwidth = (max_midi - min_midi - padding * (HOURS_PER_DAY - 1) as f32)
        / HOURS_PER_DAY as f32;

    core::array::from_fn(|hour| {
        let low = min_midi + (bandwidth + padding) * hour as f32;
        FrequencyBand {
            low,
            high: low + bandwidth,
        }
    })
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::pitch::midi_to_hz;

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(SequencerParameters::default().validate().is_ok());
    }

    #[test]
    fn test_duration_ranges() {
        let mut parameters = SequencerParameters::default();
        parameters.cloud_duration = 99.0;
        assert!(parameters.validate().is_err());
        parameters.cloud_duration = 500.0;
        assert!(parameters.validate().is_ok());
        parameters.grain_duration = 51.0;
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn test_band_bounds() {
        assert!(FrequencyBand::new(60.0, 72.0).is_ok());
        assert!(FrequencyBand::new(72.0, 60.0).is_err());
        assert!(FrequencyBand::new(60.0, 60.0).is_err());
        assert!(FrequencyBand::new(f32::NAN, 60.0).is_err());
    }

    #[test]
    fn test_default_band_layout() {
        let bands = default_bands();
        // bands span 400 Hz to 10 kHz, are sorted and non-overlapping
        assert!((midi_to_hz(bands[0].low) - 400.0).abs() < 1.0);
        assert!((midi_to_hz(bands[HOURS_PER_DAY - 1].high) - 10_000.0).abs() < 25.0);
        for pair in bands.windows(2) {
            assert!(pair[0].high < pair[1].low);
        }
        for band in &bands {
            assert!(band.validate().is_ok());
        }
    }
}
