//! A single scheduled grain: one oscillator and envelope with a fixed onset identity.

pub mod envelope;
pub mod oscillator;

use std::sync::Arc;

use self::{
    envelope::{EnvelopeKind, GrainEnvelope},
    oscillator::{Oscillator, WaveformKind},
};
use crate::utils::{ms_to_samples, window::HannWindow};

// -------------------------------------------------------------------------------------------------

/// One scheduled sonic event inside a [`Cloud`](crate::Cloud).
///
/// A grain's onset ratio and frequency ratio are drawn once at creation and never
/// re-drawn: they are the grain's identity. Only the band bounds and the duration
/// they are applied against may change over the grain's lifetime, so a grain
/// replays identically every cycle until it is explicitly resized away.
#[derive(Clone)]
pub struct Grain {
    duration: f32, // milliseconds
    duration_samples: u32,
    onset_ratio: f32,
    frequency_ratio: f32,
    min_frequency: f32,
    max_frequency: f32,
    frequency: f32,
    position: u32,
    sample_rate: u32,
    oscillator: Oscillator,
    envelope: GrainEnvelope,
}

impl Grain {
    /// Create a grain with a fixed onset ratio and frequency ratio within the
    /// given band, computing its effective frequency and initializing the
    /// oscillator and envelope.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        onset_ratio: f32,
        min_frequency: f32,
        max_frequency: f32,
        frequency_ratio: f32,
        duration: f32,
        waveform: WaveformKind,
        envelope: EnvelopeKind,
        sample_rate: u32,
        window: Arc<HannWindow>,
    ) -> Self {
        debug_assert!(
            (0.0..1.0).contains(&onset_ratio),
            "Onset ratio must be in range [0.0, 1.0)"
        );
        debug_assert!(
            (0.0..1.0).contains(&frequency_ratio),
            "Frequency ratio must be in range [0.0, 1.0)"
        );
        let frequency = min_frequency + frequency_ratio * (max_frequency - min_frequency);
        Self {
            duration,
            duration_samples: ms_to_samples(duration, sample_rate),
            onset_ratio,
            frequency_ratio,
            min_frequency,
            max_frequency,
            frequency,
            position: 0,
            sample_rate,
            oscillator: Oscillator::new(waveform, frequency, sample_rate),
            envelope: GrainEnvelope::new(envelope, window),
        }
    }

    /// Fractional start time within the owning cloud's duration window.
    #[inline]
    pub fn onset_ratio(&self) -> f32 {
        self.onset_ratio
    }

    /// Effective frequency in Hz: `min + ratio * (max - min)`.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Grain duration in milliseconds.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Grain duration in sample frames.
    pub fn duration_samples(&self) -> u32 {
        self.duration_samples
    }

    /// Current playback position in sample frames.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// True while the grain still has samples to produce in this cycle.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.position < self.duration_samples
    }

    /// Compute and return one enveloped output sample, or 0.0 when exhausted.
    ///
    /// Advances the envelope's stage machine, reads one oscillator sample,
    /// multiplies by the envelope amplitude and increments the position. Must be
    /// called exactly once per output sample while the grain is active.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if !self.has_next() {
            return 0.0;
        }
        let level = self.envelope.next_level(self.position, self.duration_samples);
        let sample = self.oscillator.next_sample();
        self.position += 1;
        sample * level
    }

    /// Rewind the position, oscillator phase and envelope stage machine for an
    /// identical replay. Does not re-draw the onset or frequency ratios.
    pub fn reset(&mut self) {
        self.position = 0;
        self.oscillator.reset();
        self.envelope.reset();
    }

    /// Change the grain duration in milliseconds and restart from position 0.
    /// The restart discontinuity is acceptable: the owning cloud must be paused.
    pub fn reset_duration(&mut self, duration: f32) {
        self.duration = duration;
        self.duration_samples = ms_to_samples(duration, self.sample_rate);
        self.reset();
    }

    /// Retune into a new frequency band without restarting: the effective
    /// frequency is recomputed from the fixed frequency ratio, position and
    /// envelope state stay untouched.
    pub fn reset_frequency_band(&mut self, min_frequency: f32, max_frequency: f32) {
        self.min_frequency = min_frequency;
        self.max_frequency = max_frequency;
        self.frequency =
            min_frequency + self.frequency_ratio * (max_frequency - min_frequency);
        self.oscillator.set_frequency(self.frequency);
    }

    /// Switch the waveform shape. Takes effect on the very next sample.
    pub fn select_waveform(&mut self, kind: WaveformKind) {
        self.oscillator.set_kind(kind);
    }

    /// Switch the envelope policy. Takes effect on the very next sample.
    pub fn select_envelope(&mut self, kind: EnvelopeKind) {
        self.envelope.set_kind(kind);
    }
}

// -------------------------------------------------------------------------------------------------
