//! A stochastic cluster of grains inside one duration window and frequency band.

use std::sync::Arc;

use rand::{rngs::SmallRng, Rng};

use crate::{
    grain::{
        envelope::EnvelopeKind,
        oscillator::WaveformKind,
        Grain,
    },
    utils::{ms_to_samples, pitch::midi_to_hz, window::HannWindow},
};

// -------------------------------------------------------------------------------------------------

/// An ensemble of [`Grain`]s scattered in time and pitch, mixed into a single
/// normalized sample stream.
///
/// Grains live in an owned arena (`Vec<Grain>`), kept sorted ascending by onset
/// ratio; the currently sounding set is an insertion-ordered list of arena
/// indices. Sorted onsets plus a single monotonic scheduling cursor make onset
/// detection amortized O(1) per sample, grains fire strictly chronologically,
/// and the fixed iteration order keeps the floating point mix bit-stable across
/// runs and platforms.
///
/// Randomness is only consumed when the population is (re)built; playback itself
/// is fully deterministic and replays the identical realization after a
/// [`Self::reset`].
pub struct Cloud {
    grains: Vec<Grain>,
    /// Arena indices of the grains currently sounding, in activation order.
    active: Vec<usize>,

    density: f32,        // grains per second
    grain_duration: f32, // milliseconds
    cloud_duration: f32, // milliseconds
    cloud_duration_samples: u32,

    min_midi: f32,
    max_midi: f32,
    min_frequency: f32,
    max_frequency: f32,

    waveform: WaveformKind,
    envelope: EnvelopeKind,

    /// Index of the next not-yet-activated grain in the sorted sequence.
    schedule_cursor: usize,
    /// Current playback position within the cloud window.
    sample_cursor: u32,

    sample_rate: u32,
    window: Arc<HannWindow>,
    rng: SmallRng,
}

impl Cloud {
    /// Create a cloud and scatter its initial grain population.
    ///
    /// The band bounds are MIDI note numbers; `density` is the target number of
    /// grains per second within the `cloud_duration` window.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        density: f32,
        midi_low: f32,
        midi_high: f32,
        grain_duration: f32,
        cloud_duration: f32,
        waveform: WaveformKind,
        envelope: EnvelopeKind,
        sample_rate: u32,
        window: Arc<HannWindow>,
        rng: SmallRng,
    ) -> Self {
        let mut cloud = Self {
            grains: Vec::new(),
            active: Vec::new(),
            density: 0.0,
            grain_duration: 0.0,
            cloud_duration: 0.0,
            cloud_duration_samples: 0,
            min_midi: 0.0,
            max_midi: 0.0,
            min_frequency: 0.0,
            max_frequency: 0.0,
            waveform,
            envelope,
            schedule_cursor: 0,
            sample_cursor: 0,
            sample_rate,
            window,
            rng,
        };
        cloud.set_grains(density, midi_low, midi_high, grain_duration, cloud_duration);
        cloud
    }

    /// Scatter a fresh grain population within the window and band.
    ///
    /// The target count is `floor(density * cloud_duration / 1000)`. Each grain
    /// draws two independent uniform values: a frequency ratio, and an onset
    /// ratio rescaled into `[0, (cloud_duration - grain_duration) /
    /// cloud_duration]` so no grain's sound window runs past the cloud boundary.
    /// The population is sorted ascending by onset ratio afterwards.
    ///
    /// Allocates: only call while playback is paused.
    pub fn set_grains(
        &mut self,
        density: f32,
        midi_low: f32,
        midi_high: f32,
        grain_duration: f32,
        cloud_duration: f32,
    ) {
        self.density = density.max(0.0);
        self.min_midi = midi_low;
        self.max_midi = midi_high;
        self.min_frequency = midi_to_hz(midi_low);
        self.max_frequency = midi_to_hz(midi_high);
        self.grain_duration = grain_duration;
        self.cloud_duration = cloud_duration;
        self.cloud_duration_samples = ms_to_samples(cloud_duration, self.sample_rate);
        self.schedule_cursor = 0;
        self.sample_cursor = 0;

        let target = self.target_grain_count();
        let max_onset_ratio = self.max_onset_ratio();

        self.grains.clear();
        self.grains.reserve(target);
        for _ in 0..target {
            let frequency_ratio = self.rng.random::<f32>();
            let onset_ratio = self.rng.random::<f32>() * max_onset_ratio;
            let grain = self.new_grain(onset_ratio, frequency_ratio);
            self.grains.push(grain);
        }
        self.grains
            .sort_unstable_by(|a, b| a.onset_ratio().total_cmp(&b.onset_ratio()));

        // the hot path pushes into this without allocating
        self.active.clear();
        self.active.reserve(self.grains.len());
    }

    /// Compute and return one mixed output sample (the asynchronous core).
    ///
    /// Activates every grain whose onset sample has been reached, drains the
    /// active set, and returns the arithmetic mean over the grains that
    /// contributed, which keeps the output amplitude independent of how many
    /// grains overlap. Grains that report exhausted after the drain are dropped
    /// from the active set. The sample cursor then advances, clamped at the
    /// window end. Allocation-free and bounded-time.
    pub fn next_value(&mut self) -> f32 {
        // fire all grains whose onset time has passed, in chronological order
        while self.schedule_cursor < self.grains.len() {
            let onset_samples = (self.grains[self.schedule_cursor].onset_ratio()
                * self.cloud_duration_samples as f32) as u32;
            if onset_samples > self.sample_cursor {
                break;
            }
            self.active.push(self.schedule_cursor);
            self.schedule_cursor += 1;
        }

        let mut sum = 0.0;
        let mut count = 0u32;
        for &index in &self.active {
            let grain = &mut self.grains[index];
            if grain.has_next() {
                sum += grain.next_value();
                count += 1;
            }
        }
        if count > 0 {
            sum /= count as f32;
        }

        // drop grains that have been fully drained in this sample
        let grains = &self.grains;
        self.active.retain(|&index| grains[index].has_next());

        self.sample_cursor = (self.sample_cursor + 1).min(self.cloud_duration_samples);
        sum
    }

    /// True while the sample cursor is below the cloud's duration window.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.sample_cursor < self.cloud_duration_samples
    }

    /// Rewind for an identical replay of the current stochastic realization:
    /// clears the active set, rewinds both cursors and resets every grain.
    /// No new randomness is consumed.
    pub fn reset(&mut self) {
        self.active.clear();
        for grain in &mut self.grains {
            grain.reset();
        }
        self.schedule_cursor = 0;
        self.sample_cursor = 0;
    }

    /// Resize the cloud window to a new duration in milliseconds, keeping the
    /// density constant.
    ///
    /// A smaller target count drops grains from the sorted tail and clamps the
    /// scheduling cursor; a larger one appends grains with onset ratios drawn
    /// uniformly from (previous max onset, new max onset), which keeps the
    /// sequence sorted by construction, so only the appended suffix is sorted.
    /// Always finishes with a full [`Self::reset`].
    ///
    /// Allocates: only call while playback is paused.
    pub fn reset_cloud_duration(&mut self, duration: f32) {
        self.cloud_duration = duration;
        self.cloud_duration_samples = ms_to_samples(duration, self.sample_rate);
        self.sample_cursor = self.sample_cursor.min(self.cloud_duration_samples);

        let target = self.target_grain_count();
        if target < self.grains.len() {
            self.grains.truncate(target);
            if self.schedule_cursor > target {
                self.schedule_cursor = 0;
            }
        } else if target > self.grains.len() {
            let last_onset = self.grains.last().map_or(0.0, |grain| grain.onset_ratio());
            let onset_span = (self.max_onset_ratio() - last_onset).max(0.0);
            let first_new = self.grains.len();
            self.grains.reserve(target - first_new);
            for _ in first_new..target {
                let frequency_ratio = self.rng.random::<f32>();
                let onset_ratio = last_onset + onset_span * self.rng.random::<f32>();
                let grain = self.new_grain(onset_ratio, frequency_ratio);
                self.grains.push(grain);
            }
            // only the appended suffix needs sorting
            self.grains[first_new..]
                .sort_unstable_by(|a, b| a.onset_ratio().total_cmp(&b.onset_ratio()));
        }

        self.active.reserve(self.grains.len());
        self.reset();
    }

    /// Change the duration of every grain in milliseconds. Restarts all grains
    /// from position 0: only call while playback is paused.
    pub fn reset_grain_duration(&mut self, duration: f32) {
        self.grain_duration = duration;
        for grain in &mut self.grains {
            grain.reset_duration(duration);
        }
    }

    /// Retune the cloud into a new MIDI band. In-flight grains retune from their
    /// fixed frequency ratios without restarting.
    pub fn reset_frequency_band(&mut self, midi_low: f32, midi_high: f32) {
        self.min_midi = midi_low;
        self.max_midi = midi_high;
        self.min_frequency = midi_to_hz(midi_low);
        self.max_frequency = midi_to_hz(midi_high);
        for grain in &mut self.grains {
            grain.reset_frequency_band(self.min_frequency, self.max_frequency);
        }
    }

    /// Switch every grain's waveform shape. Applies to each grain's next sample.
    pub fn select_waveform(&mut self, kind: WaveformKind) {
        self.waveform = kind;
        for grain in &mut self.grains {
            grain.select_waveform(kind);
        }
    }

    /// Switch every grain's envelope policy. Applies to each grain's next sample.
    pub fn select_envelope(&mut self, kind: EnvelopeKind) {
        self.envelope = kind;
        for grain in &mut self.grains {
            grain.select_envelope(kind);
        }
    }

    /// Target grains per second.
    pub fn density(&self) -> f32 {
        self.density
    }

    /// Cloud window duration in milliseconds.
    pub fn cloud_duration(&self) -> f32 {
        self.cloud_duration
    }

    /// Cloud window duration in sample frames.
    pub fn cloud_duration_samples(&self) -> u32 {
        self.cloud_duration_samples
    }

    /// Grain duration in milliseconds.
    pub fn grain_duration(&self) -> f32 {
        self.grain_duration
    }

    /// The cloud's MIDI band bounds as (low, high).
    pub fn band(&self) -> (f32, f32) {
        (self.min_midi, self.max_midi)
    }

    /// The sorted grain population, e.g. for external visualizers.
    pub fn grains(&self) -> &[Grain] {
        &self.grains
    }

    fn new_grain(&self, onset_ratio: f32, frequency_ratio: f32) -> Grain {
        Grain::new(
            onset_ratio,
            self.min_frequency,
            self.max_frequency,
            frequency_ratio,
            self.grain_duration,
            self.waveform,
            self.envelope,
            self.sample_rate,
            Arc::clone(&self.window),
        )
    }

    /// `floor(density * duration / 1000)`, floored at zero: degenerate densities
    /// degrade to an empty, silent cloud rather than an invalid collection.
    fn target_grain_count(&self) -> usize {
        (self.density * (self.cloud_duration / 1000.0)).max(0.0) as usize
    }

    /// Largest onset ratio that keeps a whole grain inside the window.
    fn max_onset_ratio(&self) -> f32 {
        if self.cloud_duration <= 0.0 {
            return 0.0;
        }
        ((self.cloud_duration - self.grain_duration) / self.cloud_duration).max(0.0)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn new_cloud(density: f32, cloud_duration: f32, seed: u64) -> Cloud {
        Cloud::new(
            density,
            60.0,
            72.0,
            20.0,
            cloud_duration,
            WaveformKind::Sine,
            EnvelopeKind::LinearAdsr,
            44100,
            Arc::new(HannWindow::default()),
            SmallRng::seed_from_u64(seed),
        )
    }

    #[test]
    fn test_target_grain_count() {
        let cloud = new_cloud(50.0, 200.0, 1);
        assert_eq!(cloud.grains().len(), 10);
        assert_eq!(cloud.cloud_duration_samples(), 8820);
    }

    #[test]
    fn test_degenerate_density() {
        let cloud = new_cloud(0.0, 200.0, 1);
        assert!(cloud.grains().is_empty());
        let cloud = new_cloud(-10.0, 200.0, 1);
        assert!(cloud.grains().is_empty());
    }

    #[test]
    fn test_onset_bounds_and_sort_order() {
        let cloud = new_cloud(100.0, 300.0, 2);
        let max_onset = (300.0 - 20.0) / 300.0;
        let mut previous = 0.0f32;
        for grain in cloud.grains() {
            assert!(grain.onset_ratio() >= 0.0);
            assert!(grain.onset_ratio() <= max_onset);
            assert!(grain.onset_ratio() >= previous);
            previous = grain.onset_ratio();
        }
    }

    #[test]
    fn test_replay_determinism() {
        let mut cloud = new_cloud(50.0, 200.0, 3);
        let samples = cloud.cloud_duration_samples();
        let first: Vec<f32> = (0..samples).map(|_| cloud.next_value()).collect();
        assert!(!cloud.has_next());
        cloud.reset();
        let second: Vec<f32> = (0..samples).map(|_| cloud.next_value()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalization_bound() {
        for envelope in [EnvelopeKind::LinearAdsr, EnvelopeKind::HannWindow] {
            let mut cloud = new_cloud(100.0, 200.0, 4);
            cloud.select_envelope(envelope);
            for _ in 0..cloud.cloud_duration_samples() {
                let value = cloud.next_value();
                assert!(value.abs() <= 1.0, "unnormalized sample: {value}");
            }
        }
    }

    #[test]
    fn test_resize_round_trip() {
        let mut cloud = new_cloud(50.0, 200.0, 5);
        assert_eq!(cloud.grains().len(), 10);

        cloud.reset_cloud_duration(400.0);
        assert_eq!(cloud.grains().len(), 20);
        assert_eq!(cloud.cloud_duration_samples(), 17640);

        cloud.reset_cloud_duration(200.0);
        assert_eq!(cloud.grains().len(), 10);
        assert_eq!(cloud.cloud_duration_samples(), 8820);
    }

    #[test]
    fn test_resize_keeps_sort_order() {
        let mut cloud = new_cloud(50.0, 100.0, 6);
        cloud.reset_cloud_duration(500.0);
        let mut previous = 0.0f32;
        for grain in cloud.grains() {
            assert!(grain.onset_ratio() >= previous);
            previous = grain.onset_ratio();
        }
    }

    #[test]
    fn test_reset_after_resize() {
        let mut cloud = new_cloud(50.0, 200.0, 7);
        for _ in 0..1000 {
            let _ = cloud.next_value();
        }
        cloud.reset_cloud_duration(300.0);
        // resize always finishes with a full rewind
        assert!(cloud.has_next());
        for grain in cloud.grains() {
            assert_eq!(grain.position(), 0);
        }
    }

    #[test]
    fn test_band_retune_mid_playback() {
        let mut cloud = new_cloud(50.0, 200.0, 8);
        for _ in 0..1000 {
            let _ = cloud.next_value();
        }
        cloud.reset_frequency_band(80.0, 90.0);
        let (low, high) = cloud.band();
        assert_eq!((low, high), (80.0, 90.0));
        let min_hz = midi_to_hz(80.0);
        let max_hz = midi_to_hz(90.0);
        for grain in cloud.grains() {
            assert!(grain.frequency() >= min_hz && grain.frequency() <= max_hz);
        }
    }

    #[test]
    fn test_cursor_clamps_at_window_end() {
        let mut cloud = new_cloud(10.0, 100.0, 9);
        let samples = cloud.cloud_duration_samples();
        for _ in 0..samples + 100 {
            let _ = cloud.next_value();
        }
        assert!(!cloud.has_next());
    }
}
