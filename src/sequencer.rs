//! Drives 24 clouds per calendar day in lockstep and mixes their output.

use std::sync::Arc;

use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    cloud::Cloud,
    grain::{envelope::EnvelopeKind, oscillator::WaveformKind},
    parameters::{
        FrequencyBand, SequencerParameters, CLOUD_DURATION_RANGE, GRAIN_DURATION_RANGE,
        HOURS_PER_DAY,
    },
    utils::{ms_to_samples, window::HannWindow},
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Hourly usage durations of one calendar day, in minutes per hour.
pub type UsageDay = [f32; HOURS_PER_DAY];

/// Grains per second produced by one hour of full (60 minutes) usage.
const DENSITY_PER_FULL_HOUR: f32 = 100.0;

/// Map hourly usage minutes to a whole grain density in grains per second:
/// 30 minutes of usage yield a density of 50 grains per second.
fn usage_to_density(minutes: f32) -> f32 {
    (minutes.max(0.0) * DENSITY_PER_FULL_HOUR / 60.0).floor()
}

// -------------------------------------------------------------------------------------------------

/// One calendar day: 24 clouds, one per hour band.
struct Day {
    clouds: Vec<Cloud>,
}

// -------------------------------------------------------------------------------------------------

/// The day sequencer: owns all days' clouds, advances the current day's 24
/// clouds in lockstep per output sample, and fans live parameter edits out to
/// every cloud.
///
/// Parameter edits are applied atomically to the matching cloud(s) of every day
/// at the moment the setter is called, so all days converge deterministically.
/// The structural setters ([`Self::set_cloud_duration`],
/// [`Self::set_grain_duration`]) reallocate grain populations and are safe to
/// call only while playback is paused; the remaining setters are cheap
/// broadcasts and may be applied between samples.
pub struct DaySequencer {
    days: Vec<Day>,
    parameters: SequencerParameters,
    muted: [bool; HOURS_PER_DAY],
    elapsed_day: usize,
    /// Playhead position in samples within the active cloud-duration window.
    position: u32,
}

impl DaySequencer {
    /// Create a sequencer from a per-day, per-hour usage table.
    ///
    /// Each hour's grain density derives from its usage minutes via
    /// [`usage_to_density`]; the shared window table is handed to every grain
    /// envelope. An empty table yields a sequencer with zero days which
    /// produces silence instead of failing.
    pub fn new(
        usage: &[UsageDay],
        parameters: SequencerParameters,
        window: Arc<HannWindow>,
    ) -> Result<Self, Error> {
        Self::with_rng(usage, parameters, window, SmallRng::from_os_rng())
    }

    /// Same as [`Self::new`], with an explicit RNG for reproducible scatter.
    pub fn with_rng(
        usage: &[UsageDay],
        parameters: SequencerParameters,
        window: Arc<HannWindow>,
        mut rng: SmallRng,
    ) -> Result<Self, Error> {
        parameters.validate()?;
        if usage.is_empty() {
            log::warn!("Empty usage table: the sequencer will stay idle");
        }

        let mut days = Vec::with_capacity(usage.len());
        for day_usage in usage {
            let mut clouds = Vec::with_capacity(HOURS_PER_DAY);
            for (hour, minutes) in day_usage.iter().enumerate() {
                let band = parameters.bands[hour];
                clouds.push(Cloud::new(
                    usage_to_density(*minutes),
                    band.low,
                    band.high,
                    parameters.grain_duration,
                    parameters.cloud_duration,
                    parameters.waveform,
                    parameters.envelope,
                    parameters.sample_rate,
                    Arc::clone(&window),
                    SmallRng::from_rng(&mut rng),
                ));
            }
            days.push(Day { clouds });
        }

        Ok(Self {
            days,
            parameters,
            muted: [false; HOURS_PER_DAY],
            elapsed_day: 0,
            position: 0,
        })
    }

    /// Compute and return one mixed output sample for the current day.
    ///
    /// All 24 clouds advance in lockstep; muted hours are gated to zero but
    /// still advanced. The sum is always divided by 24, independent of how many
    /// hours are muted or silent. A cloud that finished its window is reset
    /// immediately, re-arming its pattern for the next day cycle covering that
    /// hour. When all 24 clouds finish in the same sample the day is complete:
    /// the elapsed-day index advances, wrapping at the day count for continuous
    /// looped playback over the whole dataset.
    pub fn next_value(&mut self) -> f32 {
        let Some(day) = self.days.get_mut(self.elapsed_day) else {
            return 0.0;
        };

        let mut sum = 0.0;
        let mut day_done = true;
        for (hour, cloud) in day.clouds.iter_mut().enumerate() {
            let value = cloud.next_value();
            if !self.muted[hour] {
                sum += value;
            }
            let has_next = cloud.has_next();
            if !has_next {
                cloud.reset();
            }
            day_done &= !has_next;
        }

        self.position += 1;
        if day_done {
            log::debug!("day {} done", self.elapsed_day);
            self.elapsed_day = (self.elapsed_day + 1) % self.days.len();
            self.position = 0;
        }

        sum / HOURS_PER_DAY as f32
    }

    /// Stop playback synchronously: reset every cloud and rewind the playhead
    /// and the elapsed-day index.
    pub fn stop(&mut self) {
        for cloud in self.clouds_mut() {
            cloud.reset();
        }
        self.elapsed_day = 0;
        self.position = 0;
    }

    /// Ratio of the playhead within the active cloud-duration window, in 0.0..=1.0.
    pub fn playhead_ratio(&self) -> f32 {
        let duration_samples =
            ms_to_samples(self.parameters.cloud_duration, self.parameters.sample_rate);
        if duration_samples == 0 {
            return 0.0;
        }
        (self.position as f32 / duration_samples as f32).min(1.0)
    }

    /// Index of the day currently playing.
    pub fn elapsed_day(&self) -> usize {
        self.elapsed_day
    }

    /// Number of days built from the usage table.
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Currently applied parameters.
    pub fn parameters(&self) -> &SequencerParameters {
        &self.parameters
    }

    /// The 24 clouds of the given day, e.g. for external visualizers.
    pub fn day_clouds(&self, day: usize) -> Option<&[Cloud]> {
        self.days.get(day).map(|day| day.clouds.as_slice())
    }

    /// Per-hour mute flags.
    pub fn muted(&self) -> &[bool; HOURS_PER_DAY] {
        &self.muted
    }

    /// Mute or unmute one hour band. Muted hours keep advancing but are gated
    /// to zero in the mix.
    pub fn set_muted(&mut self, hour: usize, muted: bool) -> Result<(), Error> {
        if hour >= HOURS_PER_DAY {
            return Err(Error::HourIndexError(hour));
        }
        self.muted[hour] = muted;
        Ok(())
    }

    /// Solo one hour band: mutes every other hour.
    pub fn solo(&mut self, hour: usize) -> Result<(), Error> {
        if hour >= HOURS_PER_DAY {
            return Err(Error::HourIndexError(hour));
        }
        for (index, muted) in self.muted.iter_mut().enumerate() {
            *muted = index != hour;
        }
        Ok(())
    }

    /// Clear all mute flags.
    pub fn clear_mutes(&mut self) {
        self.muted = [false; HOURS_PER_DAY];
    }

    /// Set a new cloud window duration in milliseconds, resizing every cloud's
    /// grain population at constant density and rewinding the playhead.
    /// Allocates: only call while playback is paused.
    pub fn set_cloud_duration(&mut self, duration: f32) -> Result<(), Error> {
        if !CLOUD_DURATION_RANGE.contains(&duration) {
            return Err(Error::ParameterError(format!(
                "Cloud duration must be between {:?} ms, but is: {}",
                CLOUD_DURATION_RANGE, duration
            )));
        }
        self.parameters.cloud_duration = duration;
        for cloud in self.clouds_mut() {
            cloud.reset_cloud_duration(duration);
        }
        // all cloud cursors rewound above, keep the playhead in sync
        self.position = 0;
        Ok(())
    }

    /// Set a new grain duration in milliseconds, restarting every grain.
    /// Only call while playback is paused.
    pub fn set_grain_duration(&mut self, duration: f32) -> Result<(), Error> {
        if !GRAIN_DURATION_RANGE.contains(&duration) {
            return Err(Error::ParameterError(format!(
                "Grain duration must be between {:?} ms, but is: {}",
                GRAIN_DURATION_RANGE, duration
            )));
        }
        self.parameters.grain_duration = duration;
        for cloud in self.clouds_mut() {
            cloud.reset_grain_duration(duration);
        }
        Ok(())
    }

    /// Retune one hour's frequency band across all days. In-flight grains
    /// retune without restarting.
    pub fn set_frequency_band(&mut self, hour: usize, band: FrequencyBand) -> Result<(), Error> {
        if hour >= HOURS_PER_DAY {
            return Err(Error::HourIndexError(hour));
        }
        band.validate()?;
        self.parameters.bands[hour] = band;
        for day in &mut self.days {
            day.clouds[hour].reset_frequency_band(band.low, band.high);
        }
        Ok(())
    }

    /// Switch the waveform shape of every grain. Applies on the next sample.
    pub fn set_waveform(&mut self, kind: WaveformKind) {
        self.parameters.waveform = kind;
        for cloud in self.clouds_mut() {
            cloud.select_waveform(kind);
        }
    }

    /// Switch the envelope policy of every grain. Applies on the next sample.
    pub fn set_envelope(&mut self, kind: EnvelopeKind) {
        self.parameters.envelope = kind;
        for cloud in self.clouds_mut() {
            cloud.select_envelope(kind);
        }
    }

    fn clouds_mut(&mut self) -> impl Iterator<Item = &mut Cloud> + '_ {
        self.days.iter_mut().flat_map(|day| day.clouds.iter_mut())
    }
}

// -------------------------------------------------------------------------------------------------
