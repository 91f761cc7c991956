//! Waveform oscillator for a single grain.

use std::sync::LazyLock;

// -------------------------------------------------------------------------------------------------

/// Waveform shape produced by a grain's [`Oscillator`].
///
/// None of the shapes are band-limited: aliasing at high frequencies is accepted
/// as part of the raw grain texture.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, strum::EnumString, strum::Display, strum::VariantNames,
)]
#[repr(u8)]
pub enum WaveformKind {
    /// Pure tone, read from a shared lookup table with linear interpolation.
    Sine,
    /// Rising ramp from -1 to 1.
    Saw,
    /// Linear rise and fall between -1 and 1.
    Triangle,
    /// Hard-switched between 1 and -1 at half phase.
    Square,
    /// A single unit sample per period, zero otherwise.
    Impulse,
}

// -------------------------------------------------------------------------------------------------

/// Precomputed sine lookup table.
/// `N` must be a pow2 value.
struct SineTable<const N: usize> {
    lut: [f32; N],
}

impl<const N: usize> SineTable<N> {
    const _VERIFY_N: () = assert!(N.is_power_of_two(), "Sine table size must be a pow2 value");
    const MASK: usize = N - 1;

    fn new() -> Self {
        let mut lut = [0.0; N];
        #[allow(clippy::needless_range_loop)]
        for i in 0..N {
            let phase = i as f32 / N as f32; // [0.0, 1.0)
            lut[i] = (phase * std::f32::consts::TAU).sin();
        }
        Self { lut }
    }

    /// Evaluate the table at a normalized phase [0.0, 1.0).
    /// Uses linear interpolation for smooth lookup between LUT samples.
    #[inline]
    fn sample(&self, phase: f32) -> f32 {
        debug_assert!((0.0..1.0).contains(&phase));

        let index_float = phase * N as f32;
        let index = (index_float as usize) & Self::MASK;
        let fraction = index_float.fract();
        let next_index = (index + 1) & Self::MASK;

        self.lut[index] * (1.0 - fraction) + self.lut[next_index] * fraction
    }
}

/// Static, shared lookup table for sine grains.
static SINE_LUT: LazyLock<SineTable<4096>> = LazyLock::new(SineTable::new);

// -------------------------------------------------------------------------------------------------

/// Single phase-accumulator oscillator.
///
/// All waveform shapes read the same running phase, so switching the shape on a
/// live oscillator neither resets the phase nor forces silence: the new shape
/// applies to the very next sample. Frequency changes likewise take effect on
/// the next sample.
#[derive(Debug, Clone)]
pub struct Oscillator {
    kind: WaveformKind,
    frequency: f32,
    phase: f32,
    increment: f32,
    sample_rate: u32,
}

impl Oscillator {
    /// Create an oscillator with the given shape and frequency in Hz.
    pub fn new(kind: WaveformKind, frequency: f32, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0, "Invalid sample rate");
        let mut oscillator = Self {
            kind,
            frequency: 0.0,
            phase: 0.0,
            increment: 0.0,
            sample_rate,
        };
        oscillator.set_frequency(frequency);
        oscillator
    }

    /// Currently selected waveform shape.
    pub fn kind(&self) -> WaveformKind {
        self.kind
    }

    /// Switch the waveform shape. Takes effect on the next sample.
    pub fn set_kind(&mut self, kind: WaveformKind) {
        self.kind = kind;
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set a new frequency in Hz. Takes effect on the next sample.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.increment = frequency / self.sample_rate as f32;
    }

    /// Rewind the phase accumulator, so the next cycle replays identically.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Compute and return one output sample, advancing the phase.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let phase = self.phase;
        self.phase += self.increment;
        self.phase -= self.phase.floor();

        match self.kind {
            WaveformKind::Sine => SINE_LUT.sample(phase),
            WaveformKind::Saw => 2.0 * phase - 1.0,
            WaveformKind::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
            WaveformKind::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            // fires on the first sample of every period
            WaveformKind::Impulse => {
                if phase < self.increment {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
