#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod cloud;
mod error;
mod grain;
mod parameters;
mod sequencer;

// public, flat re-exports
pub use error::Error;

pub use cloud::Cloud;

pub use grain::{
    envelope::{EnvelopeKind, EnvelopeStage, GrainEnvelope},
    oscillator::{Oscillator, WaveformKind},
    Grain,
};

pub use parameters::{
    default_bands, FrequencyBand, SequencerParameters, CLOUD_DURATION_RANGE, GRAIN_DURATION_RANGE,
    HOURS_PER_DAY,
};

pub use sequencer::{DaySequencer, UsageDay};

// public mods
pub mod utils;
