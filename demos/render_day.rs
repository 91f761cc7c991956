//! An example rendering a synthetic phone-usage table to a WAV file.

use std::sync::Arc;

use cumulus::{
    utils::window::HannWindow, DaySequencer, EnvelopeKind, SequencerParameters, UsageDay,
    WaveformKind, HOURS_PER_DAY,
};

// -------------------------------------------------------------------------------------------------

// Render parameter consts (tweak as needed!)

/// Path of the rendered output file
const OUTPUT_PATH: &str = "render_day.wav";

/// Number of seconds to render
const RENDER_SECONDS: u32 = 30;

/// Cloud window duration in ms (100 - 500)
const CLOUD_DURATION: f32 = 250.0;
/// Grain duration in ms (10 - 50)
const GRAIN_DURATION: f32 = 25.0;

const WAVEFORM: WaveformKind = WaveformKind::Sine;
const ENVELOPE: EnvelopeKind = EnvelopeKind::HannWindow;

// -------------------------------------------------------------------------------------------------

/// A synthetic week of usage: quiet nights, busy evenings.
fn synthetic_usage() -> Vec<UsageDay> {
    (0..7)
        .map(|day| {
            let mut hours = [0.0; HOURS_PER_DAY];
            for (hour, minutes) in hours.iter_mut().enumerate() {
                *minutes = match hour {
                    0..=6 => 0.0,
                    7..=16 => 10.0 + 2.0 * day as f32,
                    17..=22 => 35.0 + 3.0 * day as f32,
                    _ => 5.0,
                };
            }
            hours
        })
        .collect()
}

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init logger
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init()?;

    // Build the sequencer from the synthetic usage table
    let mut parameters = SequencerParameters::default();
    parameters.cloud_duration = CLOUD_DURATION;
    parameters.grain_duration = GRAIN_DURATION;
    parameters.waveform = WAVEFORM;
    parameters.envelope = ENVELOPE;
    let sample_rate = parameters.sample_rate;

    let usage = synthetic_usage();
    let window = Arc::new(HannWindow::default());
    let mut sequencer = DaySequencer::new(&usage, parameters, window)?;

    log::info!(
        "Rendering {} days of usage for {} seconds to '{}'",
        sequencer.day_count(),
        RENDER_SECONDS,
        OUTPUT_PATH
    );

    // Render to a 32 bit float mono WAV file
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(OUTPUT_PATH, spec)?;
    for _ in 0..RENDER_SECONDS * sample_rate {
        writer.write_sample(sequencer.next_value())?;
    }
    writer.finalize()?;

    log::info!("Done: stopped at day {}", sequencer.elapsed_day());
    Ok(())
}
