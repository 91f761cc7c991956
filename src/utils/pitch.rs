//! MIDI note number to frequency conversions.

/// Convert a (fractional) MIDI note number to a frequency in Hz.
///
/// Uses the standard equal tempered mapping with A4 = note 69 = 440 Hz.
#[inline]
pub fn midi_to_hz(note: f32) -> f32 {
    440.0 * ((note - 69.0) / 12.0).exp2()
}

/// Convert a frequency in Hz to a (fractional) MIDI note number.
#[inline]
pub fn hz_to_midi(frequency: f32) -> f32 {
    debug_assert!(frequency > 0.0, "Invalid frequency");
    69.0 + 12.0 * (frequency / 440.0).log2()
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pitches() {
        assert!((midi_to_hz(69.0) - 440.0).abs() < 1e-3);
        assert!((midi_to_hz(81.0) - 880.0).abs() < 1e-3);
        assert!((midi_to_hz(57.0) - 220.0).abs() < 1e-3);
        // middle C
        assert!((midi_to_hz(60.0) - 261.626).abs() < 1e-2);
    }

    #[test]
    fn test_round_trip() {
        for note in [0.0f32, 12.5, 60.0, 69.0, 100.0, 127.0] {
            let converted = hz_to_midi(midi_to_hz(note));
            assert!((converted - note).abs() < 1e-3);
        }
    }
}
