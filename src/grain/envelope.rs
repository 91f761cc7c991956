//! Amplitude envelope for a single grain.

use std::sync::Arc;

use crate::utils::window::HannWindow;

// -------------------------------------------------------------------------------------------------

/// Amplitude shaping policy of a [`GrainEnvelope`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, strum::EnumString, strum::Display, strum::VariantNames,
)]
#[repr(u8)]
pub enum EnvelopeKind {
    /// Two-segment linear ramp: attack 0 -> 1 over the first half of the grain,
    /// decay 1 -> 0 over the second half.
    LinearAdsr,
    /// Raised-cosine bell, read from a shared [`HannWindow`] table.
    HannWindow,
}

// -------------------------------------------------------------------------------------------------

/// Current processing stage in a [`GrainEnvelope`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    #[default]
    Attack,
    Decay,
    /// Terminal until the next reset.
    Done,
}

// -------------------------------------------------------------------------------------------------

/// Per-grain amplitude envelope.
///
/// Both policies are driven by the same per-sample position counter, so the kind
/// can be switched on a live grain at any position: the new policy is evaluated
/// from the grain's current position with no cross-fade. The Hann policy is a pure
/// function of position and ignores the stage machine, but still advances it, which
/// keeps a later switch back to the ramp policy consistent.
#[derive(Clone)]
pub struct GrainEnvelope {
    kind: EnvelopeKind,
    stage: EnvelopeStage,
    window: Arc<HannWindow>,
}

impl GrainEnvelope {
    /// Create a new envelope in Attack stage, sharing the given window table.
    pub fn new(kind: EnvelopeKind, window: Arc<HannWindow>) -> Self {
        Self {
            kind,
            stage: EnvelopeStage::Attack,
            window,
        }
    }

    /// Return the envelope's current stage.
    #[inline(always)]
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Currently selected shaping policy.
    pub fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    /// Switch the shaping policy. Applies from the grain's current position.
    pub fn set_kind(&mut self, kind: EnvelopeKind) {
        self.kind = kind;
    }

    /// Rewind the stage machine to Attack.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Attack;
    }

    /// Advance the stage machine for the given elapsed `position` and return the
    /// amplitude multiplier at that position of a `duration_samples` long grain.
    ///
    /// Stage transitions are driven strictly by the elapsed sample count.
    #[inline]
    pub fn next_level(&mut self, position: u32, duration_samples: u32) -> f32 {
        let half = duration_samples / 2;
        match self.stage {
            EnvelopeStage::Attack if position >= half => self.stage = EnvelopeStage::Decay,
            _ => {}
        }
        if self.stage == EnvelopeStage::Decay && position >= duration_samples {
            self.stage = EnvelopeStage::Done;
        }

        match self.kind {
            EnvelopeKind::LinearAdsr => match self.stage {
                EnvelopeStage::Attack => position as f32 / half as f32,
                EnvelopeStage::Decay => {
                    let fall = (position - half) as f32 / (duration_samples - half).max(1) as f32;
                    1.0 - fall
                }
                EnvelopeStage::Done => 0.0,
            },
            EnvelopeKind::HannWindow => self.window.amplitude_at(position, duration_samples),
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn new_envelope(kind: EnvelopeKind) -> GrainEnvelope {
        GrainEnvelope::new(kind, Arc::new(HannWindow::default()))
    }

    #[test]
    fn test_linear_ramp_shape() {
        let mut envelope = new_envelope(EnvelopeKind::LinearAdsr);
        let duration = 100;
        // rises linearly to 1.0 at half duration
        assert_eq!(envelope.next_level(0, duration), 0.0);
        assert!((envelope.next_level(25, duration) - 0.5).abs() < 1e-6);
        assert_eq!(envelope.stage(), EnvelopeStage::Attack);
        assert!((envelope.next_level(50, duration) - 1.0).abs() < 1e-6);
        assert_eq!(envelope.stage(), EnvelopeStage::Decay);
        // falls linearly back to 0.0
        assert!((envelope.next_level(75, duration) - 0.5).abs() < 1e-6);
        assert!(envelope.next_level(99, duration) > 0.0);
    }

    #[test]
    fn test_stage_machine_is_terminal() {
        let mut envelope = new_envelope(EnvelopeKind::LinearAdsr);
        let duration = 10;
        for position in 0..=duration {
            let _ = envelope.next_level(position, duration);
        }
        assert_eq!(envelope.stage(), EnvelopeStage::Done);
        assert_eq!(envelope.next_level(duration, duration), 0.0);
        envelope.reset();
        assert_eq!(envelope.stage(), EnvelopeStage::Attack);
    }

    #[test]
    fn test_hann_shape() {
        let mut envelope = new_envelope(EnvelopeKind::HannWindow);
        let duration = 1000;
        assert!(envelope.next_level(0, duration) < 1e-6);
        assert!((envelope.next_level(500, duration) - 1.0).abs() < 1e-4);
        assert!(envelope.next_level(999, duration) < 1e-2);
    }

    #[test]
    fn test_live_kind_switch() {
        let mut envelope = new_envelope(EnvelopeKind::LinearAdsr);
        let duration = 100;
        let _ = envelope.next_level(0, duration);
        // switch mid-grain: the new policy evaluates from the current position
        envelope.set_kind(EnvelopeKind::HannWindow);
        assert!((envelope.next_level(50, duration) - 1.0).abs() < 1e-3);
        // and back again, with the stage machine still in sync
        envelope.set_kind(EnvelopeKind::LinearAdsr);
        assert!((envelope.next_level(75, duration) - 0.5).abs() < 1e-6);
        assert_eq!(envelope.stage(), EnvelopeStage::Decay);
    }
}
