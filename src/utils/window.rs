//! Shared raised-cosine window table for grain amplitude envelopes.

use crate::Error;

// -------------------------------------------------------------------------------------------------

/// Default window table resolution. Fine enough for the longest grain durations.
pub const DEFAULT_WINDOW_SIZE: usize = 4096;

// -------------------------------------------------------------------------------------------------

/// A precomputed Hann (raised-cosine) window with a configurable resolution.
///
/// Built once at startup and then shared read-only across all grain envelopes via
/// [`Arc`](std::sync::Arc). Never mutated after construction.
pub struct HannWindow {
    table: Vec<f32>,
}

impl HannWindow {
    /// Precompute a Hann window table with `size` entries.
    pub fn new(size: usize) -> Result<Self, Error> {
        if size == 0 {
            return Err(Error::ParameterError(
                "Window size must be greater than zero".to_string(),
            ));
        }
        let mut table = vec![0.0; size];
        for (index, value) in table.iter_mut().enumerate() {
            let phase = index as f32 / size as f32;
            *value = 0.5 * (1.0 - (std::f32::consts::TAU * phase).cos());
        }
        Ok(Self { table })
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when the table holds no entries. Can't happen for constructed windows.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Window amplitude for a grain at sample `position` of `duration_samples`.
    ///
    /// Reads the entry at `floor(table_size * position / duration_samples)`, clamped
    /// into the table, so the lookup stays valid for positions at the very end of
    /// the grain.
    #[inline]
    pub fn amplitude_at(&self, position: u32, duration_samples: u32) -> f32 {
        if duration_samples == 0 {
            return 0.0;
        }
        let index = (self.table.len() as u64 * position as u64 / duration_samples as u64) as usize;
        self.table[index.min(self.table.len() - 1)]
    }
}

impl Default for HannWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE).expect("Default window size should be valid")
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_size() {
        assert!(HannWindow::new(0).is_err());
    }

    #[test]
    fn test_shape() -> Result<(), Error> {
        let window = HannWindow::new(1024)?;
        assert_eq!(window.len(), 1024);
        // raised cosine: zero at the edges, unity in the center
        assert!(window.amplitude_at(0, 1000) < 1e-6);
        assert!((window.amplitude_at(500, 1000) - 1.0).abs() < 1e-4);
        // symmetric around the center
        let rising = window.amplitude_at(250, 1000);
        let falling = window.amplitude_at(750, 1000);
        assert!((rising - falling).abs() < 1e-2);
        Ok(())
    }

    #[test]
    fn test_position_clamping() -> Result<(), Error> {
        let window = HannWindow::new(64)?;
        // positions at or past the end must not read out of bounds
        let _ = window.amplitude_at(1000, 1000);
        let _ = window.amplitude_at(2000, 1000);
        assert_eq!(window.amplitude_at(0, 0), 0.0);
        Ok(())
    }
}
