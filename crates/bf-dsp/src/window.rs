//! Crossfade window pair for filter swaps

use bf_core::Sample;

/// Cosine-squared fade pair applied over one block when the active filter
/// changes.
///
/// `fade_in` rises from 0 to 1, `fade_out` is its exact complement, so
/// `fade_in[n] + fade_out[n] == 1` for every sample and a crossfade between
/// two identical signals is the identity.
#[derive(Debug, Clone)]
pub struct CrossfadeWindow {
    fade_in: Vec<Sample>,
    fade_out: Vec<Sample>,
}

impl CrossfadeWindow {
    pub fn new(block_size: usize) -> Self {
        let denom = block_size.saturating_sub(1).max(1) as f64;
        let mut fade_in = Vec::with_capacity(block_size);
        let mut fade_out = Vec::with_capacity(block_size);

        for n in 0..block_size {
            let phase = n as f64 / denom * std::f64::consts::FRAC_PI_2;
            let rising = (phase.sin().powi(2)) as Sample;
            fade_in.push(rising);
            fade_out.push(1.0 - rising);
        }

        Self { fade_in, fade_out }
    }

    #[inline]
    pub fn fade_in(&self) -> &[Sample] {
        &self.fade_in
    }

    #[inline]
    pub fn fade_out(&self) -> &[Sample] {
        &self.fade_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_to_one_exact() {
        let window = CrossfadeWindow::new(256);
        for n in 0..256 {
            // fade_out is constructed as 1 - fade_in, so the equal-gain
            // identity holds exactly, not just within tolerance.
            assert_eq!(window.fade_in()[n] + window.fade_out()[n], 1.0);
        }
    }

    #[test]
    fn test_endpoints() {
        let window = CrossfadeWindow::new(128);
        assert_eq!(window.fade_in()[0], 0.0);
        assert!((window.fade_in()[127] - 1.0).abs() < 1e-6);
        assert_eq!(window.fade_out()[0], 1.0);
        assert!(window.fade_out()[127].abs() < 1e-6);
    }

    #[test]
    fn test_fade_in_is_monotonic() {
        let window = CrossfadeWindow::new(64);
        for pair in window.fade_in().windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }
}
