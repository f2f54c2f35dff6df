//! Sample type definitions

/// Type alias for audio samples (f32 end to end, matching the wire format
/// and the single-precision spectra used by the convolution core)
pub type Sample = f32;

/// Largest absolute value in a block, for clipping diagnostics.
#[inline]
pub fn peak(samples: &[Sample]) -> Sample {
    samples.iter().fold(0.0, |acc, s| acc.max(s.abs()))
}
