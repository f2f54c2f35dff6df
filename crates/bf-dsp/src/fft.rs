//! Real-FFT plans for one block shape
//!
//! Overlap-save partitioned convolution transforms length-2N frames whose
//! second half is zero (filters) or whose first half is history (input).
//! [`BlockFft`] bundles the forward and inverse plans for that one shape,
//! together with the scratch buffers the transforms need, so the streaming
//! path never allocates.

use std::sync::Arc;

use bf_core::Sample;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::{DspError, DspResult};

/// Paired forward/inverse real-FFT plans of length `2 * block_size`.
pub struct BlockFft {
    block_size: usize,
    r2c: Arc<dyn RealToComplex<Sample>>,
    c2r: Arc<dyn ComplexToReal<Sample>>,
    r2c_scratch: Vec<Complex<Sample>>,
    c2r_scratch: Vec<Complex<Sample>>,
}

impl BlockFft {
    pub fn new(block_size: usize) -> Self {
        let fft_size = block_size * 2;
        let mut planner = RealFftPlanner::<Sample>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let c2r = planner.plan_fft_inverse(fft_size);
        let r2c_scratch = r2c.make_scratch_vec();
        let c2r_scratch = c2r.make_scratch_vec();

        Self {
            block_size,
            r2c,
            c2r,
            r2c_scratch,
            c2r_scratch,
        }
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.block_size * 2
    }

    /// Number of non-redundant spectrum bins (`block_size + 1`).
    #[inline]
    pub fn bins(&self) -> usize {
        self.block_size + 1
    }

    /// Forward transform of one length-2N frame into N+1 bins.
    ///
    /// The input frame is used as FFT workspace and comes back scrambled.
    pub fn forward(
        &mut self,
        frame: &mut [Sample],
        spectrum: &mut [Complex<Sample>],
    ) -> DspResult<()> {
        self.r2c
            .process_with_scratch(frame, spectrum, &mut self.r2c_scratch)
            .map_err(|e| DspError::Fft(e.to_string()))
    }

    /// Inverse transform, normalized so that forward-then-inverse is the
    /// identity. The spectrum is used as workspace and comes back scrambled.
    pub fn inverse(
        &mut self,
        spectrum: &mut [Complex<Sample>],
        frame: &mut [Sample],
    ) -> DspResult<()> {
        // realfft requires purely real DC and Nyquist bins; accumulated
        // float error can leave a stray imaginary part there.
        spectrum[0].im = 0.0;
        if let Some(last) = spectrum.last_mut() {
            last.im = 0.0;
        }

        self.c2r
            .process_with_scratch(spectrum, frame, &mut self.c2r_scratch)
            .map_err(|e| DspError::Fft(e.to_string()))?;

        let scale = 1.0 / (self.block_size * 2) as Sample;
        for sample in frame.iter_mut() {
            *sample *= scale;
        }
        Ok(())
    }
}
