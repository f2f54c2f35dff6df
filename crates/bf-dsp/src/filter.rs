//! Partitioned impulse responses
//!
//! A stereo impulse response is partitioned into equal blocks and
//! transformed to the frequency domain once, at load time. The two-state
//! lifetime is expressed with two types: [`IrFilter`] holds the transient
//! time-domain partitions, and `prepare` consumes it into an immutable
//! frequency-domain [`Filter`] — the only form the streaming path ever sees.

use bf_core::Sample;
use rustfft::num_complex::Complex;

use crate::{BlockFft, DspError, DspResult};

/// Time-domain impulse response, partitioned into blocks per ear.
pub struct IrFilter {
    block_size: usize,
    blocks: usize,
    left: Vec<Sample>,
    right: Vec<Sample>,
}

impl IrFilter {
    /// Partition interleaved stereo samples into `ceil(frames / block_size)`
    /// blocks per ear, zero-padding the tail block.
    pub fn from_interleaved(samples: &[Sample], block_size: usize) -> DspResult<Self> {
        if samples.is_empty() {
            return Err(DspError::EmptyImpulseResponse);
        }
        if samples.len() % 2 != 0 {
            return Err(DspError::OddSampleCount(samples.len()));
        }

        let frames = samples.len() / 2;
        let blocks = frames.div_ceil(block_size);
        let mut left = vec![0.0; blocks * block_size];
        let mut right = vec![0.0; blocks * block_size];

        for (i, frame) in samples.chunks_exact(2).enumerate() {
            left[i] = frame[0];
            right[i] = frame[1];
        }

        Ok(Self {
            block_size,
            blocks,
            left,
            right,
        })
    }

    #[inline]
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Transform every partition to the frequency domain, releasing the
    /// time-domain storage.
    ///
    /// Each block becomes the real FFT of a length-2N frame whose first half
    /// is the N time-domain samples and whose second half is zero — the
    /// standard overlap-save partitioned layout.
    pub fn prepare(self, fft: &mut BlockFft) -> DspResult<Filter> {
        debug_assert_eq!(fft.block_size(), self.block_size);

        let n = self.block_size;
        let bins = n + 1;
        let mut left = vec![Complex::new(0.0, 0.0); self.blocks * bins];
        let mut right = vec![Complex::new(0.0, 0.0); self.blocks * bins];
        let mut frame = vec![0.0; n * 2];

        for b in 0..self.blocks {
            frame[..n].copy_from_slice(&self.left[b * n..(b + 1) * n]);
            frame[n..].fill(0.0);
            fft.forward(&mut frame, &mut left[b * bins..(b + 1) * bins])?;

            frame[..n].copy_from_slice(&self.right[b * n..(b + 1) * n]);
            frame[n..].fill(0.0);
            fft.forward(&mut frame, &mut right[b * bins..(b + 1) * bins])?;
        }

        Ok(Filter {
            block_size: n,
            blocks: self.blocks,
            left,
            right,
        })
    }
}

/// Frequency-domain partitioned filter. Immutable once prepared.
///
/// Spectra are stored flat with row stride `block_size + 1`: row `b` holds
/// the N+1 bins of partition `b`.
#[derive(Debug, Clone)]
pub struct Filter {
    block_size: usize,
    blocks: usize,
    left: Vec<Complex<Sample>>,
    right: Vec<Complex<Sample>>,
}

impl Filter {
    /// All-zero filter covering `frames` samples — convolving with it yields
    /// silence. Used as the lookup-miss default; the FFT of zeros is zeros,
    /// so no transform is needed.
    pub fn zeros(frames: usize, block_size: usize) -> Self {
        let blocks = frames.max(1).div_ceil(block_size);
        let bins = block_size + 1;
        Self {
            block_size,
            blocks,
            left: vec![Complex::new(0.0, 0.0); blocks * bins],
            right: vec![Complex::new(0.0, 0.0); blocks * bins],
        }
    }

    #[inline]
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub fn bins(&self) -> usize {
        self.block_size + 1
    }

    /// The flat per-ear spectra, shape `[blocks, bins]`.
    #[inline]
    pub fn spectra(&self) -> (&[Complex<Sample>], &[Complex<Sample>]) {
        (&self.left, &self.right)
    }

    /// One partition row of the left-ear spectrum.
    #[inline]
    pub fn left_block(&self, block: usize) -> &[Complex<Sample>] {
        let bins = self.bins();
        &self.left[block * bins..(block + 1) * bins]
    }

    /// One partition row of the right-ear spectrum.
    #[inline]
    pub fn right_block(&self, block: usize) -> &[Complex<Sample>] {
        let bins = self.bins();
        &self.right[block * bins..(block + 1) * bins]
    }
}
