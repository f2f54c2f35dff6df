//! Uniform-partitioned overlap-save convolver with filter crossfade
//!
//! One instance renders one virtual source: each mono input block is
//! convolved against the active direction filter to produce one stereo
//! block. A stereo-input variant of the same engine serves headphone
//! compensation. Swapping filters optionally crossfades the output over a
//! single block with a cosine-squared window pair to mask discontinuities.
//!
//! The frequency-domain delay line is a ring addressed by a head index, so
//! feeding a block moves no spectra — partition `i` of the filter always
//! meets the input spectrum from `i` blocks ago at
//! `fdl[(head + i) % total_blocks]`.

use bf_core::Sample;
use rustfft::num_complex::Complex;

use crate::{BlockFft, CrossfadeWindow, DspError, DspResult, Filter};

pub struct Convolver {
    block_size: usize,
    bins: usize,
    early_blocks: usize,
    late_blocks: usize,
    total_blocks: usize,

    fft: BlockFft,
    window: CrossfadeWindow,

    /// Overlap-save input windows, length 2N. The right window is used only
    /// by the stereo-input path.
    input_left: Vec<Sample>,
    input_right: Vec<Sample>,

    /// Frequency-domain delay lines, flat `[total_blocks, bins]` rings.
    fdl_left: Vec<Complex<Sample>>,
    fdl_right: Vec<Complex<Sample>>,
    fdl_head: usize,

    /// Active combined filter (early rows + spliced late tail).
    tf_left: Vec<Complex<Sample>>,
    tf_right: Vec<Complex<Sample>>,

    /// Snapshot of the previous combined filter; meaningful only while a
    /// crossfade is pending.
    tf_left_prev: Vec<Complex<Sample>>,
    tf_right_prev: Vec<Complex<Sample>>,

    /// Sticky late-reverb tail, flat `[late_blocks, bins]`; spliced into the
    /// tail rows of `tf_*` on the next process after either piece changes.
    late_left: Vec<Complex<Sample>>,
    late_right: Vec<Complex<Sample>>,

    // Owned scratch so the streaming path never allocates.
    frame: Vec<Sample>,
    spectrum: Vec<Complex<Sample>>,
    acc: Vec<Complex<Sample>>,

    crossfade_pending: bool,
    rebuild_pending: bool,
    blocks_processed: u64,
}

impl Convolver {
    /// Create a convolver for impulse responses of `ir_size` samples, plus
    /// an optional late-reverb tail of `late_reverb_size` samples appended
    /// to the same partition array. All state starts at zero; until a filter
    /// is installed the output is silence.
    pub fn new(ir_size: usize, block_size: usize, late_reverb_size: usize) -> Self {
        let early_blocks = ir_size.max(1).div_ceil(block_size);
        let late_blocks = late_reverb_size.div_ceil(block_size);
        let total_blocks = early_blocks + late_blocks;
        let bins = block_size + 1;

        log::debug!(
            "Convolver: {early_blocks} early + {late_blocks} late partitions of {block_size} samples"
        );

        let zero = Complex::new(0.0, 0.0);
        Self {
            block_size,
            bins,
            early_blocks,
            late_blocks,
            total_blocks,
            fft: BlockFft::new(block_size),
            window: CrossfadeWindow::new(block_size),
            input_left: vec![0.0; block_size * 2],
            input_right: vec![0.0; block_size * 2],
            fdl_left: vec![zero; total_blocks * bins],
            fdl_right: vec![zero; total_blocks * bins],
            fdl_head: 0,
            tf_left: vec![zero; total_blocks * bins],
            tf_right: vec![zero; total_blocks * bins],
            tf_left_prev: vec![zero; total_blocks * bins],
            tf_right_prev: vec![zero; total_blocks * bins],
            late_left: vec![zero; late_blocks * bins],
            late_right: vec![zero; late_blocks * bins],
            frame: vec![0.0; block_size * 2],
            spectrum: vec![zero; bins],
            acc: vec![zero; bins],
            crossfade_pending: false,
            rebuild_pending: false,
            blocks_processed: 0,
        }
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub fn early_blocks(&self) -> usize {
        self.early_blocks
    }

    #[inline]
    pub fn late_blocks(&self) -> usize {
        self.late_blocks
    }

    #[inline]
    pub fn total_blocks(&self) -> usize {
        self.total_blocks
    }

    /// Number of blocks processed since construction or the last reset.
    #[inline]
    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed
    }

    /// Install a new direction filter into the early partition rows.
    ///
    /// Each bin is scaled by `attenuation` (unit when no distance model is
    /// in play) and, when a `directivity` filter is given, multiplied
    /// element-wise with its spectrum row by row; early rows beyond the
    /// directivity's partition count pass unscaled. With `crossfade` the
    /// outgoing combined filter is kept for one block and the next output
    /// mixes both renderings.
    pub fn set_filter(
        &mut self,
        filter: &Filter,
        crossfade: bool,
        attenuation: Sample,
        directivity: Option<&Filter>,
    ) -> DspResult<()> {
        self.check_filter(filter, self.early_blocks)?;
        if let Some(dir) = directivity {
            if dir.block_size() != self.block_size {
                return Err(DspError::BlockSizeMismatch {
                    expected: self.block_size,
                    actual: dir.block_size(),
                });
            }
        }

        self.snapshot_for_crossfade(crossfade);

        let bins = self.bins;
        let (left, right) = filter.spectra();

        for b in 0..self.early_blocks {
            let row = b * bins..(b + 1) * bins;
            let src_left = &left[row.clone()];
            let src_right = &right[row.clone()];

            match directivity {
                Some(dir) if b < dir.blocks() => {
                    for ((dst, src), d) in self.tf_left[row.clone()]
                        .iter_mut()
                        .zip(src_left)
                        .zip(dir.left_block(b))
                    {
                        *dst = *src * *d * attenuation;
                    }
                    for ((dst, src), d) in self.tf_right[row]
                        .iter_mut()
                        .zip(src_right)
                        .zip(dir.right_block(b))
                    {
                        *dst = *src * *d * attenuation;
                    }
                }
                _ => {
                    for (dst, src) in self.tf_left[row.clone()].iter_mut().zip(src_left) {
                        *dst = *src * attenuation;
                    }
                    for (dst, src) in self.tf_right[row].iter_mut().zip(src_right) {
                        *dst = *src * attenuation;
                    }
                }
            }
        }

        self.rebuild_pending = true;
        self.crossfade_pending = crossfade;
        Ok(())
    }

    /// Install a new late-reverb tail. The tail is sticky: it survives
    /// direction-filter swaps and is re-spliced into the combined filter on
    /// the next processed block.
    pub fn set_late_reverb(&mut self, filter: &Filter, crossfade: bool) -> DspResult<()> {
        self.check_filter(filter, self.late_blocks)?;

        self.snapshot_for_crossfade(crossfade);

        let (left, right) = filter.spectra();
        self.late_left.copy_from_slice(left);
        self.late_right.copy_from_slice(right);

        self.rebuild_pending = true;
        self.crossfade_pending = crossfade;
        Ok(())
    }

    /// Convolve one mono block into one stereo block. The same input
    /// spectrum feeds both ears.
    pub fn process(
        &mut self,
        input: &[Sample],
        out_left: &mut [Sample],
        out_right: &mut [Sample],
    ) -> DspResult<()> {
        self.check_block(input.len())?;
        self.check_block(out_left.len())?;
        self.check_block(out_right.len())?;

        if self.rebuild_pending {
            self.rebuild();
        }
        self.feed_mono(input)?;
        self.render(out_left, out_right)?;

        self.crossfade_pending = false;
        self.blocks_processed += 1;
        Ok(())
    }

    /// Convolve one stereo block (headphone-compensation variant): left and
    /// right inputs run through independent delay lines; otherwise identical
    /// to [`process`](Self::process).
    pub fn process_stereo(
        &mut self,
        in_left: &[Sample],
        in_right: &[Sample],
        out_left: &mut [Sample],
        out_right: &mut [Sample],
    ) -> DspResult<()> {
        self.check_block(in_left.len())?;
        self.check_block(in_right.len())?;
        self.check_block(out_left.len())?;
        self.check_block(out_right.len())?;

        if self.rebuild_pending {
            self.rebuild();
        }
        self.feed_stereo(in_left, in_right)?;
        self.render(out_left, out_right)?;

        self.crossfade_pending = false;
        self.blocks_processed += 1;
        Ok(())
    }

    /// Clear all signal state (delay lines, input windows, counters) while
    /// keeping the installed filters.
    pub fn reset(&mut self) {
        let zero = Complex::new(0.0, 0.0);
        self.input_left.fill(0.0);
        self.input_right.fill(0.0);
        self.fdl_left.fill(zero);
        self.fdl_right.fill(zero);
        self.fdl_head = 0;
        self.crossfade_pending = false;
        self.blocks_processed = 0;
    }

    /// Keep the outgoing combined filter for the crossfade render. Only the
    /// first arming snapshots — a direction swap followed by a late-reverb
    /// swap before the next block must preserve the true previous state.
    fn snapshot_for_crossfade(&mut self, crossfade: bool) {
        if crossfade && !self.crossfade_pending {
            self.tf_left_prev.copy_from_slice(&self.tf_left);
            self.tf_right_prev.copy_from_slice(&self.tf_right);
        }
    }

    /// Splice the late-reverb spectra into the tail rows of the combined
    /// filter.
    fn rebuild(&mut self) {
        let offset = self.early_blocks * self.bins;
        self.tf_left[offset..].copy_from_slice(&self.late_left);
        self.tf_right[offset..].copy_from_slice(&self.late_right);
        self.rebuild_pending = false;
    }

    fn check_block(&self, len: usize) -> DspResult<()> {
        if len != self.block_size {
            return Err(DspError::BlockSizeMismatch {
                expected: self.block_size,
                actual: len,
            });
        }
        Ok(())
    }

    fn check_filter(&self, filter: &Filter, expected_blocks: usize) -> DspResult<()> {
        if filter.block_size() != self.block_size {
            return Err(DspError::BlockSizeMismatch {
                expected: self.block_size,
                actual: filter.block_size(),
            });
        }
        if filter.blocks() != expected_blocks {
            return Err(DspError::PartitionMismatch {
                expected: expected_blocks,
                actual: filter.blocks(),
            });
        }
        Ok(())
    }

    /// Advance the delay-line ring so the head points at the slot of the
    /// oldest spectrum, which the new block overwrites.
    #[inline]
    fn advance_fdl(&mut self) {
        self.fdl_head = (self.fdl_head + self.total_blocks - 1) % self.total_blocks;
    }

    fn feed_mono(&mut self, input: &[Sample]) -> DspResult<()> {
        let n = self.block_size;
        self.input_left.copy_within(n.., 0);
        self.input_left[n..].copy_from_slice(input);

        self.frame.copy_from_slice(&self.input_left);
        self.fft.forward(&mut self.frame, &mut self.spectrum)?;

        self.advance_fdl();
        let row = self.fdl_head * self.bins;
        self.fdl_left[row..row + self.bins].copy_from_slice(&self.spectrum);
        self.fdl_right[row..row + self.bins].copy_from_slice(&self.spectrum);
        Ok(())
    }

    fn feed_stereo(&mut self, in_left: &[Sample], in_right: &[Sample]) -> DspResult<()> {
        let n = self.block_size;
        self.input_left.copy_within(n.., 0);
        self.input_left[n..].copy_from_slice(in_left);
        self.input_right.copy_within(n.., 0);
        self.input_right[n..].copy_from_slice(in_right);

        self.advance_fdl();
        let row = self.fdl_head * self.bins;

        self.frame.copy_from_slice(&self.input_left);
        self.fft.forward(&mut self.frame, &mut self.spectrum)?;
        self.fdl_left[row..row + self.bins].copy_from_slice(&self.spectrum);

        self.frame.copy_from_slice(&self.input_right);
        self.fft.forward(&mut self.frame, &mut self.spectrum)?;
        self.fdl_right[row..row + self.bins].copy_from_slice(&self.spectrum);
        Ok(())
    }

    /// Accumulate, inverse-transform, and emit one stereo block, mixing in
    /// the previous filter's rendering while a crossfade is pending.
    fn render(&mut self, out_left: &mut [Sample], out_right: &mut [Sample]) -> DspResult<()> {
        let n = self.block_size;

        accumulate(
            &self.tf_left,
            &self.fdl_left,
            self.fdl_head,
            self.total_blocks,
            self.bins,
            &mut self.acc,
        );
        self.fft.inverse(&mut self.acc, &mut self.frame)?;
        out_left.copy_from_slice(&self.frame[n..]);

        accumulate(
            &self.tf_right,
            &self.fdl_right,
            self.fdl_head,
            self.total_blocks,
            self.bins,
            &mut self.acc,
        );
        self.fft.inverse(&mut self.acc, &mut self.frame)?;
        out_right.copy_from_slice(&self.frame[n..]);

        if self.crossfade_pending {
            let fade_in = self.window.fade_in();
            let fade_out = self.window.fade_out();

            accumulate(
                &self.tf_left_prev,
                &self.fdl_left,
                self.fdl_head,
                self.total_blocks,
                self.bins,
                &mut self.acc,
            );
            self.fft.inverse(&mut self.acc, &mut self.frame)?;
            for i in 0..n {
                out_left[i] = out_left[i] * fade_in[i] + self.frame[n + i] * fade_out[i];
            }

            accumulate(
                &self.tf_right_prev,
                &self.fdl_right,
                self.fdl_head,
                self.total_blocks,
                self.bins,
                &mut self.acc,
            );
            self.fft.inverse(&mut self.acc, &mut self.frame)?;
            for i in 0..n {
                out_right[i] = out_right[i] * fade_in[i] + self.frame[n + i] * fade_out[i];
            }
        }

        Ok(())
    }
}

/// `acc[k] = Σ_i tf[i][k] * fdl[(head + i) % blocks][k]` — the partitioned
/// convolution sum over all filter rows against the input history ring.
fn accumulate(
    tf: &[Complex<Sample>],
    fdl: &[Complex<Sample>],
    head: usize,
    blocks: usize,
    bins: usize,
    acc: &mut [Complex<Sample>],
) {
    acc.fill(Complex::new(0.0, 0.0));
    for i in 0..blocks {
        let tf_row = &tf[i * bins..(i + 1) * bins];
        let slot = (head + i) % blocks;
        let fdl_row = &fdl[slot * bins..slot * bins + bins];
        for ((a, t), f) in acc.iter_mut().zip(tf_row).zip(fdl_row) {
            *a += t * f;
        }
    }
}
