//! Per-block rendering pipeline
//!
//! The engine owns everything a request touches: the filter store, one
//! convolver per virtual source channel, the optional headphone convolver,
//! and the pose tracker. It is driven one block at a time by the transport
//! and is the sole mutator of its convolvers.

use bf_core::{Sample, peak};
use bf_dsp::Convolver;

use crate::{EngineConfig, EngineError, EngineResult, FilterStore, PoseTracker};

pub struct Engine {
    config: EngineConfig,
    store: FilterStore,
    convolvers: Vec<Convolver>,
    headphone: Option<Convolver>,
    tracker: PoseTracker,
    /// Staging for the headphone pass (its input and output blocks alias
    /// otherwise).
    stage_left: Vec<Sample>,
    stage_right: Vec<Sample>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let store = FilterStore::load(&config)?;

        log::info!(
            "Engine: {} channels, block size {}, {} directional filters",
            config.max_channels,
            config.block_size,
            store.directional_count()
        );

        let convolvers = (0..config.max_channels)
            .map(|_| {
                Convolver::new(
                    config.filter_size,
                    config.block_size,
                    config.convolver_late_size(),
                )
            })
            .collect();

        // The headphone filter never changes, so it is installed once here,
        // without crossfade.
        let headphone = match store.headphone() {
            Some(filter) => {
                let mut convolver =
                    Convolver::new(config.headphone_filter_size, config.block_size, 0);
                convolver.set_filter(filter, false, 1.0, None)?;
                Some(convolver)
            }
            None => None,
        };

        let tracker = PoseTracker::new(config.max_channels);
        let block_size = config.block_size;

        Ok(Self {
            config,
            store,
            convolvers,
            headphone,
            tracker,
            stage_left: vec![0.0; block_size],
            stage_right: vec![0.0; block_size],
        })
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    #[inline]
    pub fn max_channels(&self) -> usize {
        self.config.max_channels
    }

    /// Render one request: update the channel's pose, reselect filters if it
    /// moved, convolve, apply headphone compensation and output gain.
    ///
    /// Shape and channel errors are reported before any state changes, so a
    /// bad request never poisons the engine.
    pub fn handle_block(
        &mut self,
        input: &[Sample],
        channel: usize,
        azimuth: i32,
        elevation: i32,
        out_left: &mut [Sample],
        out_right: &mut [Sample],
    ) -> EngineResult<()> {
        let n = self.config.block_size;
        for len in [input.len(), out_left.len(), out_right.len()] {
            if len != n {
                return Err(EngineError::BlockSizeMismatch {
                    expected: n,
                    actual: len,
                });
            }
        }
        if channel >= self.config.max_channels {
            return Err(EngineError::ChannelOutOfRange {
                channel,
                max: self.config.max_channels,
            });
        }

        self.tracker.update(channel, azimuth, elevation)?;
        if self.tracker.needs_update(channel)? {
            let pose = self.tracker.consume(channel)?;
            let crossfade = self.config.enable_crossfading;
            let convolver = &mut self.convolvers[channel];

            // No distance source in the request format: unit attenuation.
            let filter = self.store.nearest_directional(&pose);
            let directivity = self.store.nearest_directivity(&pose);
            convolver.set_filter(filter, crossfade, 1.0, directivity)?;

            if let Some(tail) = self.store.nearest_late_reverb(&pose) {
                convolver.set_late_reverb(tail, crossfade)?;
            }
        }

        self.convolvers[channel].process(input, out_left, out_right)?;

        if let Some(headphone) = self.headphone.as_mut() {
            self.stage_left.copy_from_slice(out_left);
            self.stage_right.copy_from_slice(out_right);
            headphone.process_stereo(&self.stage_left, &self.stage_right, out_left, out_right)?;
        }

        let gain = self.config.loudness_factor;
        for sample in out_left.iter_mut() {
            *sample *= gain;
        }
        for sample in out_right.iter_mut() {
            *sample *= gain;
        }

        let level = peak(out_left).max(peak(out_right));
        if level > 1.0 {
            log::warn!("Clipping occurred (peak {level:.3}): adjust loudnessFactor");
        }

        Ok(())
    }
}
