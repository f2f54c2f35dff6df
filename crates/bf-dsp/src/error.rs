//! DSP error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DspError {
    #[error("Impulse response is empty")]
    EmptyImpulseResponse,

    #[error("Interleaved stereo data has odd sample count {0}")]
    OddSampleCount(usize),

    #[error("Filter has {actual} partitions, expected {expected}")]
    PartitionMismatch { expected: usize, actual: usize },

    #[error("Block has {actual} samples, expected {expected}")]
    BlockSizeMismatch { expected: usize, actual: usize },

    #[error("FFT error: {0}")]
    Fft(String),
}

pub type DspResult<T> = Result<T, DspError>;
