//! Engine error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Asset error: {0}")]
    Asset(#[from] bf_file::FileError),

    #[error("DSP error: {0}")]
    Dsp(#[from] bf_dsp::DspError),

    #[error("Channel {channel} out of range (max {max})")]
    ChannelOutOfRange { channel: usize, max: usize },

    #[error("Block has {actual} samples, expected {expected}")]
    BlockSizeMismatch { expected: usize, actual: usize },
}

pub type EngineResult<T> = Result<T, EngineError>;
