//! File I/O error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(String),

    #[error("Unsupported channel count {channels} in {path}")]
    ChannelCount { path: String, channels: u16 },

    #[error("Invalid filter list entry at line {line}: {reason}")]
    InvalidEntry { line: usize, reason: String },
}

pub type FileResult<T> = Result<T, FileError>;

impl From<hound::Error> for FileError {
    fn from(err: hound::Error) -> Self {
        FileError::Wav(err.to_string())
    }
}
