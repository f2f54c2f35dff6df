//! bf-file: Asset loading for BinForge
//!
//! Provides the two startup inputs of the engine:
//! - WAV impulse responses (via hound), decoded to f32 stereo
//! - the plaintext filter-list index mapping poses to IR files

mod error;
mod list;
mod wav;

pub use error::*;
pub use list::*;
pub use wav::*;
