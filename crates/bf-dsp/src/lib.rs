//! bf-dsp: Real-time convolution DSP for BinForge
//!
//! Uniform-partitioned overlap-save convolution in the frequency domain:
//! - `fft` - paired real-FFT plans for one block shape
//! - `window` - cosine-squared crossfade window pair
//! - `filter` - partitioned impulse responses (time domain → spectra)
//! - `convolver` - the per-channel streaming convolver with crossfade

mod convolver;
mod error;
mod fft;
mod filter;
mod window;

pub use convolver::*;
pub use error::*;
pub use fft::*;
pub use filter::*;
pub use window::*;
