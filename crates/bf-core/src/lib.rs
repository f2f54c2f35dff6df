//! bf-core: Shared types for BinForge
//!
//! This crate provides the foundational types used across all BinForge
//! crates: the audio sample type and the [`Pose`] direction key.

mod pose;
mod sample;

pub use pose::*;
pub use sample::*;
