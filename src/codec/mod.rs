//! Streaming encoder and its backends
//!
//! [`StreamEncoder`] owns the PCM handling and lifecycle; the actual
//! compression sits behind the [`EncodingBackend`] trait.

pub mod backend;
pub mod encoder;
pub mod shared;

#[cfg(feature = "lame")]
pub mod lame;

#[cfg(test)]
pub(crate) mod mock;

pub use backend::{BackendOp, ChannelMode, EncodingBackend};
pub use encoder::{channel_mode, EncoderState, EncoderStats, StreamEncoder};
pub use shared::SharedEncoder;

#[cfg(feature = "lame")]
pub use lame::LameBackend;
