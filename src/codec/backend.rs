//! Encoding backend contract
//!
//! The encoder only ever talks to a backend through [`EncodingBackend`]:
//! a handful of parameter setters, one materialization step, two encode
//! entry points and a final flush.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BackendError;

/// Channel mode pushed to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelMode {
    Mono,
    Stereo,
}

/// Backend operation, carried as context on failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendOp {
    SetInSampleRate,
    SetOutSampleRate,
    SetChannelCount,
    SetMode,
    SetQuality,
    MaterializeParameters,
    EncodeMono,
    EncodeInterleaved,
    Flush,
}

impl fmt::Display for BackendOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendOp::SetInSampleRate => "set input sample rate",
            BackendOp::SetOutSampleRate => "set output sample rate",
            BackendOp::SetChannelCount => "set channel count",
            BackendOp::SetMode => "set mode",
            BackendOp::SetQuality => "set quality",
            BackendOp::MaterializeParameters => "materialize parameters",
            BackendOp::EncodeMono => "encode mono samples",
            BackendOp::EncodeInterleaved => "encode interleaved samples",
            BackendOp::Flush => "flush",
        };
        f.write_str(name)
    }
}

/// A lossy encoder driven sample block by sample block
///
/// Setters must all be called before [`materialize_parameters`], which must
/// run exactly once before the first encode call.
///
/// [`materialize_parameters`]: EncodingBackend::materialize_parameters
pub trait EncodingBackend {
    fn set_in_sample_rate(&mut self, hz: u32) -> Result<(), BackendError>;

    fn set_out_sample_rate(&mut self, hz: u32) -> Result<(), BackendError>;

    fn set_channel_count(&mut self, channels: u16) -> Result<(), BackendError>;

    fn set_mode(&mut self, mode: ChannelMode) -> Result<(), BackendError>;

    /// 0 is the highest quality, 9 the lowest
    fn set_quality(&mut self, quality: u8) -> Result<(), BackendError>;

    /// Freeze the parameters set so far into active encoder state
    fn materialize_parameters(&mut self) -> Result<(), BackendError>;

    /// Encode one block of per-channel samples, returning bytes written to `out`
    fn encode_mono(&mut self, left: &[i16], right: &[i16], out: &mut [u8]) -> Result<usize, BackendError>;

    /// Encode one block of interleaved L/R samples, returning bytes written to `out`
    fn encode_interleaved(&mut self, samples: &[i16], out: &mut [u8]) -> Result<usize, BackendError>;

    /// Drain output still buffered inside the backend
    fn flush(&mut self) -> Result<Bytes, BackendError>;
}

impl<T: EncodingBackend + ?Sized> EncodingBackend for Box<T> {
    fn set_in_sample_rate(&mut self, hz: u32) -> Result<(), BackendError> {
        (**self).set_in_sample_rate(hz)
    }

    fn set_out_sample_rate(&mut self, hz: u32) -> Result<(), BackendError> {
        (**self).set_out_sample_rate(hz)
    }

    fn set_channel_count(&mut self, channels: u16) -> Result<(), BackendError> {
        (**self).set_channel_count(channels)
    }

    fn set_mode(&mut self, mode: ChannelMode) -> Result<(), BackendError> {
        (**self).set_mode(mode)
    }

    fn set_quality(&mut self, quality: u8) -> Result<(), BackendError> {
        (**self).set_quality(quality)
    }

    fn materialize_parameters(&mut self) -> Result<(), BackendError> {
        (**self).materialize_parameters()
    }

    fn encode_mono(&mut self, left: &[i16], right: &[i16], out: &mut [u8]) -> Result<usize, BackendError> {
        (**self).encode_mono(left, right, out)
    }

    fn encode_interleaved(&mut self, samples: &[i16], out: &mut [u8]) -> Result<usize, BackendError> {
        (**self).encode_interleaved(samples, out)
    }

    fn flush(&mut self) -> Result<Bytes, BackendError> {
        (**self).flush()
    }
}
