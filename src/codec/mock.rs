//! Recording backend for tests

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::codec::backend::{BackendOp, ChannelMode, EncodingBackend};
use crate::error::BackendError;

/// Trailing bytes returned by [`RecordingBackend::flush`]
pub const RESIDUAL: &[u8] = b"TAIL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetInSampleRate(u32),
    SetOutSampleRate(u32),
    SetChannelCount(u16),
    SetMode(ChannelMode),
    SetQuality(u8),
    MaterializeParameters,
    EncodeMono {
        left: Vec<i16>,
        mirrored: bool,
        capacity: usize,
    },
    EncodeInterleaved {
        samples: Vec<i16>,
        capacity: usize,
    },
    Flush,
}

impl Call {
    pub fn is_parameter_call(&self) -> bool {
        !matches!(self, Call::EncodeMono { .. } | Call::EncodeInterleaved { .. } | Call::Flush)
    }
}

/// Records every call; clones share the log and the failure switch
///
/// Each encode call emits the block's sample count as 4 little-endian
/// bytes, so output length tracks the number of non-empty blocks.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_on: Arc<Mutex<Option<BackendOp>>>,
    /// Calls to the failing op that still succeed before it starts failing
    grace: Arc<Mutex<usize>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(op: BackendOp) -> Self {
        let backend = Self::new();
        backend.fail_on(Some(op));
        backend
    }

    /// Let `op` succeed `grace` times, then fail every later call
    pub fn failing_after(op: BackendOp, grace: usize) -> Self {
        let backend = Self::failing_on(op);
        *backend.grace.lock() = grace;
        backend
    }

    pub fn fail_on(&self, op: Option<BackendOp>) {
        *self.fail_on.lock() = op;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, op: BackendOp, call: Call) -> Result<(), BackendError> {
        if *self.fail_on.lock() == Some(op) {
            let mut grace = self.grace.lock();
            if *grace == 0 {
                return Err(BackendError::Generic);
            }
            *grace -= 1;
        }
        self.calls.lock().push(call);
        Ok(())
    }

    fn emit(sample_count: usize, out: &mut [u8]) -> Result<usize, BackendError> {
        if sample_count == 0 {
            return Ok(0);
        }
        let frame = (sample_count as u32).to_le_bytes();
        let slot = out.get_mut(..frame.len()).ok_or(BackendError::BufferTooSmall)?;
        slot.copy_from_slice(&frame);
        Ok(frame.len())
    }
}

impl EncodingBackend for RecordingBackend {
    fn set_in_sample_rate(&mut self, hz: u32) -> Result<(), BackendError> {
        self.record(BackendOp::SetInSampleRate, Call::SetInSampleRate(hz))
    }

    fn set_out_sample_rate(&mut self, hz: u32) -> Result<(), BackendError> {
        self.record(BackendOp::SetOutSampleRate, Call::SetOutSampleRate(hz))
    }

    fn set_channel_count(&mut self, channels: u16) -> Result<(), BackendError> {
        self.record(BackendOp::SetChannelCount, Call::SetChannelCount(channels))
    }

    fn set_mode(&mut self, mode: ChannelMode) -> Result<(), BackendError> {
        self.record(BackendOp::SetMode, Call::SetMode(mode))
    }

    fn set_quality(&mut self, quality: u8) -> Result<(), BackendError> {
        self.record(BackendOp::SetQuality, Call::SetQuality(quality))
    }

    fn materialize_parameters(&mut self) -> Result<(), BackendError> {
        self.record(BackendOp::MaterializeParameters, Call::MaterializeParameters)
    }

    fn encode_mono(&mut self, left: &[i16], right: &[i16], out: &mut [u8]) -> Result<usize, BackendError> {
        self.record(
            BackendOp::EncodeMono,
            Call::EncodeMono {
                left: left.to_vec(),
                mirrored: left == right,
                capacity: out.len(),
            },
        )?;
        Self::emit(left.len(), out)
    }

    fn encode_interleaved(&mut self, samples: &[i16], out: &mut [u8]) -> Result<usize, BackendError> {
        self.record(
            BackendOp::EncodeInterleaved,
            Call::EncodeInterleaved {
                samples: samples.to_vec(),
                capacity: out.len(),
            },
        )?;
        Self::emit(samples.len(), out)
    }

    fn flush(&mut self) -> Result<Bytes, BackendError> {
        self.record(BackendOp::Flush, Call::Flush)?;
        Ok(Bytes::from_static(RESIDUAL))
    }
}
