//! libmp3lame backend
//!
//! Parameters are staged on an `mp3lame_encoder::Builder`; materializing
//! builds the `Encoder`. Stereo blocks are split into left and right
//! channels before encoding.

use bytes::Bytes;
use mp3lame_encoder::{ffi, BuildError, Builder, DualPcm, EncodeError, Encoder, FlushNoGap, Mode, Quality};
use std::os::raw::c_int;

use crate::codec::backend::{ChannelMode, EncodingBackend};
use crate::constants::FLUSH_BUFFER_SIZE;
use crate::error::BackendError;

enum Stage {
    Building(Builder),
    Ready(Encoder),
    /// `build` consumed the builder and failed
    Failed,
}

/// MP3 encoding backend on top of libmp3lame
pub struct LameBackend {
    stage: Stage,
    left: Vec<i16>,
    right: Vec<i16>,
    /// Spare-capacity target for `encode_to_vec`
    scratch: Vec<u8>,
}

impl LameBackend {
    pub fn new() -> Result<Self, BackendError> {
        let builder = Builder::new().ok_or(BackendError::InitFailed)?;
        tracing::debug!("Allocated libmp3lame handle");
        Ok(Self {
            stage: Stage::Building(builder),
            left: Vec::new(),
            right: Vec::new(),
            scratch: Vec::new(),
        })
    }

    fn builder(&mut self) -> Result<&mut Builder, BackendError> {
        match &mut self.stage {
            Stage::Building(builder) => Ok(builder),
            Stage::Ready(_) => Err(BackendError::AlreadyMaterialized),
            Stage::Failed => Err(BackendError::InitFailed),
        }
    }

    fn encode_dual(&mut self, left: &[i16], right: &[i16], out: &mut [u8]) -> Result<usize, BackendError> {
        let Stage::Ready(encoder) = &mut self.stage else {
            return Err(BackendError::NotMaterialized);
        };
        let count = left.len().min(right.len());
        let pcm = DualPcm {
            left: &left[..count],
            right: &right[..count],
        };

        self.scratch.clear();
        self.scratch.reserve(out.len());
        let written = encoder.encode_to_vec(pcm, &mut self.scratch).map_err(encode_error)?;

        let dest = out.get_mut(..written).ok_or(BackendError::BufferTooSmall)?;
        dest.copy_from_slice(&self.scratch[..written]);
        Ok(written)
    }
}

fn build_error(err: BuildError) -> BackendError {
    match err {
        BuildError::Generic => BackendError::Generic,
        BuildError::NoMem => BackendError::NoMem,
        BuildError::BadBRate => BackendError::InvalidParameter("bitrate"),
        BuildError::BadSampleFreq => BackendError::InvalidParameter("sample rate"),
        BuildError::InternalError => BackendError::Generic,
        BuildError::Other(status) => BackendError::from_status(status),
    }
}

fn encode_error(err: EncodeError) -> BackendError {
    match err {
        EncodeError::BufferTooSmall => BackendError::BufferTooSmall,
        EncodeError::NoMem => BackendError::NoMem,
        EncodeError::InvalidState => BackendError::NotMaterialized,
        EncodeError::PsychoAcoustic => BackendError::PsychoAcoustic,
        EncodeError::Other(status) => BackendError::from_status(status),
    }
}

fn lame_quality(quality: u8) -> Result<Quality, BackendError> {
    Ok(match quality {
        0 => Quality::Best,
        1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        9 => Quality::Worst,
        _ => return Err(BackendError::InvalidParameter("quality")),
    })
}

impl EncodingBackend for LameBackend {
    fn set_in_sample_rate(&mut self, hz: u32) -> Result<(), BackendError> {
        self.builder()?.set_sample_rate(hz).map_err(build_error)
    }

    fn set_out_sample_rate(&mut self, hz: u32) -> Result<(), BackendError> {
        let rate = c_int::try_from(hz).map_err(|_| BackendError::InvalidSampleRate(hz))?;
        let builder = self.builder()?;
        // The builder has no setter for the output rate.
        let status = unsafe { ffi::lame_set_out_samplerate(builder.as_ptr(), rate) };
        if status < 0 {
            return Err(BackendError::from_status(status));
        }
        Ok(())
    }

    fn set_channel_count(&mut self, channels: u16) -> Result<(), BackendError> {
        let channels = u8::try_from(channels).map_err(|_| BackendError::InvalidParameter("channel count"))?;
        self.builder()?.set_num_channels(channels).map_err(build_error)
    }

    fn set_mode(&mut self, mode: ChannelMode) -> Result<(), BackendError> {
        let mode = match mode {
            ChannelMode::Mono => Mode::Mono,
            ChannelMode::Stereo => Mode::Stereo,
        };
        self.builder()?.set_mode(mode).map_err(build_error)
    }

    fn set_quality(&mut self, quality: u8) -> Result<(), BackendError> {
        let quality = lame_quality(quality)?;
        self.builder()?.set_quality(quality).map_err(build_error)
    }

    fn materialize_parameters(&mut self) -> Result<(), BackendError> {
        let builder = match std::mem::replace(&mut self.stage, Stage::Failed) {
            Stage::Building(builder) => builder,
            ready @ Stage::Ready(_) => {
                self.stage = ready;
                return Err(BackendError::AlreadyMaterialized);
            }
            Stage::Failed => return Err(BackendError::InitFailed),
        };
        let encoder = builder.build().map_err(build_error)?;
        self.stage = Stage::Ready(encoder);
        Ok(())
    }

    fn encode_mono(&mut self, left: &[i16], right: &[i16], out: &mut [u8]) -> Result<usize, BackendError> {
        self.encode_dual(left, right, out)
    }

    fn encode_interleaved(&mut self, samples: &[i16], out: &mut [u8]) -> Result<usize, BackendError> {
        let mut left = std::mem::take(&mut self.left);
        let mut right = std::mem::take(&mut self.right);
        left.clear();
        right.clear();
        for frame in samples.chunks_exact(2) {
            left.push(frame[0]);
            right.push(frame[1]);
        }

        let result = self.encode_dual(&left, &right, out);
        self.left = left;
        self.right = right;
        result
    }

    fn flush(&mut self) -> Result<Bytes, BackendError> {
        let Stage::Ready(encoder) = &mut self.stage else {
            return Err(BackendError::NotMaterialized);
        };
        let mut buffer = Vec::with_capacity(FLUSH_BUFFER_SIZE);
        encoder
            .flush_to_vec::<FlushNoGap>(&mut buffer)
            .map_err(encode_error)?;
        Ok(Bytes::from(buffer))
    }
}
