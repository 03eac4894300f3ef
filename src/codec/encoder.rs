//! Streaming PCM encoder
//!
//! Feeds raw 16-bit PCM through an [`EncodingBackend`] and writes the encoded
//! bitstream to a sink. Backend parameters are applied lazily, exactly once,
//! right before the first block is encoded.

use serde::Serialize;
use std::io::{self, Write};

use crate::audio::sample::{output_buffer_bound, SampleConverter};
use crate::codec::backend::{BackendOp, ChannelMode, EncodingBackend};
use crate::config::EncodeOptions;
use crate::error::{BackendError, CodecError};

/// Lifecycle of a [`StreamEncoder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EncoderState {
    /// Options may still change; nothing has reached the backend
    Unconfigured,
    /// Parameters materialized, blocks are being encoded
    Configured,
    /// Residual output drained, no more input accepted
    Flushed,
}

/// Backend mode for a set of options: mono only for one output channel
pub fn channel_mode(options: &EncodeOptions) -> ChannelMode {
    if options.resolved().out_channels == 1 {
        ChannelMode::Mono
    } else {
        ChannelMode::Stereo
    }
}

fn backend_error(op: BackendOp) -> impl FnOnce(BackendError) -> CodecError {
    move |source| CodecError::Backend { op, source }
}

/// Streaming encoder over one backend and one output sink
///
/// Not meant for concurrent use: every call takes `&mut self`. Wrap it in a
/// [`SharedEncoder`](crate::codec::SharedEncoder) to serialize writers.
///
/// An encoder that is dropped without [`finish`](Self::finish) still drains
/// the backend, but any error is only logged.
pub struct StreamEncoder<B: EncodingBackend, W: Write> {
    backend: B,
    output: Option<W>,
    options: EncodeOptions,
    state: EncoderState,
    converter: SampleConverter,
    /// Encoding buffer (reused to avoid allocations)
    encode_buffer: Vec<u8>,
    /// Partial sample frame carried between `Write::write` calls
    pending: Vec<u8>,
    stats: EncoderStats,
}

impl<B: EncodingBackend, W: Write> StreamEncoder<B, W> {
    /// Create an encoder with default headerless PCM options
    pub fn new(backend: B, output: W) -> Self {
        Self::with_options(backend, output, EncodeOptions::default())
    }

    /// Create an encoder with explicit options
    pub fn with_options(backend: B, output: W, options: EncodeOptions) -> Self {
        Self {
            backend,
            output: Some(output),
            options,
            state: EncoderState::Unconfigured,
            converter: SampleConverter::new(options.in_big_endian),
            encode_buffer: Vec::new(),
            pending: Vec::new(),
            stats: EncoderStats::default(),
        }
    }

    /// Current options; resolved once configured
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Mutable options, only while still unconfigured
    pub fn options_mut(&mut self) -> Option<&mut EncodeOptions> {
        match self.state {
            EncoderState::Unconfigured => Some(&mut self.options),
            _ => None,
        }
    }

    /// Replace the options before the first encode call
    pub fn set_options(&mut self, options: EncodeOptions) -> Result<(), CodecError> {
        let slot = self.options_mut().ok_or(CodecError::OptionsLocked)?;
        *slot = options;
        Ok(())
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The output sink, until the encoder is finished
    pub fn get_ref(&self) -> Option<&W> {
        self.output.as_ref()
    }

    pub fn stats(&self) -> &EncoderStats {
        &self.stats
    }

    /// Push the options into the backend and materialize them.
    ///
    /// Runs automatically before the first encode. Calling it again once
    /// configured does nothing. On failure the encoder stays unconfigured,
    /// so the options can be corrected and configure retried.
    pub fn configure(&mut self) -> Result<(), CodecError> {
        match self.state {
            EncoderState::Configured => return Ok(()),
            EncoderState::Flushed => return Err(CodecError::AlreadyFinished),
            EncoderState::Unconfigured => {}
        }

        self.options.validate()?;
        let resolved = self.options.resolved();
        let mode = channel_mode(&resolved);

        let backend = &mut self.backend;
        backend
            .set_in_sample_rate(resolved.in_sample_rate)
            .map_err(backend_error(BackendOp::SetInSampleRate))?;
        backend
            .set_out_sample_rate(resolved.out_sample_rate)
            .map_err(backend_error(BackendOp::SetOutSampleRate))?;
        backend
            .set_channel_count(resolved.in_channels)
            .map_err(backend_error(BackendOp::SetChannelCount))?;
        backend
            .set_mode(mode)
            .map_err(backend_error(BackendOp::SetMode))?;
        backend
            .set_quality(resolved.out_quality)
            .map_err(backend_error(BackendOp::SetQuality))?;
        backend
            .materialize_parameters()
            .map_err(backend_error(BackendOp::MaterializeParameters))?;

        self.options = resolved;
        self.converter = SampleConverter::new(resolved.in_big_endian);
        self.state = EncoderState::Configured;

        tracing::info!(
            "Encoder configured: {}Hz -> {}Hz, {} -> {} channel(s), {:?} mode, quality {}{}",
            resolved.in_sample_rate,
            resolved.out_sample_rate,
            resolved.in_channels,
            resolved.out_channels,
            mode,
            resolved.out_quality,
            if resolved.in_big_endian { ", big-endian input" } else { "" }
        );
        Ok(())
    }

    /// Encode one block of raw PCM bytes.
    ///
    /// Returns the number of input bytes consumed: two per sample, so a
    /// trailing unpaired byte is not counted. The amount of encoded output
    /// written to the sink is unrelated to this number. If the backend
    /// fails, nothing is consumed and nothing is written.
    pub fn encode(&mut self, pcm: &[u8]) -> Result<usize, CodecError> {
        if self.state == EncoderState::Flushed {
            return Err(CodecError::AlreadyFinished);
        }
        let channels = self.options.in_channels;
        if !matches!(channels, 1 | 2) {
            return Err(CodecError::ChannelCountUnsupported(channels));
        }
        self.configure()?;

        let options = self.options;
        let samples = self.converter.convert(pcm);
        let sample_count = samples.len();
        let bound = output_buffer_bound(
            sample_count,
            options.in_sample_rate,
            options.out_sample_rate,
            options.in_channels,
            options.out_channels,
        );
        self.encode_buffer.resize(bound, 0);

        let op = if channels == 1 {
            BackendOp::EncodeMono
        } else {
            BackendOp::EncodeInterleaved
        };
        let written = match op {
            BackendOp::EncodeMono => self.backend.encode_mono(samples, samples, &mut self.encode_buffer),
            _ => self.backend.encode_interleaved(samples, &mut self.encode_buffer),
        }
        .map_err(backend_error(op))?;

        let encoded = self
            .encode_buffer
            .get(..written)
            .ok_or(CodecError::Backend {
                op,
                source: BackendError::BufferTooSmall,
            })?;
        let output = self.output.as_mut().ok_or(CodecError::AlreadyFinished)?;
        output.write_all(encoded)?;

        tracing::trace!("Encoded {} samples into {} bytes", sample_count, written);
        let consumed = sample_count * 2;
        self.stats.chunks_encoded += 1;
        self.stats.samples_encoded += sample_count as u64;
        self.stats.input_bytes += consumed as u64;
        self.stats.bytes_produced += written as u64;
        Ok(consumed)
    }

    /// Drain the backend into the sink and stop accepting input.
    ///
    /// Only the first call does any work. An encoder that never encoded a
    /// block has nothing buffered, so the backend is not asked to flush.
    pub fn flush_residual(&mut self) -> Result<(), CodecError> {
        let previous = std::mem::replace(&mut self.state, EncoderState::Flushed);
        if previous == EncoderState::Flushed {
            return Ok(());
        }

        if !self.pending.is_empty() {
            tracing::warn!(
                "Dropping {} trailing byte(s) that do not form a whole sample frame",
                self.pending.len()
            );
            self.stats.dropped_bytes += self.pending.len() as u64;
            self.pending.clear();
        }

        let output = self.output.as_mut().ok_or(CodecError::AlreadyFinished)?;
        if previous == EncoderState::Configured {
            let residual = self
                .backend
                .flush()
                .map_err(backend_error(BackendOp::Flush))?;
            if !residual.is_empty() {
                output.write_all(&residual)?;
            }
            self.stats.residual_bytes = residual.len() as u64;
            self.stats.bytes_produced += residual.len() as u64;
        } else {
            tracing::debug!("Encoder finished before any input, skipping backend flush");
        }
        output.flush()?;
        Ok(())
    }

    /// Flush residual output and hand back the sink
    pub fn finish(mut self) -> Result<W, CodecError> {
        self.flush_residual()?;
        self.output.take().ok_or(CodecError::AlreadyFinished)
    }

    fn frame_len(&self) -> usize {
        usize::from(self.options.in_channels) * 2
    }
}

impl<B: EncodingBackend, W: Write> Drop for StreamEncoder<B, W> {
    fn drop(&mut self) {
        if self.state == EncoderState::Flushed {
            return;
        }
        if let Err(e) = self.flush_residual() {
            tracing::warn!("Failed to flush encoder on drop: {}", e);
        }
    }
}

/// Byte-stream adapter for `std::io::copy`.
///
/// Bytes that do not complete a sample frame are held back until the next
/// write, so arbitrary read sizes never split a sample. A failed write
/// leaves the held-back bytes untouched and consumes nothing, so the same
/// buffer can be written again. Encoder errors are boxed into `io::Error`;
/// see [`Error::from_io`](crate::Error::from_io).
impl<B: EncodingBackend, W: Write> Write for StreamEncoder<B, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.state == EncoderState::Flushed {
            return Err(io::Error::other(CodecError::AlreadyFinished));
        }
        let channels = self.options.in_channels;
        if !matches!(channels, 1 | 2) {
            return Err(io::Error::other(CodecError::ChannelCountUnsupported(channels)));
        }

        let frame = self.frame_len();
        let mut consumed = 0;
        if !self.pending.is_empty() {
            let take = (frame - self.pending.len()).min(buf.len());
            if self.pending.len() + take < frame {
                self.pending.extend_from_slice(&buf[..take]);
                return Ok(take);
            }
            let mut block = Vec::with_capacity(frame);
            block.extend_from_slice(&self.pending);
            block.extend_from_slice(&buf[..take]);
            self.encode(&block).map_err(io::Error::other)?;
            self.pending.clear();
            consumed = take;
        }

        let rest = &buf[consumed..];
        let whole = rest.len() - rest.len() % frame;
        if whole > 0 {
            if let Err(e) = self.encode(&rest[..whole]) {
                // The completed frame is already encoded; report only that much
                if consumed > 0 {
                    return Ok(consumed);
                }
                return Err(io::Error::other(e));
            }
        }
        self.pending.extend_from_slice(&rest[whole..]);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.output.as_mut() {
            Some(output) => output.flush(),
            None => Ok(()),
        }
    }
}

/// Encoder statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncoderStats {
    /// Blocks handed to the backend
    pub chunks_encoded: u64,
    pub samples_encoded: u64,
    /// Input bytes consumed (two per sample)
    pub input_bytes: u64,
    /// Encoded bytes written, residual flush included
    pub bytes_produced: u64,
    /// Bytes written by the final flush
    pub residual_bytes: u64,
    /// Trailing input bytes that never formed a whole frame
    pub dropped_bytes: u64,
}

impl EncoderStats {
    /// Input bytes per output byte, 0 before any output
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_produced == 0 {
            0.0
        } else {
            self.input_bytes as f64 / self.bytes_produced as f64
        }
    }
}
