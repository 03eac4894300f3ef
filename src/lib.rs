//! # MP3 Stream Encoder
//!
//! Streams 16-bit PCM, raw or wrapped in a WAV container, through a lossy
//! encoding backend and writes the compressed bitstream to any sink.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          INPUT (Read + Seek)                         │
//! └───────────────────────────────────┬──────────────────────────────────┘
//!                                     │
//!                                     ▼
//!               ┌───────────────────────────────────────────┐
//!               │   pipeline::detect_input                  │
//!               │   WavHeader::read_from (audio::wav)       │
//!               │   ok  -> options from header              │
//!               │   err -> rewind, fallback EncodeOptions   │
//!               └─────────────────────┬─────────────────────┘
//!                                     │ EncodeOptions
//!                                     ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                  StreamEncoder (codec::encoder)                      │
//! │                                                                      │
//! │   Unconfigured ──configure()──▶ Configured ──finish()──▶ Flushed     │
//! │                                     │                                │
//! │   byte chunk ─▶ SampleConverter ─▶ output_buffer_bound               │
//! │                 (audio::sample)         │                            │
//! │                                         ▼                            │
//! │                 mono:   encode_mono(samples, samples)                │
//! │                 stereo: encode_interleaved(samples)                  │
//! └─────────────────────────────────────┬────────────────────────────────┘
//!                                       │ EncodingBackend trait
//!                                       ▼
//!               ┌───────────────────────────────────────────┐
//!               │   LameBackend (codec::lame, "lame")       │
//!               └─────────────────────┬─────────────────────┘
//!                                     │ encoded bytes, residual flush
//!                                     ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                            OUTPUT (Write)                            │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod pipeline;

pub use error::{Error, Result};

/// Crate-wide constants
pub mod constants {
    /// Default input sample rate for headerless PCM
    pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

    /// Default input channel count for headerless PCM (mono)
    pub const DEFAULT_CHANNELS: u16 = 1;

    /// The only supported sample width
    pub const BITS_PER_SAMPLE: u16 = 16;

    /// Highest quality setting
    pub const BEST_QUALITY: u8 = 0;

    /// Lowest quality setting
    pub const WORST_QUALITY: u8 = 9;

    /// Size of the canonical WAV header
    pub const WAV_HEADER_LEN: usize = 44;

    /// Fixed frame overhead added to every output buffer bound
    pub const OUTPUT_BUFFER_OVERHEAD: usize = 7200;

    /// Buffer handed to the backend for the final flush
    pub const FLUSH_BUFFER_SIZE: usize = 7200;
}
