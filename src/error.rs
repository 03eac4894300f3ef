//! Error types for the stream encoder

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::backend::BackendOp;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("WAV error: {0}")]
    Wav(#[from] WavError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Recover a [`CodecError`] that travelled through `std::io::Write`.
    ///
    /// `std::io::copy` only speaks `io::Error`, so encoder failures are boxed
    /// on the way out; everything else stays an IO error.
    pub fn from_io(err: io::Error) -> Self {
        let wraps_codec = err
            .get_ref()
            .is_some_and(|inner| inner.is::<CodecError>());
        if !wraps_codec {
            return Error::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<CodecError>()) {
            Some(Ok(codec)) => Error::Codec(*codec),
            Some(Err(other)) => Error::Io(io::Error::other(other)),
            None => Error::Io(io::Error::other("encoder error without payload")),
        }
    }
}

/// WAV header parsing errors
///
/// All of these are recoverable: the caller may rewind and treat the input
/// as headerless PCM.
#[derive(Error, Debug)]
pub enum WavError {
    #[error("cannot read chunk id")]
    CannotReadChunkId,

    #[error("invalid chunk id {:?}, expected RIFF or RIFX", String::from_utf8_lossy(.0))]
    InvalidChunkId([u8; 4]),

    #[error("cannot read header")]
    CannotReadHeader,

    #[error(
        "unexpected tag {:?}, expected {:?}",
        String::from_utf8_lossy(.found),
        String::from_utf8_lossy(.expected)
    )]
    UnexpectedTag { expected: [u8; 4], found: [u8; 4] },
}

/// Encode option and config file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid input sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("unsupported input channel count: {0}, only 1 and 2 are supported")]
    UnsupportedChannels(u16),

    #[error("unsupported output channel count: {0}, expected 0, 1 or 2")]
    UnsupportedOutputChannels(u16),

    #[error("unsupported bits per sample: {0}, only 16 is supported")]
    UnsupportedBitsPerSample(u16),

    #[error("quality out of range: {0}, expected 0-9")]
    InvalidQuality(u8),

    #[error("failed to access config file {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Encoder errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("only 1 and 2 channels are supported, got {0}")]
    ChannelCountUnsupported(u16),

    #[error("invalid encode options: {0}")]
    Config(#[from] ConfigError),

    #[error("backend failed to {op}: {source}")]
    Backend {
        op: BackendOp,
        #[source]
        source: BackendError,
    },

    #[error("encode options are locked once the backend is configured")]
    OptionsLocked,

    #[error("encoder already finished")]
    AlreadyFinished,

    #[error("failed to write encoded output: {0}")]
    Io(#[from] io::Error),
}

/// Errors reported by an encoding backend
///
/// The status variants follow libmp3lame's negative return codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend initialization failed")]
    InitFailed,

    #[error("generic backend error")]
    Generic,

    #[error("output buffer too small")]
    BufferTooSmall,

    #[error("out of memory")]
    NoMem,

    #[error("parameters were not materialized")]
    NotMaterialized,

    #[error("psychoacoustic model failure")]
    PsychoAcoustic,

    #[error("input of {0} samples is too large for one call")]
    InputTooLarge(usize),

    #[error("sample rate out of range for the backend: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("backend rejected the {0}")]
    InvalidParameter(&'static str),

    #[error("parameters are already materialized")]
    AlreadyMaterialized,

    #[error("backend returned status {0}")]
    Status(i32),
}

impl BackendError {
    /// Map a negative backend status code
    pub fn from_status(status: i32) -> Self {
        match status {
            -1 => BackendError::Generic,
            -2 => BackendError::BufferTooSmall,
            -3 => BackendError::NoMem,
            -4 => BackendError::NotMaterialized,
            -5 => BackendError::PsychoAcoustic,
            other => BackendError::Status(other),
        }
    }
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
