//! Mutex-guarded encoder handle for multi-threaded producers

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

use crate::codec::backend::EncodingBackend;
use crate::codec::encoder::{EncoderStats, StreamEncoder};
use crate::error::CodecError;

/// Cloneable handle serializing access to one [`StreamEncoder`]
///
/// Blocks from different clones never interleave inside the backend, and
/// the lazy configuration still happens exactly once.
pub struct SharedEncoder<B: EncodingBackend, W: Write> {
    inner: Arc<Mutex<StreamEncoder<B, W>>>,
}

impl<B: EncodingBackend, W: Write> Clone for SharedEncoder<B, W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: EncodingBackend, W: Write> SharedEncoder<B, W> {
    pub fn new(encoder: StreamEncoder<B, W>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(encoder)),
        }
    }

    /// Run `f` while holding the lock
    pub fn with<T>(&self, f: impl FnOnce(&mut StreamEncoder<B, W>) -> T) -> T {
        f(&mut self.inner.lock())
    }

    pub fn configure(&self) -> Result<(), CodecError> {
        self.inner.lock().configure()
    }

    pub fn encode(&self, pcm: &[u8]) -> Result<usize, CodecError> {
        self.inner.lock().encode(pcm)
    }

    pub fn flush_residual(&self) -> Result<(), CodecError> {
        self.inner.lock().flush_residual()
    }

    pub fn stats(&self) -> EncoderStats {
        self.inner.lock().stats().clone()
    }

    /// Take the encoder back once every other clone is gone
    pub fn into_inner(self) -> Result<StreamEncoder<B, W>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}
