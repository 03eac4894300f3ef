//! PCM byte to sample conversion and output buffer sizing

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::constants::OUTPUT_BUFFER_OVERHEAD;

/// Convert raw 16-bit PCM bytes into signed samples
///
/// Little-endian input puts the low byte first; big-endian swaps the roles.
/// A trailing unpaired byte is dropped.
pub fn bytes_to_samples(bytes: &[u8], big_endian: bool) -> Vec<i16> {
    let mut samples = vec![0i16; bytes.len() / 2];
    decode_into(bytes, big_endian, &mut samples);
    samples
}

fn decode_into(bytes: &[u8], big_endian: bool, samples: &mut [i16]) {
    let paired = &bytes[..samples.len() * 2];
    if big_endian {
        BigEndian::read_i16_into(paired, samples);
    } else {
        LittleEndian::read_i16_into(paired, samples);
    }
}

/// Estimate how many samples the backend will emit for one input block
///
/// Computed as `sample_count * in_rate / out_rate * out_channels / in_channels`
/// with integer truncation, strictly left to right. The evaluation order
/// changes the rounding and must be kept.
///
/// # Panics
///
/// Panics if `out_rate` or `in_channels` is zero; pass resolved options.
pub fn estimated_output_samples(
    sample_count: usize,
    in_rate: u32,
    out_rate: u32,
    in_channels: u16,
    out_channels: u16,
) -> usize {
    let estimate = sample_count as u64 * u64::from(in_rate) / u64::from(out_rate)
        * u64::from(out_channels)
        / u64::from(in_channels);
    estimate as usize
}

/// Worst-case encoded size for `estimated_samples` output samples
///
/// `ceil(1.25 * n) + 7200`, the backend's documented bound for
/// incompressible input plus frame overhead.
pub fn bound_for_estimate(estimated_samples: usize) -> usize {
    (estimated_samples * 5).div_ceil(4) + OUTPUT_BUFFER_OVERHEAD
}

/// Output buffer size needed to encode `sample_count` input samples
pub fn output_buffer_bound(
    sample_count: usize,
    in_rate: u32,
    out_rate: u32,
    in_channels: u16,
    out_channels: u16,
) -> usize {
    bound_for_estimate(estimated_output_samples(
        sample_count,
        in_rate,
        out_rate,
        in_channels,
        out_channels,
    ))
}

/// Sample converter with a reusable output buffer
#[derive(Debug, Clone, Default)]
pub struct SampleConverter {
    big_endian: bool,
    /// Conversion buffer (reused to avoid allocations)
    samples: Vec<i16>,
}

impl SampleConverter {
    pub fn new(big_endian: bool) -> Self {
        Self {
            big_endian,
            samples: Vec::new(),
        }
    }

    /// Convert `bytes`, dropping a trailing unpaired byte
    pub fn convert(&mut self, bytes: &[u8]) -> &[i16] {
        self.samples.clear();
        self.samples.resize(bytes.len() / 2, 0);
        decode_into(bytes, self.big_endian, &mut self.samples);
        &self.samples
    }

    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }
}
