//! WAV header detection
//!
//! Decodes the canonical 44-byte RIFF/RIFX header. The chunk id decides the
//! byte order of every field after it: "RIFF" is little-endian, "RIFX" is
//! big-endian. Fields are read one by one with an explicit byte order.

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{self, Read, Write};
use std::time::Duration;

use crate::config::EncodeOptions;
use crate::constants::{BEST_QUALITY, WAV_HEADER_LEN};
use crate::error::WavError;

/// Chunk id of a little-endian file
pub const CHUNK_ID_LE: [u8; 4] = *b"RIFF";
/// Chunk id of a big-endian file
pub const CHUNK_ID_BE: [u8; 4] = *b"RIFX";

const FORMAT: [u8; 4] = *b"WAVE";
const SUB_CHUNK1_ID: [u8; 4] = *b"fmt ";
const SUB_CHUNK2_ID: [u8; 4] = *b"data";

/// PCM audio format code
pub const FORMAT_PCM: u16 = 1;

/// Canonical WAV header
///
/// The fixed tags ("WAVE", "fmt ", "data") are validated while parsing and
/// not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// "RIFF" or "RIFX"
    pub chunk_id: [u8; 4],
    /// Size of the file minus 8 bytes
    pub chunk_size: u32,
    /// Length of the format data
    pub sub_chunk1_size: u32,
    /// 1 for PCM
    pub audio_format: u16,
    pub num_channels: u16,
    /// Samples per second per channel
    pub sample_rate: u32,
    /// sample_rate * num_channels * bits_per_sample / 8
    pub byte_rate: u32,
    /// num_channels * bits_per_sample / 8
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Number of bytes of sample data
    pub sub_chunk2_size: u32,
}

impl WavHeader {
    /// Build a canonical 16-bit PCM header for `data_len` bytes of samples
    pub fn pcm16(sample_rate: u32, num_channels: u16, data_len: u32, big_endian: bool) -> Self {
        let block_align = num_channels * 2;
        Self {
            chunk_id: if big_endian { CHUNK_ID_BE } else { CHUNK_ID_LE },
            chunk_size: 36 + data_len,
            sub_chunk1_size: 16,
            audio_format: FORMAT_PCM,
            num_channels,
            sample_rate,
            byte_rate: sample_rate * u32::from(block_align),
            block_align,
            bits_per_sample: 16,
            sub_chunk2_size: data_len,
        }
    }

    /// Read a header from the start of `reader`.
    ///
    /// The reader is NOT rewound on failure: every byte that was read stays
    /// consumed. Callers that want to fall back to headerless PCM must seek
    /// back to where the stream started (see
    /// [`detect_input`](crate::pipeline::detect_input)).
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, WavError> {
        let mut chunk_id = [0u8; 4];
        reader
            .read_exact(&mut chunk_id)
            .map_err(|_| WavError::CannotReadChunkId)?;

        match chunk_id {
            CHUNK_ID_LE => read_fields::<_, LittleEndian>(reader, chunk_id),
            CHUNK_ID_BE => read_fields::<_, BigEndian>(reader, chunk_id),
            other => Err(WavError::InvalidChunkId(other)),
        }
    }

    /// Parse a header from the first 44 bytes of `bytes`
    pub fn parse(mut bytes: &[u8]) -> Result<Self, WavError> {
        Self::read_from(&mut bytes)
    }

    /// Serialize in the header's own byte order
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Serialize into a fixed 44-byte buffer
    pub fn to_bytes(&self) -> [u8; WAV_HEADER_LEN] {
        if self.is_big_endian() {
            self.encode_fields::<BigEndian>()
        } else {
            self.encode_fields::<LittleEndian>()
        }
    }

    fn encode_fields<B: ByteOrder>(&self) -> [u8; WAV_HEADER_LEN] {
        let mut bytes = [0u8; WAV_HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.chunk_id);
        B::write_u32(&mut bytes[4..8], self.chunk_size);
        bytes[8..12].copy_from_slice(&FORMAT);

        bytes[12..16].copy_from_slice(&SUB_CHUNK1_ID);
        B::write_u32(&mut bytes[16..20], self.sub_chunk1_size);
        B::write_u16(&mut bytes[20..22], self.audio_format);
        B::write_u16(&mut bytes[22..24], self.num_channels);
        B::write_u32(&mut bytes[24..28], self.sample_rate);
        B::write_u32(&mut bytes[28..32], self.byte_rate);
        B::write_u16(&mut bytes[32..34], self.block_align);
        B::write_u16(&mut bytes[34..36], self.bits_per_sample);

        bytes[36..40].copy_from_slice(&SUB_CHUNK2_ID);
        B::write_u32(&mut bytes[40..44], self.sub_chunk2_size);
        bytes
    }

    /// True if the chunk id was "RIFX"
    pub fn is_big_endian(&self) -> bool {
        self.chunk_id == CHUNK_ID_BE
    }

    /// Encode options that keep the input rate and channel layout
    pub fn to_encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            in_big_endian: self.is_big_endian(),
            in_sample_rate: self.sample_rate,
            in_bits_per_sample: self.bits_per_sample,
            in_channels: self.num_channels,
            out_sample_rate: self.sample_rate,
            out_channels: self.num_channels,
            out_quality: BEST_QUALITY,
        }
    }

    /// Playback length of the data chunk, if the byte rate is known
    pub fn duration(&self) -> Option<Duration> {
        if self.byte_rate == 0 {
            return None;
        }
        let micros = u64::from(self.sub_chunk2_size) * 1_000_000 / u64::from(self.byte_rate);
        Some(Duration::from_micros(micros))
    }
}

/// Read the 40 bytes after the chunk id in byte order `B`
fn read_fields<R: Read, B: ByteOrder>(reader: &mut R, chunk_id: [u8; 4]) -> Result<WavHeader, WavError> {
    let mut fields = FieldReader { inner: reader };

    let chunk_size = fields.u32::<B>()?;
    fields.tag(FORMAT)?;

    fields.tag(SUB_CHUNK1_ID)?;
    let sub_chunk1_size = fields.u32::<B>()?;
    let audio_format = fields.u16::<B>()?;
    let num_channels = fields.u16::<B>()?;
    let sample_rate = fields.u32::<B>()?;
    let byte_rate = fields.u32::<B>()?;
    let block_align = fields.u16::<B>()?;
    let bits_per_sample = fields.u16::<B>()?;

    fields.tag(SUB_CHUNK2_ID)?;
    let sub_chunk2_size = fields.u32::<B>()?;

    Ok(WavHeader {
        chunk_id,
        chunk_size,
        sub_chunk1_size,
        audio_format,
        num_channels,
        sample_rate,
        byte_rate,
        block_align,
        bits_per_sample,
        sub_chunk2_size,
    })
}

struct FieldReader<'a, R> {
    inner: &'a mut R,
}

impl<R: Read> FieldReader<'_, R> {
    fn u16<B: ByteOrder>(&mut self) -> Result<u16, WavError> {
        self.inner
            .read_u16::<B>()
            .map_err(|_| WavError::CannotReadHeader)
    }

    fn u32<B: ByteOrder>(&mut self) -> Result<u32, WavError> {
        self.inner
            .read_u32::<B>()
            .map_err(|_| WavError::CannotReadHeader)
    }

    /// Tags are ASCII and read the same in either byte order
    fn tag(&mut self, expected: [u8; 4]) -> Result<(), WavError> {
        let mut found = [0u8; 4];
        self.inner
            .read_exact(&mut found)
            .map_err(|_| WavError::CannotReadHeader)?;
        if found != expected {
            return Err(WavError::UnexpectedTag { expected, found });
        }
        Ok(())
    }
}
