//! End-to-end encode of one input stream
//!
//! Sniffs for a WAV header, falls back to headerless PCM, then pushes the
//! rest of the input through a [`StreamEncoder`].

use serde::Serialize;
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::audio::wav::WavHeader;
use crate::codec::backend::EncodingBackend;
use crate::codec::encoder::{EncoderStats, StreamEncoder};
use crate::config::EncodeOptions;
use crate::error::{Error, Result};

/// What [`detect_input`] found at the start of a stream
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedInput {
    pub options: EncodeOptions,
    /// Parsed header, `None` for headerless PCM
    pub header: Option<WavHeader>,
}

/// Summary of one [`encode_stream`] run
#[derive(Debug, Clone, Serialize)]
pub struct EncodeReport {
    /// Resolved options the backend was configured with
    pub options: EncodeOptions,
    pub wav_header: bool,
    pub stats: EncoderStats,
}

/// Read a WAV header if there is one.
///
/// With a header the reader is left right after it and the options come
/// from the header, keeping the quality of `fallback`. Without one the
/// reader is rewound to where it was and `fallback` is used as is.
pub fn detect_input<R: Read + Seek>(reader: &mut R, fallback: &EncodeOptions) -> Result<DetectedInput> {
    let origin = reader.stream_position()?;
    match WavHeader::read_from(reader) {
        Ok(header) => {
            let options = EncodeOptions {
                out_quality: fallback.out_quality,
                ..header.to_encode_options()
            };
            tracing::info!(
                "WAV header: {}Hz, {} channel(s), {} bits{}",
                header.sample_rate,
                header.num_channels,
                header.bits_per_sample,
                if header.is_big_endian() { ", big-endian" } else { "" }
            );
            if let Some(duration) = header.duration() {
                tracing::debug!("Declared data length: {:.2}s", duration.as_secs_f64());
            }
            Ok(DetectedInput {
                options,
                header: Some(header),
            })
        }
        Err(e) => {
            tracing::debug!("No WAV header ({}), treating input as raw PCM", e);
            reader.seek(SeekFrom::Start(origin))?;
            Ok(DetectedInput {
                options: *fallback,
                header: None,
            })
        }
    }
}

/// Encode everything left in `input` into `output`
pub fn encode_stream<R, W, B>(mut input: R, output: W, backend: B, fallback: &EncodeOptions) -> Result<EncodeReport>
where
    R: Read + Seek,
    W: Write,
    B: EncodingBackend,
{
    let detected = detect_input(&mut input, fallback)?;
    let mut encoder = StreamEncoder::with_options(backend, output, detected.options);

    let copied = io::copy(&mut input, &mut encoder).map_err(Error::from_io)?;
    tracing::debug!("Read {} PCM bytes", copied);

    encoder.flush_residual()?;
    let report = EncodeReport {
        options: *encoder.options(),
        wav_header: detected.header.is_some(),
        stats: encoder.stats().clone(),
    };
    encoder.finish()?;

    tracing::info!(
        "Encoded {} samples into {} bytes",
        report.stats.samples_encoded,
        report.stats.bytes_produced
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::mock::{Call, RecordingBackend, RESIDUAL};
    use crate::codec::ChannelMode;
    use crate::error::CodecError;
    use std::io::Cursor;

    fn wav(sample_rate: u32, channels: u16, data: &[u8], big_endian: bool) -> Vec<u8> {
        let mut bytes = WavHeader::pcm16(sample_rate, channels, data.len() as u32, big_endian).to_bytes().to_vec();
        bytes.extend_from_slice(data);
        bytes
    }

    #[test]
    fn test_wav_input_end_to_end() {
        let data = vec![0u8; 320_000];
        let input = Cursor::new(wav(16000, 1, &data, false));
        let backend = RecordingBackend::new();
        let mut output = Vec::new();

        let report = encode_stream(input, &mut output, backend.clone(), &EncodeOptions::default()).unwrap();

        assert!(report.wav_header);
        assert_eq!(report.options.in_sample_rate, 16000);
        assert_eq!(report.options.out_sample_rate, 16000);
        assert_eq!(report.stats.samples_encoded, 160_000);
        assert_eq!(report.stats.dropped_bytes, 0);
        assert!(output.ends_with(RESIDUAL));
        assert_eq!(output.len() as u64, report.stats.bytes_produced);
        assert!(backend.calls().contains(&Call::SetInSampleRate(16000)));
        assert!(backend.calls().contains(&Call::SetMode(ChannelMode::Mono)));
    }

    #[test]
    fn test_headerless_input_is_rewound() {
        let pcm: Vec<u8> = (1..=8u8).collect();
        let mut input = Cursor::new(pcm);

        let detected = detect_input(&mut input, &EncodeOptions::default()).unwrap();
        assert!(detected.header.is_none());
        assert_eq!(detected.options, EncodeOptions::default());
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn test_headerless_samples_start_at_first_byte() {
        let pcm = vec![0x01, 0x00, 0x02, 0x00, 0x03, 0x00];
        let backend = RecordingBackend::new();

        let report = encode_stream(Cursor::new(pcm), Vec::new(), backend.clone(), &EncodeOptions::default()).unwrap();

        assert!(!report.wav_header);
        assert_eq!(report.options.in_sample_rate, 24000);
        let samples: Vec<i16> = backend
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::EncodeMono { left, .. } => Some(left),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(samples, vec![1, 2, 3]);
    }

    #[test]
    fn test_detect_rewinds_to_origin() {
        let mut bytes = vec![0xAA; 10];
        bytes.extend_from_slice(b"OggS and more bytes than a header needs, padding padding");
        let mut input = Cursor::new(bytes);
        input.set_position(10);

        let detected = detect_input(&mut input, &EncodeOptions::default()).unwrap();
        assert!(detected.header.is_none());
        assert_eq!(input.position(), 10);
    }

    #[test]
    fn test_rifx_input_is_big_endian() {
        let data = [0x00, 0x01, 0x00, 0x02, 0x01, 0x00, 0x02, 0x00];
        let input = Cursor::new(wav(22050, 2, &data, true));
        let backend = RecordingBackend::new();

        let report = encode_stream(input, Vec::new(), backend.clone(), &EncodeOptions::default()).unwrap();

        assert!(report.options.in_big_endian);
        assert!(backend.calls().contains(&Call::EncodeInterleaved {
            samples: vec![1, 2, 256, 512],
            capacity: crate::audio::sample::bound_for_estimate(4),
        }));
    }

    #[test]
    fn test_header_keeps_fallback_quality() {
        let mut input = Cursor::new(wav(8000, 1, &[0; 4], false));
        let fallback = EncodeOptions {
            out_quality: 7,
            in_sample_rate: 44100,
            ..Default::default()
        };

        let detected = detect_input(&mut input, &fallback).unwrap();
        assert_eq!(detected.options.out_quality, 7);
        assert_eq!(detected.options.in_sample_rate, 8000);
        assert_eq!(input.position(), 44);
    }

    #[test]
    fn test_unsupported_header_channels_propagate() {
        let input = Cursor::new(wav(44100, 6, &[0; 24], false));
        let backend = RecordingBackend::new();

        let err = encode_stream(input, Vec::new(), backend.clone(), &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::ChannelCountUnsupported(6))));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_report_serializes() {
        let report = encode_stream(
            Cursor::new(vec![0u8; 8]),
            Vec::new(),
            RecordingBackend::new(),
            &EncodeOptions::default(),
        )
        .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["wav_header"], false);
        assert_eq!(json["stats"]["samples_encoded"], 4);
        assert_eq!(json["options"]["in_sample_rate"], 24000);
    }
}
