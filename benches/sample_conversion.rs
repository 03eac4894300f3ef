//! Benchmarks for PCM conversion and the encoder's per-block overhead.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mp3_stream_encoder::audio::{bytes_to_samples, output_buffer_bound, SampleConverter};
use mp3_stream_encoder::codec::{ChannelMode, EncodingBackend, StreamEncoder};
use mp3_stream_encoder::config::EncodeOptions;
use mp3_stream_encoder::error::BackendError;

/// Backend that accepts everything and emits nothing, isolating encoder cost.
struct NullBackend;

impl EncodingBackend for NullBackend {
    fn set_in_sample_rate(&mut self, _hz: u32) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_out_sample_rate(&mut self, _hz: u32) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_channel_count(&mut self, _channels: u16) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_mode(&mut self, _mode: ChannelMode) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_quality(&mut self, _quality: u8) -> Result<(), BackendError> {
        Ok(())
    }

    fn materialize_parameters(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn encode_mono(&mut self, left: &[i16], _right: &[i16], _out: &mut [u8]) -> Result<usize, BackendError> {
        black_box(left);
        Ok(0)
    }

    fn encode_interleaved(&mut self, samples: &[i16], _out: &mut [u8]) -> Result<usize, BackendError> {
        black_box(samples);
        Ok(0)
    }

    fn flush(&mut self) -> Result<Bytes, BackendError> {
        Ok(Bytes::new())
    }
}

/// Generate a 440 Hz tone as 16-bit little-endian PCM.
fn generate_pcm(frames: usize, channels: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(frames * channels * 2);
    for i in 0..frames {
        let sample = ((2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin() * 16000.0) as i16;
        for _ in 0..channels {
            buf.extend_from_slice(&sample.to_le_bytes());
        }
    }
    buf
}

fn bench_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("bytes_to_samples");
    for frames in [1024usize, 8192, 48000] {
        let pcm = generate_pcm(frames, 2);
        group.throughput(Throughput::Bytes(pcm.len() as u64));

        group.bench_with_input(BenchmarkId::new("allocating", frames), &pcm, |b, pcm| {
            b.iter(|| bytes_to_samples(black_box(pcm), false))
        });

        let mut converter = SampleConverter::new(true);
        group.bench_with_input(BenchmarkId::new("reused_big_endian", frames), &pcm, |b, pcm| {
            b.iter(|| converter.convert(black_box(pcm)).len())
        });
    }
    group.finish();
}

fn bench_buffer_bound(c: &mut Criterion) {
    c.bench_function("output_buffer_bound", |b| {
        b.iter(|| output_buffer_bound(black_box(8192), black_box(44100), black_box(22050), 2, 1))
    });
}

fn bench_encode_block(c: &mut Criterion) {
    let pcm = generate_pcm(4096, 2);
    let options = EncodeOptions {
        in_sample_rate: 48000,
        in_channels: 2,
        ..Default::default()
    };
    let mut encoder = StreamEncoder::with_options(NullBackend, std::io::sink(), options);

    let mut group = c.benchmark_group("stream_encoder");
    group.throughput(Throughput::Bytes(pcm.len() as u64));
    group.bench_function("encode_4096_stereo_frames", |b| {
        b.iter(|| encoder.encode(black_box(&pcm)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_conversion, bench_buffer_bound, bench_encode_block);
criterion_main!(benches);
