//! MP3 Encoder Application
//!
//! Encodes a WAV or headerless PCM file to MP3 with libmp3lame.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mp3_stream_encoder::{
    codec::LameBackend,
    config::{AppConfig, EncodeOptions},
    pipeline::encode_stream,
};

#[derive(Parser, Debug)]
#[command(name = "mp3enc")]
#[command(about = "Encode WAV or raw 16-bit PCM to MP3")]
struct Args {
    /// Input WAV or headerless PCM file
    #[arg(short, long)]
    input: PathBuf,

    /// Output MP3 file
    #[arg(short, long)]
    output: PathBuf,

    /// Headerless input is big-endian
    #[arg(long, overrides_with = "no_in_big_endian")]
    in_big_endian: bool,

    /// Headerless input is little-endian, even if the config says otherwise
    #[arg(long, overrides_with = "in_big_endian")]
    no_in_big_endian: bool,

    /// Headerless input sample rate in Hz [default: 24000]
    #[arg(long)]
    in_sample_rate: Option<u32>,

    /// Headerless input channel count [default: 1]
    #[arg(long)]
    in_channels: Option<u16>,

    /// Headerless input bits per sample [default: 16]
    #[arg(long)]
    in_bits: Option<u16>,

    /// Output sample rate in Hz, 0 keeps the input rate
    #[arg(long)]
    out_sample_rate: Option<u32>,

    /// Output channel count, 0 keeps the input layout
    #[arg(long)]
    out_channels: Option<u16>,

    /// Encoding quality, 0 is best and 9 is worst
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=9))]
    quality: Option<u8>,

    /// TOML config file with default PCM options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print an encode report as JSON on stdout
    #[arg(long)]
    report: bool,
}

impl Args {
    /// Byte order requested on the command line; the last flag wins
    fn big_endian(&self) -> Option<bool> {
        match (self.in_big_endian, self.no_in_big_endian) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Layer the command line over the configured defaults
    fn apply(&self, base: EncodeOptions) -> EncodeOptions {
        EncodeOptions {
            in_big_endian: self.big_endian().unwrap_or(base.in_big_endian),
            in_sample_rate: self.in_sample_rate.unwrap_or(base.in_sample_rate),
            in_channels: self.in_channels.unwrap_or(base.in_channels),
            in_bits_per_sample: self.in_bits.unwrap_or(base.in_bits_per_sample),
            out_sample_rate: self.out_sample_rate.unwrap_or(base.out_sample_rate),
            out_channels: self.out_channels.unwrap_or(base.out_channels),
            out_quality: self.quality.unwrap_or(base.out_quality),
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so --report output stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path).with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::load(),
    };
    let fallback = args.apply(config.pcm);
    fallback.validate().context("invalid PCM options")?;

    let input = File::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?;
    let output = File::create(&args.output).with_context(|| format!("creating {}", args.output.display()))?;

    tracing::info!("Encoding {} -> {}", args.input.display(), args.output.display());

    let backend = LameBackend::new().context("initializing libmp3lame")?;
    let report = encode_stream(BufReader::new(input), BufWriter::new(output), backend, &fallback)
        .with_context(|| format!("encoding {}", args.input.display()))?;

    tracing::info!(
        "Done: {} bytes in, {} bytes out (ratio {:.1})",
        report.stats.input_bytes,
        report.stats.bytes_produced,
        report.stats.compression_ratio()
    );

    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
