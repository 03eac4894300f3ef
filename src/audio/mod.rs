//! Audio input handling: WAV header detection and PCM sample conversion

pub mod sample;
pub mod wav;

pub use sample::{bytes_to_samples, output_buffer_bound, SampleConverter};
pub use wav::WavHeader;
