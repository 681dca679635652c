//! Dither and noise-shaping quantization for sample format conversion.
//!
//! When a resampler reduces precision, for example from 32-bit float to 16-bit
//! integer, the rounding error correlates with the signal and is heard as
//! distortion. Adding a little noise before rounding (dithering) turns that
//! error into a benign noise floor; noise shaping additionally moves the noise
//! to frequencies where hearing is least sensitive.
//!
//! # Overview
//!
//! * [`DitherSession`]: per-lane quantizer state, set up once per conversion
//! * [`ChannelDither`]: one session per channel over interleaved buffers
//! * [`DitherConfig`]: method, strength and seed, loadable from TOML
//! * [`catalog`]: the compiled-in noise shaping filters
//! * [`NoiseGenerator`]: the seeded, bit-reproducible noise source
//!
//! # Example
//!
//! ```no_run
//! use swdither::{DitherConfig, DitherMethod, DitherSession, SampleFormat};
//!
//! let config = DitherConfig::new(DitherMethod::Lipshitz).with_seed(42);
//! let mut session =
//!     DitherSession::new(&config, 44_100, SampleFormat::Flt, SampleFormat::S16)?;
//!
//! let input = [0.1_f32, 0.2, 0.3];
//! let mut output = [0.0_f32; 3];
//! session.process(&input, &mut output)?;
//! # Ok::<(), swdither::Error>(())
//! ```

pub mod catalog;
pub mod channels;
pub mod config;
pub mod dither;
pub mod error;
pub mod format;
pub mod method;
pub mod noise;
pub mod ringbuf;
pub mod sample;

pub use channels::ChannelDither;
pub use config::DitherConfig;
pub use dither::{DitherSession, Quantized, quantized};
pub use error::{Error, Result};
pub use format::SampleFormat;
pub use method::DitherMethod;
pub use noise::NoiseGenerator;
pub use sample::Sample;
