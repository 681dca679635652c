//! Error types for dither session setup and sample processing.
//!
//! Only configuration and caller contract violations are errors. A noise
//! shaping filter that is unavailable at the requested rate is not: the
//! session falls back to triangular high-pass dither and logs a warning.
//! Likewise, a format pair without a conversion scale is not an error but
//! yields undithered passthrough output.

use thiserror::Error;

use crate::format::SampleFormat;

/// Errors that can occur while configuring or running a dither session.
#[derive(Error, Debug)]
pub enum Error {
    /// Dither strength was negative, infinite or NaN.
    #[error("dither strength must be a finite, non-negative number, got {0}")]
    InvalidStrength(f64),

    /// Output sample rate was zero.
    #[error("output sample rate must be positive")]
    InvalidSampleRate,

    /// Channel count was zero.
    #[error("channel count must be at least one")]
    InvalidChannels,

    /// Input and output buffers differ in length.
    #[error("buffer length mismatch: {input} input samples, {output} output slots")]
    LengthMismatch { input: usize, output: usize },

    /// Sample type does not match the representation the session was set up for.
    #[error("sample type {actual} does not match session format {expected}")]
    FormatMismatch {
        expected: SampleFormat,
        actual: SampleFormat,
    },

    /// Format has no quantizer representation and cannot be a source.
    #[error("sample format {0} cannot be dithered as a source")]
    UnsupportedFormat(SampleFormat),

    /// Source type has too few significant bits to hold the destination grid.
    #[error("{from} samples are too coarse to carry the {to} grid")]
    UnsupportedConversion { from: SampleFormat, to: SampleFormat },

    /// Unrecognized dither method name.
    #[error("unknown dither method: {0}")]
    UnknownMethod(String),

    /// Unrecognized sample format name.
    #[error("unknown sample format: {0}")]
    UnknownFormat(String),

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for dither operations.
pub type Result<T> = std::result::Result<T, Error>;
