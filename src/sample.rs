//! Storage representations the quantizer reads from and writes to.
//!
//! Quantization works on `f64` internally. Each representation defines how a
//! working value is stored back: integers round to nearest (ties to even) and
//! saturate, floats are stored as-is.

use crate::format::SampleFormat;

/// A sample representation supported by the quantizer.
pub trait Sample: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Packed format matching this representation.
    const FORMAT: SampleFormat;

    /// Converts the sample into the working representation.
    fn to_f64(self) -> f64;

    /// Stores a working value, rounding and saturating as the representation requires.
    fn from_f64(value: f64) -> Self;
}

impl Sample for i16 {
    const FORMAT: SampleFormat = SampleFormat::S16;

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        // NaN saturates to zero
        value
            .round_ties_even()
            .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
    }
}

impl Sample for i32 {
    const FORMAT: SampleFormat = SampleFormat::S32;

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
            .round_ties_even()
            .clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    }
}

impl Sample for f32 {
    const FORMAT: SampleFormat = SampleFormat::Flt;

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Sample for f64 {
    const FORMAT: SampleFormat = SampleFormat::Dbl;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}
