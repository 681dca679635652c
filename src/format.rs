//! Sample formats and the conversion scale between them.
//!
//! Formats follow the usual resampler naming: unsigned 8-bit, signed 16 and
//! 32-bit integers, 32 and 64-bit floats, each in a packed (interleaved) and a
//! planar variant. Dithering only cares about the numeric representation, so
//! planar formats are normalized to their packed counterparts before use.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Sample format of a buffer on either side of the conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    U8,
    S16,
    S32,
    #[serde(alias = "f32")]
    Flt,
    #[serde(alias = "f64")]
    Dbl,
    U8p,
    S16p,
    S32p,
    #[serde(alias = "f32p")]
    Fltp,
    #[serde(alias = "f64p")]
    Dblp,
}

impl SampleFormat {
    /// Returns the packed variant of this format.
    #[must_use]
    pub const fn packed(self) -> Self {
        match self {
            Self::U8 | Self::U8p => Self::U8,
            Self::S16 | Self::S16p => Self::S16,
            Self::S32 | Self::S32p => Self::S32,
            Self::Flt | Self::Fltp => Self::Flt,
            Self::Dbl | Self::Dblp => Self::Dbl,
        }
    }

    #[must_use]
    pub const fn is_planar(self) -> bool {
        matches!(
            self,
            Self::U8p | Self::S16p | Self::S32p | Self::Fltp | Self::Dblp
        )
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self.packed(), Self::Flt | Self::Dbl)
    }

    /// Size of one sample in bytes.
    #[must_use]
    pub const fn bytes_per_sample(self) -> usize {
        match self.packed() {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S32 | Self::Flt => 4,
            _ => 8,
        }
    }

    /// Magnitude that maps to full scale in this format.
    ///
    /// Floats are normalized to 1.0, integers to their largest power of two.
    #[must_use]
    pub const fn full_scale(self) -> f64 {
        match self.packed() {
            Self::U8 => 128.0,
            Self::S16 => 32_768.0,
            Self::S32 => 2_147_483_648.0,
            _ => 1.0,
        }
    }

    /// Returns the size of one destination LSB expressed in source units.
    ///
    /// Only the pairs a resampler dithers between are covered. Every other pair,
    /// including all float destinations, returns 0.0: the quantizer then passes
    /// samples through undithered. Callers that dither between unlisted formats
    /// get undithered output. This is deliberate and relied upon.
    #[must_use]
    pub fn conversion_scale(source: Self, destination: Self) -> f64 {
        match (source.packed(), destination.packed()) {
            (Self::Flt | Self::Dbl, Self::S32) => 1.0 / f64::from(1u32 << 31),
            (Self::Flt | Self::Dbl, Self::S16) => 1.0 / f64::from(1u32 << 15),
            (Self::Flt | Self::Dbl, Self::U8) => 1.0 / f64::from(1u32 << 7),
            (Self::S32, Self::S16) => f64::from(1u32 << 16),
            (Self::S32, Self::U8) => f64::from(1u32 << 24),
            (Self::S16, Self::U8) => f64::from(1u32 << 8),
            _ => 0.0,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::Flt => "flt",
            Self::Dbl => "dbl",
            Self::U8p => "u8p",
            Self::S16p => "s16p",
            Self::S32p => "s32p",
            Self::Fltp => "fltp",
            Self::Dblp => "dblp",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.to_ascii_lowercase().as_str() {
            "u8" => Self::U8,
            "s16" => Self::S16,
            "s32" => Self::S32,
            "flt" | "f32" => Self::Flt,
            "dbl" | "f64" => Self::Dbl,
            "u8p" => Self::U8p,
            "s16p" => Self::S16p,
            "s32p" => Self::S32p,
            "fltp" | "f32p" => Self::Fltp,
            "dblp" | "f64p" => Self::Dblp,
            _ => return Err(Error::UnknownFormat(s.to_string())),
        };
        Ok(format)
    }
}
