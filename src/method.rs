//! Dither methods.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Dither algorithm applied before quantization.
///
/// The first three methods only add noise. The remaining ones additionally
/// shape the quantization error with a FIR filter from the
/// [catalog](crate::catalog); they fall back to
/// [`TriangularHighpass`](Self::TriangularHighpass) when no filter exists for
/// the output sample rate. The Shibata family has no compiled-in filters and
/// always falls back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DitherMethod {
    /// Rectangular PDF noise, one LSB peak-to-peak.
    Rectangular,

    /// Triangular PDF noise, two LSB peak-to-peak.
    Triangular,

    /// Triangular PDF noise passed through a first-order high-pass.
    #[default]
    #[serde(rename = "triangular_hp")]
    TriangularHighpass,

    /// Lipshitz minimally audible noise shaping.
    Lipshitz,

    /// F-weighted noise shaping.
    FWeighted,

    /// Modified E-weighted noise shaping.
    ModifiedEWeighted,

    /// Improved E-weighted noise shaping.
    #[serde(rename = "e_weighted")]
    ImprovedEWeighted,

    /// Shibata noise shaping.
    Shibata,

    /// Shibata noise shaping with a low cutoff.
    LowShibata,

    /// Shibata noise shaping with a high cutoff.
    HighShibata,
}

impl DitherMethod {
    /// All methods, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Rectangular,
        Self::Triangular,
        Self::TriangularHighpass,
        Self::Lipshitz,
        Self::FWeighted,
        Self::ModifiedEWeighted,
        Self::ImprovedEWeighted,
        Self::Shibata,
        Self::LowShibata,
        Self::HighShibata,
    ];

    /// Whether this method feeds back quantization error.
    #[must_use]
    pub const fn is_noise_shaping(self) -> bool {
        !matches!(
            self,
            Self::Rectangular | Self::Triangular | Self::TriangularHighpass
        )
    }

    /// Configuration name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rectangular => "rectangular",
            Self::Triangular => "triangular",
            Self::TriangularHighpass => "triangular_hp",
            Self::Lipshitz => "lipshitz",
            Self::FWeighted => "f_weighted",
            Self::ModifiedEWeighted => "modified_e_weighted",
            Self::ImprovedEWeighted => "e_weighted",
            Self::Shibata => "shibata",
            Self::LowShibata => "low_shibata",
            Self::HighShibata => "high_shibata",
        }
    }
}

impl fmt::Display for DitherMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DitherMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|method| method.name() == name)
            .ok_or_else(|| Error::UnknownMethod(s.to_string()))
    }
}
