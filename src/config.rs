//! Dither configuration.
//!
//! Configuration can be built in code or read from TOML:
//!
//! ```toml
//! method = "lipshitz"
//! strength = 1.0
//! seed = 12345
//! ```
//!
//! Every key is optional. Without a seed, one is drawn at random when a session
//! is set up and logged at debug level, so that a run can still be reproduced.

use std::{fs, path::Path};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    method::DitherMethod,
};

/// User-facing dither settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DitherConfig {
    /// Dither algorithm.
    ///
    /// Default: `triangular_hp`.
    pub method: DitherMethod,

    /// Multiplier on the dither scale. Must be finite and non-negative.
    ///
    /// Values above 1.0 quantize to a coarser grid with proportionally louder
    /// noise. Zero passes samples through undithered.
    ///
    /// Default: 1.0.
    pub strength: f64,

    /// Generator seed for reproducible output.
    ///
    /// Default: random.
    pub seed: Option<u32>,
}

impl Default for DitherConfig {
    fn default() -> Self {
        Self {
            method: DitherMethod::default(),
            strength: Self::DEFAULT_STRENGTH,
            seed: None,
        }
    }
}

impl DitherConfig {
    /// Default dither strength: exactly one destination LSB.
    pub const DEFAULT_STRENGTH: f64 = 1.0;

    /// Creates a configuration for `method` with default strength and a random seed.
    #[must_use]
    pub fn new(method: DitherMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Sets the dither strength.
    #[must_use]
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    /// Sets the generator seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, has unknown keys, or the
    /// strength is invalid.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`from_toml`](Self::from_toml) fails.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Checks that the strength is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStrength`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.strength.is_finite() && self.strength >= 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidStrength(self.strength))
        }
    }

    /// Returns the configured seed, or draws a random one.
    #[must_use]
    pub fn resolve_seed(&self) -> u32 {
        self.seed.unwrap_or_else(|| {
            let seed = fastrand::u32(..);
            debug!("no dither seed configured, using {seed}");
            seed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = DitherConfig::from_toml("").unwrap();
        assert_eq!(config, DitherConfig::default());
        assert_eq!(config.method, DitherMethod::TriangularHighpass);
        assert_eq!(config.strength, 1.0);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn parses_all_keys() {
        let config = DitherConfig::from_toml(
            r#"
            method = "modified_e_weighted"
            strength = 0.5
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            DitherConfig::new(DitherMethod::ModifiedEWeighted)
                .with_strength(0.5)
                .with_seed(42)
        );
    }

    #[test]
    fn rejects_unknown_keys_and_methods() {
        assert!(matches!(
            DitherConfig::from_toml("shaping = true"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            DitherConfig::from_toml(r#"method = "shibata""#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn rejects_invalid_strength() {
        assert!(matches!(
            DitherConfig::from_toml("strength = -1.0"),
            Err(Error::InvalidStrength(strength)) if strength == -1.0
        ));
        assert!(
            DitherConfig::default()
                .with_strength(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(
            DitherConfig::default()
                .with_strength(f64::INFINITY)
                .validate()
                .is_err()
        );
        assert!(DitherConfig::default().with_strength(0.0).validate().is_ok());
    }

    #[test]
    fn configured_seed_is_kept() {
        let config = DitherConfig::default().with_seed(7);
        assert_eq!(config.resolve_seed(), 7);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            DitherConfig::from_file("/nonexistent/swdither.toml"),
            Err(Error::Io(_))
        ));
    }
}
