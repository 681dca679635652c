//! Deterministic noise for dithering.
//!
//! Noise comes from a 32-bit linear congruential generator so that a given
//! seed reproduces the exact same dither on every platform. Only wrapping
//! integer arithmetic and IEEE-754 double division are involved.
//!
//! Three shapes are derived from the raw draws:
//! * Rectangular: one draw, uniform over [-0.5, 0.5]
//! * Triangular: difference of two draws, triangular over (-1, 1)
//! * High-passed triangular: a second-difference over consecutive triangular
//!   values, normalized by √6 to keep the variance of the triangular source

/// LCG multiplier.
pub const LCG_MULTIPLIER: u32 = 1_664_525;

/// LCG increment.
pub const LCG_INCREMENT: u32 = 1_013_904_223;

/// √6, the gain of the `[-1, 2, -1]` high-pass kernel.
pub const SQRT_6: f64 = 2.449_489_742_783_178;

/// Applies the `[-1, 2, -1] / √6` high-pass kernel to three consecutive values.
#[inline]
#[must_use]
pub fn highpass(window: [f64; 3]) -> f64 {
    (-window[0] + 2.0 * window[1] - window[2]) / SQRT_6
}

/// Linear congruential noise source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoiseGenerator {
    seed: u32,
}

impl NoiseGenerator {
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Current generator state.
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Advances the state once and maps it onto [0.0, 1.0].
    #[inline]
    pub fn draw(&mut self) -> f64 {
        self.seed = self
            .seed
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        f64::from(self.seed) / f64::from(u32::MAX)
    }

    /// Rectangular PDF noise, one draw.
    #[inline]
    pub fn rectangular(&mut self) -> f64 {
        self.draw() - 0.5
    }

    /// Triangular PDF noise, two draws.
    #[inline]
    pub fn triangular(&mut self) -> f64 {
        let first = self.draw();
        first - self.draw()
    }
}

/// Streaming version of the high-passed triangular noise.
///
/// Keeps the two previous triangular values, so that sample `i` sees the same
/// `[s[i], s[i+1], s[i+2]]` window as a bulk fill started from the same seed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighpassNoise {
    window: Option<[f64; 2]>,
}

impl HighpassNoise {
    #[must_use]
    pub const fn new() -> Self {
        Self { window: None }
    }

    /// Draws the next high-passed value, priming the window on first use.
    pub fn next(&mut self, generator: &mut NoiseGenerator) -> f64 {
        let [first, second] = match self.window {
            Some(window) => window,
            None => [generator.triangular(), generator.triangular()],
        };
        let third = generator.triangular();
        self.window = Some([second, third]);
        highpass([first, second, third])
    }

    /// Forgets the primed window.
    pub fn reset(&mut self) {
        self.window = None;
    }
}
