//! Fixed-capacity history of quantization errors for noise shaping.
//!
//! The noise shaper feeds past quantization errors through a FIR filter.
//! This buffer keeps the most recent `N` errors and exposes them by age,
//! so that coefficient `k` always lines up with the error from `k + 1`
//! samples ago.

/// A fixed-capacity ring of quantization errors.
///
/// * Writes go to [`position`](Self::position), which then advances modulo `N`
/// * Index 0 of [`get`](Self::get) is the most recent error, index 1 the one
///   before it, and so on
/// * Starts out, and resets to, all zeros at position 0
#[derive(Debug, Clone)]
pub struct ErrorHistory<const N: usize> {
    /// Past errors in write order, wrapping at `N`
    errors: [f32; N],

    /// Next write index, always below `N`
    position: usize,
}

impl<const N: usize> Default for ErrorHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ErrorHistory<N> {
    /// Number of errors the history can hold.
    pub const CAPACITY: usize = N;

    /// Creates a zeroed history.
    #[must_use]
    pub fn new() -> Self {
        const { assert!(N > 0, "error history needs at least one slot") };
        Self {
            errors: [0.0; N],
            position: 0,
        }
    }

    /// Records a new error, overwriting the oldest one.
    #[inline]
    pub fn push(&mut self, error: f32) {
        self.errors[self.position] = error;
        self.position = (self.position + 1) % N;
    }

    /// Returns the error recorded `age + 1` pushes ago.
    ///
    /// # Panics
    ///
    /// Panics if `age >= N`.
    #[inline]
    #[must_use]
    pub fn get(&self, age: usize) -> f32 {
        assert!(age < N, "age {age} exceeds history capacity {N}");
        self.errors[(self.position + N - 1 - age) % N]
    }

    /// Returns the next write index.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Convolves the most recent errors with `coefficients`.
    ///
    /// Computes `Σ coefficients[k] · get(k)` in double precision. Only as many
    /// errors as there are coefficients take part.
    ///
    /// # Panics
    ///
    /// Panics if there are more than `N` coefficients.
    #[inline]
    #[must_use]
    pub fn convolve(&self, coefficients: &[f32]) -> f64 {
        assert!(coefficients.len() <= N, "more taps than history slots");
        coefficients
            .iter()
            .enumerate()
            .map(|(age, &coefficient)| f64::from(coefficient) * f64::from(self.get(age)))
            .sum()
    }

    /// Zeroes all errors and rewinds to position 0.
    pub fn reset(&mut self) {
        self.errors.fill(0.0);
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_error_comes_first() {
        let mut history = ErrorHistory::<4>::new();
        history.push(1.0);
        history.push(2.0);
        history.push(3.0);

        assert_eq!(history.get(0), 3.0);
        assert_eq!(history.get(1), 2.0);
        assert_eq!(history.get(2), 1.0);
        assert_eq!(history.get(3), 0.0);
    }

    #[test]
    fn position_wraps_at_capacity() {
        let mut history = ErrorHistory::<3>::new();
        assert_eq!(ErrorHistory::<3>::CAPACITY, 3);
        assert_eq!(history.position(), 0);
        for expected in [1, 2, 0, 1] {
            history.push(0.5);
            assert_eq!(history.position(), expected);
        }
    }

    #[test]
    fn oldest_errors_are_overwritten() {
        let mut history = ErrorHistory::<2>::new();
        history.push(1.0);
        history.push(2.0);
        history.push(3.0);

        assert_eq!(history.get(0), 3.0);
        assert_eq!(history.get(1), 2.0);
    }

    #[test]
    fn convolution_pairs_coefficients_with_age() {
        let mut history = ErrorHistory::<8>::new();
        history.push(0.25);
        history.push(-0.5);
        history.push(1.0);

        // 2·1.0 + 4·(-0.5) + 8·0.25
        assert_eq!(history.convolve(&[2.0, 4.0, 8.0]), 2.0);
        assert_eq!(history.convolve(&[2.0]), 2.0);
        assert_eq!(history.convolve(&[]), 0.0);
    }

    #[test]
    fn reset_clears_errors_and_position() {
        let mut history = ErrorHistory::<4>::new();
        history.push(1.0);
        history.push(1.0);
        history.reset();

        assert_eq!(history.position(), 0);
        assert_eq!(history.convolve(&[1.0; 4]), 0.0);
    }

    #[test]
    #[should_panic(expected = "exceeds history capacity")]
    fn age_beyond_capacity_panics() {
        let history = ErrorHistory::<2>::new();
        let _ = history.get(2);
    }
}
