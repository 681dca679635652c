//! Noise shaping filter catalog.
//!
//! Each entry holds the FIR coefficients applied to past quantization errors
//! for one shaping method at one sample rate. The coefficients are the widely
//! published designs for 44.1 kHz playback:
//! * Lipshitz: minimally audible shaping, 5 taps
//! * F-weighted: 9 taps following the F-weighting hearing threshold curve
//! * Modified E-weighted: gentler 9-tap E-weighted variant
//! * Improved E-weighted: aggressive 9-tap E-weighted variant
//!
//! Filters are matched with a 5% tolerance on the sample rate, so 44.1 kHz
//! designs also serve 42 to 46 kHz outputs. The table is compiled in and never
//! changes at runtime.

use crate::method::DitherMethod;

/// Largest number of taps any catalog filter may have.
pub const MAX_TAPS: usize = 20;

/// Relative sample rate deviation still accepted by [`lookup`].
pub const RATE_TOLERANCE: f64 = 0.05;

/// A noise shaping filter designed for one sample rate.
#[derive(Debug, PartialEq)]
pub struct FilterSpec {
    /// Method this filter implements.
    pub method: DitherMethod,
    /// Sample rate the filter was designed for, in Hz.
    pub rate: f64,
    /// Coefficients, most recent error first.
    pub coefficients: &'static [f32],
}

impl FilterSpec {
    /// Number of coefficients.
    #[must_use]
    pub const fn taps(&self) -> usize {
        self.coefficients.len()
    }

    /// Whether this filter implements `method` at `rate`.
    #[must_use]
    pub fn matches(&self, method: DitherMethod, rate: f64) -> bool {
        self.method == method && (rate - self.rate).abs() / self.rate <= RATE_TOLERANCE
    }
}

#[rustfmt::skip]
const LIPSHITZ_44: [f32; 5] = [2.033, -2.165, 1.959, -1.590, 0.6149];

#[rustfmt::skip]
const F_WEIGHTED_44: [f32; 9] = [
    2.412, -3.370, 3.937, -4.174, 3.353, -2.205, 1.281, -0.569, 0.0847,
];

#[rustfmt::skip]
const MODIFIED_E_WEIGHTED_44: [f32; 9] = [
    1.662, -1.263, 0.4827, -0.2913, 0.1268, -0.1124, 0.03252, -0.01265, -0.03524,
];

#[rustfmt::skip]
const IMPROVED_E_WEIGHTED_44: [f32; 9] = [
    2.847, -4.685, 6.214, -7.184, 6.639, -5.032, 3.263, -1.632, 0.4191,
];

/// All filters, in lookup order.
pub static FILTERS: &[FilterSpec] = &[
    FilterSpec {
        method: DitherMethod::Lipshitz,
        rate: 44_100.0,
        coefficients: &LIPSHITZ_44,
    },
    FilterSpec {
        method: DitherMethod::FWeighted,
        rate: 44_100.0,
        coefficients: &F_WEIGHTED_44,
    },
    FilterSpec {
        method: DitherMethod::ModifiedEWeighted,
        rate: 44_100.0,
        coefficients: &MODIFIED_E_WEIGHTED_44,
    },
    FilterSpec {
        method: DitherMethod::ImprovedEWeighted,
        rate: 44_100.0,
        coefficients: &IMPROVED_E_WEIGHTED_44,
    },
];

/// Finds the filter for `method` at `rate`.
///
/// Returns the first catalog entry, in catalog order, that implements `method`
/// and was designed for a rate within [`RATE_TOLERANCE`] of `rate`.
#[must_use]
pub fn lookup(method: DitherMethod, rate: f64) -> Option<&'static FilterSpec> {
    lookup_in(FILTERS, method, rate)
}

fn lookup_in(filters: &[FilterSpec], method: DitherMethod, rate: f64) -> Option<&FilterSpec> {
    filters.iter().find(|filter| filter.matches(method, rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_methods_have_a_filter() {
        for method in [
            DitherMethod::Lipshitz,
            DitherMethod::FWeighted,
            DitherMethod::ModifiedEWeighted,
            DitherMethod::ImprovedEWeighted,
        ] {
            assert!(lookup(method, 44_100.0).is_some(), "{method}");
        }
    }

    #[test]
    fn shibata_and_plain_methods_have_no_filter() {
        for method in DitherMethod::ALL {
            if matches!(
                method,
                DitherMethod::Shibata | DitherMethod::LowShibata | DitherMethod::HighShibata
            ) || !method.is_noise_shaping()
            {
                assert!(lookup(method, 44_100.0).is_none(), "{method}");
            }
        }
    }

    #[test]
    fn filters_fit_the_session() {
        for filter in FILTERS {
            assert!(filter.taps() > 0);
            assert!(filter.taps() <= crate::ringbuf::ErrorHistory::<MAX_TAPS>::CAPACITY);
            assert!(filter.method.is_noise_shaping());
            assert!(filter.rate > 0.0);
        }
    }

    #[test]
    fn five_percent_boundary_matches_in_both_directions() {
        // 44100 ± 2205 is exactly 5% off
        assert!(lookup(DitherMethod::Lipshitz, 46_305.0).is_some());
        assert!(lookup(DitherMethod::Lipshitz, 41_895.0).is_some());
        assert!(lookup(DitherMethod::Lipshitz, 46_306.0).is_none());
        assert!(lookup(DitherMethod::Lipshitz, 41_894.0).is_none());
    }

    #[test]
    fn common_rates() {
        assert!(lookup(DitherMethod::FWeighted, 44_100.0).is_some());
        assert!(lookup(DitherMethod::FWeighted, 48_000.0).is_none());
        assert!(lookup(DitherMethod::FWeighted, 96_000.0).is_none());
    }

    #[test]
    fn first_match_wins() {
        const FIRST: [f32; 2] = [1.0, 0.5];
        const SECOND: [f32; 1] = [0.25];
        let filters = [
            FilterSpec {
                method: DitherMethod::ImprovedEWeighted,
                rate: 48_000.0,
                coefficients: &FIRST,
            },
            FilterSpec {
                method: DitherMethod::ImprovedEWeighted,
                rate: 47_000.0,
                coefficients: &SECOND,
            },
        ];

        let found = lookup_in(&filters, DitherMethod::ImprovedEWeighted, 47_000.0).unwrap();
        assert_eq!(found.coefficients, &FIRST);
        let found = lookup_in(&filters, DitherMethod::ImprovedEWeighted, 45_000.0).unwrap();
        assert_eq!(found.coefficients, &SECOND);
        assert!(lookup_in(&filters, DitherMethod::Lipshitz, 48_000.0).is_none());
    }
}
