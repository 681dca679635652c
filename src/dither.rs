//! Dither sessions: noise injection and noise-shaped quantization.
//!
//! A [`DitherSession`] quantizes one lane of samples onto the grid of a lower
//! precision destination format. It is set up once per conversion from a
//! [`DitherConfig`], the output sample rate and the source and destination
//! formats, and is then driven sample by sample or slice by slice.
//!
//! # Scaling
//!
//! Samples are read and written in the source representation. The session
//! scale is the size of one destination LSB in source units (see
//! [`SampleFormat::conversion_scale`]) times the dither strength. Quantization
//! happens in LSB units: the sample is divided by the scale, dithered, rounded
//! and multiplied back, so the output lies exactly on the destination grid and
//! a later format conversion is lossless.
//!
//! That holds as long as the source type has at least as many significant
//! bits as the destination. An `f32` source carries 24, so for an `s32`
//! destination grid points above 2^24 LSB are rounded again when stored, and
//! the error history does not see that second rounding.
//!
//! A scale of zero, from an unsupported format pair or a zero strength, turns
//! the quantizer into a passthrough.
//!
//! # Noise shaping
//!
//! Shaping methods keep a history of past quantization errors and subtract
//! their FIR-filtered sum from each sample before rounding. This moves the
//! error spectrum towards less audible frequencies. When the catalog has no
//! filter for the method at the output rate, the session falls back to
//! triangular high-pass dither and logs a warning.

use log::{debug, warn};

use crate::{
    catalog::{self, MAX_TAPS},
    config::DitherConfig,
    error::{Error, Result},
    format::SampleFormat,
    method::DitherMethod,
    noise::{self, HighpassNoise, NoiseGenerator},
    ringbuf::ErrorHistory,
    sample::Sample,
};

/// Extra scratch values drawn by a bulk fill for the high-pass window.
const LOOKAHEAD: usize = 2;

/// Quantization state for one lane of samples.
#[derive(Clone, Debug)]
pub struct DitherSession {
    /// Effective method, after any fallback
    method: DitherMethod,
    /// Requested shaping method that had no filter at this rate
    fallback: Option<DitherMethod>,
    source: SampleFormat,
    destination: SampleFormat,
    sample_rate: u32,
    /// Destination LSB in source units, times the dither strength
    scale: f64,
    /// `1 / scale`, or zero when `scale` is zero
    inverse_scale: f64,
    taps: usize,
    coefficients: [f32; MAX_TAPS],
    history: ErrorHistory<MAX_TAPS>,
    generator: NoiseGenerator,
    highpass: HighpassNoise,
}

impl DitherSession {
    /// Sets up a session for converting `source` samples to `destination` at
    /// `sample_rate` Hz.
    ///
    /// Planar formats are treated like their packed counterparts. The seed is
    /// taken from `config` or drawn at random.
    ///
    /// # Errors
    ///
    /// Returns an error if the strength is invalid, or so extreme that the
    /// quantization step overflows, or if `sample_rate` is zero.
    pub fn new(
        config: &DitherConfig,
        sample_rate: u32,
        source: SampleFormat,
        destination: SampleFormat,
    ) -> Result<Self> {
        let mut session = Self {
            method: config.method,
            fallback: None,
            source: source.packed(),
            destination: destination.packed(),
            sample_rate,
            scale: 0.0,
            inverse_scale: 0.0,
            taps: 0,
            coefficients: [0.0; MAX_TAPS],
            history: ErrorHistory::new(),
            generator: NoiseGenerator::new(0),
            highpass: HighpassNoise::new(),
        };
        session.reinitialize(config, sample_rate, source, destination)?;
        Ok(session)
    }

    /// Resets the session for a new conversion setup.
    ///
    /// Clears the error history and reseeds the generator. On error the session
    /// is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStrength`] if the strength is invalid or the
    /// resulting step or its reciprocal is not a normal float, and
    /// [`Error::InvalidSampleRate`] if `sample_rate` is zero.
    pub fn reinitialize(
        &mut self,
        config: &DitherConfig,
        sample_rate: u32,
        source: SampleFormat,
        destination: SampleFormat,
    ) -> Result<()> {
        config.validate()?;
        if sample_rate == 0 {
            return Err(Error::InvalidSampleRate);
        }

        let source = source.packed();
        let destination = destination.packed();
        let scale = SampleFormat::conversion_scale(source, destination) * config.strength;
        // Subnormal or overflowing steps break the LSB arithmetic.
        if scale != 0.0 && !(scale.is_normal() && scale.recip().is_normal()) {
            return Err(Error::InvalidStrength(config.strength));
        }

        let requested = config.method;
        let filter = if requested.is_noise_shaping() {
            catalog::lookup(requested, f64::from(sample_rate))
        } else {
            None
        };

        self.fallback = None;
        self.method = requested;
        if requested.is_noise_shaping() && filter.is_none() {
            warn!(
                "{requested} noise shaping is not available at {sample_rate} Hz, \
                 using triangular high-pass dither"
            );
            self.method = DitherMethod::TriangularHighpass;
            self.fallback = Some(requested);
        }

        self.coefficients.fill(0.0);
        self.taps = filter.map_or(0, |filter| {
            self.coefficients[..filter.taps()].copy_from_slice(filter.coefficients);
            filter.taps()
        });

        self.source = source;
        self.destination = destination;
        self.sample_rate = sample_rate;
        self.scale = scale;
        self.inverse_scale = if scale == 0.0 { 0.0 } else { 1.0 / scale };
        self.history.reset();
        self.generator = NoiseGenerator::new(config.resolve_seed());
        self.highpass.reset();

        debug!(
            "dither session: {} at {sample_rate} Hz, {source} to {destination}, \
             scale {scale:e}, {} taps",
            self.method, self.taps
        );
        if scale == 0.0 {
            debug!("no dither scale for {source} to {destination}, passing samples through");
        }

        Ok(())
    }

    /// Effective dither method.
    #[must_use]
    pub fn method(&self) -> DitherMethod {
        self.method
    }

    /// The shaping method that was requested but replaced by
    /// [`TriangularHighpass`](DitherMethod::TriangularHighpass), if any.
    #[must_use]
    pub fn fallback(&self) -> Option<DitherMethod> {
        self.fallback
    }

    /// Packed source format.
    #[must_use]
    pub fn source_format(&self) -> SampleFormat {
        self.source
    }

    /// Packed destination format.
    #[must_use]
    pub fn destination_format(&self) -> SampleFormat {
        self.destination
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Destination LSB in source units, times the dither strength.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Reciprocal of [`scale`](Self::scale); zero when the scale is zero.
    #[must_use]
    pub fn inverse_scale(&self) -> f64 {
        self.inverse_scale
    }

    /// Whether samples pass through undithered.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.scale == 0.0
    }

    /// Active noise shaping coefficients, empty without shaping.
    #[must_use]
    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients[..self.taps]
    }

    /// Number of active noise shaping coefficients.
    #[must_use]
    pub fn taps(&self) -> usize {
        self.taps
    }

    /// Next write index into the error history.
    #[must_use]
    pub fn history_position(&self) -> usize {
        self.history.position()
    }

    /// Quantization error recorded `age + 1` samples ago, in destination LSBs.
    ///
    /// # Panics
    ///
    /// Panics if `age` is not below [`MAX_TAPS`].
    #[must_use]
    pub fn error(&self, age: usize) -> f32 {
        self.history.get(age)
    }

    /// Current generator state.
    #[must_use]
    pub fn seed(&self) -> u32 {
        self.generator.seed()
    }

    /// Restarts the generator from `seed`, keeping filter and error history.
    pub fn reseed(&mut self, seed: u32) {
        self.generator = NoiseGenerator::new(seed);
        self.highpass.reset();
    }

    fn check_format<T: Sample>(&self) -> Result<()> {
        if T::FORMAT == self.source {
            Ok(())
        } else {
            Err(Error::FormatMismatch {
                expected: self.source,
                actual: T::FORMAT,
            })
        }
    }

    /// Fills `dst` with scaled dither noise, without shaping.
    ///
    /// Draws `dst.len() + 2` values into a scratch buffer first: rectangular
    /// for [`Rectangular`](DitherMethod::Rectangular), triangular for every
    /// other method. [`TriangularHighpass`](DitherMethod::TriangularHighpass)
    /// combines three consecutive values per output, the other methods use
    /// one. Values are multiplied by the scale and stored with the rounding
    /// rule of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormatMismatch`] if `T` is not the source representation.
    pub fn fill_dither<T: Sample>(&mut self, dst: &mut [T]) -> Result<()> {
        self.check_format::<T>()?;

        let rectangular = self.method == DitherMethod::Rectangular;
        let generator = &mut self.generator;
        let scratch: Vec<f64> = (0..dst.len() + LOOKAHEAD)
            .map(|_| {
                if rectangular {
                    generator.rectangular()
                } else {
                    generator.triangular()
                }
            })
            .collect();

        let highpass = self.method == DitherMethod::TriangularHighpass;
        for (slot, window) in dst.iter_mut().zip(scratch.windows(LOOKAHEAD + 1)) {
            let value = if highpass {
                noise::highpass([window[0], window[1], window[2]])
            } else {
                window[0]
            };
            *slot = T::from_f64(value * self.scale);
        }

        Ok(())
    }

    /// Draws the dither for one sample, in destination LSBs.
    #[inline]
    fn next_dither(&mut self) -> f64 {
        match self.method {
            DitherMethod::Rectangular => self.generator.rectangular(),
            DitherMethod::TriangularHighpass => self.highpass.next(&mut self.generator),
            method => {
                debug_assert!(
                    !method.is_noise_shaping() || self.taps > 0,
                    "{method} session has no shaping filter"
                );
                self.generator.triangular()
            }
        }
    }

    /// Dithers, shapes and quantizes one sample.
    ///
    /// The dither is drawn even in passthrough, so the generator advances by
    /// the same amount whatever the scale. Non-finite samples pass through
    /// unchanged and record a zero error, so they cannot poison the feedback.
    #[inline]
    pub fn quantize<T: Sample>(&mut self, sample: T) -> T {
        debug_assert_eq!(T::FORMAT, self.source, "sample type does not match session");

        let dither = self.next_dither();
        if self.scale == 0.0 {
            return sample;
        }

        let mut target = sample.to_f64() * self.inverse_scale;
        if self.taps > 0 {
            target -= self.history.convolve(&self.coefficients[..self.taps]);
        }
        if !target.is_finite() {
            self.history.push(0.0);
            return sample;
        }

        // The error is taken before saturation so that clipping cannot feed back.
        let quantized = (target + dither).round_ties_even();
        self.history.push((quantized - target) as f32);

        T::from_f64(quantized * self.scale)
    }

    /// Quantizes `src` into `dst`.
    ///
    /// Nothing is written unless both slices have the same length and `T` is
    /// the source representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] or [`Error::FormatMismatch`].
    pub fn process<T: Sample>(&mut self, src: &[T], dst: &mut [T]) -> Result<()> {
        if src.len() != dst.len() {
            return Err(Error::LengthMismatch {
                input: src.len(),
                output: dst.len(),
            });
        }
        self.check_format::<T>()?;

        for (slot, &sample) in dst.iter_mut().zip(src) {
            *slot = self.quantize(sample);
        }

        Ok(())
    }

    /// Quantizes `buffer` in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormatMismatch`] if `T` is not the source representation.
    pub fn process_in_place<T: Sample>(&mut self, buffer: &mut [T]) -> Result<()> {
        self.check_format::<T>()?;

        for sample in buffer {
            *sample = self.quantize(*sample);
        }

        Ok(())
    }
}

/// Wraps a sample iterator so that every sample is quantized by `session`.
///
/// # Errors
///
/// Returns [`Error::FormatMismatch`] if the item type is not the session's
/// source representation.
pub fn quantized<I>(input: I, session: DitherSession) -> Result<Quantized<I>>
where
    I: Iterator,
    I::Item: Sample,
{
    session.check_format::<I::Item>()?;
    Ok(Quantized { input, session })
}

/// Iterator adapter that quantizes samples on the fly.
#[derive(Clone, Debug)]
pub struct Quantized<I> {
    input: I,
    session: DitherSession,
}

impl<I> Quantized<I> {
    /// Returns a reference to the inner iterator.
    #[inline]
    pub fn inner(&self) -> &I {
        &self.input
    }

    /// Returns a mutable reference to the inner iterator.
    #[inline]
    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Returns the session driving the quantization.
    #[inline]
    pub fn session(&self) -> &DitherSession {
        &self.session
    }

    /// Returns the inner iterator.
    #[inline]
    pub fn into_inner(self) -> I {
        self.input
    }

    /// Returns the inner iterator and the session.
    #[inline]
    pub fn into_parts(self) -> (I, DitherSession) {
        (self.input, self.session)
    }
}

impl<I> Iterator for Quantized<I>
where
    I: Iterator,
    I::Item: Sample,
{
    type Item = I::Item;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.input
            .next()
            .map(|sample| self.session.quantize(sample))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.input.size_hint()
    }
}
