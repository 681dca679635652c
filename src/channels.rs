//! Per-channel dithering of interleaved audio.
//!
//! Error feedback must never leak between channels, so every channel gets its
//! own [`DitherSession`]. The sessions share their configuration but not their
//! seed: channel `n` starts from `seed + n · CHANNEL_SEED_STRIDE`, which keeps
//! the noise of neighbouring channels uncorrelated while staying reproducible.

use crate::{
    config::DitherConfig,
    dither::DitherSession,
    error::{Error, Result},
    format::SampleFormat,
    method::DitherMethod,
    sample::Sample,
};

/// Seed offset between consecutive channels.
pub const CHANNEL_SEED_STRIDE: u32 = 12_345_678_913_579_u64 as u32;

/// Seed for `channel` given the base seed of channel 0.
#[must_use]
pub fn channel_seed(seed: u32, channel: usize) -> u32 {
    // Truncation is fine: only the low 32 bits matter in wrapping arithmetic.
    seed.wrapping_add(CHANNEL_SEED_STRIDE.wrapping_mul(channel as u32))
}

/// Independent dither sessions for each channel of an interleaved stream.
#[derive(Clone, Debug)]
pub struct ChannelDither {
    sessions: Vec<DitherSession>,
    /// Channel of the next interleaved sample
    position: usize,
}

impl ChannelDither {
    /// Sets up one session per channel.
    ///
    /// The setup, including any noise shaping fallback warning, happens once;
    /// the other channels are copies reseeded with [`channel_seed`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannels`] for zero channels, or any error of
    /// [`DitherSession::new`].
    pub fn new(
        config: &DitherConfig,
        channels: usize,
        sample_rate: u32,
        source: SampleFormat,
        destination: SampleFormat,
    ) -> Result<Self> {
        if channels == 0 {
            return Err(Error::InvalidChannels);
        }

        let seed = config.resolve_seed();
        let config = config.clone().with_seed(seed);
        let first = DitherSession::new(&config, sample_rate, source, destination)?;

        let sessions = (0..channels)
            .map(|channel| {
                let mut session = first.clone();
                session.reseed(channel_seed(seed, channel));
                session
            })
            .collect();

        Ok(Self {
            sessions,
            position: 0,
        })
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.sessions.len()
    }

    /// Effective method, identical for every channel.
    #[must_use]
    pub fn method(&self) -> DitherMethod {
        self.sessions[0].method()
    }

    /// Session of `channel`.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    #[must_use]
    pub fn session(&self, channel: usize) -> &DitherSession {
        &self.sessions[channel]
    }

    /// Channel that the next interleaved sample belongs to.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Quantizes interleaved samples from `src` into `dst`.
    ///
    /// Slices need not hold whole frames: the channel position carries over to
    /// the next call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] or [`Error::FormatMismatch`] without
    /// writing anything.
    pub fn process_interleaved<T: Sample>(&mut self, src: &[T], dst: &mut [T]) -> Result<()> {
        if src.len() != dst.len() {
            return Err(Error::LengthMismatch {
                input: src.len(),
                output: dst.len(),
            });
        }
        let expected = self.sessions[0].source_format();
        if T::FORMAT != expected {
            return Err(Error::FormatMismatch {
                expected,
                actual: T::FORMAT,
            });
        }

        let channels = self.sessions.len();
        for (slot, &sample) in dst.iter_mut().zip(src) {
            *slot = self.sessions[self.position].quantize(sample);
            self.position = (self.position + 1) % channels;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo(method: DitherMethod) -> ChannelDither {
        let config = DitherConfig::new(method).with_seed(100);
        ChannelDither::new(&config, 2, 44_100, SampleFormat::Flt, SampleFormat::S16).unwrap()
    }

    #[test]
    fn channels_get_distinct_seeds() {
        let dither = stereo(DitherMethod::Triangular);
        assert_eq!(dither.channels(), 2);
        assert_eq!(dither.session(0).seed(), 100);
        assert_eq!(dither.session(1).seed(), 100_u32.wrapping_add(CHANNEL_SEED_STRIDE));
    }

    #[test]
    fn zero_channels_is_an_error() {
        let config = DitherConfig::default();
        assert!(matches!(
            ChannelDither::new(&config, 0, 44_100, SampleFormat::Flt, SampleFormat::S16),
            Err(Error::InvalidChannels)
        ));
    }

    #[test]
    fn interleaved_matches_separate_sessions() {
        let left: Vec<f32> = (0..64).map(|i| (i as f32 * 0.1).sin() * 0.5).collect();
        let right: Vec<f32> = (0..64).map(|i| (i as f32 * 0.3).cos() * 0.25).collect();
        let interleaved: Vec<f32> = left
            .iter()
            .zip(&right)
            .flat_map(|(&l, &r)| [l, r])
            .collect();

        let mut dither = stereo(DitherMethod::Lipshitz);
        let mut output = vec![0.0; interleaved.len()];
        dither.process_interleaved(&interleaved, &mut output).unwrap();

        for (channel, input) in [left, right].iter().enumerate() {
            let config =
                DitherConfig::new(DitherMethod::Lipshitz).with_seed(channel_seed(100, channel));
            let mut session =
                DitherSession::new(&config, 44_100, SampleFormat::Flt, SampleFormat::S16).unwrap();
            let mut expected = vec![0.0; input.len()];
            session.process(input, &mut expected).unwrap();

            let actual: Vec<f32> = output.iter().skip(channel).step_by(2).copied().collect();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn position_carries_over_partial_frames() {
        let mut whole = stereo(DitherMethod::TriangularHighpass);
        let mut split = stereo(DitherMethod::TriangularHighpass);
        let input = [0.1_f32, -0.1, 0.2, -0.2, 0.3];

        let mut expected = [0.0; 5];
        whole.process_interleaved(&input, &mut expected).unwrap();

        let mut output = [0.0; 5];
        split.process_interleaved(&input[..3], &mut output[..3]).unwrap();
        assert_eq!(split.position(), 1);
        split.process_interleaved(&input[3..], &mut output[3..]).unwrap();

        assert_eq!(output, expected);
        assert_eq!(split.position(), 1);
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let mut dither = stereo(DitherMethod::Triangular);
        let mut output = [0_i16; 2];
        assert!(matches!(
            dither.process_interleaved(&[0_i16, 0], &mut output),
            Err(Error::FormatMismatch { .. })
        ));
        let mut output = [0.0_f32; 1];
        assert!(matches!(
            dither.process_interleaved(&[0.0_f32, 0.0], &mut output),
            Err(Error::LengthMismatch { .. })
        ));
        assert_eq!(dither.position(), 0);
    }
}
