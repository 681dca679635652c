//! Command-line dithering of raw PCM streams.
//!
//! Reads interleaved little-endian samples from stdin, dithers every channel
//! independently and writes the destination format to stdout:
//!
//! ```sh
//! swdither --method lipshitz --rate 44100 --from flt --to s16 < in.f32 > out.s16
//! ```

use std::{
    io::{self, BufReader, BufWriter, ErrorKind, Read, Write},
    path::PathBuf,
    process,
};

use clap::{ArgAction, Parser};
use log::{LevelFilter, debug, error, info, warn};

use swdither::{
    ChannelDither, DitherConfig, DitherMethod, Error, Result, Sample, SampleFormat,
};

/// Interleaved frames processed per chunk.
const CHUNK_FRAMES: usize = 4096;

#[derive(Parser, Debug)]
#[command(name = "swdither", version, about, long_about = None)]
struct Args {
    /// TOML configuration file with `method`, `strength` and `seed` keys.
    /// Command-line options take precedence.
    #[arg(short, long, value_name = "FILE", env = "SWDITHER_CONFIG")]
    config: Option<PathBuf>,

    /// Dither method: rectangular, triangular, triangular_hp, lipshitz,
    /// f_weighted, modified_e_weighted, e_weighted, shibata, low_shibata or
    /// high_shibata
    #[arg(short, long)]
    method: Option<DitherMethod>,

    /// Output sample rate in Hz, used to select the noise shaping filter
    #[arg(short, long, default_value_t = 44_100)]
    rate: u32,

    /// Input sample format: s16, s32, flt or dbl
    #[arg(long, default_value = "flt")]
    from: SampleFormat,

    /// Output sample format: u8, s16, s32, flt or dbl
    #[arg(long, default_value = "s16")]
    to: SampleFormat,

    /// Dither strength multiplier, 1.0 is one LSB of the output format
    #[arg(short, long)]
    strength: Option<f64>,

    /// Noise generator seed [default: random]
    #[arg(long)]
    seed: Option<u32>,

    /// Number of interleaved channels
    #[arg(short = 'n', long, default_value_t = 2)]
    channels: usize,

    /// Increase log verbosity, may be repeated
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Samples that can be read from a little-endian byte stream.
trait WireSample: Sample {
    const SIZE: usize;

    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_wire_sample {
    ($($ty:ty),*) => {
        $(
            impl WireSample for $ty {
                const SIZE: usize = size_of::<$ty>();

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0; size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_wire_sample!(i16, i32, f32, f64);

fn init_logger(args: &Args) {
    let level = if args.quiet {
        LevelFilter::Off
    } else {
        match args.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    // RUST_LOG overrides the command-line level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(args: &Args) -> Result<DitherConfig> {
    let mut config = match &args.config {
        Some(path) => {
            debug!("reading configuration from {}", path.display());
            DitherConfig::from_file(path)?
        }
        None => DitherConfig::default(),
    };

    if let Some(method) = args.method {
        config.method = method;
    }
    if let Some(strength) = args.strength {
        config.strength = strength;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    config.validate()?;
    Ok(config)
}

/// Fills `buf` as far as the reader allows, returning the number of bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Appends `value`, in source units, to `out` in the destination layout.
fn encode(value: f64, source: SampleFormat, destination: SampleFormat, out: &mut Vec<u8>) {
    let value = value * destination.full_scale() / source.full_scale();
    match destination.packed() {
        SampleFormat::U8 => {
            let biased = (value.round_ties_even() + 128.0).clamp(0.0, 255.0);
            out.push(biased as u8);
        }
        SampleFormat::S16 => out.extend_from_slice(&i16::from_f64(value).to_le_bytes()),
        SampleFormat::S32 => out.extend_from_slice(&i32::from_f64(value).to_le_bytes()),
        SampleFormat::Flt => out.extend_from_slice(&f32::from_f64(value).to_le_bytes()),
        _ => out.extend_from_slice(&value.to_le_bytes()),
    }
}

/// Rejects pairs whose destination grid is finer than the source type can
/// store, which would round every output a second time.
fn check_conversion(source: SampleFormat, destination: SampleFormat) -> Result<()> {
    if !source.is_float() || destination.is_float() {
        return Ok(());
    }

    let precision = if source.packed() == SampleFormat::Flt {
        f32::MANTISSA_DIGITS
    } else {
        f64::MANTISSA_DIGITS
    };
    let bits = 8 * destination.bytes_per_sample() as u32;
    if bits > precision {
        return Err(Error::UnsupportedConversion {
            from: source,
            to: destination,
        });
    }

    Ok(())
}

fn dither_stream<T: WireSample>(
    dither: &mut ChannelDither,
    destination: SampleFormat,
    mut input: impl Read,
    mut output: impl Write,
) -> Result<usize> {
    let chunk_samples = CHUNK_FRAMES * dither.channels();
    let mut bytes = vec![0; chunk_samples * T::SIZE];
    let mut samples = Vec::with_capacity(chunk_samples);
    let mut quantized = Vec::with_capacity(chunk_samples);
    let mut encoded = Vec::with_capacity(chunk_samples * destination.bytes_per_sample());
    let mut total = 0;

    loop {
        let filled = read_full(&mut input, &mut bytes)?;
        let whole = filled - filled % T::SIZE;
        if whole < filled {
            warn!("ignoring {} trailing bytes of a partial sample", filled - whole);
        }
        if whole == 0 {
            break;
        }

        samples.clear();
        samples.extend(bytes[..whole].chunks_exact(T::SIZE).map(T::from_le_slice));
        quantized.clear();
        quantized.resize(samples.len(), T::default());
        dither.process_interleaved(&samples, &mut quantized)?;

        encoded.clear();
        for sample in &quantized {
            encode(sample.to_f64(), T::FORMAT, destination, &mut encoded);
        }
        output.write_all(&encoded)?;
        total += samples.len();

        if filled < bytes.len() {
            break;
        }
    }

    output.flush()?;
    Ok(total)
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let source = args.from.packed();
    let destination = args.to.packed();
    check_conversion(source, destination)?;

    let mut dither = ChannelDither::new(&config, args.channels, args.rate, source, destination)?;
    info!(
        "dithering {} channels of {source} to {destination} at {} Hz with {} dither",
        args.channels,
        args.rate,
        dither.method()
    );

    let input = BufReader::new(io::stdin().lock());
    let output = BufWriter::new(io::stdout().lock());
    let total = match source {
        SampleFormat::S16 => dither_stream::<i16>(&mut dither, destination, input, output),
        SampleFormat::S32 => dither_stream::<i32>(&mut dither, destination, input, output),
        SampleFormat::Flt => dither_stream::<f32>(&mut dither, destination, input, output),
        SampleFormat::Dbl => dither_stream::<f64>(&mut dither, destination, input, output),
        other => Err(Error::UnsupportedFormat(other)),
    }?;

    debug!("processed {total} samples");
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logger(&args);

    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}
