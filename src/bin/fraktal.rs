extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
extern crate fraktal;
extern crate gif;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use failure::Error;
use gif::SetParameter;
use image::png::PNGEncoder;
use image::pnm::{PNMEncoder, PNMSubtype, SampleEncoding};
use image::ColorType;
use itertools::Itertools;
use num::Complex;
use std::cmp;
use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;
use std::slice;
use std::str::FromStr;

use fraktal::{ColorGradient, FractalFunction, Frame, Renderer, Rgb, Viewport};

/// Given a string and a separator, returns the two values
/// separated by the separator.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// A specific implementation of parse_pair using a comma and expecting
/// floating point numbers.
fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

/// A color written as three comma-separated channel values, 0 to 255.
fn parse_rgb(s: &str) -> Option<Rgb> {
    let (r, g, b) = s.split(',').collect_tuple()?;
    match (u8::from_str(r), u8::from_str(g), u8::from_str(b)) {
        (Ok(r), Ok(g), Ok(b)) => Some(Rgb::new(r, g, b)),
        _ => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_rgb(s: &str, err: &str) -> Result<(), String> {
    match parse_rgb(s) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_log_level(s: &str) -> Result<(), String> {
    match log::LevelFilter::from_str(s) {
        Ok(_) => Ok(()),
        Err(_) => Err("Log level must be off, error, warn, info, debug, or trace".to_string()),
    }
}

const EXPRESSION: &str = "expression";
const OUTPUT: &str = "output";
const SIZE: &str = "size";
const ITERATIONS: &str = "iterations";
const UPPER_LEFT: &str = "upperleft";
const LOWER_RIGHT: &str = "lowerright";
const INSIDE: &str = "inside";
const OUTSIDE: &str = "outside";
const THREADS: &str = "threads";
const ZOOM: &str = "zoom";
const FRAMES: &str = "frames";
const DELAY: &str = "delay";
const LOG: &str = "log";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("fraktal")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Escape-time fractal renderer with a formula language")
        .arg(
            Arg::with_name(EXPRESSION)
                .required(true)
                .allow_hyphen_values(true)
                .help("The formula to iterate; the seed point c is added automatically"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .required(false)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("fraktal.png")
                .help("Output file; the extension picks the format (png, ppm, gif)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("512")
                .validator(|s| {
                    validate_range::<usize>(
                        &s,
                        2,
                        65_535,
                        "Could not parse image size",
                        "Image size must be between 2 and 65535",
                    )
                })
                .help("Width and height of the square output image"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("50")
                .validator(|s| {
                    validate_range::<usize>(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Iteration cap before a point is declared trapped"),
        )
        .arg(
            Arg::with_name(UPPER_LEFT)
                .required(false)
                .long(UPPER_LEFT)
                .short("u")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2,-2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse upper left corner"))
                .help("Upper left corner of the viewport"),
        )
        .arg(
            Arg::with_name(LOWER_RIGHT)
                .required(false)
                .long(LOWER_RIGHT)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("2,2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse lower right corner"))
                .help("Lower right corner of the viewport"),
        )
        .arg(
            Arg::with_name(INSIDE)
                .required(false)
                .long(INSIDE)
                .takes_value(true)
                .default_value("0,0,0")
                .validator(|s| validate_rgb(&s, "Could not parse the inside color as R,G,B"))
                .help("Color of points that never escape"),
        )
        .arg(
            Arg::with_name(OUTSIDE)
                .required(false)
                .long(OUTSIDE)
                .takes_value(true)
                .default_value("0,255,0")
                .validator(|s| validate_rgb(&s, "Could not parse the outside color as R,G,B"))
                .help("Color of points that escape at the iteration cap"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of render threads; defaults to one less than the CPU count"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .number_of_values(2)
                .allow_hyphen_values(true)
                .value_names(&["X0,Y0", "X1,Y1"])
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse zoom corner"))
                .help("Corners of a target viewport; renders an animated GIF zooming to it"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .required(false)
                .long(FRAMES)
                .short("f")
                .takes_value(true)
                .default_value("24")
                .validator(|s| {
                    validate_range::<usize>(
                        &s,
                        2,
                        1_000,
                        "Could not parse frame count",
                        "Frame count must be between 2 and 1000",
                    )
                })
                .help("Number of frames in a zoom animation"),
        )
        .arg(
            Arg::with_name(DELAY)
                .required(false)
                .long(DELAY)
                .takes_value(true)
                .default_value("125")
                .validator(|s| {
                    validate_range::<u16>(
                        &s,
                        10,
                        60_000,
                        "Could not parse frame delay",
                        "Frame delay must be between 10 and 60000 milliseconds",
                    )
                })
                .help("Delay between animation frames in milliseconds"),
        )
        .arg(
            Arg::with_name(LOG)
                .required(false)
                .long(LOG)
                .takes_value(true)
                .validator(|s| validate_log_level(&s))
                .help("Log level: off, error, warn, info, debug, or trace"),
        )
        .get_matches()
}

fn init_logging(level: Option<&str>) {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(level) = level {
        if let Ok(filter) = log::LevelFilter::from_str(level) {
            builder.filter_level(filter);
        }
    }
    builder.init();
}

fn write_png(filename: &str, frame: &Frame) -> Result<(), Error> {
    let output = File::create(filename)?;
    PNGEncoder::new(output).encode(
        frame.pixels(),
        frame.size() as u32,
        frame.size() as u32,
        ColorType::RGB(8),
    )?;
    Ok(())
}

fn write_ppm(filename: &str, frame: &Frame) -> Result<(), Error> {
    let output = File::create(filename)?;
    let mut encoder =
        PNMEncoder::new(output).with_subtype(PNMSubtype::Pixmap(SampleEncoding::Binary));
    encoder.encode(
        frame.pixels(),
        frame.size() as u32,
        frame.size() as u32,
        ColorType::RGB(8),
    )?;
    Ok(())
}

fn write_gif(filename: &str, frames: &[Frame], delay_ms: u16) -> Result<(), Error> {
    let first = match frames.first() {
        Some(first) => first,
        None => return Ok(()),
    };
    let size = first.size() as u16;
    let output = File::create(filename)?;
    let mut encoder = gif::Encoder::new(output, size, size, &[])?;
    encoder.set(gif::Repeat::Infinite)?;
    for frame in frames {
        let mut rendered = gif::Frame::from_rgb(size, size, frame.pixels());
        rendered.delay = delay_ms / 10;
        encoder.write_frame(&rendered)?;
    }
    Ok(())
}

fn write_frame(filename: &str, frame: &Frame) -> Result<(), Error> {
    match Path::new(filename).extension().and_then(OsStr::to_str) {
        Some("png") => write_png(filename, frame),
        Some("ppm") | Some("pnm") => write_ppm(filename, frame),
        Some("gif") => write_gif(filename, slice::from_ref(frame), 0),
        _ => Err(format_err!(
            "cannot tell an image format from {:?}; use .png, .ppm, or .gif",
            filename
        )),
    }
}

/// The viewports along a zoom, interpolated corner-wise with both
/// endpoints exact.  Every intermediate rectangle is valid because a
/// blend of two positive spans stays positive.
fn tween(from: Viewport, to: Viewport, steps: usize) -> Result<Vec<Viewport>, Error> {
    let mut path = Vec::with_capacity(steps);
    let span = (steps - 1) as f64;
    for step in 0..steps {
        if step == steps - 1 {
            path.push(to);
            continue;
        }
        let t = (step as f64) / span;
        let ul = lerp_complex(from.upper_left(), to.upper_left(), t);
        let lr = lerp_complex(from.lower_right(), to.lower_right(), t);
        path.push(Viewport::new(ul, lr)?);
    }
    Ok(path)
}

fn lerp_complex(a: Complex<f64>, b: Complex<f64>, t: f64) -> Complex<f64> {
    Complex {
        re: a.re + t * (b.re - a.re),
        im: a.im + t * (b.im - a.im),
    }
}

fn run() -> Result<(), Error> {
    let matches = args();
    init_logging(matches.value_of(LOG));

    let expression = matches.value_of(EXPRESSION).unwrap_or_default();
    let output = matches.value_of(OUTPUT).unwrap_or_default();
    let size = usize::from_str(matches.value_of(SIZE).unwrap_or_default())?;
    let iterations = usize::from_str(matches.value_of(ITERATIONS).unwrap_or_default())?;
    let upper_left = parse_complex(matches.value_of(UPPER_LEFT).unwrap_or_default())
        .ok_or_else(|| format_err!("could not parse the upper left corner"))?;
    let lower_right = parse_complex(matches.value_of(LOWER_RIGHT).unwrap_or_default())
        .ok_or_else(|| format_err!("could not parse the lower right corner"))?;
    let inside = parse_rgb(matches.value_of(INSIDE).unwrap_or_default())
        .ok_or_else(|| format_err!("could not parse the inside color"))?;
    let outside = parse_rgb(matches.value_of(OUTSIDE).unwrap_or_default())
        .ok_or_else(|| format_err!("could not parse the outside color"))?;
    let threads = match matches.value_of(THREADS) {
        Some(requested) => usize::from_str(requested)?,
        None => cmp::max(1, num_cpus::get() - 1),
    };

    let viewport = Viewport::new(upper_left, lower_right)?;
    let gradient = ColorGradient::new(inside, outside);
    let function = FractalFunction::compile(expression)?;
    info!(
        "rendering {:?} at {}x{}, {} iterations, {} threads",
        function.source(),
        size,
        size,
        iterations,
        threads
    );

    if let Some(zoom) = matches.values_of(ZOOM) {
        if Path::new(output).extension().and_then(OsStr::to_str) != Some("gif") {
            return Err(format_err!(
                "--zoom writes an animated GIF; use a .gif output file, not {:?}",
                output
            ));
        }
        let (near, far) = zoom
            .collect_tuple()
            .ok_or_else(|| format_err!("--zoom needs both corners of the target viewport"))?;
        let target_ul = parse_complex(near)
            .ok_or_else(|| format_err!("could not parse the zoom upper left corner"))?;
        let target_lr = parse_complex(far)
            .ok_or_else(|| format_err!("could not parse the zoom lower right corner"))?;
        let target = Viewport::new(target_ul, target_lr)?;
        let steps = usize::from_str(matches.value_of(FRAMES).unwrap_or_default())?;
        let delay = u16::from_str(matches.value_of(DELAY).unwrap_or_default())?;

        let mut frames = Vec::with_capacity(steps);
        for (index, frame_viewport) in tween(viewport, target, steps)?.into_iter().enumerate() {
            debug!("frame {} of {}", index + 1, steps);
            let renderer = Renderer::from_parts(
                function.clone(),
                size,
                iterations,
                frame_viewport,
                gradient,
            )?;
            frames.push(renderer.render(threads)?);
        }
        write_gif(output, &frames, delay)?;
        info!("wrote {} frames to {}", frames.len(), output);
    } else {
        let renderer = Renderer::from_parts(function, size, iterations, viewport, gradient)?;
        let frame = renderer.render(threads)?;
        write_frame(output, &frame)?;
        info!("wrote {}", output);
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("fraktal: {}", err);
        std::process::exit(1);
    }
}
