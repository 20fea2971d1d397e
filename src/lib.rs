#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time fractal renderer
//!
//! An escape-time fractal takes a point on the complex plane, seeds an
//! orbit at zero, and repeatedly applies a formula to it, asking how
//! many steps it takes for the orbit to fly off toward infinity.  The
//! points whose orbits never leave form the body of the fractal; the
//! points around them are painted by how long they held on.  With the
//! formula `z**2` this is the Mandelbrot set, but the interesting part
//! is that it does not have to be `z**2`.
//!
//! This crate lets the formula be *data*: a small arithmetic language
//! over the complex numbers, compiled through an allow-list so that an
//! expression from an untrusted hand can do arithmetic and nothing
//! else.  The constant term of the recurrence is implicit, so the
//! classic fractals are one-liners: `z**2` is the Mandelbrot set, and
//! swapping in `z**3` or `sin(z) * z` paints a different creature
//! with the same machinery.
//!
//! The pieces are exposed separately: `FractalFunction` compiles a
//! formula, `escape_time` runs one orbit, `PixelGrid` maps pixels to
//! seed points, `ColorGradient` turns outcomes into color, and
//! `Renderer` drives the whole grid across a pool of threads.  The
//! `render` function glues them together for callers who just want
//! the picture.

extern crate crossbeam;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

pub mod errors;
pub mod escape;
pub mod expr;
pub mod gradient;
pub mod planes;
pub mod render;

pub use errors::{CompileError, Error, ParamError, RenderError};
pub use escape::{escape_time, IterationResult, ESCAPE_RADIUS};
pub use expr::FractalFunction;
pub use gradient::{ColorGradient, Rgb};
pub use planes::{PixelGrid, Viewport};
pub use render::{render, CancelFlag, Frame, Renderer};
