// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render engine.  A `Renderer` owns a compiled formula and the
//! geometry of one image; rendering fans the rows out over a pool of
//! scoped worker threads and reassembles their bands into a `Frame`
//! of packed RGB bytes.
//!
//! The division of labor copies the shape of the problem: every pixel
//! is independent, so the grid is cut into contiguous bands of rows,
//! one band per worker.  Workers share nothing but the read-only
//! renderer and a cancel flag, and hand their finished band back when
//! joined, so the assembly step is a plain concatenation in spawn
//! order.
use crossbeam;
use num_cpus;
use std::cmp;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use errors::{Error, ParamError, RenderError};
use escape::escape_time;
use expr::FractalFunction;
use gradient::{ColorGradient, Rgb};
use planes::{PixelGrid, Viewport};

/// A cooperative cancellation handle.  Clone it, hand the clone to
/// whatever owns the stop button, and pass the original to
/// `Renderer::render_with_cancel`.  Workers poll it between rows, so
/// cancellation lands within one row's worth of work.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A fresh, unraised flag.
    pub fn new() -> CancelFlag {
        CancelFlag(Arc::new(AtomicBool::new(false)))
    }

    /// Raise the flag.  There is no way to lower it again; a flag is
    /// good for one render.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether the flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One finished image: the grid geometry it was rendered under and a
/// row-major buffer of packed RGB bytes, three per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    size: usize,
    viewport: Viewport,
    pixels: Vec<u8>,
}

impl Frame {
    /// Width and height in pixels.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The viewport the frame covers.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The packed RGB buffer, `size * size * 3` bytes in row-major
    /// order.  This is the layout every encoder in the binary wants.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The color of one pixel, mostly for inspection.
    pub fn rgb_at(&self, row: usize, col: usize) -> Rgb {
        let base = (row * self.size + col) * 3;
        Rgb::new(self.pixels[base], self.pixels[base + 1], self.pixels[base + 2])
    }
}

/// A compiled formula plus everything needed to turn it into pixels.
/// Building one validates the geometry; rendering one cannot fail for
/// any reason but a dead worker or a raised cancel flag.
#[derive(Debug, Clone)]
pub struct Renderer {
    function: FractalFunction,
    grid: PixelGrid,
    iterations: usize,
    gradient: ColorGradient,
}

impl Renderer {
    /// Compile an expression and bind it to a render geometry.
    pub fn new(
        expression: &str,
        size: usize,
        iterations: usize,
        viewport: Viewport,
        gradient: ColorGradient,
    ) -> Result<Renderer, Error> {
        let function = FractalFunction::compile(expression)?;
        let renderer = Renderer::from_parts(function, size, iterations, viewport, gradient)?;
        Ok(renderer)
    }

    /// Bind an already-compiled formula to a render geometry.  This is
    /// the entry point for animation, where one compilation serves a
    /// whole run of frames with shifting viewports.
    pub fn from_parts(
        function: FractalFunction,
        size: usize,
        iterations: usize,
        viewport: Viewport,
        gradient: ColorGradient,
    ) -> Result<Renderer, ParamError> {
        if iterations == 0 {
            return Err(ParamError::ZeroIterations);
        }
        let grid = PixelGrid::new(size, viewport)?;
        Ok(Renderer {
            function,
            grid,
            iterations,
            gradient,
        })
    }

    /// Render the whole frame on `workers` threads.
    pub fn render(&self, workers: usize) -> Result<Frame, RenderError> {
        self.render_with_cancel(workers, &CancelFlag::new())
    }

    /// Render the whole frame on `workers` threads, abandoning the
    /// run if `cancel` is raised.  On cancellation every finished
    /// block is discarded; there are no partial frames.
    pub fn render_with_cancel(
        &self,
        workers: usize,
        cancel: &CancelFlag,
    ) -> Result<Frame, RenderError> {
        if cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }
        let size = self.grid.size();
        // Clamped into [1, size]: more workers than rows buys
        // nothing, and the sum in the ceiling division must not wrap.
        let workers = cmp::min(cmp::max(1, workers), size);
        let block = (size + workers - 1) / workers;
        debug!(
            "rendering {0}x{0} grid in blocks of {1} rows",
            size, block
        );

        let joined = match crossbeam::scope(|spawner| {
            let mut handles = Vec::new();
            let mut start = 0;
            while start < size {
                let stop = cmp::min(start + block, size);
                handles.push(spawner.spawn(move |_| self.render_rows(start..stop, cancel)));
                start = stop;
            }
            let mut outcomes = Vec::with_capacity(handles.len());
            for handle in handles {
                outcomes.push(handle.join());
            }
            outcomes
        }) {
            Ok(joined) => joined,
            // Every handle was joined above, so the scope itself has
            // no unjoined panic left to report.
            Err(_) => return Err(RenderError::Worker(0)),
        };

        let mut pixels = Vec::with_capacity(self.grid.len() * 3);
        for (index, outcome) in joined.into_iter().enumerate() {
            match outcome {
                Ok(Some(band)) => pixels.extend_from_slice(&band),
                Ok(None) => return Err(RenderError::Cancelled),
                Err(_) => return Err(RenderError::Worker(index)),
            }
        }
        Ok(Frame {
            size,
            viewport: self.grid.viewport(),
            pixels,
        })
    }

    // One worker's share: a contiguous band of rows, returned as
    // packed RGB.  None means the cancel flag came up mid-band.
    fn render_rows(&self, rows: Range<usize>, cancel: &CancelFlag) -> Option<Vec<u8>> {
        let size = self.grid.size();
        let mut band = Vec::with_capacity(rows.len() * size * 3);
        for row in rows {
            if cancel.is_cancelled() {
                return None;
            }
            for col in 0..size {
                let c = self.grid.point_at(row, col);
                let result = escape_time(&self.function, c, self.iterations);
                let color = self.gradient.shade(result, self.iterations);
                band.extend_from_slice(&color.channels());
            }
        }
        Some(band)
    }
}

/// Compile, validate, and render in one call, with a worker pool
/// sized to leave one CPU free for the rest of the machine.
pub fn render(
    expression: &str,
    size: usize,
    iterations: usize,
    viewport: Viewport,
    gradient: ColorGradient,
) -> Result<Frame, Error> {
    let renderer = Renderer::new(expression, size, iterations, viewport, gradient)?;
    let workers = cmp::max(1, num_cpus::get() - 1);
    let frame = renderer.render(workers)?;
    Ok(frame)
}
