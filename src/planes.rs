//! Describes the relationship between the integral plane of the image
//! (rows and columns, origin at the top left) and the rectangle of the
//! complex plane being rendered.  The mapping is corner-inclusive:
//! the first and last pixel of each axis land exactly on the viewport
//! corners, which is why a grid needs at least two pixels per side.
use num::Complex;

use errors::ParamError;

/// An axis-aligned rectangle on the complex plane.  The first corner
/// maps to pixel (0, 0) and the second to the far corner of the grid,
/// so the imaginary axis grows *downward* across the image, the same
/// direction as the row index.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    upper_left: Complex<f64>,
    lower_right: Complex<f64>,
}

impl Viewport {
    /// Constructor.  The corners must enclose a real area: the second
    /// corner strictly to the right of and below the first.  A flat or
    /// inverted rectangle is rejected here, once, rather than producing
    /// a degenerate coordinate map later.
    pub fn new(upper_left: Complex<f64>, lower_right: Complex<f64>) -> Result<Viewport, ParamError> {
        if lower_right.re <= upper_left.re || lower_right.im <= upper_left.im {
            return Err(ParamError::EmptyViewport(
                upper_left.re,
                upper_left.im,
                lower_right.re,
                lower_right.im,
            ));
        }
        Ok(Viewport {
            upper_left,
            lower_right,
        })
    }

    /// Constructor from bare coordinates, for callers holding four
    /// floats rather than two complex numbers.
    pub fn from_coords(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Viewport, ParamError> {
        Viewport::new(Complex::new(x0, y0), Complex::new(x1, y1))
    }

    /// The corner mapped to pixel (0, 0).
    pub fn upper_left(&self) -> Complex<f64> {
        self.upper_left
    }

    /// The corner mapped to the last pixel of the grid.
    pub fn lower_right(&self) -> Complex<f64> {
        self.lower_right
    }

    /// Extent along the real axis.  Always positive.
    pub fn width(&self) -> f64 {
        self.lower_right.re - self.upper_left.re
    }

    /// Extent along the imaginary axis.  Always positive.
    pub fn height(&self) -> f64 {
        self.lower_right.im - self.upper_left.im
    }
}

/// A square pixel grid laid over a viewport.  Maps each (row, column)
/// pair to the complex number at which that pixel's orbit is seeded.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PixelGrid {
    viewport: Viewport,
    size: usize,
}

impl PixelGrid {
    /// Constructor.  `size` is the width and height of the image in
    /// pixels.  Sizes below 2 are rejected: with a single pixel per
    /// axis there is no way to place both corners of the viewport.
    pub fn new(size: usize, viewport: Viewport) -> Result<PixelGrid, ParamError> {
        if size < 2 {
            return Err(ParamError::GridTooSmall(size));
        }
        Ok(PixelGrid { viewport, size })
    }

    /// The width and height of the grid in pixels.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The total number of pixels in the grid.  Used to size the
    /// image buffer up front.
    pub fn len(&self) -> usize {
        self.size * self.size
    }

    /// True for a grid with no pixels.  The constructor makes this
    /// unreachable, but clippy insists that `len` implies `is_empty`.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The viewport this grid is laid over.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Given a position on the integral plane, the complex number at
    /// that position.  Each axis interpolates linearly from the first
    /// corner at index 0 to the second corner at index `size - 1`,
    /// both endpoints exact.
    pub fn point_at(&self, row: usize, col: usize) -> Complex<f64> {
        let span = (self.size - 1) as f64;
        let tx = (col as f64) / span;
        let ty = (row as f64) / span;
        Complex::new(
            self.viewport.upper_left.re + tx * self.viewport.width(),
            self.viewport.upper_left.im + ty * self.viewport.height(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_fails_on_bad_shape() {
        assert!(Viewport::new(Complex::new(1.0, -1.0), Complex::new(-1.0, 1.0)).is_err());
        assert!(Viewport::new(Complex::new(-1.0, 1.0), Complex::new(1.0, -1.0)).is_err());
        assert!(Viewport::from_coords(0.0, 0.0, 0.0, 4.0).is_err());
        assert_eq!(
            Viewport::from_coords(2.0, 0.0, 2.0, 4.0),
            Err(ParamError::EmptyViewport(2.0, 0.0, 2.0, 4.0))
        );
    }

    #[test]
    fn viewport_passes_on_good_shape() {
        let vp = Viewport::from_coords(-2.0, -2.0, 2.0, 2.0).unwrap();
        assert_eq!(vp.width(), 4.0);
        assert_eq!(vp.height(), 4.0);
    }

    #[test]
    fn grid_rejects_degenerate_sizes() {
        let vp = Viewport::from_coords(-2.0, -2.0, 2.0, 2.0).unwrap();
        assert_eq!(PixelGrid::new(0, vp), Err(ParamError::GridTooSmall(0)));
        assert_eq!(PixelGrid::new(1, vp), Err(ParamError::GridTooSmall(1)));
        assert!(PixelGrid::new(2, vp).is_ok());
    }

    #[test]
    fn grid_corners_land_on_viewport_corners() {
        let vp = Viewport::from_coords(-2.0, -2.0, 2.0, 2.0).unwrap();
        let grid = PixelGrid::new(3, vp).unwrap();
        assert_eq!(grid.point_at(0, 0), Complex::new(-2.0, -2.0));
        assert_eq!(grid.point_at(2, 2), Complex::new(2.0, 2.0));
        assert_eq!(grid.point_at(0, 2), Complex::new(2.0, -2.0));
        assert_eq!(grid.point_at(2, 0), Complex::new(-2.0, 2.0));
    }

    #[test]
    fn grid_center_lands_on_viewport_center() {
        let vp = Viewport::from_coords(-2.0, -2.0, 2.0, 2.0).unwrap();
        let grid = PixelGrid::new(3, vp).unwrap();
        assert_eq!(grid.point_at(1, 1), Complex::new(0.0, 0.0));
    }

    #[test]
    fn grid_maps_rows_down_the_imaginary_axis() {
        let vp = Viewport::from_coords(0.0, 0.0, 4.0, 4.0).unwrap();
        let grid = PixelGrid::new(5, vp).unwrap();
        assert_eq!(grid.point_at(0, 3), Complex::new(3.0, 0.0));
        assert_eq!(grid.point_at(3, 0), Complex::new(0.0, 3.0));
        assert_eq!(grid.point_at(2, 2), Complex::new(2.0, 2.0));
    }

    #[test]
    fn grid_handles_rectangular_viewports() {
        let vp = Viewport::from_coords(-2.0, -1.0, 1.0, 1.0).unwrap();
        let grid = PixelGrid::new(4, vp).unwrap();
        assert_eq!(grid.point_at(0, 2), Complex::new(0.0, -1.0));
        assert_eq!(grid.point_at(3, 3), Complex::new(1.0, 1.0));
        assert_eq!(grid.len(), 16);
    }
}
