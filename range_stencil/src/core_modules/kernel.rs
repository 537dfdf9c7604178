// THEORY:
// A `StencilKernel` computes one destination pixel from the source grid around a
// coordinate. Kernels only ever receive `&PixelGrid`, so they can read any row,
// including halo rows owned by other workers, but cannot write.
//
// `BoxBlur` is the mean filter. Its neighborhood is the square of side `2 * radius + 1`
// centered on the pixel, clipped to the grid: cells past an edge are skipped, never
// wrapped or padded. The divisor is the number of cells that survived clipping, so a
// corner of a 3x3 blur averages 4 pixels and an edge pixel averages 6.

use crate::core_modules::pixel::pixel::{ChannelSum, Pixel};
use crate::core_modules::pixel_grid::PixelGrid;

pub trait StencilKernel: Sync {
    /// Produces the destination pixel for `(row, col)`.
    fn apply(&self, source: &PixelGrid, row: usize, col: usize) -> Pixel;
}

/// Square mean filter over the in-bounds neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxBlur {
    radius: usize,
}

impl Default for BoxBlur {
    /// The 3x3 box.
    fn default() -> Self {
        Self { radius: 1 }
    }
}

impl BoxBlur {
    pub fn with_radius(radius: usize) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Side length of the unclipped neighborhood, saturating at `usize::MAX`.
    pub fn span(&self) -> usize {
        self.radius.saturating_mul(2).saturating_add(1)
    }
}

impl StencilKernel for BoxBlur {
    fn apply(&self, source: &PixelGrid, row: usize, col: usize) -> Pixel {
        let rows = row.saturating_sub(self.radius)..reach(row, self.radius, source.height());
        let cols = col.saturating_sub(self.radius)..reach(col, self.radius, source.width());

        let mut sum = ChannelSum::default();
        for y in rows {
            for pixel in &source.row(y)[cols.clone()] {
                sum.add(pixel);
            }
        }
        sum.average()
    }
}

/// Exclusive upper bound of a neighborhood, clipped to `extent`.
fn reach(center: usize, radius: usize, extent: usize) -> usize {
    center.saturating_add(radius).saturating_add(1).min(extent)
}

/// Copies the source pixel unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl StencilKernel for Identity {
    fn apply(&self, source: &PixelGrid, row: usize, col: usize) -> Pixel {
        *source.get(row, col)
    }
}

impl<F> StencilKernel for F
where
    F: Fn(&PixelGrid, usize, usize) -> Pixel + Sync,
{
    fn apply(&self, source: &PixelGrid, row: usize, col: usize) -> Pixel {
        self(source, row, col)
    }
}
