// THEORY:
// `PixelGrid` is the single owned image buffer used on both sides of the stencil pass.
// Pixels live in one contiguous, row-major `Vec<Pixel>`; the pixel at `(row, col)` sits
// at `row * width + col`. There is no per-row allocation.
//
// During the parallel phase the source grid is only ever borrowed immutably, and the
// destination grid is carved into `RowBand`s: disjoint `&mut` slices covering whole rows.
// A band only exposes its own rows, so a worker holding one cannot write anywhere else.

use crate::core_modules::partition::Range;
use crate::core_modules::pixel::pixel::{Byte, CHANNELS, ENCODED_CHANNELS, Pixel};
use crate::error::{Result, StencilError};
use std::mem;

/// An owned `width x height` grid of RGB pixels in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    /// Wraps an existing pixel vector, checking it matches the dimensions.
    pub fn new(width: usize, height: usize, pixels: Vec<Pixel>) -> Result<Self> {
        let expected = area(width, height)?;
        if pixels.len() != expected {
            return Err(StencilError::DimensionMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Allocates a grid with every pixel set to `fill`.
    pub fn filled(width: usize, height: usize, fill: Pixel) -> Result<Self> {
        let len = area(width, height)?;
        let mut pixels = reserve::<Pixel>(len)?;
        pixels.resize(len, fill);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A black grid of the same shape, used as a stencil destination.
    pub fn allocate_like(&self) -> Result<Self> {
        Self::filled(self.width, self.height, Pixel::default())
    }

    /// Builds a grid from tightly packed RGB bytes.
    pub fn from_rgb_bytes(width: usize, height: usize, bytes: &[Byte]) -> Result<Self> {
        let len = area(width, height)?;
        let expected_bytes = len.saturating_mul(CHANNELS);
        if bytes.len() != expected_bytes {
            return Err(StencilError::DimensionMismatch {
                expected: len,
                actual: bytes.len() / CHANNELS,
            });
        }
        let mut pixels = reserve::<Pixel>(len)?;
        pixels.extend(
            bytes
                .chunks_exact(CHANNELS)
                .map(|rgb| Pixel::new(rgb[0], rgb[1], rgb[2])),
        );
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Flattens to RGBA bytes with alpha fixed at fully opaque.
    pub fn to_rgba_bytes(&self) -> Result<Vec<Byte>> {
        let mut bytes = reserve::<Byte>(self.pixels.len().saturating_mul(ENCODED_CHANNELS))?;
        for pixel in &self.pixels {
            bytes.extend_from_slice(&pixel.to_rgba());
        }
        Ok(bytes)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.height && col < self.width);
        row * self.width + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &Pixel {
        &self.pixels[self.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, pixel: Pixel) {
        let index = self.index(row, col);
        self.pixels[index] = pixel;
    }

    pub fn row(&self, row: usize) -> &[Pixel] {
        let start = row * self.width;
        &self.pixels[start..start + self.width]
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<Pixel> {
        self.pixels
    }

    /// Splits the grid into one mutable band per row range.
    ///
    /// `ranges` must be increasing, non-overlapping and inside `[0, height)`, which is
    /// exactly what `partition(height, ..)` returns. Rows not named by any range are
    /// left out of every band.
    pub fn row_bands_mut(&mut self, ranges: &[Range]) -> Vec<RowBand<'_>> {
        let width = self.width;
        let height = self.height;
        let mut rest: &mut [Pixel] = &mut self.pixels;
        let mut consumed = 0;
        let mut bands = Vec::with_capacity(ranges.len());

        for &rows in ranges {
            assert!(
                rows.start >= consumed && rows.end <= height,
                "row band {rows:?} overlaps a previous band or leaves the grid"
            );
            let (_, tail) = mem::take(&mut rest).split_at_mut((rows.start - consumed) * width);
            let (band, tail) = tail.split_at_mut(rows.len() * width);
            bands.push(RowBand {
                rows,
                width,
                pixels: band,
            });
            rest = tail;
            consumed = rows.end;
        }

        bands
    }
}

/// Exclusive write access to a contiguous run of whole rows of a `PixelGrid`.
#[derive(Debug)]
pub struct RowBand<'a> {
    rows: Range,
    width: usize,
    pixels: &'a mut [Pixel],
}

impl RowBand<'_> {
    /// The absolute rows this band covers.
    pub fn rows(&self) -> Range {
        self.rows
    }

    /// Mutable access to absolute row `row`, which must be inside this band.
    pub fn row_mut(&mut self, row: usize) -> &mut [Pixel] {
        assert!(
            self.rows.contains(row),
            "row {row} is outside band {:?}",
            self.rows
        );
        let start = (row - self.rows.start) * self.width;
        &mut self.pixels[start..start + self.width]
    }
}

fn area(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .ok_or(StencilError::AllocationFailure { bytes: usize::MAX })
}

fn reserve<T>(len: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| StencilError::AllocationFailure {
            bytes: len.saturating_mul(mem::size_of::<T>()),
        })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(width: usize, height: usize) -> PixelGrid {
        let pixels = (0..width * height)
            .map(|i| Pixel::gray((i % 256) as u8))
            .collect();
        PixelGrid::new(width, height, pixels).unwrap()
    }

    #[test]
    fn row_major_indexing() {
        let grid = numbered(4, 3);
        assert_eq!(grid.index(2, 1), 9);
        assert_eq!(*grid.get(2, 1), Pixel::gray(9));
        assert_eq!(grid.row(1), &grid.pixels()[4..8]);
    }

    #[test]
    fn new_rejects_wrong_length() {
        let err = PixelGrid::new(3, 3, vec![Pixel::default(); 8]).unwrap_err();
        assert!(matches!(
            err,
            StencilError::DimensionMismatch {
                expected: 9,
                actual: 8
            }
        ));
    }

    #[test]
    fn rgb_bytes_round_trip_to_rgba() {
        let grid = PixelGrid::from_rgb_bytes(2, 1, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(*grid.get(0, 1), Pixel::new(4, 5, 6));
        assert_eq!(grid.to_rgba_bytes().unwrap(), vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert!(PixelGrid::from_rgb_bytes(2, 2, &[0; 6]).is_err());
    }

    #[test]
    fn bands_are_disjoint_and_cover_their_rows() {
        let mut grid = PixelGrid::filled(3, 5, Pixel::default()).unwrap();
        let ranges = [Range::new(0, 2), Range::new(2, 4), Range::new(4, 5)];
        for (i, mut band) in grid.row_bands_mut(&ranges).into_iter().enumerate() {
            for row in band.rows().indices() {
                band.row_mut(row).fill(Pixel::gray(i as u8 + 1));
            }
        }
        let levels: Vec<u8> = (0..5).map(|row| grid.get(row, 2).red).collect();
        assert_eq!(levels, vec![1, 1, 2, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "outside band")]
    fn band_refuses_foreign_rows() {
        let mut grid = PixelGrid::filled(2, 4, Pixel::default()).unwrap();
        let mut bands = grid.row_bands_mut(&[Range::new(0, 2), Range::new(2, 4)]);
        bands[0].row_mut(2);
    }

    #[test]
    fn empty_grid_is_allowed() {
        let grid = PixelGrid::filled(0, 0, Pixel::default()).unwrap();
        assert!(grid.is_empty());
        assert!(grid.to_rgba_bytes().unwrap().is_empty());
    }

    #[test]
    fn overflowing_area_is_an_allocation_failure() {
        match PixelGrid::filled(usize::MAX, 2, Pixel::default()) {
            Err(StencilError::AllocationFailure { bytes }) => assert_eq!(bytes, usize::MAX),
            other => panic!("expected AllocationFailure, got {other:?}"),
        }
    }

    #[test]
    fn unreservable_buffer_is_an_allocation_failure() {
        let len = usize::MAX / 8;
        match PixelGrid::filled(len, 1, Pixel::default()) {
            Err(StencilError::AllocationFailure { bytes }) => {
                assert_eq!(bytes, len * mem::size_of::<Pixel>());
            }
            other => panic!("expected AllocationFailure, got {other:?}"),
        }
    }
}
