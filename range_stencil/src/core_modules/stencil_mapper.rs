// THEORY:
// The `StencilMapper` runs a kernel over every pixel of a source grid using one OS thread
// per output row range. It is the lock-free half of the engine:
//
// 1.  **Read-shared source**: every worker borrows the whole source grid immutably, so
//     halo rows that belong to a neighbor's write range can be read without coordination.
// 2.  **Write-disjoint destination**: the destination is split into `RowBand`s before any
//     thread starts. Each worker owns exactly one band and can only reach its own rows.
// 3.  **Scoped lifetime**: workers run on scoped threads. Every worker that was started
//     is joined before `map` returns, on the error paths too, and the destination is
//     handed back to the caller only after that.
//
// Because no pixel is written twice and the source never changes, the output does not
// depend on the worker count or on the order in which workers finish.

use crate::config::WorkerCount;
use crate::core_modules::kernel::StencilKernel;
use crate::core_modules::partition::{Range, partition};
use crate::core_modules::pixel_grid::{PixelGrid, RowBand};
use crate::core_modules::scoped::run_scoped;
use crate::error::Result;
use tracing::{debug, info};

pub struct StencilMapper {
    workers: WorkerCount,
}

impl StencilMapper {
    pub fn new(workers: WorkerCount) -> Self {
        Self { workers }
    }

    /// The row ranges `map` will hand out for a grid of `height` rows.
    pub fn plan(&self, height: usize) -> Vec<Range> {
        partition(height, self.workers)
    }

    /// Applies `kernel` to every pixel of `source`, returning a new grid of the same shape.
    pub fn map<K>(&self, source: &PixelGrid, kernel: &K) -> Result<PixelGrid>
    where
        K: StencilKernel + ?Sized,
    {
        let mut destination = source.allocate_like()?;
        let ranges = self.plan(source.height());
        if ranges.is_empty() {
            return Ok(destination);
        }

        info!(
            width = source.width(),
            height = source.height(),
            workers = ranges.len(),
            "starting stencil pass"
        );

        let bands = destination.row_bands_mut(&ranges);
        run_scoped("stencil-worker", bands, |worker, band| {
            fill_band(worker, source, kernel, band)
        })?;

        Ok(destination)
    }
}

fn fill_band<K>(worker: usize, source: &PixelGrid, kernel: &K, mut band: RowBand<'_>)
where
    K: StencilKernel + ?Sized,
{
    let rows = band.rows();
    debug!(worker, start = rows.start, end = rows.end, "stencil worker started");

    for y in rows.indices() {
        let out = band.row_mut(y);
        for (x, pixel) in out.iter_mut().enumerate() {
            *pixel = kernel.apply(source, y, x);
        }
    }

    debug!(worker, rows = rows.len(), "stencil worker finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::kernel::{BoxBlur, Identity};
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::StencilError;

    fn workers(n: usize) -> WorkerCount {
        WorkerCount::new(n).unwrap()
    }

    fn noisy(width: usize, height: usize) -> PixelGrid {
        // Deterministic xorshift noise.
        let mut state = 0x2545_f491_u32;
        let pixels = (0..width * height)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let [r, g, b, _] = state.to_le_bytes();
                Pixel::new(r, g, b)
            })
            .collect();
        PixelGrid::new(width, height, pixels).unwrap()
    }

    fn sequential_blur(source: &PixelGrid) -> PixelGrid {
        let blur = BoxBlur::default();
        let mut out = source.allocate_like().unwrap();
        for y in 0..source.height() {
            for x in 0..source.width() {
                out.set(y, x, blur.apply(source, y, x));
            }
        }
        out
    }

    #[test]
    fn output_is_partition_invariant() {
        let source = noisy(37, 23);
        let single = StencilMapper::new(workers(1))
            .map(&source, &BoxBlur::default())
            .unwrap();
        let eight = StencilMapper::new(workers(8))
            .map(&source, &BoxBlur::default())
            .unwrap();
        assert_eq!(single, eight);
        assert_eq!(single, sequential_blur(&source));
    }

    #[test]
    fn every_worker_count_matches_sequential() {
        let source = noisy(9, 7);
        let expected = sequential_blur(&source);
        for t in 1..=10 {
            let out = StencilMapper::new(workers(t))
                .map(&source, &BoxBlur::default())
                .unwrap();
            assert_eq!(out, expected, "mismatch with {t} workers");
        }
    }

    #[test]
    fn uniform_image_is_unchanged() {
        let source = PixelGrid::filled(16, 11, Pixel::new(12, 200, 99)).unwrap();
        let out = StencilMapper::new(workers(4))
            .map(&source, &BoxBlur::default())
            .unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn one_by_one_image_is_unchanged() {
        let source = PixelGrid::new(1, 1, vec![Pixel::new(3, 141, 59)]).unwrap();
        let out = StencilMapper::new(workers(8))
            .map(&source, &BoxBlur::default())
            .unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn halo_rows_are_read_across_band_boundaries() {
        // Two rows, two workers: each worker's only row needs the other's row.
        let source = PixelGrid::new(1, 2, vec![Pixel::gray(0), Pixel::gray(100)]).unwrap();
        let out = StencilMapper::new(workers(2))
            .map(&source, &BoxBlur::default())
            .unwrap();
        assert_eq!(out.pixels(), &[Pixel::gray(50), Pixel::gray(50)]);
    }

    #[test]
    fn empty_grid_spawns_nothing() {
        let source = PixelGrid::filled(5, 0, Pixel::default()).unwrap();
        let out = StencilMapper::new(workers(3)).map(&source, &Identity).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn worker_panic_is_reported() {
        let source = PixelGrid::filled(2, 4, Pixel::default()).unwrap();
        let exploding = |_: &PixelGrid, row: usize, _: usize| -> Pixel {
            if row == 3 {
                panic!("kernel failure");
            }
            Pixel::default()
        };
        let err = StencilMapper::new(workers(2))
            .map(&source, &exploding)
            .unwrap_err();
        assert!(matches!(err, StencilError::WorkerPanicked { worker: 1 }));
    }

    #[test]
    fn plan_clamps_to_rows() {
        let mapper = StencilMapper::new(workers(16));
        assert_eq!(mapper.plan(3).len(), 3);
        assert!(mapper.plan(0).is_empty());
    }
}
