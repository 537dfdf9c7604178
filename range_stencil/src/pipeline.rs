// THEORY:
// The `pipeline` module is the top-level API of the engine. It wires the collaborators
// (codec, corpus) to the parallel core (partitioner, mapper, reducer) and owns the
// validation rules that sit between them:
//
// 1.  **Validate before spawning**: worker counts are already `WorkerCount`s here, and an
//     extent of zero (no pixels, no samples, no iterations) is reported as `EmptyInput`
//     before any thread exists.
// 2.  **Clamp**: neither pattern ever runs more workers than it has work units.
// 3.  **Own the buffers**: the source grid, destination grid and accumulators are created
//     here and dropped here. Every exit path, error or not, joins the workers first.
// 4.  **Report**: each run returns a small report struct for the binaries to format.

use crate::config::{RunConfig, WorkerCount};
use crate::core_modules::corpus::{Corpus, SourceCount};
use crate::core_modules::kernel::BoxBlur;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::core_modules::reducer::{Accumulator, ParallelReducer};
use crate::core_modules::series::{LinearFit, Point, PrimeTally, RegressionSums, leibniz_term};
use crate::core_modules::stencil_mapper::StencilMapper;
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::{Result, StencilError};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// Outcome of one file-to-file blur run.
#[derive(Debug, Clone)]
pub struct BlurReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: usize,
    pub height: usize,
    /// Workers actually spawned, after clamping to the row count.
    pub workers: usize,
    pub elapsed: Duration,
}

/// Box-blurs images using the row-partitioned stencil mapper.
pub struct BlurPipeline {
    config: RunConfig,
    kernel: BoxBlur,
}

impl BlurPipeline {
    pub fn new(config: RunConfig) -> Self {
        let kernel = BoxBlur::with_radius(config.blur_radius);
        Self { config, kernel }
    }

    /// Blurs an in-memory grid. A grid with no pixels is `EmptyInput`.
    pub fn blur(&self, source: &PixelGrid) -> Result<PixelGrid> {
        if source.is_empty() {
            return Err(StencilError::empty_input("image with no pixels"));
        }
        StencilMapper::new(self.config.workers).map(source, &self.kernel)
    }

    /// Decodes `input`, blurs it, and encodes the result to `output`.
    pub fn run(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<BlurReport> {
        let (input, output) = (input.as_ref(), output.as_ref());
        let started = Instant::now();

        let source = image_helper::decode(input)?;
        if source.is_empty() {
            return Err(StencilError::empty_input(input.display().to_string()));
        }

        let blurred = self.blur(&source)?;
        image_helper::encode(output, &blurred)?;

        let report = BlurReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            width: source.width(),
            height: source.height(),
            workers: self.config.workers.clamp_to(source.height()),
            elapsed: started.elapsed(),
        };
        info!(
            input = %report.input.display(),
            output = %report.output.display(),
            width = report.width,
            height = report.height,
            workers = report.workers,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "blur complete"
        );
        Ok(report)
    }
}

/// Approximates pi with `iterations` terms of the Leibniz series.
pub fn estimate_pi(iterations: usize, workers: WorkerCount) -> Result<f64> {
    if iterations == 0 {
        return Err(StencilError::empty_input("pi series with zero iterations"));
    }
    let quarter = ParallelReducer::new(workers).reduce(iterations, leibniz_term, |a, b| a + b, 0.0)?;
    let pi = 4.0 * quarter;
    info!(iterations, workers = workers.clamp_to(iterations), pi, "pi estimated");
    Ok(pi)
}

/// Primes found in a loaded integer corpus, in corpus order.
#[derive(Debug, Clone)]
pub struct PrimeReport {
    pub scanned: usize,
    pub primes: Vec<i64>,
    pub sources: Vec<SourceCount>,
}

impl PrimeReport {
    /// Writes the count line, a header, then one prime per line.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_error = |source| StencilError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut out = BufWriter::new(File::create(path).map_err(io_error)?);
        write!(out, "{self}").map_err(io_error)?;
        out.flush().map_err(io_error)
    }
}

impl fmt::Display for PrimeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total prime numbers found: {}", self.primes.len())?;
        writeln!(f, "Prime numbers:")?;
        for prime in &self.primes {
            writeln!(f, "{prime}")?;
        }
        Ok(())
    }
}

/// Filters the primes out of `corpus`. `EmptyInput` only if every source was empty.
pub fn filter_primes(corpus: Corpus<i64>, workers: WorkerCount) -> Result<PrimeReport> {
    if corpus.is_empty() {
        return Err(empty_corpus(&corpus));
    }

    let samples = &corpus.samples;
    let accumulator = Accumulator::new(PrimeTally::default());
    ParallelReducer::new(workers).fold(
        samples.len(),
        &PrimeTally::default(),
        |tally, index| tally.observe(index, samples[index]),
        |shared, partial| shared.absorb(partial),
        &accumulator,
    )?;
    let primes = accumulator.into_inner().into_ordered();

    info!(scanned = samples.len(), primes = primes.len(), "prime filter complete");
    Ok(PrimeReport {
        scanned: samples.len(),
        primes,
        sources: corpus.sources,
    })
}

/// A fitted regression line and the data it came from.
#[derive(Debug, Clone)]
pub struct RegressionReport {
    pub fit: LinearFit,
    pub samples: usize,
    pub sources: Vec<SourceCount>,
}

/// Fits a least-squares line to `corpus`, summing in parallel.
pub fn fit_regression(corpus: Corpus<Point>, workers: WorkerCount) -> Result<RegressionReport> {
    if corpus.is_empty() {
        return Err(empty_corpus(&corpus));
    }

    let points = &corpus.samples;
    let accumulator = Accumulator::new(RegressionSums::default());
    ParallelReducer::new(workers).fold(
        points.len(),
        &RegressionSums::default(),
        |sums, index| sums.observe(&points[index]),
        |shared, partial| shared.absorb(partial),
        &accumulator,
    )?;
    let fit = accumulator.into_inner().fit()?;

    info!(samples = points.len(), slope = fit.slope, intercept = fit.intercept, "regression fitted");
    Ok(RegressionReport {
        fit,
        samples: points.len(),
        sources: corpus.sources,
    })
}

fn empty_corpus<T>(corpus: &Corpus<T>) -> StencilError {
    if corpus.sources.is_empty() {
        StencilError::empty_input("no corpus files given")
    } else {
        StencilError::empty_input(corpus.describe_sources())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    fn workers(n: usize) -> WorkerCount {
        WorkerCount::new(n).unwrap()
    }

    fn corpus<T>(samples: Vec<T>) -> Corpus<T> {
        let records = samples.len();
        Corpus {
            samples,
            sources: vec![SourceCount {
                path: PathBuf::from("inline.txt"),
                records,
            }],
        }
    }

    #[test]
    fn pi_converges() {
        let pi = estimate_pi(1_000_000, workers(4)).unwrap();
        assert!((pi - std::f64::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn pi_is_worker_count_independent() {
        let single = estimate_pi(10_007, workers(1)).unwrap();
        for t in [2, 3, 7, 16] {
            let parallel = estimate_pi(10_007, workers(t)).unwrap();
            assert!((single - parallel).abs() < 1e-10, "t = {t}");
        }
    }

    #[test]
    fn pi_rejects_zero_iterations() {
        assert!(matches!(
            estimate_pi(0, workers(2)),
            Err(StencilError::EmptyInput { .. })
        ));
    }

    #[test]
    fn primes_keep_corpus_order() {
        let samples = vec![10, 7, 4, 13, 1, 2, 97, 100, 5, -3];
        for t in 1..=samples.len() {
            let report = filter_primes(corpus(samples.clone()), workers(t)).unwrap();
            assert_eq!(report.primes, vec![7, 13, 2, 97, 5], "t = {t}");
            assert_eq!(report.scanned, samples.len());
        }
    }

    #[test]
    fn prime_report_format() {
        let report = filter_primes(corpus(vec![3, 4, 5]), workers(2)).unwrap();
        assert_eq!(
            report.to_string(),
            "Total prime numbers found: 2\nPrime numbers:\n3\n5\n"
        );
    }

    #[test]
    fn prime_report_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let report = filter_primes(corpus(vec![11]), workers(1)).unwrap();
        report.write_to(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Total prime numbers found: 1\n"));
    }

    #[test]
    fn empty_corpus_is_empty_input() {
        let empty = Corpus::<i64> {
            samples: Vec::new(),
            sources: vec![SourceCount {
                path: PathBuf::from("a.txt"),
                records: 0,
            }],
        };
        match filter_primes(empty, workers(2)) {
            Err(StencilError::EmptyInput { source_name }) => assert_eq!(source_name, "a.txt"),
            other => panic!("expected EmptyInput, got {other:?}"),
        }
    }

    #[test]
    fn regression_matches_sequential_fit() {
        let points: Vec<Point> = (0..50)
            .map(|i| {
                let x = i as f64 * 0.5;
                Point::new(x, 3.0 * x + 2.0 + if i % 2 == 0 { 0.25 } else { -0.25 })
            })
            .collect();
        let mut sequential = RegressionSums::default();
        points.iter().for_each(|p| sequential.observe(p));
        let expected = sequential.fit().unwrap();

        for t in [1, 3, 8, 50] {
            let report = fit_regression(corpus(points.clone()), workers(t)).unwrap();
            assert!((report.fit.slope - expected.slope).abs() < 1e-9);
            assert!((report.fit.intercept - expected.intercept).abs() < 1e-9);
            assert_eq!(report.samples, 50);
        }
    }

    #[test]
    fn regression_on_vertical_data_is_degenerate() {
        let points = vec![Point::new(1.0, 1.0), Point::new(1.0, 2.0)];
        assert!(matches!(
            fit_regression(corpus(points), workers(2)),
            Err(StencilError::DegenerateRegression)
        ));
    }

    #[test]
    fn blur_rejects_empty_grid() {
        let pipeline = BlurPipeline::new(RunConfig::with_workers(workers(2)));
        let empty = PixelGrid::filled(0, 4, Pixel::default()).unwrap();
        assert!(matches!(
            pipeline.blur(&empty),
            Err(StencilError::EmptyInput { .. })
        ));
    }

    #[test]
    fn blur_run_round_trips_through_codec() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        let source = PixelGrid::filled(6, 5, Pixel::new(40, 80, 120)).unwrap();
        image_helper::encode(&input, &source).unwrap();

        let pipeline = BlurPipeline::new(RunConfig::with_workers(workers(16)));
        let report = pipeline.run(&input, &output).unwrap();
        assert_eq!((report.width, report.height, report.workers), (6, 5, 5));
        assert_eq!(image_helper::decode(&output).unwrap(), source);
    }
}
