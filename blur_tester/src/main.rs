use anyhow::{Context, bail};
use clap::Parser;
use range_stencil::core_modules::utils::image_helper::image_helper;
use range_stencil::{BoxBlur, PixelGrid, StencilMapper, WorkerCount};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Blurs one image at every worker count from 1 to `--max-threads` and checks that each
/// result is byte-identical to the single-threaded one.
#[derive(Parser, Debug)]
#[command(name = "blur_tester", version)]
struct Cli {
    /// Image to blur.
    input: PathBuf,

    /// Highest worker count to try; defaults to twice the logical CPUs.
    #[arg(long)]
    max_threads: Option<usize>,

    /// Blur radius; 1 is the 3x3 box.
    #[arg(long, default_value_t = 1)]
    radius: usize,

    /// Write the single-threaded result here for visual inspection.
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // --- 1. Argument Parsing & Setup ---
    let cli = Cli::parse();
    range_stencil::init_logging(0);
    let max_threads = cli.max_threads.unwrap_or_else(|| 2 * num_cpus::get()).max(1);
    let kernel = BoxBlur::with_radius(cli.radius);

    // --- 2. Image Decoding ---
    let source = image_helper::decode(&cli.input)
        .with_context(|| format!("loading {}", cli.input.display()))?;
    println!(
        "Loaded {} ({}x{}), kernel radius {} span {}",
        cli.input.display(),
        source.width(),
        source.height(),
        kernel.radius(),
        kernel.span()
    );

    // --- 3. Baseline (single worker) ---
    let (baseline, baseline_time) = timed_blur(&source, &kernel, 1)?;
    println!("threads  1: {:>10.3} ms  (baseline)", millis(baseline_time));

    // --- 4. Sweep Worker Counts ---
    let mut mismatches = Vec::new();
    for threads in 2..=max_threads {
        let (blurred, elapsed) = timed_blur(&source, &kernel, threads)?;
        let identical = blurred == baseline;
        let speedup = baseline_time.as_secs_f64() / elapsed.as_secs_f64().max(f64::EPSILON);
        println!(
            "threads {threads:>2}: {:>10.3} ms  speedup {speedup:>5.2}x  {}",
            millis(elapsed),
            if identical { "identical" } else { "MISMATCH" }
        );
        if !identical {
            mismatches.push(threads);
        }
    }

    // --- 5. Optional Output ---
    if let Some(path) = &cli.save {
        image_helper::encode(path, &baseline)?;
        println!("Baseline written to {}", path.display());
    }

    if !mismatches.is_empty() {
        bail!("output differed from the single-threaded baseline for thread counts {mismatches:?}");
    }
    println!("All {max_threads} worker counts produced identical output.");
    Ok(())
}

fn timed_blur(source: &PixelGrid, kernel: &BoxBlur, threads: usize) -> anyhow::Result<(PixelGrid, Duration)> {
    let mapper = StencilMapper::new(WorkerCount::new(threads)?);
    let started = Instant::now();
    let blurred = mapper.map(source, kernel)?;
    Ok((blurred, started.elapsed()))
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
