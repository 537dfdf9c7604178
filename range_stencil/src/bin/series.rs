// Reduction workloads from the command line: Leibniz pi, prime filtering and linear
// regression. Corpus files load concurrently on the tokio runtime; the reduction itself
// runs on scoped worker threads inside `spawn_blocking`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use range_stencil::config::THREADS_ENV;
use range_stencil::core_modules::corpus;
use range_stencil::pipeline;
use range_stencil::{Result as StencilResult, WorkerCount};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "series", version, about = "Range-partitioned parallel reductions")]
struct Cli {
    /// Worker threads; defaults to one per logical CPU.
    #[arg(short, long, global = true, env = THREADS_ENV, allow_hyphen_values = true)]
    threads: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Approximate pi with the Leibniz series.
    Pi {
        #[arg(short = 'n', long)]
        iterations: usize,
    },
    /// Extract the primes from one or more integer files.
    Primes {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Where to write the prime listing.
        #[arg(short, long, default_value = "output.txt")]
        output: PathBuf,
    },
    /// Fit a least-squares line to `x,y` pairs from one or more files.
    Regression {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also evaluate the fitted line at this x.
        #[arg(long, allow_hyphen_values = true)]
        predict: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    range_stencil::init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn worker_count(text: Option<&str>) -> StencilResult<WorkerCount> {
    match text {
        Some(text) => text.parse(),
        None => Ok(WorkerCount::available()),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let workers = worker_count(cli.threads.as_deref())?;

    match cli.command {
        Command::Pi { iterations } => {
            let pi = blocking(move || pipeline::estimate_pi(iterations, workers)).await?;
            println!("The value of pi after {iterations} iterations is {pi:.15}");
        }
        Command::Primes { files, output } => {
            for file in &files {
                println!("Processing {}...", file.display());
            }
            let corpus = corpus::load_all_integers(&files).await;
            let report = blocking(move || pipeline::filter_primes(corpus, workers)).await?;
            report.write_to(&output)?;
            println!(
                "{} of {} numbers are prime; written to {}",
                report.primes.len(),
                report.scanned,
                output.display()
            );
        }
        Command::Regression { files, predict } => {
            for file in &files {
                println!("Processing {}...", file.display());
            }
            let corpus = corpus::load_all_points(&files).await;
            let report = blocking(move || pipeline::fit_regression(corpus, workers)).await?;
            println!("Regression equation: {}", report.fit);
            if let Some(x) = predict {
                println!("For x = {x:.2}, y = {:.2}", report.fit.predict(x));
            }
        }
    }

    Ok(())
}

/// Runs a thread-spawning reduction off the async executor.
async fn blocking<T, F>(job: F) -> anyhow::Result<T>
where
    F: FnOnce() -> StencilResult<T> + Send + 'static,
    T: Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(job)
        .await
        .context("reduction task did not complete")?;
    Ok(outcome?)
}
