// Command-line front end for the blur pipeline:
//
//     range_stencil <input-path> <output-path> <thread-count>
//
// Exit code 0 on success, 1 on any validation, codec or thread failure.

use clap::Parser;
use clap::error::ErrorKind;
use range_stencil::WorkerCount;
use range_stencil::config::RunConfig;
use range_stencil::pipeline::BlurPipeline;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "Usage: range_stencil <input.png> <output.png> <threads>";

#[derive(Parser, Debug)]
#[command(
    name = "range_stencil",
    version,
    about = "Box-blur an image with one worker thread per band of rows"
)]
struct Cli {
    /// Image to read (any format the decoder supports).
    input: PathBuf,

    /// PNG file to write.
    output: PathBuf,

    /// Number of worker threads; must be a positive integer.
    #[arg(allow_hyphen_values = true)]
    threads: String,

    /// Neighborhood radius; 1 is the 3x3 box.
    #[arg(long, default_value_t = 1)]
    radius: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            println!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    range_stencil::init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => {
            println!("Blur applied successfully.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let workers: WorkerCount = cli.threads.parse()?;
    let config = RunConfig {
        workers,
        blur_radius: cli.radius,
    };

    let report = BlurPipeline::new(config).run(&cli.input, &cli.output)?;
    tracing::debug!(?report, "blur report");
    Ok(())
}
