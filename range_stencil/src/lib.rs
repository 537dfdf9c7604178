// THEORY:
// This file is the entry point for the `range_stencil` library crate. The public API is
// the `pipeline` module (blur runs, pi estimation, prime filtering, regression) plus the
// parallel building blocks in `core_modules`, which are usable on their own:
//
// - `partition`: extent + worker count -> contiguous, balanced, non-empty ranges.
// - `stencil_mapper`: one scoped thread per output row band, lock-free.
// - `reducer`: one scoped thread per range, local fold then a single locked merge.
// - `kernel`: the per-pixel functions the mapper applies.
//
// The codec (`utils::image_helper`) and the corpus loader (`corpus`) are the I/O edges.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use config::{RunConfig, WorkerCount};
pub use core_modules::kernel::{BoxBlur, StencilKernel};
pub use core_modules::partition::{Range, partition};
pub use core_modules::pixel::pixel::Pixel;
pub use core_modules::pixel_grid::PixelGrid;
pub use core_modules::reducer::{Accumulator, ParallelReducer};
pub use core_modules::stencil_mapper::StencilMapper;
pub use error::{Result, StencilError};

/// Installs the `tracing` subscriber used by the binaries.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks the level.
pub fn init_logging(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
