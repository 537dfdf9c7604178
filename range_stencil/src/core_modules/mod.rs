pub mod corpus;
pub mod kernel;
pub mod partition;
pub mod pixel;
pub mod pixel_grid;
pub mod reducer;
mod scoped;
pub mod series;
pub mod stencil_mapper;
pub mod utils;
