pub mod image_helper {
    use crate::core_modules::pixel_grid::PixelGrid;
    use crate::error::{Result, StencilError};
    use image::ImageEncoder;
    use std::fs::File;
    use std::io::BufWriter;
    use std::path::Path;

    /// Decodes any format the `image` crate understands into an RGB grid.
    pub fn decode(path: impl AsRef<Path>) -> Result<PixelGrid> {
        let path = path.as_ref();
        let decode_failure = |reason: String| StencilError::DecodeFailure {
            path: path.to_path_buf(),
            reason,
        };

        let rgb = image::open(path)
            .map_err(|e| decode_failure(e.to_string()))?
            .into_rgb8();
        let (width, height) = rgb.dimensions();
        PixelGrid::from_rgb_bytes(width as usize, height as usize, rgb.as_raw())
    }

    /// Writes the grid as an RGBA PNG with every alpha byte fully opaque.
    pub fn encode(path: impl AsRef<Path>, grid: &PixelGrid) -> Result<()> {
        let path = path.as_ref();
        let encode_failure = |reason: String| StencilError::EncodeFailure {
            path: path.to_path_buf(),
            reason,
        };

        let width = u32::try_from(grid.width()).map_err(|e| encode_failure(e.to_string()))?;
        let height = u32::try_from(grid.height()).map_err(|e| encode_failure(e.to_string()))?;
        let buffer = grid.to_rgba_bytes()?;

        let output = File::create(path).map_err(|e| encode_failure(e.to_string()))?;
        let encoder = image::codecs::png::PngEncoder::new(BufWriter::new(output));
        encoder
            .write_image(&buffer, width, height, image::ExtendedColorType::Rgba8)
            .map_err(|e| encode_failure(e.to_string()))?;

        Ok(())
    }
}
