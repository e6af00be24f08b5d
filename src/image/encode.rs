//! Writing intensity buffers as 8-bit grayscale image files.

use std::path::Path;

use image::GrayImage;

use crate::error::Result;

/// Write a row-major `f32` intensity buffer as an 8-bit single-channel
/// image file. Intensities are clamped to `0..=255`; the file format is
/// chosen from the path extension.
///
/// # Panics
/// Panics if the buffer length does not match `width * height`.
pub fn write_gray_image(
    path: impl AsRef<Path>,
    width: usize,
    height: usize,
    intensities: &[f32],
) -> Result<()> {
    assert_eq!(
        intensities.len(),
        width * height,
        "intensity buffer length must equal width * height"
    );
    let pixels: Vec<u8> = intensities
        .iter()
        .map(|&v| v.clamp(0.0, 255.0).round() as u8)
        .collect();
    let img = GrayImage::from_raw(width as u32, height as u32, pixels)
        .expect("buffer length checked above");
    img.save(path.as_ref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ramp.png");

        let intensities: Vec<f32> = (0..16).map(|i| i as f32 * 20.0).collect();
        write_gray_image(&path, 4, 4, &intensities).unwrap();

        let reloaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(reloaded.width(), 4);
        assert_eq!(reloaded.height(), 4);
        assert_eq!(reloaded.get_pixel(0, 0).0[0], 0);
        assert_eq!(reloaded.get_pixel(3, 0).0[0], 60);
        // 15 * 20 = 300 clamps to 255.
        assert_eq!(reloaded.get_pixel(3, 3).0[0], 255);
    }
}
