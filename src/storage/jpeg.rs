use image::{DynamicImage, ImageEncoder, codecs::jpeg::JpegEncoder};
use tracing::debug;

use super::StorageError;

/// Encode an image as JPEG, dropping any alpha channel.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, StorageError> {
    let quality = quality.clamp(1, 100);
    // JPEG doesn't support alpha channel, so convert to RGB
    let rgb_image = image.to_rgb8();

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.write_image(
        &rgb_image,
        rgb_image.width(),
        rgb_image.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    debug!(
        "Encoded {}x{} JPEG at quality {}: {} bytes",
        rgb_image.width(),
        rgb_image.height(),
        quality,
        buffer.len()
    );
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    #[test]
    fn test_encode_jpeg_from_rgba() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 48, Rgba([10, 200, 30, 100])));
        let bytes = encode_jpeg(&img, 70).unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_encode_jpeg_quality_affects_size() {
        let img = DynamicImage::ImageRgb8(image::ImageBuffer::from_fn(128, 128, |x, y| {
            image::Rgb([(x * 2) as u8, (y * 2) as u8, ((x ^ y) * 3) as u8])
        }));
        let low = encode_jpeg(&img, 10).unwrap();
        let high = encode_jpeg(&img, 95).unwrap();
        assert!(low.len() < high.len());

        // Out-of-range quality is clamped rather than rejected
        assert!(encode_jpeg(&img, 0).is_ok());
    }
}
