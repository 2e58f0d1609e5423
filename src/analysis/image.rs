use std::io::Cursor;

use bytes::Bytes;
use image::ImageOutputFormat;

use super::error::AnalysisError;

const JPEG_QUALITY: u8 = 85;

/// Re-encodes whatever the client uploaded (HEIC-style formats
/// excluded by the decoder surface as rejection) into a JPEG the model
/// accepts.
pub fn transcode_to_jpeg(raw: &[u8]) -> Result<Bytes, AnalysisError> {
    let decoded = image::load_from_memory(raw).map_err(AnalysisError::ImageRejected)?;
    let mut out = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(AnalysisError::ImageRejected)?;
    Ok(Bytes::from(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_image_bytes() {
        let err = transcode_to_jpeg(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AnalysisError::ImageRejected(_)));
    }

    #[test]
    fn transcodes_png_to_jpeg() {
        let mut png = Vec::new();
        image::RgbImage::from_pixel(4, 4, image::Rgb([200, 120, 40]))
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .unwrap();

        let jpeg = transcode_to_jpeg(&png).unwrap();
        // JPEG SOI marker
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
