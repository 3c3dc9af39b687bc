//! Background template placement.
//!
//! A template image is decoded, re-encoded as JPEG for registration with
//! the whiteboard, and laid out as one locked element scaled to the
//! viewport height and centered horizontally.

use std::io::Cursor;

use image::ImageFormat;
use treatmark_canvas::{DrawingElement, FileAsset, Viewport};

use crate::constants::TEMPLATE_MIME_TYPE;
use crate::data_url;
use crate::error::{AnnotatorError, Result};

/// A template image ready to be registered as a whiteboard file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// JPEG `data:` URL
    pub data_url: String,
}

/// Decode an image of any supported format and re-encode it as JPEG.
pub fn prepare_image(bytes: &[u8]) -> Result<PreparedImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| AnnotatorError::asset_load(format!("Failed to decode image: {}", e)))?;
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(AnnotatorError::asset_load("image has no pixels"));
    }

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut encoded = Cursor::new(Vec::new());
    rgb.write_to(&mut encoded, ImageFormat::Jpeg)
        .map_err(|e| AnnotatorError::asset_load(format!("Failed to encode image: {}", e)))?;

    log::debug!(
        "🖼️ Prepared {}x{} template ({} bytes)",
        width,
        height,
        encoded.get_ref().len()
    );

    Ok(PreparedImage {
        width,
        height,
        data_url: data_url::encode(TEMPLATE_MIME_TYPE, encoded.get_ref()),
    })
}

/// Build the file asset registered for a template.
pub fn template_asset(file_id: &str, image: &PreparedImage, created_millis: i64) -> FileAsset {
    FileAsset::new(
        file_id,
        TEMPLATE_MIME_TYPE,
        image.data_url.clone(),
        created_millis,
    )
}

/// Lay out the locked background element for a template.
///
/// The element keeps the image's pixel size; the whiteboard applies
/// `scale = viewport height / image height`.
pub fn background_element(
    label: &str,
    file_id: &str,
    image: &PreparedImage,
    viewport: Viewport,
    updated_millis: i64,
) -> DrawingElement {
    let (width, height) = (f64::from(image.width), f64::from(image.height));
    let scale = viewport.height / height;
    let scaled_width = width * scale;
    let x = (viewport.width - scaled_width) / 2.0;
    let y = (viewport.height - height * scale) / 2.0;

    DrawingElement::locked_image(label, file_id, (x, y), (width, height), scale, updated_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use serde_json::json;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 128]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_prepare_reencodes_as_jpeg() {
        let prepared = prepare_image(&png(40, 80)).unwrap();
        assert_eq!((prepared.width, prepared.height), (40, 80));
        assert!(prepared.data_url.starts_with("data:image/jpeg;base64,"));

        let decoded = data_url::decode(&prepared.data_url).unwrap();
        assert!(decoded.bytes.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn test_prepare_rejects_garbage() {
        let err = prepare_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AnnotatorError::AssetLoad { .. }));
    }

    #[test]
    fn test_background_layout() {
        let image = PreparedImage {
            width: 200,
            height: 400,
            data_url: String::new(),
        };
        let viewport = Viewport {
            width: 1000.0,
            height: 800.0,
        };
        let element = background_element("Front", "AT-1-5", &image, viewport, 7);

        assert_eq!(element.id, "Front");
        assert!(element.locked);
        assert_eq!(element.file_id.as_deref(), Some("AT-1-5"));
        // scale 2.0: 400 wide on screen, centered
        assert_eq!(element.x, 300.0);
        assert_eq!(element.y, 0.0);
        assert_eq!((element.width, element.height), (200.0, 400.0));
        assert_eq!(element.extra["scale"], json!([2.0, 2.0]));
    }
}
