//! Save request assembly.
//!
//! A save reads the scene synchronously into a `SaveDraft`, waits for the
//! surface's raster export, then joins the two into `SaveAnnotationArgs`.

use treatmark_canvas::{CanvasError, DrawingSurface, RasterFormat, RasterImage, SceneSnapshot};

use crate::api::SaveAnnotationArgs;
use crate::data_url;
use crate::error::{AnnotatorError, Result};
use crate::model::SessionParams;

/// Everything a save sends except the preview image.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveDraft {
    pub doctype: String,
    pub docname: String,
    pub annotation_name: Option<String>,
    pub annotation_template: Option<String>,
    /// Scene snapshot as JSON text
    pub json_text: String,
    /// Format the preview is requested in
    pub format: RasterFormat,
    pub element_count: usize,
}

impl SaveDraft {
    /// Attach the exported preview.
    pub fn into_args(self, raster: &RasterImage) -> SaveAnnotationArgs {
        log::debug!(
            "💾 Exported {}x{} preview for {} elements",
            raster.width,
            raster.height,
            self.element_count
        );
        SaveAnnotationArgs {
            doctype: self.doctype,
            docname: self.docname,
            annotation_name: self.annotation_name,
            annotation_template: self.annotation_template,
            json_text: self.json_text,
            file_data: data_url::encode(raster.format.mime_type(), &raster.bytes),
        }
    }
}

/// Read the surface into a save draft.
///
/// Fails with `EmptyScene` when no live element exists. A surface that
/// cannot be read fails with its own error rather than looking empty.
pub fn draft_save(
    surface: &dyn DrawingSurface,
    session: &SessionParams,
    annotation_template: Option<&str>,
    format: RasterFormat,
) -> Result<SaveDraft> {
    let elements = surface.elements()?;
    if elements.is_empty() {
        return Err(AnnotatorError::EmptyScene);
    }
    let files = surface.files()?;
    let element_count = elements.len();
    let json_text = serde_json::to_string(&SceneSnapshot::new(elements, files))?;

    Ok(SaveDraft {
        doctype: session.record_type().to_string(),
        docname: session.record_id().to_string(),
        annotation_name: session.annotation_name().map(str::to_string),
        annotation_template: annotation_template.map(str::to_string),
        json_text,
        format,
        element_count,
    })
}

/// Read a raster export delivered as a `data:` URL.
pub fn raster_from_data_url(url: &str) -> treatmark_canvas::Result<RasterImage> {
    let decoded = data_url::decode(url).map_err(CanvasError::Export)?;
    let format = RasterFormat::from_mime_type(&decoded.mime_type).ok_or_else(|| {
        CanvasError::Export(format!("unsupported image type {}", decoded.mime_type))
    })?;
    let image = image::load_from_memory(&decoded.bytes)?;
    Ok(RasterImage {
        format,
        width: image.width(),
        height: image.height(),
        bytes: decoded.bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use treatmark_canvas::{DrawingElement, FileAsset, MemorySurface};

    fn session() -> SessionParams {
        SessionParams::new("Encounter", "ENC-0001", Some("HA-9".to_string())).unwrap()
    }

    #[test]
    fn test_empty_scene_rejected() {
        let surface = MemorySurface::new();
        let result = draft_save(&surface, &session(), None, RasterFormat::Jpeg);
        assert_matches!(result, Err(AnnotatorError::EmptyScene));
    }

    #[test]
    fn test_deleted_elements_do_not_count() {
        let mut surface = MemorySurface::new();
        surface.push_element(DrawingElement::freedraw(
            "s1",
            (0.0, 0.0),
            vec![[0.0, 0.0], [3.0, 3.0]],
            "#000000",
        ));
        surface.delete_element("s1");
        let result = draft_save(&surface, &session(), None, RasterFormat::Jpeg);
        assert_matches!(result, Err(AnnotatorError::EmptyScene));
    }

    #[test]
    fn test_args_reproduce_scene() {
        let mut surface = MemorySurface::new();
        surface.push_element(DrawingElement::freedraw(
            "s1",
            (5.0, 5.0),
            vec![[0.0, 0.0], [10.0, 10.0]],
            "#ff0000",
        ));
        surface.add_files(vec![FileAsset::new(
            "AT-1-1",
            "image/jpeg",
            "data:image/jpeg;base64,AA==",
            1,
        )]);

        let draft = draft_save(&surface, &session(), Some("AT-1"), RasterFormat::Jpeg).unwrap();
        assert_eq!(draft.element_count, 1);
        let raster = pollster::block_on(surface.export_raster(draft.format)).unwrap();
        let args = draft.into_args(&raster);

        assert_eq!(args.doctype, "Encounter");
        assert_eq!(args.annotation_name.as_deref(), Some("HA-9"));
        assert_eq!(args.annotation_template.as_deref(), Some("AT-1"));
        assert!(args.file_data.starts_with("data:image/jpeg;base64,/9j/"));

        let scene = SceneSnapshot::from_json(&args.json_text).unwrap();
        assert_eq!(scene, surface.snapshot().unwrap());
    }

    #[test]
    fn test_raster_from_data_url() {
        let img = image::RgbImage::from_pixel(12, 7, image::Rgb([240, 220, 200]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        let url = data_url::encode("image/png", bytes.get_ref());

        let raster = raster_from_data_url(&url).unwrap();
        assert_eq!(raster.format, RasterFormat::Png);
        assert_eq!((raster.width, raster.height), (12, 7));
        assert_eq!(raster.bytes, bytes.into_inner());
    }

    #[test]
    fn test_raster_from_bad_data_url() {
        assert_matches!(
            raster_from_data_url("not a data url"),
            Err(CanvasError::Export(_))
        );
        assert_matches!(
            raster_from_data_url(&data_url::encode("image/gif", b"GIF89a")),
            Err(CanvasError::Export(message)) if message.contains("image/gif")
        );
        assert_matches!(
            raster_from_data_url(&data_url::encode("image/png", b"not png")),
            Err(CanvasError::Raster(_))
        );
    }
}
