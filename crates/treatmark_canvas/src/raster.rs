//! Flat raster previews of a scene.
//!
//! This is a preview renderer, not a vector renderer: strokes are drawn as
//! thin polylines in their stroke color and images as outlined boxes. It
//! exists so headless surfaces can satisfy the export contract.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::error::{CanvasError, Result};
use crate::scene::{DrawingElement, SceneSnapshot};
use crate::surface::{RasterFormat, RasterImage};
use crate::tool::ElementType;

/// Padding around the scene bounds, in pixels.
pub const EXPORT_PADDING: f64 = 10.0;

/// Largest edge of an exported image; bigger scenes are scaled down.
pub const MAX_EXPORT_DIMENSION: f64 = 4096.0;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const IMAGE_OUTLINE: Rgb<u8> = Rgb([200, 200, 200]);
const DEFAULT_STROKE: Rgb<u8> = Rgb([30, 30, 30]);

/// Render the live elements of a scene into an encoded raster image.
pub fn render_scene(scene: &SceneSnapshot, format: RasterFormat) -> Result<RasterImage> {
    let (min_x, min_y, max_x, max_y) = scene.bounds().ok_or(CanvasError::EmptyScene)?;

    let content_w = (max_x - min_x) + EXPORT_PADDING * 2.0;
    let content_h = (max_y - min_y) + EXPORT_PADDING * 2.0;
    let scale = (MAX_EXPORT_DIMENSION / content_w.max(content_h)).min(1.0);

    let width = ((content_w * scale).ceil() as u32).max(1);
    let height = ((content_h * scale).ceil() as u32).max(1);
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    let to_pixel = |x: f64, y: f64| -> (f64, f64) {
        (
            (x - min_x + EXPORT_PADDING) * scale,
            (y - min_y + EXPORT_PADDING) * scale,
        )
    };

    for element in scene.live_elements() {
        match element.kind {
            ElementType::Freedraw => draw_stroke(&mut canvas, element, &to_pixel),
            _ => {
                let (x0, y0) = to_pixel(element.x, element.y);
                let (x1, y1) = to_pixel(element.x + element.width, element.y + element.height);
                let color = if element.kind == ElementType::Image {
                    IMAGE_OUTLINE
                } else {
                    stroke_rgb(element.stroke_color.as_deref())
                };
                draw_line(&mut canvas, (x0, y0), (x1, y0), color);
                draw_line(&mut canvas, (x1, y0), (x1, y1), color);
                draw_line(&mut canvas, (x1, y1), (x0, y1), color);
                draw_line(&mut canvas, (x0, y1), (x0, y0), color);
            }
        }
    }

    let image_format = match format {
        RasterFormat::Jpeg => ImageFormat::Jpeg,
        RasterFormat::Png => ImageFormat::Png,
    };
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(canvas).write_to(&mut Cursor::new(&mut bytes), image_format)?;

    log::debug!(
        "🖼️ Exported {}x{} {} preview ({} bytes)",
        width,
        height,
        format.mime_type(),
        bytes.len()
    );

    Ok(RasterImage {
        format,
        width,
        height,
        bytes,
    })
}

fn draw_stroke(
    canvas: &mut RgbImage,
    element: &DrawingElement,
    to_pixel: &impl Fn(f64, f64) -> (f64, f64),
) {
    let color = stroke_rgb(element.stroke_color.as_deref());
    let points: Vec<(f64, f64)> = element
        .points
        .iter()
        .map(|[px, py]| to_pixel(element.x + px, element.y + py))
        .collect();

    match points.as_slice() {
        [] => {}
        [single] => plot(canvas, single.0, single.1, color),
        _ => {
            for pair in points.windows(2) {
                draw_line(canvas, pair[0], pair[1], color);
            }
        }
    }
}

fn draw_line(canvas: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
    for step in 0..=steps {
        let t = f64::from(step) / f64::from(steps);
        plot(canvas, from.0 + dx * t, from.1 + dy * t, color);
    }
}

fn plot(canvas: &mut RgbImage, x: f64, y: f64, color: Rgb<u8>) {
    if x < 0.0 || y < 0.0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, color);
    }
}

/// Parse a `#rrggbb` / `#rgb` stroke color, falling back to near-black.
fn stroke_rgb(color: Option<&str>) -> Rgb<u8> {
    let Some(hex) = color
        .and_then(|c| c.strip_prefix('#'))
        .filter(|hex| hex.is_ascii())
    else {
        return DEFAULT_STROKE;
    };
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    let parsed = match hex.len() {
        6 => channel(&hex[0..2]).zip(channel(&hex[2..4])).zip(channel(&hex[4..6])),
        3 => channel(hex[0..1].repeat(2).as_str())
            .zip(channel(hex[1..2].repeat(2).as_str()))
            .zip(channel(hex[2..3].repeat(2).as_str())),
        _ => None,
    };
    match parsed {
        Some(((r, g), b)) => Rgb([r, g, b]),
        None => DEFAULT_STROKE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::FileStore;

    fn stroke_scene() -> SceneSnapshot {
        let stroke = DrawingElement::freedraw(
            "s1",
            (0.0, 0.0),
            vec![[0.0, 0.0], [40.0, 0.0], [40.0, 20.0]],
            "#ff0000",
        );
        SceneSnapshot::new(vec![stroke], FileStore::new())
    }

    #[test]
    fn test_empty_scene_is_rejected() {
        let result = render_scene(&SceneSnapshot::default(), RasterFormat::Png);
        assert!(matches!(result, Err(CanvasError::EmptyScene)));
    }

    #[test]
    fn test_export_size_includes_padding() {
        let raster = render_scene(&stroke_scene(), RasterFormat::Png).unwrap();
        assert_eq!(raster.width, 60);
        assert_eq!(raster.height, 40);
        assert!(!raster.bytes.is_empty());
    }

    #[test]
    fn test_stroke_is_painted_in_its_color() {
        let raster = render_scene(&stroke_scene(), RasterFormat::Png).unwrap();
        let decoded = image::load_from_memory(&raster.bytes).unwrap().to_rgb8();
        // First point sits at the padding offset.
        assert_eq!(decoded.get_pixel(10, 10), &Rgb([255, 0, 0]));
        assert_eq!(decoded.get_pixel(0, 0), &BACKGROUND);
    }

    #[test]
    fn test_jpeg_export_has_jpeg_magic() {
        let raster = render_scene(&stroke_scene(), RasterFormat::Jpeg).unwrap();
        assert_eq!(&raster.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_stroke_rgb_parsing() {
        assert_eq!(stroke_rgb(Some("#00ff80")), Rgb([0, 255, 128]));
        assert_eq!(stroke_rgb(Some("#f00")), Rgb([255, 0, 0]));
        assert_eq!(stroke_rgb(Some("transparent")), DEFAULT_STROKE);
        assert_eq!(stroke_rgb(None), DEFAULT_STROKE);
    }
}
