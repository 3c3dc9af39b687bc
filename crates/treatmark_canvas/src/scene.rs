//! Scene snapshot data model.
//!
//! Mirrors the whiteboard's JSON shape closely enough to read the fields
//! the annotation workflow cares about. Every other field is carried in
//! `extra` and written back untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CanvasError, Result};
use crate::tool::ElementType;

/// Stroke color used for elements that should not draw an outline.
pub const TRANSPARENT: &str = "transparent";

/// A single element on the whiteboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingElement {
    /// Element identifier, unique within a scene
    pub id: String,
    /// Element type (freedraw, image, ...)
    #[serde(rename = "type")]
    pub kind: ElementType,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    /// Freehand points, relative to (`x`, `y`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<[f64; 2]>,
    /// Registered file backing an image element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub is_deleted: bool,
    /// Application metadata attached to the element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<Value>,
    /// Whiteboard fields this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DrawingElement {
    /// Create a bare element of the given kind.
    pub fn new(id: impl Into<String>, kind: ElementType) -> Self {
        Self {
            id: id.into(),
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            stroke_color: None,
            points: Vec::new(),
            file_id: None,
            locked: false,
            is_deleted: false,
            custom_data: None,
            extra: Map::new(),
        }
    }

    /// Create a freehand stroke from points relative to `origin`.
    pub fn freedraw(
        id: impl Into<String>,
        origin: (f64, f64),
        points: Vec<[f64; 2]>,
        stroke_color: impl Into<String>,
    ) -> Self {
        let (width, height) = points_extent(&points);
        let mut element = Self::new(id, ElementType::Freedraw);
        element.x = origin.0;
        element.y = origin.1;
        element.width = width;
        element.height = height;
        element.points = points;
        element.stroke_color = Some(stroke_color.into());
        element
    }

    /// Create a locked, non-interactive background image element.
    ///
    /// `width`/`height` are the source image's pixel size; `scale` is the
    /// uniform factor the whiteboard applies when drawing it. Every field the
    /// whiteboard reads from a live element is filled in, since elements
    /// pushed through a scene update are not normalised.
    pub fn locked_image(
        id: impl Into<String>,
        file_id: impl Into<String>,
        position: (f64, f64),
        size: (f64, f64),
        scale: f64,
        updated_millis: i64,
    ) -> Self {
        let mut element = Self::new(id, ElementType::Image);
        element.x = position.0;
        element.y = position.1;
        element.width = size.0;
        element.height = size.1;
        element.file_id = Some(file_id.into());
        element.locked = true;
        element.stroke_color = Some(TRANSPARENT.to_string());
        let fields = [
            ("scale", Value::from(vec![scale, scale])),
            ("backgroundColor", Value::from(TRANSPARENT)),
            ("status", Value::from("pending")),
            ("version", Value::from(1)),
            ("versionNonce", Value::from(123_456)),
            ("seed", Value::from(1)),
            ("angle", Value::from(0)),
            ("opacity", Value::from(100)),
            ("fillStyle", Value::from("solid")),
            ("strokeWidth", Value::from(2)),
            ("strokeStyle", Value::from("solid")),
            ("roughness", Value::from(1)),
            ("groupIds", Value::Array(Vec::new())),
            ("boundElements", Value::Null),
            ("frameId", Value::Null),
            ("link", Value::Null),
            ("roundness", Value::Null),
            ("updated", Value::from(updated_millis)),
        ];
        for (key, value) in fields {
            element.extra.insert(key.to_string(), value);
        }
        element
    }

    /// Check if this is a freehand stroke.
    pub fn is_freedraw(&self) -> bool {
        self.kind == ElementType::Freedraw
    }

    /// Axis-aligned bounds as (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

fn points_extent(points: &[[f64; 2]]) -> (f64, f64) {
    let mut min = [f64::MAX, f64::MAX];
    let mut max = [f64::MIN, f64::MIN];
    for point in points {
        for axis in 0..2 {
            min[axis] = min[axis].min(point[axis]);
            max[axis] = max[axis].max(point[axis]);
        }
    }
    if points.is_empty() {
        (0.0, 0.0)
    } else {
        (max[0] - min[0], max[1] - min[1])
    }
}

/// A binary asset registered with the whiteboard (background images).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAsset {
    pub id: String,
    pub mime_type: String,
    /// Asset bytes as a `data:` URL
    #[serde(rename = "dataURL")]
    pub data_url: String,
    /// Creation time in milliseconds since the Unix epoch
    #[serde(default)]
    pub created: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileAsset {
    /// Create a new file asset.
    pub fn new(
        id: impl Into<String>,
        mime_type: impl Into<String>,
        data_url: impl Into<String>,
        created: i64,
    ) -> Self {
        Self {
            id: id.into(),
            mime_type: mime_type.into(),
            data_url: data_url.into(),
            created,
            extra: Map::new(),
        }
    }
}

/// Registered files keyed by file id.
pub type FileStore = BTreeMap<String, FileAsset>;

/// Read the whiteboard's element list, dropping deleted elements.
pub fn parse_live_elements(json: &str) -> Result<Vec<DrawingElement>> {
    let elements: Vec<DrawingElement> = serde_json::from_str(json)
        .map_err(|e| CanvasError::SceneData(format!("elements: {e}")))?;
    Ok(elements.into_iter().filter(|e| !e.is_deleted).collect())
}

/// Read the whiteboard's registered-files map.
pub fn parse_files(json: &str) -> Result<FileStore> {
    serde_json::from_str(json).map_err(|e| CanvasError::SceneData(format!("files: {e}")))
}

/// The complete vector scene plus its registered files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    #[serde(default)]
    pub elements: Vec<DrawingElement>,
    #[serde(default)]
    pub files: FileStore,
}

impl SceneSnapshot {
    /// Create a snapshot from elements and files.
    pub fn new(elements: Vec<DrawingElement>, files: FileStore) -> Self {
        Self { elements, files }
    }

    /// Elements that have not been deleted.
    pub fn live_elements(&self) -> impl Iterator<Item = &DrawingElement> {
        self.elements.iter().filter(|e| !e.is_deleted)
    }

    /// True when no live element remains.
    pub fn is_empty(&self) -> bool {
        self.live_elements().next().is_none()
    }

    /// Serialize to the transportable JSON text form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot from its JSON text form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Combined bounds of all live elements, or None for an empty scene.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.live_elements().map(DrawingElement::bounds).reduce(
            |(ax0, ay0, ax1, ay1), (bx0, by0, bx1, by1)| {
                (ax0.min(bx0), ay0.min(by0), ax1.max(bx1), ay1.max(by1))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let raw = json!({
            "id": "abc",
            "type": "freedraw",
            "x": 10.0,
            "y": 20.0,
            "width": 5.0,
            "height": 6.0,
            "points": [[0.0, 0.0], [5.0, 6.0]],
            "strokeColor": "#ff0000",
            "seed": 42,
            "roughness": 1,
            "customData": { "type": "Suture", "notes": "" }
        });

        let element: DrawingElement = serde_json::from_value(raw.clone()).unwrap();
        assert!(element.is_freedraw());
        assert_eq!(element.extra.get("seed"), Some(&json!(42)));

        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["seed"], json!(42));
        assert_eq!(back["customData"], raw["customData"]);
        assert_eq!(back["strokeColor"], json!("#ff0000"));
    }

    #[test]
    fn test_missing_files_defaults_to_empty() {
        let scene = SceneSnapshot::from_json(r#"{"elements": []}"#).unwrap();
        assert!(scene.files.is_empty());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_deleted_elements_do_not_count() {
        let mut element = DrawingElement::new("gone", ElementType::Rectangle);
        element.is_deleted = true;
        let scene = SceneSnapshot::new(vec![element], FileStore::new());
        assert!(scene.is_empty());
        assert_eq!(scene.bounds(), None);
    }

    #[test]
    fn test_freedraw_extent_from_points() {
        let stroke = DrawingElement::freedraw(
            "s1",
            (100.0, 50.0),
            vec![[0.0, 0.0], [30.0, -10.0], [12.0, 25.0]],
            "#00ff00",
        );
        assert_eq!(stroke.width, 30.0);
        assert_eq!(stroke.height, 35.0);
    }

    #[test]
    fn test_locked_image_carries_scale() {
        let image = DrawingElement::locked_image(
            "Front",
            "front-1",
            (10.0, 0.0),
            (400.0, 800.0),
            0.5,
            1_700_000_000_000,
        );
        assert!(image.locked);
        assert_eq!(image.file_id.as_deref(), Some("front-1"));
        assert_eq!(image.extra["scale"], json!([0.5, 0.5]));
    }

    #[test]
    fn test_locked_image_has_every_whiteboard_field() {
        let image = DrawingElement::locked_image("Front", "front-1", (0.0, 0.0), (4.0, 8.0), 1.0, 42);
        let value = serde_json::to_value(&image).unwrap();

        assert_eq!(value["groupIds"], json!([]));
        assert_eq!(value["angle"], json!(0));
        assert_eq!(value["opacity"], json!(100));
        assert_eq!(value["seed"], json!(1));
        assert_eq!(value["versionNonce"], json!(123_456));
        assert_eq!(value["strokeWidth"], json!(2));
        assert_eq!(value["strokeStyle"], json!("solid"));
        assert_eq!(value["roughness"], json!(1));
        assert_eq!(value["fillStyle"], json!("solid"));
        assert_eq!(value["updated"], json!(42));
        assert_eq!(value["isDeleted"], json!(false));
        assert_eq!(value["strokeColor"], json!("transparent"));
        for key in ["boundElements", "frameId", "link", "roundness"] {
            assert_eq!(value.get(key), Some(&Value::Null), "{key}");
        }

        // Survives the round trip through the whiteboard's JSON
        let back: DrawingElement = serde_json::from_value(value).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn test_parse_live_elements_drops_deleted() {
        let json = r##"[
            {"id": "a", "type": "freedraw", "points": [[0, 0], [1, 1]]},
            {"id": "b", "type": "rectangle", "isDeleted": true}
        ]"##;
        let ids: Vec<String> = parse_live_elements(json)
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["a".to_string()]);
    }

    #[test]
    fn test_unreadable_scene_data_is_an_error() {
        assert!(matches!(
            parse_live_elements("{broken"),
            Err(CanvasError::SceneData(message)) if message.starts_with("elements:")
        ));
        assert!(matches!(
            parse_files("[1, 2]"),
            Err(CanvasError::SceneData(message)) if message.starts_with("files:")
        ));
        assert!(parse_files("{}").unwrap().is_empty());
    }

    #[test]
    fn test_scene_bounds_cover_all_live_elements() {
        let mut a = DrawingElement::new("a", ElementType::Rectangle);
        a.x = -10.0;
        a.width = 20.0;
        a.height = 5.0;
        let mut b = DrawingElement::new("b", ElementType::Rectangle);
        b.y = 40.0;
        b.width = 5.0;
        b.height = 10.0;
        let scene = SceneSnapshot::new(vec![a, b], FileStore::new());
        assert_eq!(scene.bounds(), Some((-10.0, 0.0, 10.0, 50.0)));
    }
}
