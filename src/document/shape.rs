//! Free-hand shape groups as stored in a drawing container.
//!
//! The viewer stores each drawing as a serialized shape group: a `Group` node
//! holding a `Line` (the outline points and stroke color) and a `Label` (the
//! on-screen caption). Points are flat `x0, y0, x1, y1, ...`, i.e. column
//! first; this module transposes them to `(row, col)` on read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Reading
// ============================================================================

#[derive(Debug, Deserialize)]
struct GroupIn {
    #[serde(default)]
    children: Vec<NodeIn>,
}

#[derive(Debug, Deserialize)]
struct NodeIn {
    #[serde(rename = "className", default)]
    class_name: String,
    #[serde(default)]
    attrs: Value,
}

#[derive(Debug, Deserialize)]
struct LineAttrsIn {
    points: Vec<f64>,
    #[serde(default)]
    stroke: String,
}

/// Geometry and stroke of one free-hand drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct FreehandShape {
    /// Outline vertices as `(row, col)`.
    pub points: Vec<(f64, f64)>,
    /// Raw stroke color text.
    pub stroke: String,
}

/// Decodes a drawing entry, either a serialized group string or an inline
/// group object.
pub fn decode_shape(entry: &Value) -> Result<FreehandShape, String> {
    let group: GroupIn = match entry {
        Value::String(text) => serde_json::from_str(text),
        other => serde_json::from_value(other.clone()),
    }
    .map_err(|e| format!("shape group does not decode: {e}"))?;

    let line = group
        .children
        .into_iter()
        .find(|node| node.class_name == "Line")
        .ok_or_else(|| "shape group has no Line child".to_string())?;

    let attrs: LineAttrsIn = serde_json::from_value(line.attrs)
        .map_err(|e| format!("Line attrs do not decode: {e}"))?;

    if attrs.points.len() % 2 != 0 {
        return Err(format!(
            "Line has an odd number of coordinates ({})",
            attrs.points.len()
        ));
    }

    let points = attrs
        .points
        .chunks_exact(2)
        .map(|xy| (xy[1], xy[0]))
        .collect();

    Ok(FreehandShape {
        points,
        stroke: attrs.stroke,
    })
}

// ============================================================================
// Writing
// ============================================================================

/// Horizontal position of synthesized captions.
pub const CAPTION_X: u32 = 150;
/// Vertical position of the first synthesized caption in a slice.
pub const CAPTION_TOP: u32 = 10;
/// Vertical distance between consecutive captions in a slice.
pub const CAPTION_STEP: u32 = 12;

/// A free-hand drawing synthesized from a label volume.
#[derive(Clone, Debug)]
pub struct NewDrawing<'a> {
    pub id: &'a str,
    pub text: &'a str,
    /// Flat `col, row, col, row, ...` coordinates.
    pub points: &'a [usize],
    /// CSS color used for the stroke and the caption.
    pub color: &'a str,
    /// Caption anchor `(x, y)`.
    pub caption_at: (u32, u32),
}

impl NewDrawing<'_> {
    /// Serializes the drawing the way the viewer stores it: as a JSON string.
    pub fn to_entry(&self) -> Result<String, serde_json::Error> {
        let group = Node {
            attrs: GroupAttrs {
                name: "freeHand-group",
                visible: true,
                id: self.id,
            },
            class_name: "Group",
            children: Some((
                Node {
                    attrs: LineAttrs {
                        points: self.points,
                        stroke: self.color,
                        stroke_width: 2,
                        name: "shape",
                        tension: 0.5,
                        draggable: true,
                    },
                    class_name: "Line",
                    children: None::<()>,
                },
                Node {
                    attrs: CaptionAttrs {
                        x: self.caption_at.0,
                        y: self.caption_at.1,
                        name: "label",
                    },
                    class_name: "Label",
                    children: Some((
                        Node {
                            attrs: TextAttrs {
                                font_size: 11,
                                font_family: "Verdana",
                                fill: self.color,
                                name: "text",
                                text: self.text,
                            },
                            class_name: "Text",
                            children: None::<()>,
                        },
                        Node {
                            attrs: TagAttrs {
                                width: 24,
                                height: 12,
                            },
                            class_name: "Tag",
                            children: None::<()>,
                        },
                    )),
                },
            )),
        };
        serde_json::to_string(&group)
    }
}

#[derive(Serialize)]
struct Node<A, C> {
    attrs: A,
    #[serde(rename = "className")]
    class_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<C>,
}

#[derive(Serialize)]
struct GroupAttrs<'a> {
    name: &'static str,
    visible: bool,
    id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LineAttrs<'a> {
    points: &'a [usize],
    stroke: &'a str,
    stroke_width: u32,
    name: &'static str,
    tension: f64,
    draggable: bool,
}

#[derive(Serialize)]
struct CaptionAttrs {
    x: u32,
    y: u32,
    name: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextAttrs<'a> {
    font_size: u32,
    font_family: &'static str,
    fill: &'a str,
    name: &'static str,
    text: &'a str,
}

#[derive(Serialize)]
struct TagAttrs {
    width: u32,
    height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWER_ENTRY: &str = r##"{"attrs":{"name":"freeHand-group","visible":true,"id":"x1"},"className":"Group","children":[{"attrs":{"points":[10,2,14,2,14,6],"stroke":"#ffff80","strokeWidth":2,"name":"shape","tension":0.5},"className":"Line"},{"attrs":{"x":10,"y":2,"name":"label"},"className":"Label","children":[]}]}"##;

    #[test]
    fn decodes_serialized_group_and_transposes_points() {
        let shape = decode_shape(&Value::String(VIEWER_ENTRY.to_string())).unwrap();
        assert_eq!(shape.points, vec![(2.0, 10.0), (2.0, 14.0), (6.0, 14.0)]);
        assert_eq!(shape.stroke, "#ffff80");
    }

    #[test]
    fn decodes_inline_group_object() {
        let inline: Value = serde_json::from_str(VIEWER_ENTRY).unwrap();
        let shape = decode_shape(&inline).unwrap();
        assert_eq!(shape.points.len(), 3);
    }

    #[test]
    fn rejects_odd_coordinate_count() {
        let entry = r##"{"children":[{"className":"Line","attrs":{"points":[1,2,3],"stroke":"#000000"}}]}"##;
        let err = decode_shape(&Value::String(entry.to_string())).unwrap_err();
        assert!(err.contains("odd number"));
    }

    #[test]
    fn rejects_group_without_line() {
        let entry = r#"{"children":[{"className":"Label","attrs":{}}]}"#;
        let err = decode_shape(&Value::String(entry.to_string())).unwrap_err();
        assert!(err.contains("no Line child"));
    }

    #[test]
    fn new_drawing_matches_viewer_layout() {
        let drawing = NewDrawing {
            id: "liver0",
            text: "liver",
            points: &[3, 1, 4, 1],
            color: "rgba(1,2,3,0.5)",
            caption_at: (150, 10),
        };
        let entry = drawing.to_entry().unwrap();
        assert_eq!(
            entry,
            concat!(
                r#"{"attrs":{"name":"freeHand-group","visible":true,"id":"liver0"},"className":"Group","#,
                r#""children":[{"attrs":{"points":[3,1,4,1],"stroke":"rgba(1,2,3,0.5)","strokeWidth":2,"#,
                r#""name":"shape","tension":0.5,"draggable":true},"className":"Line"},"#,
                r#"{"attrs":{"x":150,"y":10,"name":"label"},"className":"Label","children":["#,
                r#"{"attrs":{"fontSize":11,"fontFamily":"Verdana","fill":"rgba(1,2,3,0.5)","name":"text","#,
                r#""text":"liver"},"className":"Text"},{"attrs":{"width":24,"height":12},"className":"Tag"}]}]}"#,
            )
        );

        let decoded = decode_shape(&Value::String(entry)).unwrap();
        assert_eq!(decoded.points, vec![(1.0, 3.0), (1.0, 4.0)]);
    }
}
