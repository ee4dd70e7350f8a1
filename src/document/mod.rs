//! The viewer's annotation document.
//!
//! A document carries the viewport state plus, for every slice of the series,
//! one drawing container (`drawings[s][0]`) and one detail list
//! (`drawingsDetails[s][0]`). The container maps stringified drawing indices
//! to shape groups and counts them in `length`; the detail list holds one
//! `{id, textExpr, longText, quant}` record per drawing, aligned by index.
//!
//! Slice `s` of the document is plane `Z - 1 - s` of the label volume, see
//! [`crate::volume::volume_index`].

pub mod payload;
pub mod shape;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::LabelBridgeError;

pub use payload::DescriptionPayload;
pub use shape::{decode_shape, FreehandShape, NewDrawing};

/// Document format version written into new documents.
pub const DOCUMENT_VERSION: &str = "0.2";

/// The complete viewer document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    pub version: String,
    #[serde(rename = "window-center")]
    pub window_center: Number,
    #[serde(rename = "window-width")]
    pub window_width: Number,
    pub position: Position,
    pub scale: Number,
    #[serde(rename = "scaleCenter")]
    pub scale_center: PlanePoint,
    pub translation: PlanePoint,
    pub drawings: Vec<Vec<DrawingContainer>>,
    #[serde(rename = "drawingsDetails")]
    pub drawings_details: Vec<Vec<Vec<DrawingDetail>>>,
    /// Top-level keys this crate does not interpret, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Viewer position index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub i: Number,
    pub j: Number,
    pub k: Number,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanePoint {
    pub x: Number,
    pub y: Number,
}

impl PlanePoint {
    fn origin() -> Self {
        Self {
            x: 0.into(),
            y: 0.into(),
        }
    }
}

/// The drawings of one slice: `{"length": n, "0": ..., "1": ...}`.
///
/// Entries are kept as raw JSON so drawings this crate did not create survive
/// a read/write cycle unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawingContainer {
    pub length: usize,
    #[serde(flatten)]
    pub entries: BTreeMap<String, Value>,
}

impl DrawingContainer {
    /// Drawing stored under index `index`.
    pub fn entry(&self, index: usize) -> Option<&Value> {
        self.entries.get(&index.to_string())
    }

    /// Stores a serialized drawing under index `index`.
    pub fn insert(&mut self, index: usize, entry: String) {
        self.entries.insert(index.to_string(), Value::String(entry));
    }
}

/// Per-drawing metadata record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawingDetail {
    #[serde(default)]
    pub id: String,
    /// Label name; may be empty.
    #[serde(rename = "textExpr", default)]
    pub text_expr: String,
    /// Free-text description payload; may be empty.
    #[serde(rename = "longText", default)]
    pub long_text: String,
    #[serde(default)]
    pub quant: Value,
}

/// Viewport state used when synthesizing a new document.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    pub window_center: Number,
    pub window_width: Number,
    pub position: Position,
    pub scale: Number,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            window_center: 50.into(),
            window_width: 350.into(),
            position: Position {
                i: 0.into(),
                j: 0.into(),
                k: 0.into(),
            },
            scale: 1.into(),
        }
    }
}

impl AnnotationDocument {
    /// A document with `slices` empty slices.
    pub fn empty(slices: usize, viewport: &Viewport) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            window_center: viewport.window_center.clone(),
            window_width: viewport.window_width.clone(),
            position: viewport.position.clone(),
            scale: viewport.scale.clone(),
            scale_center: PlanePoint::origin(),
            translation: PlanePoint::origin(),
            drawings: vec![vec![DrawingContainer::default()]; slices],
            drawings_details: vec![vec![Vec::new()]; slices],
            extra: Map::new(),
        }
    }

    /// Number of slices covered by the document.
    pub fn slice_count(&self) -> usize {
        self.drawings.len()
    }

    /// Drawing container of `slice`.
    pub fn container(&self, slice: usize) -> Option<&DrawingContainer> {
        self.drawings.get(slice)?.first()
    }

    pub fn container_mut(&mut self, slice: usize) -> Option<&mut DrawingContainer> {
        self.drawings.get_mut(slice)?.first_mut()
    }

    /// Detail records of `slice`.
    pub fn details(&self, slice: usize) -> Option<&[DrawingDetail]> {
        self.drawings_details
            .get(slice)?
            .first()
            .map(Vec::as_slice)
    }

    pub fn details_mut(&mut self, slice: usize) -> Option<&mut Vec<DrawingDetail>> {
        self.drawings_details.get_mut(slice)?.first_mut()
    }

    /// Total number of drawings over all slices.
    pub fn drawing_count(&self) -> usize {
        (0..self.slice_count())
            .filter_map(|s| self.container(s))
            .map(|c| c.length)
            .sum()
    }

    /// Checks the per-slice layout against a volume depth.
    pub fn check_layout(&self, depth: usize, path: &Path) -> Result<(), LabelBridgeError> {
        if self.drawings.len() != depth || self.drawings_details.len() != depth {
            return Err(invalid(
                path,
                format!(
                    "document has {} drawing slices and {} detail slices; volume has {depth}",
                    self.drawings.len(),
                    self.drawings_details.len()
                ),
            ));
        }
        for slice in 0..depth {
            if self.container(slice).is_none() || self.details(slice).is_none() {
                return Err(invalid(path, format!("slice {slice} has no frame 0")));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Public I/O API
// ============================================================================

/// Read a viewer document from a JSON file.
pub fn read_document(path: &Path) -> Result<AnnotationDocument, LabelBridgeError> {
    let file = File::open(path).map_err(LabelBridgeError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| LabelBridgeError::DocumentParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a viewer document as compact JSON.
pub fn write_document(path: &Path, document: &AnnotationDocument) -> Result<(), LabelBridgeError> {
    let file = File::create(path).map_err(LabelBridgeError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer(writer, document).map_err(|source| LabelBridgeError::DocumentWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a viewer document from a string.
pub fn from_document_str(json: &str) -> Result<AnnotationDocument, LabelBridgeError> {
    serde_json::from_str(json).map_err(|source| LabelBridgeError::DocumentParse {
        path: Path::new("<string>").to_path_buf(),
        source,
    })
}

/// Parse a viewer document from bytes.
pub fn from_document_slice(bytes: &[u8]) -> Result<AnnotationDocument, LabelBridgeError> {
    serde_json::from_slice(bytes).map_err(|source| LabelBridgeError::DocumentParse {
        path: Path::new("<bytes>").to_path_buf(),
        source,
    })
}

/// Serialize a viewer document to a compact JSON string.
pub fn to_document_string(document: &AnnotationDocument) -> Result<String, LabelBridgeError> {
    serde_json::to_string(document).map_err(|source| LabelBridgeError::DocumentWrite {
        path: Path::new("<string>").to_path_buf(),
        source,
    })
}

pub(crate) fn invalid(path: &Path, message: impl Into<String>) -> LabelBridgeError {
    LabelBridgeError::DocumentInvalid {
        path: path.to_path_buf(),
        message: message.into(),
    }
}
