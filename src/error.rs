use std::path::PathBuf;
use thiserror::Error;

/// The main error type for labelbridge operations.
#[derive(Debug, Error)]
pub enum LabelBridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse viewer document from {path}: {source}")]
    DocumentParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write viewer document to {path}: {source}")]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid viewer document {path}: {message}")]
    DocumentInvalid { path: PathBuf, message: String },

    #[error("Invalid drawing {drawing} at slice {slice}: {message}")]
    DrawingInvalid {
        slice: usize,
        drawing: usize,
        message: String,
    },

    #[error("Drawing {drawing} at slice {slice} has unsupported stroke color '{color}'")]
    InvalidColor {
        slice: usize,
        drawing: usize,
        color: String,
    },

    #[error("Drawing {drawing} at slice {slice} is degenerate: {reason}")]
    DegeneratePolygon {
        slice: usize,
        drawing: usize,
        reason: String,
    },

    #[error("Label value {0} is outside 1..=254")]
    LabelValueOutOfRange(i64),

    #[error("No label value owns component {component} at slice {slice}")]
    ReconciliationGap { slice: usize, component: usize },

    #[error("Label value {value} at slice {slice} has no registered name")]
    UnregisteredValue { slice: usize, value: u8 },

    #[error("Label '{0}' has no description (color) entry")]
    MissingStyle(String),

    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    #[error("Failed to read label volume from {path}: {source}")]
    VolumeRead {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    #[error("Failed to write label volume to {path}: {source}")]
    VolumeWrite {
        path: PathBuf,
        #[source]
        source: ndarray_npy::WriteNpyError,
    },

    #[error("Failed to parse session state from {path}: {source}")]
    SessionParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write session state to {path}: {source}")]
    SessionWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize report: {0}")]
    ReportWrite(#[source] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
