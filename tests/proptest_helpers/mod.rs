#![allow(dead_code)]

use labelbridge::document::{AnnotationDocument, DrawingDetail, NewDrawing, Viewport};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const GRID: usize = 16;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Axis-aligned rectangle with inclusive `(row, col)` corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub r0: usize,
    pub c0: usize,
    pub r1: usize,
    pub c1: usize,
}

impl Rect {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.r0..=self.r1).contains(&row) && (self.c0..=self.c1).contains(&col)
    }

    /// Outline as `(row, col)` vertices.
    pub fn vertices(&self) -> Vec<(f64, f64)> {
        let (r0, c0, r1, c1) = (self.r0 as f64, self.c0 as f64, self.r1 as f64, self.c1 as f64);
        vec![(r0, c0), (r0, c1), (r1, c1), (r1, c0)]
    }

    /// Outline as the viewer's flat `x, y` list.
    pub fn flat_points(&self) -> Vec<usize> {
        vec![
            self.c0, self.r0, self.c1, self.r0, self.c1, self.r1, self.c0, self.r1,
        ]
    }
}

/// Rectangles with non-zero area inside a `GRID x GRID` plane.
pub fn arb_rect() -> impl Strategy<Value = Rect> {
    (0..GRID - 1, 0..GRID - 1)
        .prop_flat_map(|(r0, c0)| (Just(r0), Just(c0), r0 + 1..GRID, c0 + 1..GRID))
        .prop_map(|(r0, c0, r1, c1)| Rect { r0, c0, r1, c1 })
}

/// Free-form vertex lists, possibly reaching outside the grid.
pub fn arb_points(max: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-4.0..GRID as f64 + 4.0, -4.0..GRID as f64 + 4.0), 3..=max)
}

/// Appends a named rectangle drawing with a `value` payload to `slice`.
pub fn push_rect(document: &mut AnnotationDocument, slice: usize, rect: Rect, name: &str, value: u8) {
    let points = rect.flat_points();
    let entry = NewDrawing {
        id: name,
        text: name,
        points: &points,
        color: "#ff8000",
        caption_at: (0, 0),
    }
    .to_entry()
    .expect("serialize drawing");

    let container = document.container_mut(slice).expect("slice container");
    let index = container.length;
    container.insert(index, entry);
    container.length += 1;
    document
        .details_mut(slice)
        .expect("slice details")
        .push(DrawingDetail {
            id: format!("{name}{index}"),
            text_expr: name.to_string(),
            long_text: format!("{{\"value\": {value}}}"),
            quant: serde_json::Value::Null,
        });
}

pub fn empty_document(slices: usize) -> AnnotationDocument {
    AnnotationDocument::empty(slices, &Viewport::default())
}
