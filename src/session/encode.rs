//! Label volume -> viewer document.

use log::debug;
use ndarray::Axis;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

use super::report::SessionReport;
use super::Session;
use crate::document::shape::{CAPTION_STEP, CAPTION_TOP, CAPTION_X};
use crate::document::{invalid, AnnotationDocument, DrawingDetail, NewDrawing, Viewport};
use crate::error::LabelBridgeError;
use crate::volume::{label_regions, volume_index, LabelVolume, Region};

/// Opacity of synthesized strokes.
const STROKE_ALPHA: f64 = 0.5;

impl Session {
    /// Encodes `volume` into a fresh document using `viewport`.
    pub fn encode(
        &self,
        volume: &LabelVolume,
        viewport: &Viewport,
    ) -> Result<(AnnotationDocument, SessionReport), LabelBridgeError> {
        let mut document = AnnotationDocument::empty(volume.dim().0, viewport);
        let report = self.encode_into(volume, &mut document)?;
        Ok((document, report))
    }

    /// Appends one drawing per connected region of `volume` to `document`.
    ///
    /// Existing drawings are kept and new ones are numbered after them. Every
    /// value in the volume must have a registered name and a ledger entry.
    /// Nothing is written to `document` unless every slice succeeds.
    ///
    /// A drawing lists every cell of its region. Regions of one or two cells,
    /// or cells along a single line, give outlines with no area, which
    /// [`Session::decode`] rejects as `DegeneratePolygon`.
    pub fn encode_into(
        &self,
        volume: &LabelVolume,
        document: &mut AnnotationDocument,
    ) -> Result<SessionReport, LabelBridgeError> {
        let path = Path::new("<document>");
        let depth = volume.dim().0;
        document.check_layout(depth, path)?;

        let mut report = SessionReport::new("encode");
        report.counts.slices = depth;

        // Indexed by volume plane.
        let planes: Vec<Vec<Region>> = volume
            .axis_iter(Axis(0))
            .into_par_iter()
            .enumerate()
            .map(|(z, plane)| label_regions(plane, volume_index(z, depth)))
            .collect::<Result<_, _>>()?;

        // Every slice is built before the document is touched, so a failed
        // call leaves it unchanged.
        let mut pending: Vec<(usize, usize, Vec<String>, Vec<DrawingDetail>)> = Vec::new();
        for slice in 0..depth {
            let regions = &planes[volume_index(slice, depth)];
            let existing = document.container(slice).map_or(0, |c| c.length);
            let recorded = document.details(slice).map_or(0, <[DrawingDetail]>::len);
            report.counts.drawings_read += existing;
            if recorded != existing {
                return Err(invalid(
                    path,
                    format!("slice {slice} has {existing} drawings but {recorded} detail records"),
                ));
            }
            if regions.is_empty() {
                continue;
            }

            let (entries, details) = self.slice_drawings(regions, slice, path)?;
            report.counts.drawings_written += entries.len();
            pending.push((slice, existing, entries, details));
        }

        for (slice, existing, entries, details) in pending {
            let container = document
                .container_mut(slice)
                .ok_or_else(|| invalid(path, format!("slice {slice} has no frame 0")))?;
            container.length = existing + entries.len();
            for (k, entry) in entries.into_iter().enumerate() {
                container.insert(existing + k, entry);
            }

            document
                .details_mut(slice)
                .ok_or_else(|| invalid(path, format!("slice {slice} has no frame 0")))?
                .extend(details);
        }

        debug!(
            "encoded {} drawing(s) over {depth} slice(s)",
            report.counts.drawings_written
        );
        Ok(report)
    }

    /// Serialized drawings and detail records for the regions of one slice.
    fn slice_drawings(
        &self,
        regions: &[Region],
        slice: usize,
        path: &Path,
    ) -> Result<(Vec<String>, Vec<DrawingDetail>), LabelBridgeError> {
        let mut ordinals: BTreeMap<&str, usize> = BTreeMap::new();
        let mut entries = Vec::with_capacity(regions.len());
        let mut details = Vec::with_capacity(regions.len());

        for (k, region) in regions.iter().enumerate() {
            let name = self
                .registry
                .name_of(region.value)
                .ok_or(LabelBridgeError::UnregisteredValue {
                    slice,
                    value: region.value.get(),
                })?;
            let style = self
                .ledger
                .get(name)
                .ok_or_else(|| LabelBridgeError::MissingStyle(name.to_string()))?;

            let ordinal = ordinals.entry(name).or_insert(0);
            let id = format!("{name}{ordinal}");
            *ordinal += 1;

            let color = style.color().to_rgba(STROKE_ALPHA);
            let points: Vec<usize> = region
                .cells
                .iter()
                .flat_map(|&(row, col)| [col, row])
                .collect();
            let entry = NewDrawing {
                id: &id,
                text: name,
                points: &points,
                color: &color,
                caption_at: (CAPTION_X, CAPTION_TOP + k as u32 * CAPTION_STEP),
            }
            .to_entry()
            .map_err(|source| LabelBridgeError::DocumentWrite {
                path: path.to_path_buf(),
                source,
            })?;

            entries.push(entry);
            details.push(DrawingDetail {
                id,
                text_expr: name.to_string(),
                long_text: format!("{{\"value\":{}}}", region.value),
                quant: serde_json::Value::Null,
            });
        }
        Ok((entries, details))
    }
}
