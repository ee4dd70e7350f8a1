//! Viewer document -> label volume.

use log::{debug, warn};
use ndarray::Axis;
use rayon::prelude::*;
use std::path::Path;

use super::report::{SessionIssue, SessionIssueCode, SessionReport};
use super::{DecodeOptions, Session};
use crate::document::{decode_shape, invalid, AnnotationDocument, DescriptionPayload};
use crate::error::LabelBridgeError;
use crate::label::{LabelStyle, LabelValue, Registration, Rgb};
use crate::raster::ConvexHull;
use crate::volume::{volume_index, LabelVolume};

/// A resolved drawing waiting to be rasterized.
struct PlannedFill {
    hull: ConvexHull,
    value: u8,
}

impl Session {
    /// Rasterizes every resolvable drawing of `document` into `volume`.
    ///
    /// The volume is `(Z, X, Y)` and the document must have exactly `Z`
    /// slices. Drawings are applied in document order per slice; later
    /// drawings overwrite earlier ones where they overlap. Drawings without a
    /// name or value are skipped and listed in the report.
    pub fn decode(
        &mut self,
        document: &AnnotationDocument,
        volume: &mut LabelVolume,
        opts: &DecodeOptions,
    ) -> Result<SessionReport, LabelBridgeError> {
        let path = Path::new("<document>");
        let (depth, rows, cols) = volume.dim();
        document.check_layout(depth, path)?;

        let mut report = SessionReport::new("decode");
        report.counts.slices = depth;

        // Label resolution runs in document order, so seeded sessions stay
        // reproducible. A failed call leaves the session as it found it.
        let checkpoint = (self.registry.clone(), self.ledger.clone());
        let plans = match self.plan_fills(document, depth, opts, &mut report) {
            Ok(plans) => plans,
            Err(err) => {
                (self.registry, self.ledger) = checkpoint;
                return Err(err);
            }
        };

        volume
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(z, mut plane)| {
                for fill in &plans[z] {
                    for (row, col) in fill.hull.cells(rows, cols) {
                        plane[[row, col]] = fill.value;
                    }
                }
            });

        debug!(
            "decoded {} of {} drawing(s) over {depth} slice(s)",
            report.counts.drawings_applied, report.counts.drawings_read
        );
        Ok(report)
    }

    /// Resolves every drawing and computes its hull, one list per plane.
    fn plan_fills(
        &mut self,
        document: &AnnotationDocument,
        depth: usize,
        opts: &DecodeOptions,
        report: &mut SessionReport,
    ) -> Result<Vec<Vec<PlannedFill>>, LabelBridgeError> {
        let path = Path::new("<document>");
        let mut plans: Vec<Vec<PlannedFill>> = (0..depth).map(|_| Vec::new()).collect();

        for slice in 0..depth {
            let (Some(container), Some(details)) =
                (document.container(slice), document.details(slice))
            else {
                return Err(invalid(path, format!("slice {slice} has no frame 0")));
            };

            for drawing in 0..container.length {
                report.counts.drawings_read += 1;
                let detail = details.get(drawing).ok_or_else(|| {
                    invalid(
                        path,
                        format!("slice {slice} drawing {drawing} has no details record"),
                    )
                })?;

                if let Some(only) = &opts.labels {
                    if !only.contains(&detail.text_expr) {
                        report.add(
                            SessionIssue::info(
                                SessionIssueCode::FilteredLabel,
                                format!("label '{}' not selected", detail.text_expr),
                            )
                            .at(slice, drawing),
                        );
                        continue;
                    }
                }

                let entry = container.entry(drawing).ok_or_else(|| {
                    invalid(path, format!("slice {slice} has no drawing '{drawing}'"))
                })?;
                let shape =
                    decode_shape(entry).map_err(|message| LabelBridgeError::DrawingInvalid {
                        slice,
                        drawing,
                        message,
                    })?;

                let payload = match DescriptionPayload::parse(&detail.long_text) {
                    Ok(payload) => payload,
                    Err(message) => {
                        warn!("slice {slice} drawing {drawing}: malformed longText: {message}");
                        report.add(
                            SessionIssue::warning(
                                SessionIssueCode::MalformedPayload,
                                format!("longText ignored: {message}"),
                            )
                            .at(slice, drawing),
                        );
                        None
                    }
                };

                let Some(registration) = self.resolve_drawing(
                    &detail.text_expr,
                    payload.as_ref(),
                    slice,
                    drawing,
                    report,
                )?
                else {
                    warn!("drawing {drawing} is not defined at slice {slice}");
                    report.add(
                        SessionIssue::warning(
                            SessionIssueCode::UnresolvableLabel,
                            "drawing has neither a label nor a value",
                        )
                        .at(slice, drawing),
                    );
                    continue;
                };

                if !self.ledger.contains(&registration.name) {
                    let color = Rgb::parse(&shape.stroke).ok_or_else(|| LabelBridgeError::InvalidColor {
                        slice,
                        drawing,
                        color: shape.stroke.clone(),
                    })?;
                    let mut style = LabelStyle::new(color, registration.value);
                    if let Some(payload) = &payload {
                        style.threshold = payload.threshold;
                        style.two = payload.two;
                        style.three = payload.three;
                    }
                    self.ledger.insert_if_absent(registration.name.clone(), style);
                }

                let hull = ConvexHull::from_points(&shape.points).map_err(|reason| {
                    LabelBridgeError::DegeneratePolygon {
                        slice,
                        drawing,
                        reason: reason.to_string(),
                    }
                })?;

                plans[volume_index(slice, depth)].push(PlannedFill {
                    hull,
                    value: registration.value.get(),
                });
                report.counts.drawings_applied += 1;
            }
        }
        Ok(plans)
    }

    /// Applies the name/payload value policy to one drawing.
    fn resolve_drawing(
        &mut self,
        name: &str,
        payload: Option<&DescriptionPayload>,
        slice: usize,
        drawing: usize,
        report: &mut SessionReport,
    ) -> Result<Option<Registration>, LabelBridgeError> {
        let explicit = match payload {
            None => None,
            Some(payload) if !name.is_empty() && self.registry.contains(name) => {
                if let (Some(requested), Some(current)) = (payload.value, self.registry.get(name)) {
                    if requested != i64::from(current.get()) {
                        report.add(
                            SessionIssue::info(
                                SessionIssueCode::IgnoredExplicitValue,
                                format!(
                                    "label '{name}' keeps value {current}; payload value {requested} ignored"
                                ),
                            )
                            .at(slice, drawing),
                        );
                    }
                }
                None
            }
            Some(payload) => payload.value.map(LabelValue::try_from).transpose()?,
        };

        let registration = self.registry.resolve(name, explicit);
        if let Some(reg) = registration.as_ref().filter(|reg| reg.newly_registered) {
            debug!("registered label '{}' as {}", reg.name, reg.value);
            report.counts.labels_registered += 1;
            if let Some(other) = &reg.shares_value_with {
                report.add(
                    SessionIssue::warning(
                        SessionIssueCode::LabelValueCollision,
                        format!("label '{}' shares value {} with '{other}'", reg.name, reg.value),
                    )
                    .at(slice, drawing),
                );
            }
        }
        Ok(registration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DrawingDetail, NewDrawing, Viewport};
    use crate::session::SessionOptions;

    fn session() -> Session {
        Session::new(&SessionOptions {
            seed: Some(11),
            ..Default::default()
        })
    }

    /// Viewer-style entry for an axis-aligned rectangle in `(row, col)`.
    fn rect_entry(r0: usize, c0: usize, r1: usize, c1: usize, stroke: &str) -> String {
        let points = [c0, r0, c1, r0, c1, r1, c0, r1];
        NewDrawing {
            id: "d",
            text: "",
            points: &points,
            color: stroke,
            caption_at: (0, 0),
        }
        .to_entry()
        .unwrap()
    }

    fn push(doc: &mut AnnotationDocument, slice: usize, entry: String, name: &str, long_text: &str) {
        let container = doc.container_mut(slice).unwrap();
        let index = container.length;
        container.insert(index, entry);
        container.length += 1;
        doc.details_mut(slice).unwrap().push(DrawingDetail {
            id: format!("d{index}"),
            text_expr: name.to_string(),
            long_text: long_text.to_string(),
            quant: serde_json::Value::Null,
        });
    }

    #[test]
    fn named_rectangle_lands_on_reversed_plane() {
        let mut doc = AnnotationDocument::empty(2, &Viewport::default());
        push(&mut doc, 0, rect_entry(2, 3, 5, 6, "#ff0000"), "liver", "");
        let mut volume = LabelVolume::zeros((2, 10, 10));
        let mut session = session();

        let report = session.decode(&doc, &mut volume, &DecodeOptions::default()).unwrap();
        assert_eq!(report.counts.drawings_applied, 1);

        let value = session.registry().get("liver").unwrap().get();
        assert!((100..=254).contains(&value));
        for row in 0..10 {
            for col in 0..10 {
                let inside = (2..=5).contains(&row) && (3..=6).contains(&col);
                assert_eq!(volume[[1, row, col]], if inside { value } else { 0 });
                assert_eq!(volume[[0, row, col]], 0);
            }
        }
        let style = session.ledger().get("liver").unwrap();
        assert_eq!(style.color(), Rgb::new(255, 0, 0));
        assert_eq!(style.value.get(), value);
    }

    #[test]
    fn unnamed_value_payload_synthesizes_label() {
        let mut doc = AnnotationDocument::empty(1, &Viewport::default());
        push(&mut doc, 0, rect_entry(0, 0, 2, 2, "#00ff00"), "", "{'value': 5}");
        let mut volume = LabelVolume::zeros((1, 4, 4));
        let mut session = session();

        session.decode(&doc, &mut volume, &DecodeOptions::default()).unwrap();
        assert_eq!(session.registry().get("lbl_5").map(|v| v.get()), Some(5));
        assert_eq!(volume[[0, 1, 1]], 5);
        assert!(session.ledger().contains("lbl_5"));
    }

    #[test]
    fn unresolvable_drawing_is_skipped_and_reported() {
        let mut doc = AnnotationDocument::empty(3, &Viewport::default());
        push(&mut doc, 1, rect_entry(0, 0, 2, 2, "#00ff00"), "", "");
        let mut volume = LabelVolume::zeros((3, 4, 4));
        let mut session = session();

        let report = session.decode(&doc, &mut volume, &DecodeOptions::default()).unwrap();
        assert!(session.registry().is_empty());
        assert!(session.ledger().is_empty());
        assert_eq!(report.unresolved_slices(), vec![1]);
        assert!(volume.iter().all(|&v| v == 0));
    }

    #[test]
    fn registered_name_wins_over_payload_value() {
        let mut doc = AnnotationDocument::empty(1, &Viewport::default());
        push(&mut doc, 0, rect_entry(0, 0, 1, 1, "#010203"), "liver", "{\"value\": 7}");
        push(&mut doc, 0, rect_entry(2, 2, 3, 3, "#040506"), "liver", "{\"value\": 9, \"threshold\": 1}");
        let mut volume = LabelVolume::zeros((1, 4, 4));
        let mut session = session();

        let report = session.decode(&doc, &mut volume, &DecodeOptions::default()).unwrap();
        assert_eq!(session.registry().get("liver").map(|v| v.get()), Some(7));
        assert_eq!(volume[[0, 3, 3]], 7);
        assert_eq!(report.info_count(), 1);

        // The ledger keeps the first drawing's color and lack of threshold.
        let style = session.ledger().get("liver").unwrap();
        assert_eq!(style.color(), Rgb::new(1, 2, 3));
        assert_eq!(style.threshold, None);
    }

    #[test]
    fn payload_metadata_fills_the_ledger() {
        let mut doc = AnnotationDocument::empty(1, &Viewport::default());
        push(
            &mut doc,
            0,
            rect_entry(0, 0, 1, 1, "#ffff80"),
            "porta",
            "{'threshold': 115, 'two': 1, 'three': false}",
        );
        let mut volume = LabelVolume::zeros((1, 4, 4));
        let mut session = session();
        session.decode(&doc, &mut volume, &DecodeOptions::default()).unwrap();

        let style = session.ledger().get("porta").unwrap();
        assert!((100..=254).contains(&style.value.get()));
        assert_eq!(style.threshold, Some(115.0));
        assert_eq!(style.two, Some(true));
        assert_eq!(style.three, Some(false));
    }

    #[test]
    fn malformed_payload_falls_back_to_name() {
        let mut doc = AnnotationDocument::empty(1, &Viewport::default());
        push(&mut doc, 0, rect_entry(0, 0, 1, 1, "#ffffff"), "liver", "{value: 3");
        push(&mut doc, 0, rect_entry(2, 2, 3, 3, "#ffffff"), "", "not json");
        let mut volume = LabelVolume::zeros((1, 4, 4));
        let mut session = session();

        let report = session.decode(&doc, &mut volume, &DecodeOptions::default()).unwrap();
        assert!(session.registry().contains("liver"));
        assert_eq!(session.registry().len(), 1);
        assert_eq!(report.warning_count(), 3);
        assert_eq!(report.unresolved_slices(), vec![0]);
    }

    #[test]
    fn label_filter_skips_other_drawings() {
        let mut doc = AnnotationDocument::empty(1, &Viewport::default());
        push(&mut doc, 0, rect_entry(0, 0, 1, 1, "#ffffff"), "liver", "");
        push(&mut doc, 0, rect_entry(2, 2, 3, 3, "#ffffff"), "lesions", "");
        let mut volume = LabelVolume::zeros((1, 4, 4));
        let mut session = session();

        let report = session
            .decode(&doc, &mut volume, &DecodeOptions::only(["lesions"]))
            .unwrap();
        assert!(!session.registry().contains("liver"));
        assert!(session.registry().contains("lesions"));
        assert_eq!(volume[[0, 0, 0]], 0);
        assert_eq!(report.counts.drawings_applied, 1);
    }

    #[test]
    fn later_drawings_overwrite_earlier_ones() {
        let mut doc = AnnotationDocument::empty(1, &Viewport::default());
        push(&mut doc, 0, rect_entry(0, 0, 3, 3, "#ffffff"), "", "{\"value\": 1}");
        push(&mut doc, 0, rect_entry(1, 1, 2, 2, "#ffffff"), "", "{\"value\": 2}");
        let mut volume = LabelVolume::zeros((1, 4, 4));
        session().decode(&doc, &mut volume, &DecodeOptions::default()).unwrap();
        assert_eq!(volume[[0, 0, 0]], 1);
        assert_eq!(volume[[0, 1, 1]], 2);
    }

    #[test]
    fn out_of_range_payload_value_is_an_error() {
        let mut doc = AnnotationDocument::empty(1, &Viewport::default());
        push(&mut doc, 0, rect_entry(0, 0, 1, 1, "#ffffff"), "", "{\"value\": 0}");
        let mut volume = LabelVolume::zeros((1, 4, 4));
        match session().decode(&doc, &mut volume, &DecodeOptions::default()) {
            Err(LabelBridgeError::LabelValueOutOfRange(0)) => {}
            other => panic!("expected LabelValueOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn bad_color_and_degenerate_shape_fail_fast() {
        let mut doc = AnnotationDocument::empty(1, &Viewport::default());
        push(&mut doc, 0, rect_entry(0, 0, 1, 1, "red"), "liver", "");
        let mut volume = LabelVolume::zeros((1, 4, 4));
        assert!(matches!(
            session().decode(&doc, &mut volume, &DecodeOptions::default()),
            Err(LabelBridgeError::InvalidColor { .. })
        ));

        let mut doc = AnnotationDocument::empty(1, &Viewport::default());
        let line = NewDrawing {
            id: "d",
            text: "",
            points: &[0, 0, 3, 3],
            color: "#ffffff",
            caption_at: (0, 0),
        }
        .to_entry()
        .unwrap();
        push(&mut doc, 0, line, "liver", "");
        assert!(matches!(
            session().decode(&doc, &mut volume, &DecodeOptions::default()),
            Err(LabelBridgeError::DegeneratePolygon { slice: 0, drawing: 0, .. })
        ));
    }

    #[test]
    fn failed_decode_leaves_session_untouched() {
        let mut doc = AnnotationDocument::empty(1, &Viewport::default());
        push(&mut doc, 0, rect_entry(0, 0, 1, 1, "#ff0000"), "liver", "");
        push(&mut doc, 0, rect_entry(2, 2, 3, 3, "red"), "spleen", "");
        let mut volume = LabelVolume::zeros((1, 4, 4));
        let mut session = session();
        session.registry_mut().insert("lesions", LabelValue::new(3).unwrap());

        assert!(matches!(
            session.decode(&doc, &mut volume, &DecodeOptions::default()),
            Err(LabelBridgeError::InvalidColor { slice: 0, drawing: 1, .. })
        ));
        assert_eq!(session.registry().len(), 1);
        assert!(session.registry().contains("lesions"));
        assert!(session.ledger().is_empty());
        assert!(volume.iter().all(|&v| v == 0));

        // A corrected document still gets its explicit value.
        let mut fixed = AnnotationDocument::empty(1, &Viewport::default());
        push(&mut fixed, 0, rect_entry(0, 0, 1, 1, "#ff0000"), "liver", "{\"value\": 7}");
        session.decode(&fixed, &mut volume, &DecodeOptions::default()).unwrap();
        assert_eq!(session.registry().get("liver").map(|v| v.get()), Some(7));
        assert!(session.ledger().contains("liver"));
    }

    #[test]
    fn slice_count_must_match_volume_depth() {
        let doc = AnnotationDocument::empty(2, &Viewport::default());
        let mut volume = LabelVolume::zeros((3, 4, 4));
        assert!(matches!(
            session().decode(&doc, &mut volume, &DecodeOptions::default()),
            Err(LabelBridgeError::DocumentInvalid { .. })
        ));
    }
}
