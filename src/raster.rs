//! Convex-hull polygon fill.
//!
//! A free-hand outline is filled by taking the convex hull of its vertices
//! and keeping every grid cell inside or on that hull. Concave bites in the
//! outline are therefore filled in; decoded seeds are always convex.

use std::fmt;

/// Relative tolerance for on-edge membership.
const EDGE_EPS: f64 = 1e-9;

/// Why a point set has no usable hull.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HullError {
    /// Fewer than three vertices were supplied.
    TooFewPoints(usize),
    /// All vertices are coincident or collinear.
    ZeroArea,
}

impl fmt::Display for HullError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HullError::TooFewPoints(n) => write!(f, "{n} point(s), at least 3 required"),
            HullError::ZeroArea => write!(f, "points are collinear, hull has no area"),
        }
    }
}

/// A convex polygon with counter-clockwise vertices in `(row, col)` space.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexHull {
    vertices: Vec<(f64, f64)>,
}

impl ConvexHull {
    /// Builds the hull of `points` (monotone chain).
    pub fn from_points(points: &[(f64, f64)]) -> Result<Self, HullError> {
        if points.len() < 3 {
            return Err(HullError::TooFewPoints(points.len()));
        }

        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        sorted.dedup();

        let mut lower: Vec<(f64, f64)> = Vec::with_capacity(sorted.len());
        for &p in &sorted {
            while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0
            {
                lower.pop();
            }
            lower.push(p);
        }

        let mut upper: Vec<(f64, f64)> = Vec::with_capacity(sorted.len());
        for &p in sorted.iter().rev() {
            while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0
            {
                upper.pop();
            }
            upper.push(p);
        }

        lower.pop();
        upper.pop();
        lower.extend(upper);

        if lower.len() < 3 {
            return Err(HullError::ZeroArea);
        }
        Ok(Self { vertices: lower })
    }

    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    /// True when `p` lies inside the hull or on its boundary.
    pub fn contains(&self, p: (f64, f64)) -> bool {
        let n = self.vertices.len();
        (0..n).all(|i| {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let edge = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
            cross(a, b, p) >= -EDGE_EPS * edge.max(1.0)
        })
    }

    /// Axis-aligned bounds `(min_row, min_col, max_row, max_col)`.
    fn bounds(&self) -> (f64, f64, f64, f64) {
        self.vertices.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(r0, c0, r1, c1), &(r, c)| (r0.min(r), c0.min(c), r1.max(r), c1.max(c)),
        )
    }

    /// Every cell of a `rows x cols` grid covered by the hull, row-major.
    ///
    /// Cells outside the hull's bounding box are never inside it, so only that
    /// box (clamped to the grid) is scanned; the result equals a full-plane
    /// scan.
    pub fn cells(&self, rows: usize, cols: usize) -> Vec<(usize, usize)> {
        let (r0, c0, r1, c1) = self.bounds();
        let Some((row_lo, row_hi)) = clamp_span(r0, r1, rows) else {
            return Vec::new();
        };
        let Some((col_lo, col_hi)) = clamp_span(c0, c1, cols) else {
            return Vec::new();
        };

        let mut cells = Vec::new();
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                if self.contains((row as f64, col as f64)) {
                    cells.push((row, col));
                }
            }
        }
        cells
    }
}

/// Fills the convex hull of `points` over a `rows x cols` grid.
pub fn fill(points: &[(f64, f64)], rows: usize, cols: usize) -> Result<Vec<(usize, usize)>, HullError> {
    Ok(ConvexHull::from_points(points)?.cells(rows, cols))
}

/// Twice the signed area of `(o, a, b)`; positive for a left turn.
fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn clamp_span(lo: f64, hi: f64, len: usize) -> Option<(usize, usize)> {
    if len == 0 || hi < -1.0 || lo > len as f64 {
        return None;
    }
    let first = lo.floor().max(0.0) as usize;
    let last = (hi.ceil().max(0.0) as usize).min(len - 1);
    (first <= last).then_some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn rect(r0: f64, c0: f64, r1: f64, c1: f64) -> Vec<(f64, f64)> {
        vec![(r0, c0), (r0, c1), (r1, c1), (r1, c0)]
    }

    #[test]
    fn rectangle_fills_exactly_its_cells() {
        let cells = fill(&rect(2.0, 3.0, 5.0, 7.0), 10, 10).unwrap();
        let expected: Vec<(usize, usize)> = (2..=5)
            .flat_map(|r| (3..=7).map(move |c| (r, c)))
            .collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn concave_c_shape_is_filled_to_its_hull() {
        // A "C" opening to the right: the notch rows 3..=5, cols 3..=6 is
        // outside the outline but inside the hull.
        let c_shape = vec![
            (1.0, 1.0),
            (1.0, 6.0),
            (2.0, 6.0),
            (2.0, 2.0),
            (6.0, 2.0),
            (6.0, 6.0),
            (7.0, 6.0),
            (7.0, 1.0),
        ];
        let cells: BTreeSet<_> = fill(&c_shape, 10, 10).unwrap().into_iter().collect();
        let hull: BTreeSet<_> = fill(&rect(1.0, 1.0, 7.0, 6.0), 10, 10)
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(cells, hull);
        for notch in [(3, 3), (4, 4), (5, 6)] {
            assert!(cells.contains(&notch), "{notch:?} should be filled");
        }
    }

    #[test]
    fn triangle_includes_edges_and_excludes_outside() {
        let tri = vec![(0.0, 0.0), (0.0, 4.0), (4.0, 0.0)];
        let cells: BTreeSet<_> = fill(&tri, 5, 5).unwrap().into_iter().collect();
        assert!(cells.contains(&(2, 2)));
        assert!(cells.contains(&(0, 4)));
        assert!(!cells.contains(&(3, 2)));
        assert_eq!(cells.len(), 15);
    }

    #[test]
    fn shapes_are_clipped_to_the_grid() {
        let cells = fill(&rect(-3.0, -3.0, 1.0, 12.0), 4, 4).unwrap();
        assert_eq!(cells.len(), 8);
        assert!(cells.iter().all(|&(r, c)| r < 4 && c < 4));

        assert!(fill(&rect(20.0, 20.0, 30.0, 30.0), 4, 4).unwrap().is_empty());
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert_eq!(
            fill(&[(0.0, 0.0), (1.0, 1.0)], 5, 5),
            Err(HullError::TooFewPoints(2))
        );
        assert_eq!(
            fill(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)], 5, 5),
            Err(HullError::ZeroArea)
        );
        assert_eq!(
            fill(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)], 5, 5),
            Err(HullError::ZeroArea)
        );
    }

    #[test]
    fn hull_drops_interior_and_collinear_points() {
        let mut points = rect(0.0, 0.0, 4.0, 4.0);
        points.push((2.0, 2.0));
        points.push((0.0, 2.0));
        let hull = ConvexHull::from_points(&points).unwrap();
        assert_eq!(hull.vertices().len(), 4);
    }
}
