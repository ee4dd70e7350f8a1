//! Label volume helpers: slice mapping, region labelling and seeds.
//!
//! Volumes are `(Z, X, Y)` arrays of `u8`; 0 is background and every other
//! value names a label.

use ndarray::{Array2, Array3, ArrayView2};
use std::collections::{BTreeSet, VecDeque};
use std::path::Path;

use crate::error::LabelBridgeError;
use crate::label::LabelValue;

/// A 3-D label volume, `(Z, X, Y)`.
pub type LabelVolume = Array3<u8>;

/// Seed value for voxels of the selected label.
pub const SEED_TARGET: u8 = 1;
/// Seed value for voxels of any other label.
pub const SEED_OTHER: u8 = 2;

/// Volume plane holding document slice `slice`.
///
/// The viewer stores slices in the reverse of the volume's Z order. The map is
/// its own inverse. `slice` must be below `depth`.
#[inline]
pub fn volume_index(slice: usize, depth: usize) -> usize {
    debug_assert!(slice < depth, "slice {slice} outside depth {depth}");
    depth - 1 - slice
}

/// One connected region of equal label value in a plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub value: LabelValue,
    /// `(row, col)` cells in raster order.
    pub cells: Vec<(usize, usize)>,
}

/// Distinct non-zero values of a plane, ascending.
pub fn present_labels(plane: ArrayView2<'_, u8>) -> Vec<u8> {
    plane
        .iter()
        .copied()
        .filter(|&v| v != 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Labels 8-connected regions of equal non-zero value.
///
/// Returns the component map (0 = background, components numbered from 1 in
/// raster order of their first cell) and each component's cells in raster
/// order.
pub fn connected_components(plane: ArrayView2<'_, u8>) -> (Array2<u32>, Vec<Vec<(usize, usize)>>) {
    let (rows, cols) = plane.dim();
    let mut map = Array2::<u32>::zeros((rows, cols));
    let mut components: Vec<Vec<(usize, usize)>> = Vec::new();
    let mut queue = VecDeque::new();

    for row in 0..rows {
        for col in 0..cols {
            let value = plane[[row, col]];
            if value == 0 || map[[row, col]] != 0 {
                continue;
            }

            let id = components.len() as u32 + 1;
            let mut cells = Vec::new();
            map[[row, col]] = id;
            queue.push_back((row, col));

            while let Some((r, c)) = queue.pop_front() {
                cells.push((r, c));
                for (nr, nc) in neighbours8(r, c, rows, cols) {
                    if map[[nr, nc]] == 0 && plane[[nr, nc]] == value {
                        map[[nr, nc]] = id;
                        queue.push_back((nr, nc));
                    }
                }
            }

            cells.sort_unstable();
            components.push(cells);
        }
    }

    (map, components)
}

fn neighbours8(
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
) -> impl Iterator<Item = (usize, usize)> {
    (-1isize..=1)
        .flat_map(|dr| (-1isize..=1).map(move |dc| (dr, dc)))
        .filter(|&d| d != (0, 0))
        .filter_map(move |(dr, dc)| {
            let r = row.checked_add_signed(dr)?;
            let c = col.checked_add_signed(dc)?;
            (r < rows && c < cols).then_some((r, c))
        })
}

/// Assigns an owning label to every component.
///
/// Each candidate of `labels` is tried in order and the first one with a cell
/// inside the component wins. Returns the index of the first component no
/// candidate owns.
pub fn reconcile(
    plane: ArrayView2<'_, u8>,
    components: &[Vec<(usize, usize)>],
    labels: &[LabelValue],
) -> Result<Vec<LabelValue>, usize> {
    components
        .iter()
        .enumerate()
        .map(|(index, cells)| {
            labels
                .iter()
                .copied()
                .find(|label| cells.iter().any(|&(r, c)| plane[[r, c]] == label.get()))
                .ok_or(index)
        })
        .collect()
}

/// Splits a plane into labelled regions, one per connected component.
///
/// `slice` is only used for error reporting.
pub fn label_regions(plane: ArrayView2<'_, u8>, slice: usize) -> Result<Vec<Region>, LabelBridgeError> {
    let labels: Vec<LabelValue> = present_labels(plane)
        .into_iter()
        .filter_map(LabelValue::new)
        .collect();
    let (_, components) = connected_components(plane);

    let owners = reconcile(plane, &components, &labels)
        .map_err(|component| LabelBridgeError::ReconciliationGap { slice, component })?;

    Ok(owners
        .into_iter()
        .zip(components)
        .map(|(value, cells)| Region { value, cells })
        .collect())
}

/// Seed volume for one label: 1 on `target`, 2 on other labels, 0 elsewhere.
pub fn seeds(volume: &LabelVolume, target: LabelValue) -> Array3<u8> {
    volume.mapv(|v| match v {
        0 => 0,
        v if v == target.get() => SEED_TARGET,
        _ => SEED_OTHER,
    })
}

/// Read a `u8` label volume from a `.npy` file.
pub fn read_volume(path: &Path) -> Result<LabelVolume, LabelBridgeError> {
    ndarray_npy::read_npy(path).map_err(|source| LabelBridgeError::VolumeRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a `u8` volume to a `.npy` file.
pub fn write_volume(path: &Path, volume: &Array3<u8>) -> Result<(), LabelBridgeError> {
    ndarray_npy::write_npy(path, volume).map_err(|source| LabelBridgeError::VolumeWrite {
        path: path.to_path_buf(),
        source,
    })
}
