//! Cell reordering between grid layouts.
//!
//! Two unrelated operations live here:
//!
//! - [`transpose`] is a true matrix transpose over the stored dimensions,
//!   used for the canonical v2 target which stores grids column-major.
//! - [`clip_to_grid`] lays a source of arbitrary row width onto a fixed
//!   target grid, padding and clipping as needed. It never transposes.

use crate::geometry::GridGeometry;

/// Row-major → column-major.
///
/// Output index `i * height + j` receives input index `j * width + i`.
/// Applying it again with the dimensions swapped restores the input.
/// `cells.len()` must equal `width * height`.
pub fn transpose<T: Copy + Default>(cells: &[T], width: usize, height: usize) -> Vec<T> {
    debug_assert_eq!(cells.len(), width * height);
    let mut out = vec![T::default(); width * height];
    for j in 0..height {
        for i in 0..width {
            out[i * height + j] = cells[j * width + i];
        }
    }
    out
}

/// Column-major → row-major; the inverse of [`transpose`].
pub fn untranspose<T: Copy + Default>(cells: &[T], width: usize, height: usize) -> Vec<T> {
    transpose(cells, height, width)
}

/// Lay `cells` (rows of `src_row_width`) onto `target` in row-major order.
///
/// A target cell whose source index falls outside `cells` is `None`. Source
/// rows narrower than the target are padded on the right; content past the
/// target's last row or column is dropped.
pub fn clip_to_grid<T: Copy>(cells: &[T], src_row_width: usize, target: GridGeometry) -> Vec<Option<T>> {
    let (tw, th) = (target.width as usize, target.height as usize);
    let mut out = Vec::with_capacity(tw * th);
    for y in 0..th {
        for x in 0..tw {
            // A column past the source row would wrap into the next row.
            let cell = if x < src_row_width {
                cells.get(y * src_row_width + x).copied()
            } else {
                None
            };
            out.push(cell);
        }
    }
    out
}
