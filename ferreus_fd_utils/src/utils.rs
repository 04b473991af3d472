/////////////////////////////////////////////////////////////////////////////////////////////
//
// Adds shared helper functions for point arrays, distances, and index sorting.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utils
//!
//! Small helpers shared by the node generation and weight assembly pipelines.

use faer::{Mat, RowRef};

/// Creates a new matrix holding the selected rows of `existing_mat`, in the given order.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_fd_utils::select_mat_rows;
///
/// let points = mat![[0.0, 0.0], [1.0, 0.0], [2.0, 5.0]];
/// let subset = select_mat_rows(&points, &[2, 0]);
///
/// assert_eq!(subset, mat![[2.0, 5.0], [0.0, 0.0]]);
/// ```
#[inline(always)]
pub fn select_mat_rows<T>(existing_mat: &Mat<T>, row_indices: &[usize]) -> Mat<T>
where
    T: Clone,
{
    Mat::from_fn(row_indices.len(), existing_mat.ncols(), |i, j| {
        existing_mat.get(row_indices[i], j).clone()
    })
}

/// Returns the indices that would sort `data` ascending.
///
/// Incomparable elements are left in their original relative order.
///
/// # Examples
///
/// ```
/// use ferreus_fd_utils::argsort;
///
/// let data = [3.0, 1.0, 2.0];
/// assert_eq!(argsort(&data), vec![1, 2, 0]);
/// ```
#[inline(always)]
pub fn argsort<T: PartialOrd>(data: &[T]) -> Vec<usize> {
    let mut indices = (0..data.len()).collect::<Vec<_>>();
    indices.sort_by(|&i, &j| {
        data[i]
            .partial_cmp(&data[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// Returns the Euclidean distance between two coordinate rows.
#[inline(always)]
pub fn get_distance(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    let mut dist = 0.0;
    for (t, s) in target.iter().zip(source.iter()) {
        let diff = t - s;
        dist += diff * diff;
    }
    dist.sqrt()
}

/// Returns the axis-aligned extents of a point array.
///
/// The first `ncols` entries hold the per-column minimums, the second `ncols`
/// entries the per-column maximums.
#[inline(always)]
pub fn get_pointarray_extents<T>(points: &Mat<T>) -> Vec<T>
where
    T: PartialOrd + Clone,
{
    let ncols = points.shape().1;

    let mut extents: Vec<T> = vec![points.get(0, 0).clone(); 2 * ncols];

    for col in 0..ncols {
        extents[col] = points.get(0, col).clone();
        extents[ncols + col] = points.get(0, col).clone();
    }

    for row in 0..points.shape().0 {
        for col in 0..ncols {
            let value = points.get(row, col);
            if *value < extents[col] {
                extents[col] = value.clone();
            }
            if *value > extents[ncols + col] {
                extents[ncols + col] = value.clone();
            }
        }
    }

    extents
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn select_mat_rows_preserves_requested_order() {
        let points = mat![[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]];
        let subset = select_mat_rows(&points, &[2, 2, 0]);
        assert_eq!(subset.nrows(), 3);
        assert_eq!(subset[(0, 1)], 5.0);
        assert_eq!(subset[(1, 0)], 4.0);
        assert_eq!(subset[(2, 0)], 0.0);
    }

    #[test]
    fn argsort_is_stable_for_equal_keys() {
        let data = [2.0, 1.0, 2.0, 0.5];
        assert_eq!(argsort(&data), vec![3, 1, 0, 2]);
    }

    #[test]
    fn distances_and_extents_agree_with_hand_calculations() {
        let points = mat![[0.0, 3.0], [4.0, 0.0], [-1.0, 1.0]];
        assert_eq!(get_distance(points.row(0), points.row(1)), 5.0);
        let extents = get_pointarray_extents(&points);
        assert_eq!(extents, vec![-1.0, 0.0, 4.0, 3.0]);
    }
}
