/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines weight rows and their assembly into a sparse differentiation operator.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # operator
//!
//! A [`WeightRow`] maps one center's stencil indices to its differentiation
//! weights; [`assemble_operator`] stacks many rows into a faer sparse matrix.
//! [`WeightMatrix`] is the assembled operator together with any per-center
//! failures collected during the build.

use std::collections::HashSet;

use faer::Mat;
use faer::sparse::{SparseColMat, Triplet};

use crate::fd::{FdError, WeightMatrixBuilder};
use crate::fd_config::WeightSettings;

/// Differentiation weights for one center node over its stencil.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightRow {
    /// Index of the center node in the node array.
    pub center: usize,
    /// Stencil node indices, nearest first.
    pub stencil: Vec<usize>,
    /// One weight per stencil node.
    pub weights: faer::Row<f64>,
}

/// A per-center failure collected during a weight-matrix build.
#[derive(Debug, Clone, PartialEq)]
pub struct StencilFailure {
    pub center: usize,
    pub error: FdError,
}

/// Assembles weight rows into a sparse operator of shape
/// `rows.len()` x `num_nodes`; `rows[r]` becomes row `r` of the matrix.
///
/// A row with an empty stencil produces a structurally zero matrix row. Two
/// rows for the same center are a caller error and are never combined;
/// [`FdError::DuplicateRow`] names the offending center.
pub fn assemble_operator(
    rows: &[WeightRow],
    num_nodes: usize,
) -> Result<SparseColMat<usize, f64>, FdError> {
    let mut seen = HashSet::with_capacity(rows.len());
    let num_entries = rows.iter().map(|row| row.stencil.len()).sum();
    let mut triplets: Vec<Triplet<usize, usize, f64>> = Vec::with_capacity(num_entries);

    for (r, row) in rows.iter().enumerate() {
        assert_eq!(row.stencil.len(), row.weights.ncols(), "one weight per stencil node");
        if !seen.insert(row.center) {
            return Err(FdError::DuplicateRow { center: row.center });
        }
        for (j, &node) in row.stencil.iter().enumerate() {
            if node >= num_nodes {
                return Err(FdError::Assembly {
                    message: format!(
                        "stencil index {} is outside the {}-node array",
                        node, num_nodes
                    ),
                });
            }
            triplets.push(Triplet::new(r, node, row.weights[j]));
        }
    }

    SparseColMat::try_new_from_triplets(rows.len(), num_nodes, &triplets)
        .map_err(|err| FdError::Assembly {
            message: format!("{err:?}"),
        })
}

/// A sparse differentiation operator over a node array.
///
/// Row `r` applies the requested derivative combination at the `r`-th requested
/// center; multiplying by a column of nodal function values evaluates the
/// operator at every center.
pub struct WeightMatrix {
    pub(crate) matrix: SparseColMat<usize, f64>,
    pub(crate) failures: Vec<StencilFailure>,
}

impl WeightMatrix {
    /// Creates a builder for a weight matrix over `nodes`, solving one stencil
    /// system per entry of `centers`.
    ///
    /// `diffs` lists the derivative multi-indices combined into the operator;
    /// see [`WeightMatrixBuilder`] for the optional per-diff coefficients,
    /// boundary restriction, and progress reporting.
    pub fn builder<'a>(
        centers: &'a [usize],
        nodes: &'a Mat<f64>,
        diffs: Vec<Vec<usize>>,
        settings: WeightSettings,
    ) -> WeightMatrixBuilder<'a> {
        WeightMatrixBuilder::new(centers, nodes, diffs, settings)
    }

    /// The assembled sparse operator.
    pub fn matrix(&self) -> &SparseColMat<usize, f64> {
        &self.matrix
    }

    /// Per-center failures collected under
    /// [`FailurePolicy::CollectFailures`](crate::fd_config::FailurePolicy);
    /// empty after a fully successful build.
    pub fn failures(&self) -> &[StencilFailure] {
        &self.failures
    }

    /// Number of operator rows (requested centers).
    pub fn num_centers(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of operator columns (nodes).
    pub fn num_nodes(&self) -> usize {
        self.matrix.ncols()
    }

    /// Densifies the operator, convenient for direct solves on small problems.
    pub fn to_dense(&self) -> Mat<f64> {
        self.matrix.to_dense()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Row;

    fn row(center: usize, stencil: Vec<usize>, weights: Vec<f64>) -> WeightRow {
        WeightRow {
            center,
            weights: Row::from_fn(weights.len(), |i| weights[i]),
            stencil,
        }
    }

    #[test]
    fn rows_land_at_their_list_positions() {
        let rows = vec![
            row(2, vec![2, 0, 4], vec![1.0, -0.5, 0.25]),
            row(0, vec![], vec![]),
            row(4, vec![4], vec![1.0]),
        ];
        let matrix = assemble_operator(&rows, 5).unwrap();
        assert_eq!(matrix.nrows(), 3);
        assert_eq!(matrix.ncols(), 5);

        let dense = matrix.to_dense();
        assert_eq!(dense[(0, 2)], 1.0);
        assert_eq!(dense[(0, 0)], -0.5);
        assert_eq!(dense[(0, 4)], 0.25);
        assert_eq!(dense[(0, 1)], 0.0);
        for j in 0..5 {
            assert_eq!(dense[(1, j)], 0.0);
        }
        assert_eq!(dense[(2, 4)], 1.0);
    }

    #[test]
    fn duplicate_center_rows_are_rejected() {
        let rows = vec![
            row(3, vec![3, 1], vec![1.0, 2.0]),
            row(3, vec![3, 2], vec![1.0, 2.0]),
        ];
        let result = assemble_operator(&rows, 4);
        assert!(matches!(result, Err(FdError::DuplicateRow { center: 3 })));
    }

    #[test]
    fn out_of_range_stencil_indices_are_rejected() {
        let rows = vec![row(0, vec![9], vec![1.0])];
        let result = assemble_operator(&rows, 5);
        assert!(matches!(result, Err(FdError::Assembly { .. })));
    }
}
