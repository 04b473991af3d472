/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the stencil weight solver and the weight matrix builder.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # fd
//!
//! The numerical core of the crate. [`fd_weights`] solves one augmented RBF
//! stencil system for the differentiation weights of a single center node, and
//! [`WeightMatrixBuilder`] runs that solve over many centers in parallel,
//! selecting stencils by nearest-neighbour search and assembling the rows into
//! a sparse operator.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use faer::linalg::solvers::Solve;
use faer::{Mat, Row, concat};
use rayon::prelude::*;

use ferreus_fd_utils::{KernelError, rbf_matrix};

use crate::fd_config::{FailurePolicy, WeightSettings};
use crate::geometry::SimplicialComplex;
use crate::kdtree::KdTree;
use crate::operator::{StencilFailure, WeightMatrix, WeightRow, assemble_operator};
use crate::polynomials::{basis_size, monomial_exponents, poly_derivative_at_origin, poly_matrix};
use crate::progress::{ProgressMsg, ProgressSink};

/// Relative threshold on the diagonal of the pivoted R factor; diagonal entries
/// below `RANK_TOL * |R00|` are treated as zero when counting rank.
const RANK_TOL: f64 = 1e-10;

/// Errors raised while computing stencil weights or assembling the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum FdError {
    /// The domain or node input cannot support the requested computation.
    InvalidDomain { message: String },
    /// The kernel family rejected its shape parameter or a derivative order.
    InvalidKernelParameters(KernelError),
    /// The augmented system for a center node is singular or numerically
    /// rank-deficient, typically from duplicate stencil nodes or a stencil too
    /// small for the polynomial basis.
    StencilSingular { center: usize },
    /// A boundary-restricted stencil could not be filled: too few neighbours are
    /// reachable from the center without the connecting segment crossing the
    /// boundary.
    StencilDeficient {
        center: usize,
        found: usize,
        required: usize,
    },
    /// Two weight rows were supplied for the same center node.
    DuplicateRow { center: usize },
    /// The sparse matrix could not be created from the assembled triplets.
    Assembly { message: String },
}

impl fmt::Display for FdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FdError::InvalidDomain { message } => {
                write!(f, "invalid domain: {}", message)
            }
            FdError::InvalidKernelParameters(source) => {
                write!(f, "invalid kernel parameters: {}", source)
            }
            FdError::StencilSingular { center } => {
                write!(
                    f,
                    "stencil system for center node {} is singular or severely ill-conditioned",
                    center
                )
            }
            FdError::StencilDeficient {
                center,
                found,
                required,
            } => {
                write!(
                    f,
                    "center node {} has only {} of {} stencil neighbours that do not cross the boundary",
                    center, found, required
                )
            }
            FdError::DuplicateRow { center } => {
                write!(f, "more than one weight row supplied for center node {}", center)
            }
            FdError::Assembly { message } => {
                write!(f, "sparse operator assembly failed: {}", message)
            }
        }
    }
}

impl Error for FdError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FdError::InvalidKernelParameters(source) => Some(source),
            _ => None,
        }
    }
}

impl From<KernelError> for FdError {
    fn from(error: KernelError) -> Self {
        FdError::InvalidKernelParameters(error)
    }
}

/// Computes RBF-FD differentiation weights for one center node.
///
/// Solves the polynomial-augmented saddle system
///
/// ```text
///   [ phi  P ] [w]   [ phi_d ]
///   [ P^t  0 ] [l] = [ p_d   ]
/// ```
///
/// where `phi` is the kernel matrix among the stencil nodes, `P` evaluates the
/// monomials up to `settings.poly_order` at the stencil nodes shifted so the
/// center sits at the origin, and the right-hand side holds the requested
/// derivative of the kernel and of each monomial at the center. The returned
/// weights `w` satisfy `sum_i w_i f(x_i) ~ D f(center)` for the differential
/// operator `D` described by `diffs`, exactly so for any `f` in the monomial
/// span. When several multi-indices are given their right-hand sides are summed
/// (scaled by `coefficients` if present), so one solve yields the weights of
/// the combined operator.
///
/// `stencil` lists node indices into `nodes`; `settings.stencil_size` and
/// `settings.failure_policy` are ignored here, the stencil being explicit.
///
/// # Errors
/// [`FdError::StencilSingular`] when the augmented system has deficient
/// numerical rank, [`FdError::InvalidKernelParameters`] when the kernel rejects
/// the shape parameter or a derivative order.
///
/// # Example
/// ```
/// use faer::mat;
/// use ferreus_fd::fd_config::{RbfKernel, WeightSettings};
/// use ferreus_fd::fd_weights;
///
/// // Second derivative on a unit-spaced line recovers the [1, -2, 1] stencil.
/// let nodes = mat![[0.0], [1.0], [2.0], [3.0], [4.0]];
/// let settings = WeightSettings::builder(RbfKernel::Phs3).build();
/// let weights = fd_weights(2, &[2, 1, 3], &nodes, &[vec![2]], None, &settings)?;
/// assert!((weights[0] + 2.0).abs() < 1e-8);
/// assert!((weights[1] - 1.0).abs() < 1e-8);
/// assert!((weights[2] - 1.0).abs() < 1e-8);
/// # Ok::<(), ferreus_fd::FdError>(())
/// ```
pub fn fd_weights(
    center: usize,
    stencil: &[usize],
    nodes: &Mat<f64>,
    diffs: &[Vec<usize>],
    coefficients: Option<&[f64]>,
    settings: &WeightSettings,
) -> Result<Row<f64>, FdError> {
    let dimensions = nodes.ncols();
    let n = stencil.len();

    assert!(center < nodes.nrows(), "center index out of range");
    assert!(!stencil.is_empty(), "stencil must contain at least one node");
    for &node in stencil {
        assert!(node < nodes.nrows(), "stencil index out of range");
    }
    assert!(!diffs.is_empty(), "at least one derivative multi-index is required");
    for diff in diffs {
        assert_eq!(
            diff.len(),
            dimensions,
            "derivative multi-index length must match the node dimension"
        );
    }
    if let Some(values) = coefficients {
        assert_eq!(values.len(), diffs.len(), "one coefficient per derivative multi-index");
    }

    settings.kernel.validate_shape(settings.shape_parameter)?;

    // Shift the stencil so the center sits at the origin. Distances are
    // unaffected; the monomial matrix and its derivative rows become those of
    // a Taylor basis about the center.
    let shifted = Mat::from_fn(n, dimensions, |i, j| {
        nodes[(stencil[i], j)] - nodes[(center, j)]
    });

    let exponents = monomial_exponents(settings.poly_order, dimensions);
    let num_poly = exponents.len();

    let zero_diff = vec![0usize; dimensions];
    let phi = rbf_matrix(
        &shifted,
        &shifted,
        settings.kernel,
        settings.shape_parameter,
        &zero_diff,
    )?;
    let p_matrix = poly_matrix(&shifted, &exponents);
    let p_t = p_matrix.transpose().to_owned();
    let lhs_zeros = Mat::<f64>::zeros(num_poly, num_poly);

    let lhs = concat![[phi, p_matrix], [p_t, lhs_zeros]];

    // One right-hand side for the combined operator: each requested derivative
    // contributes its kernel and monomial derivatives at the center, scaled by
    // its coefficient.
    let origin = Mat::<f64>::zeros(1, dimensions);
    let mut rhs = Mat::<f64>::zeros(n + num_poly, 1);
    for (k, diff) in diffs.iter().enumerate() {
        let coefficient = coefficients.map_or(1.0, |values| values[k]);
        let kernel_row = rbf_matrix(
            &origin,
            &shifted,
            settings.kernel,
            settings.shape_parameter,
            diff,
        )?;
        let poly_column = poly_derivative_at_origin(&exponents, diff);
        for i in 0..n {
            rhs[(i, 0)] += coefficient * kernel_row[(0, i)];
        }
        for j in 0..num_poly {
            rhs[(n + j, 0)] += coefficient * poly_column[(j, 0)];
        }
    }

    // Rank check on the pivoted R diagonal before trusting the solve.
    let qr = lhs.col_piv_qr();
    let r = qr.thin_R();
    let threshold = RANK_TOL * r.get(0, 0).abs();
    let rank = r
        .diagonal()
        .column_vector()
        .iter()
        .filter(|value| value.abs() > threshold)
        .count();
    if rank < n + num_poly {
        return Err(FdError::StencilSingular { center });
    }

    let solution = qr.solve(&rhs);
    let (weight_part, _multipliers) = solution.split_at_row(n);
    Ok(Row::from_fn(n, |i| weight_part[(i, 0)]))
}

/// Builder for a sparse differentiation operator over a node array.
///
/// Created through [`WeightMatrix::builder`]. For every requested center the
/// builder picks the `settings.stencil_size` nearest nodes, solves the stencil
/// system with [`fd_weights`], and assembles the rows into a sparse matrix of
/// shape (number of centers) x (number of nodes); row `r` holds the weights of
/// `centers[r]`.
pub struct WeightMatrixBuilder<'a> {
    centers: &'a [usize],
    nodes: &'a Mat<f64>,
    diffs: Vec<Vec<usize>>,
    settings: WeightSettings,
    coefficients: Option<Vec<f64>>,
    boundary: Option<&'a SimplicialComplex>,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl<'a> WeightMatrixBuilder<'a> {
    pub(crate) fn new(
        centers: &'a [usize],
        nodes: &'a Mat<f64>,
        diffs: Vec<Vec<usize>>,
        settings: WeightSettings,
    ) -> Self {
        WeightMatrixBuilder {
            centers,
            nodes,
            diffs,
            settings,
            coefficients: None,
            boundary: None,
            progress: None,
        }
    }

    /// Scales each derivative multi-index by the matching coefficient when the
    /// right-hand sides are combined. Defaults to 1.0 for every multi-index.
    pub fn coefficients(mut self, coefficients: Vec<f64>) -> Self {
        self.coefficients = Some(coefficients);
        self
    }

    /// Restricts stencils from crossing the given boundary: neighbours are taken
    /// in distance order, skipping any whose connecting segment to the center is
    /// separated from it by a boundary simplex.
    pub fn boundary(mut self, boundary: &'a SimplicialComplex) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Registers a sink for [`ProgressMsg::WeightRowsSolved`] events.
    pub fn progress_callback(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Solves every center and returns the weight rows alongside any collected
    /// per-center failures.
    ///
    /// Under [`FailurePolicy::FailFast`] the first failure aborts the build and
    /// the failure list is always empty; under
    /// [`FailurePolicy::CollectFailures`] failed centers are reported in the
    /// second element while the remaining rows complete.
    pub fn build_rows(self) -> Result<(Vec<WeightRow>, Vec<StencilFailure>), FdError> {
        let outcomes = self.solve_all()?;
        let mut rows = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(row) => rows.push(row),
                Err(failure) => failures.push(failure),
            }
        }
        Ok((rows, failures))
    }

    /// Solves every center and assembles the rows into a sparse operator.
    ///
    /// The matrix always has one row per requested center; under
    /// [`FailurePolicy::CollectFailures`] the rows of failed centers are left
    /// structurally empty and the failures are reported on the result.
    pub fn build(self) -> Result<WeightMatrix, FdError> {
        let num_nodes = self.nodes.nrows();
        let num_centers = self.centers.len();
        let centers = self.centers;
        let outcomes = self.solve_all()?;

        let mut rows = Vec::with_capacity(num_centers);
        let mut failures = Vec::new();
        for (slot, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(row) => rows.push(row),
                Err(failure) => {
                    // Keep the row count aligned with the centers list.
                    rows.push(WeightRow {
                        center: centers[slot],
                        stencil: Vec::new(),
                        weights: Row::zeros(0),
                    });
                    failures.push(failure);
                }
            }
        }

        let matrix = assemble_operator(&rows, num_nodes)?;
        Ok(WeightMatrix { matrix, failures })
    }

    fn validate(&self) -> Result<(), FdError> {
        let num_nodes = self.nodes.nrows();
        let dimensions = self.nodes.ncols();

        for &center in self.centers {
            assert!(center < num_nodes, "center index out of range");
        }
        assert!(
            self.settings.stencil_size <= num_nodes,
            "stencil size exceeds the number of nodes"
        );
        assert!(
            basis_size(self.settings.poly_order, dimensions) <= self.settings.stencil_size,
            "stencil size must cover the polynomial basis"
        );
        assert!(!self.diffs.is_empty(), "at least one derivative multi-index is required");
        for diff in &self.diffs {
            assert_eq!(
                diff.len(),
                dimensions,
                "derivative multi-index length must match the node dimension"
            );
        }
        if let Some(values) = &self.coefficients {
            assert_eq!(values.len(), self.diffs.len(), "one coefficient per derivative multi-index");
        }

        // Reject bad kernel parameters once up front rather than once per center.
        self.settings
            .kernel
            .validate_shape(self.settings.shape_parameter)?;
        let supported = self.settings.kernel.max_derivative_order();
        for diff in &self.diffs {
            let order: usize = diff.iter().sum();
            if order > supported {
                return Err(FdError::InvalidKernelParameters(
                    KernelError::UnsupportedDerivative {
                        kernel: self.settings.kernel,
                        order,
                    },
                ));
            }
        }
        Ok(())
    }

    fn solve_all(&self) -> Result<Vec<Result<WeightRow, StencilFailure>>, FdError> {
        self.validate()?;

        let tree = KdTree::new(self.nodes);
        let total = self.centers.len();
        let report_interval = (total / 20).max(1);
        let counter = AtomicUsize::new(0);

        let solve_one = |center: usize| -> Result<WeightRow, FdError> {
            let row = self.solve_center(center, &tree);
            let completed = counter.fetch_add(1, Ordering::Relaxed) + 1;
            if completed % report_interval == 0 || completed == total {
                if let Some(sink) = &self.progress {
                    sink.emit(ProgressMsg::WeightRowsSolved {
                        completed,
                        total,
                        progress: completed as f64 / total as f64,
                    });
                }
            }
            row
        };

        match self.settings.failure_policy {
            FailurePolicy::FailFast => {
                let rows: Result<Vec<WeightRow>, FdError> =
                    self.centers.par_iter().map(|&center| solve_one(center)).collect();
                Ok(rows?.into_iter().map(Ok).collect())
            }
            FailurePolicy::CollectFailures => Ok(self
                .centers
                .par_iter()
                .map(|&center| {
                    solve_one(center).map_err(|error| StencilFailure { center, error })
                })
                .collect()),
        }
    }

    fn solve_center(&self, center: usize, tree: &KdTree) -> Result<WeightRow, FdError> {
        let stencil = self.select_stencil(center, tree)?;
        let weights = fd_weights(
            center,
            &stencil,
            self.nodes,
            &self.diffs,
            self.coefficients.as_deref(),
            &self.settings,
        )?;
        Ok(WeightRow {
            center,
            stencil,
            weights,
        })
    }

    /// Picks the stencil for one center: the nearest `stencil_size` nodes, or,
    /// with a boundary present, the nearest that the boundary does not separate
    /// from the center, widening the candidate pool until the stencil fills.
    fn select_stencil(&self, center: usize, tree: &KdTree) -> Result<Vec<usize>, FdError> {
        let required = self.settings.stencil_size;
        let query = self.nodes.row(center);

        let Some(boundary) = self.boundary else {
            return Ok(tree
                .k_nearest(query, required)
                .into_iter()
                .map(|neighbor| neighbor.id)
                .collect());
        };

        let num_nodes = self.nodes.nrows();
        let mut k = (2 * required).min(num_nodes);
        loop {
            let candidates = tree.k_nearest(query, k);
            let mut stencil = Vec::with_capacity(required);
            for neighbor in &candidates {
                if neighbor.id != center
                    && boundary.separates(query, self.nodes.row(neighbor.id))
                {
                    continue;
                }
                stencil.push(neighbor.id);
                if stencil.len() == required {
                    return Ok(stencil);
                }
            }
            if k == num_nodes {
                return Err(FdError::StencilDeficient {
                    center,
                    found: stencil.len(),
                    required,
                });
            }
            k = (2 * k).min(num_nodes);
        }
    }
}
