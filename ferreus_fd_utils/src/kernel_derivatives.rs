/////////////////////////////////////////////////////////////////////////////////////////////
//
// Generates exact partial derivative expansions of RBF kernels over scattered points.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Kernel derivatives
//!
//! Exact partial derivatives of `phi(||x - c||)` for any derivative multi-index up to
//! total order [`MAX_DERIVATIVE_ORDER`] in up to three dimensions.
//!
//! Every such derivative expands over the term basis `coeff * u^powers * g_m(r)`,
//! where `u = x - c`, `r = ||u||` and `g_m = ((1/r) d/dr)^m phi` is the radial
//! quotient chain supplied per kernel family by
//! [`RbfKernel::radial_quotient`](crate::rbf_kernels::RbfKernel::radial_quotient).
//! Differentiating one term produces two:
//!
//! ```text
//!   d/dx_i [ c * u^b * g_m ] = (c * b_i) * u^(b - e_i) * g_m  +  c * u^(b + e_i) * g_(m+1)
//! ```
//!
//! so the expansion for each multi-index is a small term list, generated once for
//! all multi-indices at first use and cached behind a `OnceLock`.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use faer::Mat;

use crate::rbf_kernels::{KernelError, ORIGIN_TOL, RbfKernel};

/// The largest total derivative order the term tables are generated for.
pub const MAX_DERIVATIVE_ORDER: usize = 4;

/// Multi-indices are padded to this dimension; trailing entries are zero for 1D/2D.
const MAX_DIM: usize = 3;

/// One term `coeff * u^powers * g_(quotient_order)(r)` of a derivative expansion.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Term {
    coeff: f64,
    powers: [usize; MAX_DIM],
    quotient_order: usize,
}

/// Applies `d/dx_axis` to a term list and merges like terms.
fn differentiate(terms: &[Term], axis: usize) -> Vec<Term> {
    let mut result = Vec::with_capacity(2 * terms.len());
    for term in terms {
        if term.powers[axis] > 0 {
            let mut lowered = term.powers;
            lowered[axis] -= 1;
            result.push(Term {
                coeff: term.coeff * term.powers[axis] as f64,
                powers: lowered,
                quotient_order: term.quotient_order,
            });
        }
        let mut raised = term.powers;
        raised[axis] += 1;
        result.push(Term {
            coeff: term.coeff,
            powers: raised,
            quotient_order: term.quotient_order + 1,
        });
    }
    merge(result)
}

/// Combines terms with identical powers and quotient order, dropping cancelled ones.
fn merge(mut terms: Vec<Term>) -> Vec<Term> {
    terms.sort_by_key(|t| (t.quotient_order, t.powers));
    let mut merged: Vec<Term> = Vec::with_capacity(terms.len());
    for term in terms {
        match merged.last_mut() {
            Some(last)
                if last.quotient_order == term.quotient_order && last.powers == term.powers =>
            {
                last.coeff += term.coeff;
            }
            _ => merged.push(term),
        }
    }
    merged.retain(|t| t.coeff != 0.0);
    merged
}

/// Expands the derivative for one multi-index by repeated differentiation of `phi`.
fn expansion_for(diff: [usize; MAX_DIM]) -> Vec<Term> {
    let mut terms = vec![Term {
        coeff: 1.0,
        powers: [0; MAX_DIM],
        quotient_order: 0,
    }];
    for (axis, &count) in diff.iter().enumerate() {
        for _ in 0..count {
            terms = differentiate(&terms, axis);
        }
    }
    terms
}

/// Term tables for every padded multi-index of total order <= [`MAX_DERIVATIVE_ORDER`].
fn tables() -> &'static BTreeMap<[usize; MAX_DIM], Vec<Term>> {
    static TABLES: OnceLock<BTreeMap<[usize; MAX_DIM], Vec<Term>>> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut map = BTreeMap::new();
        for i in 0..=MAX_DERIVATIVE_ORDER {
            for j in 0..=(MAX_DERIVATIVE_ORDER - i) {
                for k in 0..=(MAX_DERIVATIVE_ORDER - i - j) {
                    let diff = [i, j, k];
                    map.insert(diff, expansion_for(diff));
                }
            }
        }
        map
    })
}

/// Zero-pads a 1D or 2D multi-index out to [`MAX_DIM`] entries.
fn pad_diff(diff: &[usize]) -> [usize; MAX_DIM] {
    let mut padded = [0; MAX_DIM];
    padded[..diff.len()].copy_from_slice(diff);
    padded
}

/// Evaluates one derivative expansion at offset `u` from the center.
#[inline(always)]
fn term_sum(kernel: RbfKernel, shape_parameter: f64, u: [f64; MAX_DIM], r: f64, terms: &[Term]) -> f64 {
    let mut sum = 0.0;
    for term in terms {
        let mut value = term.coeff * kernel.radial_quotient(term.quotient_order, r, shape_parameter);
        for axis in 0..MAX_DIM {
            value *= u[axis].powi(term.powers[axis] as i32);
        }
        sum += value;
    }
    sum
}

/// Evaluates the kernel derivative named by `diff` at every (evaluation point, center) pair.
///
/// Returns the dense matrix `D[i, j] = D^diff phi(||eval_i - center_j||)`, where the
/// derivative is taken in the evaluation point. A multi-index of all zeros evaluates
/// the kernel itself. Polyharmonic splines take their limit value `0` when an
/// evaluation point coincides with a center (the family's order cap guarantees the
/// limit exists; see [`RbfKernel::max_derivative_order`]).
///
/// Fails with [`KernelError`] if the shape parameter is invalid or the total
/// derivative order exceeds what the family supports.
pub fn rbf_matrix(
    eval_points: &Mat<f64>,
    centers: &Mat<f64>,
    kernel: RbfKernel,
    shape_parameter: f64,
    diff: &[usize],
) -> Result<Mat<f64>, KernelError> {
    let dim = eval_points.ncols();
    assert!(dim >= 1 && dim <= MAX_DIM, "points must have 1 to 3 columns");
    assert_eq!(centers.ncols(), dim);
    assert_eq!(diff.len(), dim);

    kernel.validate_shape(shape_parameter)?;
    let order: usize = diff.iter().sum();
    if order > kernel.max_derivative_order() {
        return Err(KernelError::UnsupportedDerivative { kernel, order });
    }

    let terms = &tables()[&pad_diff(diff)];
    let is_polyharmonic = kernel.phs_order().is_some();

    let mut result = Mat::zeros(eval_points.nrows(), centers.nrows());
    for j in 0..centers.nrows() {
        for i in 0..eval_points.nrows() {
            let mut u = [0.0; MAX_DIM];
            let mut r_sq = 0.0;
            for axis in 0..dim {
                let delta = eval_points[(i, axis)] - centers[(j, axis)];
                u[axis] = delta;
                r_sq += delta * delta;
            }
            let r = r_sq.sqrt();
            result[(i, j)] = if is_polyharmonic && r < ORIGIN_TOL {
                0.0
            } else {
                term_sum(kernel, shape_parameter, u, r, terms)
            };
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::mat;
    use faer::utils::approx::*;

    fn eval_and_center_pairs_2d() -> (Mat<f64>, Mat<f64>) {
        let eval_points = mat![
            [0.9, 0.1],
            [-0.4, 0.7],
            [1.2, -0.8],
            [0.3, 1.4],
        ];
        let centers = mat![[0.3, -0.2], [-0.5, 0.6]];
        (eval_points, centers)
    }

    #[test]
    fn mixed_partial_expansions_stay_minimal() {
        // d2/dxdy has the single term x*y*g_2; d2/dx2 has g_1 + x^2*g_2.
        assert!(expansion_for([1, 1, 0]).len() == 1);
        assert!(expansion_for([2, 0, 0]).len() == 2);
        // Total order 4 in one axis: g_2*3 + x^2*g_3*6 + x^4*g_4.
        assert!(expansion_for([4, 0, 0]).len() == 3);
    }

    #[test]
    fn zero_multi_index_reproduces_phi() {
        let (eval_points, centers) = eval_and_center_pairs_2d();
        let derivative =
            rbf_matrix(&eval_points, &centers, RbfKernel::Mq, 1.5, &[0, 0]).unwrap();
        for j in 0..centers.nrows() {
            for i in 0..eval_points.nrows() {
                let dx = eval_points[(i, 0)] - centers[(j, 0)];
                let dy = eval_points[(i, 1)] - centers[(j, 1)];
                let r = (dx * dx + dy * dy).sqrt();
                let expected = RbfKernel::Mq.phi(r, 1.5);
                assert!((derivative[(i, j)] - expected).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn gaussian_laplacian_matches_the_closed_form() {
        // For phi = exp(-r^2) in 2D, lap phi = 4 * (r^2 - 1) * exp(-r^2).
        let (eval_points, centers) = eval_and_center_pairs_2d();
        let dxx = rbf_matrix(&eval_points, &centers, RbfKernel::Ga, 1.0, &[2, 0]).unwrap();
        let dyy = rbf_matrix(&eval_points, &centers, RbfKernel::Ga, 1.0, &[0, 2]).unwrap();
        let laplacian = dxx + dyy;
        let expected = Mat::from_fn(eval_points.nrows(), centers.nrows(), |i, j| {
            let dx = eval_points[(i, 0)] - centers[(j, 0)];
            let dy = eval_points[(i, 1)] - centers[(j, 1)];
            let r_sq = dx * dx + dy * dy;
            4.0 * (r_sq - 1.0) * (-r_sq).exp()
        });
        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0);
        assert!(laplacian ~ expected);
    }

    #[test]
    fn cubic_spline_second_derivative_matches_the_closed_form_in_1d() {
        // For phi = |e*x|^3 the second derivative is 6 * e^3 * |x|.
        let eval_points = mat![[-1.5], [-0.2], [0.4], [2.0]];
        let centers = mat![[0.0], [0.7]];
        let eps = 1.2;
        let dxx = rbf_matrix(&eval_points, &centers, RbfKernel::Phs3, eps, &[2]).unwrap();
        let expected = Mat::from_fn(eval_points.nrows(), centers.nrows(), |i, j| {
            6.0 * eps.powi(3) * (eval_points[(i, 0)] - centers[(j, 0)]).abs()
        });
        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0);
        assert!(dxx ~ expected);
    }

    #[test]
    fn exact_derivatives_match_central_differences_for_every_family() {
        // Step one derivative order down, central-difference it back up, and compare
        // against the exact expansion, for every family and supported multi-index.
        let centers = mat![[0.3, -0.2]];
        let eval_points = mat![[1.1, 0.4], [0.7, -0.9], [-0.3, 0.2]];
        let eps = 1.3;
        let h = 1e-5;
        for kernel in RbfKernel::ALL {
            for order in 1..=kernel.max_derivative_order() {
                for dx in 0..=order {
                    let diff = [dx, order - dx];
                    let axis = if diff[0] > 0 { 0 } else { 1 };
                    let mut lower = diff;
                    lower[axis] -= 1;

                    let exact =
                        rbf_matrix(&eval_points, &centers, kernel, eps, &diff).unwrap();
                    let mut shifted_up = eval_points.clone();
                    let mut shifted_down = eval_points.clone();
                    for i in 0..eval_points.nrows() {
                        shifted_up[(i, axis)] += h;
                        shifted_down[(i, axis)] -= h;
                    }
                    let upper =
                        rbf_matrix(&shifted_up, &centers, kernel, eps, &lower).unwrap();
                    let downer =
                        rbf_matrix(&shifted_down, &centers, kernel, eps, &lower).unwrap();

                    for i in 0..eval_points.nrows() {
                        let numeric = (upper[(i, 0)] - downer[(i, 0)]) / (2.0 * h);
                        let value = exact[(i, 0)];
                        assert!(
                            (numeric - value).abs() <= 1e-4 * value.abs().max(1.0),
                            "kernel {} diff {:?} at row {}: numeric {} vs exact {}",
                            kernel,
                            diff,
                            i,
                            numeric,
                            value
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn derivatives_at_a_coincident_center_take_the_origin_limit() {
        let point = mat![[0.5, 0.5]];
        // Polyharmonic derivative limits at the center are zero.
        let phs = rbf_matrix(&point, &point, RbfKernel::Phs3, 1.0, &[2, 0]).unwrap();
        assert!(phs[(0, 0)] == 0.0);
        let phs_first = rbf_matrix(&point, &point, RbfKernel::Phs2, 1.0, &[1, 0]).unwrap();
        assert!(phs_first[(0, 0)] == 0.0);
        // The Gaussian second derivative at the center is -2 * e^2.
        let ga = rbf_matrix(&point, &point, RbfKernel::Ga, 1.0, &[2, 0]).unwrap();
        assert!((ga[(0, 0)] - (-2.0)).abs() < 1e-14);
        // Odd powers of u vanish there.
        let ga_first = rbf_matrix(&point, &point, RbfKernel::Ga, 1.0, &[1, 0]).unwrap();
        assert!(ga_first[(0, 0)] == 0.0);
    }

    #[test]
    fn unsupported_requests_are_rejected() {
        let points = mat![[0.0, 0.0], [1.0, 0.0]];
        // phs3 caps out at total order 2.
        let result = rbf_matrix(&points, &points, RbfKernel::Phs3, 1.0, &[2, 1]);
        assert!(matches!(
            result,
            Err(KernelError::UnsupportedDerivative { order: 3, .. })
        ));
        // phs1 supports no derivatives at all.
        let result = rbf_matrix(&points, &points, RbfKernel::Phs1, 1.0, &[1, 0]);
        assert!(matches!(
            result,
            Err(KernelError::UnsupportedDerivative { order: 1, .. })
        ));
        // Invalid shape parameters fail before any evaluation.
        let result = rbf_matrix(&points, &points, RbfKernel::Ga, -2.0, &[1, 0]);
        assert!(matches!(
            result,
            Err(KernelError::InvalidShapeParameter { .. })
        ));
    }
}
