/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the monomial augmentation basis used by the stencil weight systems.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # polynomials
//!
//! Monomials up to a total degree augment every stencil system, which guarantees the
//! computed weights reproduce polynomial derivatives exactly up to that degree.
//! Stencil coordinates are shifted so the center sits at the origin before these
//! functions see them.

use faer::Mat;
use itertools::Itertools;

/// Number of monomials of total degree at most `order` in `dimensions` variables.
pub fn basis_size(order: usize, dimensions: usize) -> usize {
    // binomial(order + dimensions, dimensions), kept in integers.
    let mut result = 1;
    for i in 1..=dimensions {
        result = result * (order + i) / i;
    }
    result
}

/// Exponent multi-indices of all monomials with total degree at most `order`, in
/// graded order (degree first, then a fixed lexicographic order within each degree).
pub(crate) fn monomial_exponents(order: usize, dimensions: usize) -> Vec<Vec<usize>> {
    let mut exponents = Vec::with_capacity(basis_size(order, dimensions));
    for degree in 0..=order {
        for combination in (0..dimensions).combinations_with_replacement(degree) {
            let mut exponent = vec![0; dimensions];
            for axis in combination {
                exponent[axis] += 1;
            }
            exponents.push(exponent);
        }
    }
    exponents
}

/// Evaluates every monomial at every point: `P[i, j] = prod_axis points[i, axis]^e_j[axis]`.
pub(crate) fn poly_matrix(points: &Mat<f64>, exponents: &[Vec<usize>]) -> Mat<f64> {
    Mat::from_fn(points.nrows(), exponents.len(), |i, j| {
        exponents[j]
            .iter()
            .enumerate()
            .map(|(axis, &power)| points[(i, axis)].powi(power as i32))
            .product()
    })
}

/// The derivative named by `diff` of each monomial, evaluated at the origin, as a
/// column. Only the monomial whose exponents equal the multi-index survives, with
/// value `prod_i diff_i!`.
pub(crate) fn poly_derivative_at_origin(exponents: &[Vec<usize>], diff: &[usize]) -> Mat<f64> {
    Mat::from_fn(exponents.len(), 1, |j, _| {
        if exponents[j].as_slice() == diff {
            diff.iter().map(|&d| factorial(d)).product::<usize>() as f64
        } else {
            0.0
        }
    })
}

fn factorial(n: usize) -> usize {
    (1..=n).product()
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::{mat, utils::approx::*};

    #[test]
    fn basis_sizes_match_the_binomial_formula() {
        assert_eq!(basis_size(0, 1), 1);
        assert_eq!(basis_size(2, 1), 3);
        assert_eq!(basis_size(2, 2), 6);
        assert_eq!(basis_size(3, 2), 10);
        assert_eq!(basis_size(2, 3), 10);
        assert_eq!(basis_size(3, 3), 20);
        for order in 0..=4 {
            for dimensions in 1..=3 {
                assert_eq!(
                    monomial_exponents(order, dimensions).len(),
                    basis_size(order, dimensions)
                );
            }
        }
    }

    #[test]
    fn exponents_come_out_in_graded_order() {
        let exponents = monomial_exponents(2, 2);
        let expected: Vec<Vec<usize>> = vec![
            vec![0, 0],
            vec![1, 0],
            vec![0, 1],
            vec![2, 0],
            vec![1, 1],
            vec![0, 2],
        ];
        assert_eq!(exponents, expected);
    }

    #[test]
    fn poly_matrix_evaluates_monomials() {
        let points = mat![[2.0, 3.0], [0.0, 1.0]];
        let exponents = monomial_exponents(2, 2);
        let p = poly_matrix(&points, &exponents);
        // Columns: 1, x, y, x^2, xy, y^2. 0^0 counts as 1 for the constant monomial.
        let expected = mat![
            [1.0, 2.0, 3.0, 4.0, 6.0, 9.0],
            [1.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        ];

        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0);
        assert!(&p ~ &expected);
    }

    #[test]
    fn origin_derivatives_select_the_matching_monomial() {
        let exponents = monomial_exponents(3, 2);
        let second_x = poly_derivative_at_origin(&exponents, &[2, 0]);
        for (j, exponent) in exponents.iter().enumerate() {
            let expected = if exponent.as_slice() == [2, 0] { 2.0 } else { 0.0 };
            assert_eq!(second_x[(j, 0)], expected);
        }
        // The value carries the factorial of each component.
        let third = poly_derivative_at_origin(&exponents, &[3, 0]);
        let index = exponents.iter().position(|e| e.as_slice() == [3, 0]).unwrap();
        assert_eq!(third[(index, 0)], 6.0);
        // Interpolation rows use the zero multi-index and pick the constant.
        let identity = poly_derivative_at_origin(&exponents, &[0, 0]);
        assert_eq!(identity[(0, 0)], 1.0);
        assert_eq!(identity.col(0).iter().sum::<f64>(), 1.0);
    }
}
