/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the Halton low-discrepancy sequence used to seed candidate node locations.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # halton
//!
//! Deterministic low-discrepancy points over the unit hypercube.
//!
//! Node seeding draws one extra coordinate beyond the spatial dimension for
//! density-based acceptance sampling, so up to four coordinates are supported.

use faer::Mat;

/// The first primes, one radical-inverse base per coordinate.
const BASES: [usize; 4] = [2, 3, 5, 7];

/// The radical inverse of `index` in the given base: the base-`b` digits of
/// `index` mirrored about the radix point.
fn radical_inverse(mut index: usize, base: usize) -> f64 {
    let mut result = 0.0;
    let mut fraction = 1.0 / base as f64;
    while index > 0 {
        result += (index % base) as f64 * fraction;
        index /= base;
        fraction /= base as f64;
    }
    result
}

/// Generator for the Halton sequence in up to four dimensions.
///
/// Point `i` of the sequence is `(radical_inverse(i, 2), radical_inverse(i, 3), ...)`.
/// Index 0 (the origin) is skipped so the first point drawn is already interior to
/// the unit hypercube.
pub struct HaltonSequence {
    dimensions: usize,
    next_index: usize,
}

impl HaltonSequence {
    pub fn new(dimensions: usize) -> Self {
        assert!(
            dimensions >= 1 && dimensions <= BASES.len(),
            "HaltonSequence supports 1 to {} dimensions",
            BASES.len()
        );
        Self {
            dimensions,
            next_index: 1,
        }
    }

    /// Returns the next point of the sequence.
    pub fn next_point(&mut self) -> Vec<f64> {
        let index = self.next_index;
        self.next_index += 1;
        (0..self.dimensions)
            .map(|d| radical_inverse(index, BASES[d]))
            .collect()
    }

    /// Draws the next `n` points as an `n x dimensions` matrix.
    pub fn take_points(&mut self, n: usize) -> Mat<f64> {
        let mut points = Mat::zeros(n, self.dimensions);
        for i in 0..n {
            let point = self.next_point();
            for d in 0..self.dimensions {
                points[(i, d)] = point[d];
            }
        }
        points
    }
}
