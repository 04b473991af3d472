/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines shared helpers for random points, boundary construction, and CSV output.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use csv::Writer;
use faer::{Mat, mat};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Debug;

use crate::geometry::{GeometryError, SimplicialComplex};

/// Generate a matrix of random points in the unit hypercube.
///
/// # Parameters
/// - `n`: Number of points to generate (rows in the output matrix).
/// - `d`: Number of spatial dimensions per point (columns in the output matrix).
/// - `seed`: Optional random seed.
///   - If `Some(seed)` is provided, the same sequence of points will be generated
///     deterministically across runs and platforms (useful for reproducible tests).
///   - If `None`, the generator is seeded from the operating system's randomness source.
///
/// # Returns
/// A `Mat<f64>` of shape `(n, d)` where each element lies in `[0.0, 1.0)`.
///
/// # Example
/// ```
/// use ferreus_fd::generate_random_points;
///
/// // Generate 100 reproducible 3D points
/// let pts = generate_random_points(100, 3, Some(42));
/// assert_eq!(pts.ncols(), 3);
/// ```
pub fn generate_random_points(n: usize, d: usize, seed: Option<u64>) -> Mat<f64> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    Mat::from_fn(n, d, |_, _| rng.random_range(0.0..1.0))
}

/// Create a regular evaluation grid from per-dimension ranges and sample counts.
///
/// The first dimension varies fastest. A count of 1 places the single sample at
/// the start of its range.
///
/// # Arguments
/// * `ranges` - Inclusive `(min, max)` range for each dimension.
/// * `counts` - Number of grid samples per range; must match `ranges.len()`.
///
/// # Returns
/// A `Mat<f64>` with one row per grid point and one column per dimension.
pub fn create_evaluation_grid(ranges: &[(f64, f64)], counts: &[usize]) -> Mat<f64> {
    assert_eq!(ranges.len(), counts.len());

    let total_points: usize = counts.iter().product();

    Mat::from_fn(total_points, ranges.len(), |point, axis| {
        let stride: usize = counts[..axis].iter().product();
        let index = point / stride % counts[axis];
        let (start, end) = ranges[axis];
        match counts[axis] {
            1 => start,
            n => start + (end - start) * index as f64 / (n - 1) as f64,
        }
    })
}

/// Builds the 1D boundary of the interval `[start, end]`: two vertices, each its own
/// boundary simplex.
pub fn interval_boundary(start: f64, end: f64) -> Result<SimplicialComplex, GeometryError> {
    assert!(start < end, "interval start must precede its end");
    let vertices = mat![[start], [end]];
    SimplicialComplex::new(vertices, vec![vec![0], vec![1]])
}

/// Builds the four-segment boundary of an axis-aligned rectangle.
pub fn rectangle_boundary(
    mins: [f64; 2],
    maxs: [f64; 2],
) -> Result<SimplicialComplex, GeometryError> {
    let vertices = mat![
        [mins[0], mins[1]],
        [maxs[0], mins[1]],
        [maxs[0], maxs[1]],
        [mins[0], maxs[1]],
    ];
    let simplices = vec![vec![0, 1], vec![1, 2], vec![2, 3], vec![3, 0]];
    SimplicialComplex::new(vertices, simplices)
}

/// Builds a closed polygonal approximation of a circle with the given number of
/// segments.
pub fn circle_boundary(
    center: [f64; 2],
    radius: f64,
    segments: usize,
) -> Result<SimplicialComplex, GeometryError> {
    assert!(segments >= 3, "a closed polygon needs at least 3 segments");
    let step = std::f64::consts::TAU / segments as f64;
    let vertices = Mat::from_fn(segments, 2, |i, j| {
        let angle = step * i as f64;
        match j {
            0 => center[0] + radius * angle.cos(),
            _ => center[1] + radius * angle.sin(),
        }
    });
    let simplices = (0..segments).map(|i| vec![i, (i + 1) % segments]).collect();
    SimplicialComplex::new(vertices, simplices)
}

/// Builds the triangulated boundary of an axis-aligned box (two triangles per face).
pub fn box_boundary(mins: [f64; 3], maxs: [f64; 3]) -> Result<SimplicialComplex, GeometryError> {
    // Vertex i has the bit pattern (x, y, z) = (i & 1, i & 2, i & 4).
    let vertices = Mat::from_fn(8, 3, |i, j| {
        if i >> j & 1 == 1 { maxs[j] } else { mins[j] }
    });
    let simplices = vec![
        vec![0, 1, 3],
        vec![0, 3, 2], // z = min
        vec![4, 5, 7],
        vec![4, 7, 6], // z = max
        vec![0, 1, 5],
        vec![0, 5, 4], // y = min
        vec![2, 3, 7],
        vec![2, 7, 6], // y = max
        vec![0, 2, 6],
        vec![0, 6, 4], // x = min
        vec![1, 3, 7],
        vec![1, 7, 5], // x = max
    ];
    SimplicialComplex::new(vertices, simplices)
}

/// Write point coordinates and associated values to a CSV file.
///
/// Each row of `points` is written followed by the corresponding value from
/// `values`, under headers `X, Y, Z` (truncated to the point dimension) and `Value`.
///
/// # Errors
/// Returns an error if writing to disk fails.
pub fn point_arrays_to_csv<T>(
    points: &Mat<T>,
    values: &Mat<T>,
    filename: &str,
) -> Result<(), Box<dyn std::error::Error>>
where
    T: std::fmt::Display + Debug + Clone + Send + Sync + PartialOrd + 'static,
{
    let num_points = points.shape().0;
    assert_eq!(num_points, values.shape().0, "Points and values must have same length.");

    let mut wtr = Writer::from_path(filename)?;

    let mut headers: Vec<&str> = ["X", "Y", "Z"][..points.ncols()].to_vec();
    headers.push("Value");
    wtr.write_record(&headers)?;

    for i in 0..num_points {
        let mut record: Vec<String> = points.row(i).iter().map(|c| c.to_string()).collect();
        record.push(values.get(i, 0).to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
