/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements simplicial-complex domains with containment, crossing, and normal predicates.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # geometry
//!
//! Domains are closed boundaries described as simplicial complexes: a vertex array
//! plus one simplex per boundary facet (a vertex in 1D, a segment in 2D, a triangle
//! in 3D). The complex answers the geometric queries the node generator and the
//! stencil solver depend on:
//!
//! - point containment by ray parity, with points on the boundary counted as
//!   contained,
//! - the first boundary crossing of a directed segment, used to bounce relaxation
//!   steps and to restrict stencils,
//! - per-simplex outward unit normals, fixed deterministically by probing just off
//!   each simplex centroid.
//!
//! The caller must supply a watertight, non-self-intersecting boundary; validation
//! covers index ranges and degenerate simplices only.

use std::error::Error;
use std::fmt;

use faer::{Mat, MatRef, Row, RowRef};
use rayon::prelude::*;

use crate::rtree::{SimplexRTree, build_simplex_rtree};

/// Scale factor for the on-boundary containment tolerance, relative to the domain
/// bounding-box diagonal.
const ON_BOUNDARY_TOL: f64 = 1e-9;

/// Scale factor for the orientation probe offset, relative to the bounding-box diagonal.
const ORIENTATION_PROBE: f64 = 1e-6;

/// Fixed ray directions for parity counting, expressed as per-axis offsets beyond the
/// bounding box. Irrational values keep the ray clear of vertices and edges for all
/// practical inputs; the fallback rows are tried when a degenerate hit is detected.
const RAY_OFFSETS: [[f64; 3]; 3] = [
    [0.6180339887498949, 0.4142135623730951, 0.7071067811865476],
    [0.7548776662466927, 0.5698402909980532, 0.3247179572447460],
    [0.8392867552141612, 0.6573981203562412, 0.2956938891377988],
];

/// Errors raised when a simplicial complex fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Domains must live in one, two, or three dimensions.
    UnsupportedDimension { dimensions: usize },
    /// The vertex or simplex array was empty.
    Empty,
    /// A simplex did not have exactly `dimensions` vertex indices.
    SimplexSize {
        simplex: usize,
        expected: usize,
        found: usize,
    },
    /// A simplex referenced a vertex index outside the vertex array.
    SimplexIndexOutOfRange {
        simplex: usize,
        index: usize,
        num_vertices: usize,
    },
    /// A simplex has coincident vertices and no well-defined normal.
    DegenerateSimplex { simplex: usize },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::UnsupportedDimension { dimensions } => {
                write!(f, "unsupported domain dimension {} (expected 1 to 3)", dimensions)
            }
            GeometryError::Empty => {
                write!(f, "a domain needs at least one vertex and one simplex")
            }
            GeometryError::SimplexSize {
                simplex,
                expected,
                found,
            } => write!(
                f,
                "simplex {} has {} vertices (expected {})",
                simplex, found, expected
            ),
            GeometryError::SimplexIndexOutOfRange {
                simplex,
                index,
                num_vertices,
            } => write!(
                f,
                "simplex {} references vertex {} but only {} vertices exist",
                simplex, index, num_vertices
            ),
            GeometryError::DegenerateSimplex { simplex } => {
                write!(f, "simplex {} has coincident vertices", simplex)
            }
        }
    }
}

impl Error for GeometryError {}

/// The first boundary crossing along a directed segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentCrossing {
    /// Index of the crossed simplex.
    pub simplex: usize,
    /// Position of the crossing along the segment, in (0, 1).
    pub t: f64,
}

/// Outcome of one segment-against-simplex intersection test.
enum CrossingTest {
    /// Transversal crossing strictly inside both the segment and the simplex.
    Proper(f64),
    /// The segment touches a simplex vertex, edge, or plane exactly; parity counting
    /// retries with a different ray direction when it sees this.
    Grazing,
    Miss,
}

/// A closed domain boundary in 1, 2, or 3 dimensions.
///
/// Construction validates the complex, builds an R-tree over per-simplex bounding
/// boxes, and orients every simplex so its stored normal points out of the domain.
pub struct SimplicialComplex {
    vertices: Mat<f64>,
    simplices: Vec<Vec<usize>>,
    normals: Mat<f64>,
    extents: Vec<f64>,
    rtree: SimplexRTree,
}

impl SimplicialComplex {
    /// Builds a domain from a vertex array (rows are coordinates) and one vertex
    /// index tuple per boundary simplex.
    pub fn new(vertices: Mat<f64>, simplices: Vec<Vec<usize>>) -> Result<Self, GeometryError> {
        let dimensions = vertices.ncols();
        if dimensions < 1 || dimensions > 3 {
            return Err(GeometryError::UnsupportedDimension { dimensions });
        }
        if vertices.nrows() == 0 || simplices.is_empty() {
            return Err(GeometryError::Empty);
        }
        for (s, simplex) in simplices.iter().enumerate() {
            if simplex.len() != dimensions {
                return Err(GeometryError::SimplexSize {
                    simplex: s,
                    expected: dimensions,
                    found: simplex.len(),
                });
            }
            for &index in simplex {
                if index >= vertices.nrows() {
                    return Err(GeometryError::SimplexIndexOutOfRange {
                        simplex: s,
                        index,
                        num_vertices: vertices.nrows(),
                    });
                }
            }
        }

        let extents = ferreus_fd_utils::get_pointarray_extents(&vertices);
        let simplex_extents: Vec<Vec<f64>> = simplices
            .iter()
            .map(|simplex| {
                let mut ext = vec![0.0; 2 * dimensions];
                for axis in 0..dimensions {
                    let mut min = f64::INFINITY;
                    let mut max = f64::NEG_INFINITY;
                    for &index in simplex {
                        min = min.min(vertices[(index, axis)]);
                        max = max.max(vertices[(index, axis)]);
                    }
                    ext[axis] = min;
                    ext[dimensions + axis] = max;
                }
                ext
            })
            .collect();
        let rtree = build_simplex_rtree(
            dimensions,
            simplex_extents.iter().enumerate().map(|(i, e)| (i, &e[..])),
        );

        let mut normals = Mat::zeros(simplices.len(), dimensions);
        for s in 0..simplices.len() {
            let normal = raw_normal(&vertices, &simplices[s], dimensions)
                .ok_or(GeometryError::DegenerateSimplex { simplex: s })?;
            for axis in 0..dimensions {
                normals[(s, axis)] = normal[axis];
            }
        }

        let mut complex = Self {
            vertices,
            simplices,
            normals,
            extents,
            rtree,
        };
        complex.orient_outward();
        Ok(complex)
    }

    pub fn dimensions(&self) -> usize {
        self.vertices.ncols()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.nrows()
    }

    pub fn num_simplices(&self) -> usize {
        self.simplices.len()
    }

    pub fn vertices(&self) -> MatRef<'_, f64> {
        self.vertices.as_ref()
    }

    pub fn simplices(&self) -> &[Vec<usize>] {
        &self.simplices
    }

    /// Outward unit normals, one row per simplex.
    pub fn outward_normals(&self) -> MatRef<'_, f64> {
        self.normals.as_ref()
    }

    /// Bounding box of the vertex array as `[mins..., maxs...]`.
    pub fn extents(&self) -> &[f64] {
        &self.extents
    }

    /// Length of the bounding-box diagonal.
    pub fn diagonal(&self) -> f64 {
        let d = self.dimensions();
        (0..d)
            .map(|axis| {
                let side = self.extents[d + axis] - self.extents[axis];
                side * side
            })
            .sum::<f64>()
            .sqrt()
    }

    /// The vertex coordinates of one simplex, one row per vertex.
    pub fn simplex_vertices(&self, s: usize) -> Mat<f64> {
        let d = self.dimensions();
        Mat::from_fn(self.simplices[s].len(), d, |i, j| {
            self.vertices[(self.simplices[s][i], j)]
        })
    }

    pub fn simplex_centroid(&self, s: usize) -> Row<f64> {
        let d = self.dimensions();
        let count = self.simplices[s].len() as f64;
        Row::from_fn(d, |axis| {
            self.simplices[s]
                .iter()
                .map(|&index| self.vertices[(index, axis)])
                .sum::<f64>()
                / count
        })
    }

    /// Measure of one simplex: segment length in 2D, triangle area in 3D, and the
    /// counting measure 1 in 1D (a boundary facet there is a single vertex).
    pub fn simplex_measure(&self, s: usize) -> f64 {
        let simplex = &self.simplices[s];
        match self.dimensions() {
            1 => 1.0,
            2 => {
                let a = self.vertex_point(simplex[0]);
                let b = self.vertex_point(simplex[1]);
                norm(sub(b, a))
            }
            _ => {
                let a = self.vertex_point(simplex[0]);
                let b = self.vertex_point(simplex[1]);
                let c = self.vertex_point(simplex[2]);
                0.5 * norm(cross(sub(b, a), sub(c, a)))
            }
        }
    }

    /// Total measure of the boundary: vertex count in 1D, perimeter in 2D, surface
    /// area in 3D.
    pub fn boundary_measure(&self) -> f64 {
        (0..self.num_simplices()).map(|s| self.simplex_measure(s)).sum()
    }

    /// Tests every point row for containment in the closed domain.
    pub fn contains(&self, points: &Mat<f64>) -> Vec<bool> {
        (0..points.nrows())
            .into_par_iter()
            .map(|i| self.contains_point(points.row(i)))
            .collect()
    }

    /// Tests a single point for containment in the closed domain.
    ///
    /// Points within a small tolerance of the boundary are contained; otherwise a ray
    /// is cast to a fixed exterior point and boundary crossings are counted, odd
    /// parity meaning inside.
    pub fn contains_point(&self, point: RowRef<f64>) -> bool {
        let d = self.dimensions();
        let p = row_to_point(point);
        let tol = ON_BOUNDARY_TOL * self.diagonal();

        let mut query = vec![0.0; 2 * d];
        for axis in 0..d {
            query[axis] = p[axis] - tol;
            query[d + axis] = p[axis] + tol;
        }
        for s in self.rtree.locate_intersecting(&query) {
            if self.distance_to_simplex(point, s) <= tol {
                return true;
            }
        }

        let mut parity = false;
        for offsets in RAY_OFFSETS {
            let exterior = self.exterior_point(offsets);
            let (crossings, grazed) = self.count_crossings(p, exterior);
            parity = crossings % 2 == 1;
            if !grazed {
                return parity;
            }
        }
        // Every fallback ray grazed a vertex or edge; the proper-crossing count of
        // the last ray is still the best available answer.
        parity
    }

    /// Distance from a point to one simplex.
    pub fn distance_to_simplex(&self, point: RowRef<f64>, s: usize) -> f64 {
        let p = row_to_point(point);
        let simplex = &self.simplices[s];
        match self.dimensions() {
            1 => (p[0] - self.vertices[(simplex[0], 0)]).abs(),
            2 => point_segment_distance(
                p,
                self.vertex_point(simplex[0]),
                self.vertex_point(simplex[1]),
            ),
            _ => point_triangle_distance(
                p,
                self.vertex_point(simplex[0]),
                self.vertex_point(simplex[1]),
                self.vertex_point(simplex[2]),
            ),
        }
    }

    /// Finds the first boundary crossing along the directed segment from `start` to
    /// `end`, if any. Ties at the same crossing parameter resolve to the lowest
    /// simplex index.
    pub fn first_crossing(&self, start: RowRef<f64>, end: RowRef<f64>) -> Option<SegmentCrossing> {
        let p = row_to_point(start);
        let q = row_to_point(end);
        let mut first: Option<SegmentCrossing> = None;
        for s in self.rtree.locate_intersecting(&segment_extents(p, q, self.dimensions())) {
            if let CrossingTest::Proper(t) = self.segment_simplex_crossing(p, q, s) {
                let candidate = SegmentCrossing { simplex: s, t };
                let closer = match first {
                    None => true,
                    Some(best) => (t, s) < (best.t, best.simplex),
                };
                if closer {
                    first = Some(candidate);
                }
            }
        }
        first
    }

    /// Whether the open segment between two points touches or crosses the boundary.
    pub fn crosses(&self, start: RowRef<f64>, end: RowRef<f64>) -> bool {
        let p = row_to_point(start);
        let q = row_to_point(end);
        for s in self.rtree.locate_intersecting(&segment_extents(p, q, self.dimensions())) {
            match self.segment_simplex_crossing(p, q, s) {
                CrossingTest::Proper(_) | CrossingTest::Grazing => return true,
                CrossingTest::Miss => {}
            }
        }
        false
    }

    /// Whether the boundary passes strictly between two points: some simplex
    /// intersects the connecting segment, not counting simplices that either
    /// endpoint lies on. Unlike [`SimplicialComplex::crosses`] this tolerates
    /// endpoints sitting exactly on the boundary, which makes it the right test
    /// for deciding whether one node is visible from another.
    pub fn separates(&self, start: RowRef<f64>, end: RowRef<f64>) -> bool {
        let p = row_to_point(start);
        let q = row_to_point(end);
        let tolerance = ON_BOUNDARY_TOL * self.diagonal();
        for s in self.rtree.locate_intersecting(&segment_extents(p, q, self.dimensions())) {
            let hit = !matches!(self.segment_simplex_crossing(p, q, s), CrossingTest::Miss);
            if hit
                && self.distance_to_simplex(start, s) > tolerance
                && self.distance_to_simplex(end, s) > tolerance
            {
                return true;
            }
        }
        false
    }

    fn vertex_point(&self, index: usize) -> [f64; 3] {
        let mut p = [0.0; 3];
        for axis in 0..self.dimensions() {
            p[axis] = self.vertices[(index, axis)];
        }
        p
    }

    fn exterior_point(&self, offsets: [f64; 3]) -> [f64; 3] {
        let d = self.dimensions();
        let diag = self.diagonal().max(1.0);
        let mut e = [0.0; 3];
        for axis in 0..d {
            e[axis] = self.extents[d + axis] + diag * offsets[axis];
        }
        e
    }

    /// Counts proper crossings of the segment `p` to `q` against nearby simplices.
    /// The flag reports whether any test grazed a simplex.
    fn count_crossings(&self, p: [f64; 3], q: [f64; 3]) -> (usize, bool) {
        let mut crossings = 0;
        let mut grazed = false;
        for s in self.rtree.locate_intersecting(&segment_extents(p, q, self.dimensions())) {
            match self.segment_simplex_crossing(p, q, s) {
                CrossingTest::Proper(_) => crossings += 1,
                CrossingTest::Grazing => grazed = true,
                CrossingTest::Miss => {}
            }
        }
        (crossings, grazed)
    }

    fn segment_simplex_crossing(&self, p: [f64; 3], q: [f64; 3], s: usize) -> CrossingTest {
        let simplex = &self.simplices[s];
        match self.dimensions() {
            1 => segment_point_crossing(p[0], q[0], self.vertices[(simplex[0], 0)]),
            2 => segment_segment_crossing(
                p,
                q,
                self.vertex_point(simplex[0]),
                self.vertex_point(simplex[1]),
            ),
            _ => segment_triangle_crossing(
                p,
                q,
                self.vertex_point(simplex[0]),
                self.vertex_point(simplex[1]),
                self.vertex_point(simplex[2]),
            ),
        }
    }

    /// Flips simplices whose normal points into the domain, so every stored normal
    /// ends up outward. A probe just off the simplex centroid decides the side.
    fn orient_outward(&mut self) {
        let d = self.dimensions();
        let delta = ORIENTATION_PROBE * self.diagonal();
        if delta == 0.0 {
            return;
        }
        for s in 0..self.simplices.len() {
            let centroid = self.simplex_centroid(s);
            let probe = Row::from_fn(d, |axis| centroid[axis] + delta * self.normals[(s, axis)]);
            if self.contains_point(probe.as_ref()) {
                for axis in 0..d {
                    self.normals[(s, axis)] = -self.normals[(s, axis)];
                }
                self.simplices[s].reverse();
            }
        }
    }
}

/// Unit normal of a simplex before outward orientation, or `None` if degenerate.
fn raw_normal(vertices: &Mat<f64>, simplex: &[usize], dimensions: usize) -> Option<[f64; 3]> {
    match dimensions {
        1 => Some([1.0, 0.0, 0.0]),
        2 => {
            let edge = [
                vertices[(simplex[1], 0)] - vertices[(simplex[0], 0)],
                vertices[(simplex[1], 1)] - vertices[(simplex[0], 1)],
                0.0,
            ];
            let length = norm(edge);
            if length == 0.0 {
                return None;
            }
            Some([edge[1] / length, -edge[0] / length, 0.0])
        }
        _ => {
            let a = [
                vertices[(simplex[0], 0)],
                vertices[(simplex[0], 1)],
                vertices[(simplex[0], 2)],
            ];
            let b = [
                vertices[(simplex[1], 0)],
                vertices[(simplex[1], 1)],
                vertices[(simplex[1], 2)],
            ];
            let c = [
                vertices[(simplex[2], 0)],
                vertices[(simplex[2], 1)],
                vertices[(simplex[2], 2)],
            ];
            let n = cross(sub(b, a), sub(c, a));
            let length = norm(n);
            if length == 0.0 {
                return None;
            }
            Some([n[0] / length, n[1] / length, n[2] / length])
        }
    }
}

fn row_to_point(row: RowRef<f64>) -> [f64; 3] {
    let mut p = [0.0; 3];
    for (axis, value) in row.iter().enumerate() {
        p[axis] = *value;
    }
    p
}

fn segment_extents(p: [f64; 3], q: [f64; 3], dimensions: usize) -> Vec<f64> {
    let mut ext = vec![0.0; 2 * dimensions];
    for axis in 0..dimensions {
        ext[axis] = p[axis].min(q[axis]);
        ext[dimensions + axis] = p[axis].max(q[axis]);
    }
    ext
}

#[inline(always)]
fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline(always)]
fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline(always)]
fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline(always)]
fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Signed double area of the triangle `a`, `b`, `c` (z components ignored).
#[inline(always)]
fn orient_2d(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// 1D crossing: does the segment from `p` to `q` pass the boundary vertex `v`.
fn segment_point_crossing(p: f64, q: f64, v: f64) -> CrossingTest {
    let from_p = v - p;
    let from_q = v - q;
    let product = from_p * from_q;
    if product < 0.0 {
        CrossingTest::Proper(from_p / (q - p))
    } else if product == 0.0 {
        CrossingTest::Grazing
    } else {
        CrossingTest::Miss
    }
}

/// 2D crossing of the segment `p`-`q` against the boundary segment `a`-`b`.
fn segment_segment_crossing(p: [f64; 3], q: [f64; 3], a: [f64; 3], b: [f64; 3]) -> CrossingTest {
    let o_pqa = orient_2d(p, q, a);
    let o_pqb = orient_2d(p, q, b);
    let o_abp = orient_2d(a, b, p);
    let o_abq = orient_2d(a, b, q);
    if o_pqa == 0.0 || o_pqb == 0.0 || o_abp == 0.0 || o_abq == 0.0 {
        return CrossingTest::Grazing;
    }
    if (o_pqa > 0.0) != (o_pqb > 0.0) && (o_abp > 0.0) != (o_abq > 0.0) {
        CrossingTest::Proper(o_abp / (o_abp - o_abq))
    } else {
        CrossingTest::Miss
    }
}

/// 3D crossing of the segment `p`-`q` against the triangle `a`-`b`-`c`
/// (Moeller-Trumbore with strict interior tests).
fn segment_triangle_crossing(
    p: [f64; 3],
    q: [f64; 3],
    a: [f64; 3],
    b: [f64; 3],
    c: [f64; 3],
) -> CrossingTest {
    let dir = sub(q, p);
    let edge1 = sub(b, a);
    let edge2 = sub(c, a);
    let h = cross(dir, edge2);
    let det = dot(edge1, h);
    if det.abs() <= 1e-14 * norm(dir) * norm(edge1) * norm(edge2) {
        return CrossingTest::Grazing;
    }
    let inv_det = 1.0 / det;
    let s = sub(p, a);
    let u = dot(s, h) * inv_det;
    let s_cross = cross(s, edge1);
    let v = dot(dir, s_cross) * inv_det;
    let t = dot(edge2, s_cross) * inv_det;
    if u == 0.0 || v == 0.0 || u == 1.0 || u + v == 1.0 || t == 0.0 || t == 1.0 {
        return CrossingTest::Grazing;
    }
    if u > 0.0 && v > 0.0 && u + v < 1.0 && t > 0.0 && t < 1.0 {
        CrossingTest::Proper(t)
    } else {
        CrossingTest::Miss
    }
}

fn point_segment_distance(p: [f64; 3], a: [f64; 3], b: [f64; 3]) -> f64 {
    let ab = sub(b, a);
    let ap = sub(p, a);
    let length_sq = dot(ab, ab);
    if length_sq == 0.0 {
        return norm(ap);
    }
    let t = (dot(ap, ab) / length_sq).clamp(0.0, 1.0);
    let closest = [a[0] + t * ab[0], a[1] + t * ab[1], a[2] + t * ab[2]];
    norm(sub(p, closest))
}

fn point_triangle_distance(p: [f64; 3], a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    let n = cross(sub(b, a), sub(c, a));
    let n_len = norm(n);
    if n_len == 0.0 {
        return point_segment_distance(p, a, b)
            .min(point_segment_distance(p, b, c))
            .min(point_segment_distance(p, c, a));
    }
    let unit = [n[0] / n_len, n[1] / n_len, n[2] / n_len];
    let height = dot(sub(p, a), unit);
    let projected = [
        p[0] - height * unit[0],
        p[1] - height * unit[1],
        p[2] - height * unit[2],
    ];
    // Same-side tests decide whether the projection lands inside the triangle.
    let inside = dot(cross(sub(b, a), sub(projected, a)), n) >= 0.0
        && dot(cross(sub(c, b), sub(projected, b)), n) >= 0.0
        && dot(cross(sub(a, c), sub(projected, c)), n) >= 0.0;
    if inside {
        height.abs()
    } else {
        point_segment_distance(p, a, b)
            .min(point_segment_distance(p, b, c))
            .min(point_segment_distance(p, c, a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{box_boundary, circle_boundary, interval_boundary, rectangle_boundary};
    use faer::mat;

    fn l_shape() -> SimplicialComplex {
        // An L-shaped domain: the unit 2x2 square with the top-right 1x1 corner removed.
        let vertices = mat![
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 2.0],
            [0.0, 2.0],
        ];
        let simplices = vec![
            vec![0, 1],
            vec![1, 2],
            vec![2, 3],
            vec![3, 4],
            vec![4, 5],
            vec![5, 0],
        ];
        SimplicialComplex::new(vertices, simplices).unwrap()
    }

    #[test]
    fn validation_rejects_malformed_complexes() {
        let vertices = mat![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
        let out_of_range = SimplicialComplex::new(vertices.clone(), vec![vec![0, 7]]);
        assert!(matches!(
            out_of_range,
            Err(GeometryError::SimplexIndexOutOfRange { index: 7, .. })
        ));

        let wrong_size = SimplicialComplex::new(vertices.clone(), vec![vec![0, 1, 2]]);
        assert!(matches!(
            wrong_size,
            Err(GeometryError::SimplexSize { expected: 2, found: 3, .. })
        ));

        let degenerate = SimplicialComplex::new(vertices.clone(), vec![vec![1, 1]]);
        assert!(matches!(
            degenerate,
            Err(GeometryError::DegenerateSimplex { simplex: 0 })
        ));

        let empty = SimplicialComplex::new(vertices, vec![]);
        assert!(matches!(empty, Err(GeometryError::Empty)));
    }

    #[test]
    fn interval_containment_includes_the_endpoints() {
        let interval = interval_boundary(0.0, 1.0).unwrap();
        assert!(interval.contains_point(mat![[0.5]].row(0)));
        assert!(interval.contains_point(mat![[0.0]].row(0)));
        assert!(interval.contains_point(mat![[1.0]].row(0)));
        assert!(!interval.contains_point(mat![[-0.1]].row(0)));
        assert!(!interval.contains_point(mat![[1.1]].row(0)));
    }

    #[test]
    fn square_containment_classifies_interior_boundary_and_exterior() {
        let square = rectangle_boundary([0.0, 0.0], [1.0, 1.0]).unwrap();
        let points = mat![
            [0.5, 0.5],     // interior
            [0.01, 0.99],   // interior, near a corner
            [0.5, 0.0],     // on an edge
            [1.0, 1.0],     // on a vertex
            [1.5, 0.5],     // outside
            [-0.2, -0.2],   // outside, diagonal from a corner
        ];
        let inside = square.contains(&points);
        assert_eq!(inside, vec![true, true, true, true, false, false]);
    }

    #[test]
    fn concave_domains_resolve_parity_correctly() {
        let shape = l_shape();
        assert!(shape.contains_point(mat![[0.5, 0.5]].row(0)));
        assert!(shape.contains_point(mat![[1.5, 0.5]].row(0)));
        assert!(shape.contains_point(mat![[0.5, 1.5]].row(0)));
        // The removed corner.
        assert!(!shape.contains_point(mat![[1.5, 1.5]].row(0)));
        assert!(!shape.contains_point(mat![[2.5, 0.5]].row(0)));
    }

    #[test]
    fn cube_containment_works_in_three_dimensions() {
        let cube = box_boundary([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).unwrap();
        assert!(cube.contains_point(mat![[0.5, 0.5, 0.5]].row(0)));
        assert!(cube.contains_point(mat![[0.9, 0.1, 0.8]].row(0)));
        // On a face, an edge, and a corner.
        assert!(cube.contains_point(mat![[0.5, 0.5, 1.0]].row(0)));
        assert!(cube.contains_point(mat![[0.0, 0.5, 0.0]].row(0)));
        assert!(cube.contains_point(mat![[1.0, 1.0, 1.0]].row(0)));
        assert!(!cube.contains_point(mat![[0.5, 0.5, 1.2]].row(0)));
        assert!(!cube.contains_point(mat![[-0.3, 0.4, 0.4]].row(0)));
    }

    #[test]
    fn normals_point_out_of_the_domain() {
        for complex in [
            rectangle_boundary([0.0, 0.0], [2.0, 1.0]).unwrap(),
            circle_boundary([1.0, -2.0], 1.5, 64).unwrap(),
        ] {
            let delta = 1e-6 * complex.diagonal();
            for s in 0..complex.num_simplices() {
                let centroid = complex.simplex_centroid(s);
                let probe = Row::from_fn(2, |axis| {
                    centroid[axis] + delta * complex.outward_normals()[(s, axis)]
                });
                assert!(
                    !complex.contains_point(probe.as_ref()),
                    "normal of simplex {} points inward",
                    s
                );
            }
        }
    }

    #[test]
    fn cube_normals_point_out_of_every_face() {
        let cube = box_boundary([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]).unwrap();
        for s in 0..cube.num_simplices() {
            let centroid = cube.simplex_centroid(s);
            let normal = cube.outward_normals().row(s);
            // For a box centered on the origin the outward direction agrees with
            // the centroid direction.
            let mut outwardness = 0.0;
            for axis in 0..3 {
                outwardness += centroid[axis] * normal[axis];
            }
            assert!(outwardness > 0.0, "simplex {} normal {:?}", s, normal);
        }
    }

    #[test]
    fn interval_normals_point_away_from_the_interior() {
        let interval = interval_boundary(2.0, 5.0).unwrap();
        let normals = interval.outward_normals();
        // Simplex 0 holds the left endpoint, simplex 1 the right.
        assert_eq!(normals[(0, 0)], -1.0);
        assert_eq!(normals[(1, 0)], 1.0);
    }

    #[test]
    fn vertices_perturbed_along_normals_classify_as_expected() {
        let circle = circle_boundary([0.0, 0.0], 1.0, 48).unwrap();
        let delta = 1e-4;
        for s in 0..circle.num_simplices() {
            let centroid = circle.simplex_centroid(s);
            let normal = circle.outward_normals().row(s);
            let inward = Row::from_fn(2, |axis| centroid[axis] - delta * normal[axis]);
            let outward = Row::from_fn(2, |axis| centroid[axis] + delta * normal[axis]);
            assert!(circle.contains_point(inward.as_ref()));
            assert!(!circle.contains_point(outward.as_ref()));
        }
    }

    #[test]
    fn first_crossing_finds_the_nearest_boundary_hit() {
        let square = rectangle_boundary([0.0, 0.0], [1.0, 1.0]).unwrap();
        let start = mat![[0.4, 0.37]];
        let end = mat![[1.7, 0.37]];
        let crossing = square
            .first_crossing(start.row(0), end.row(0))
            .expect("segment leaves the square");
        // The hit is on the right edge, x = 1.
        let t_expected = (1.0 - 0.4) / (1.7 - 0.4);
        assert!((crossing.t - t_expected).abs() < 1e-12);
        let hit_x = 0.4 + crossing.t * (1.7 - 0.4);
        assert!((hit_x - 1.0).abs() < 1e-12);

        // A segment that stays inside reports no crossing.
        assert!(square.first_crossing(start.row(0), mat![[0.6, 0.6]].row(0)).is_none());
    }

    #[test]
    fn crossing_detection_respects_concavity() {
        let shape = l_shape();
        // Across the notch: both endpoints inside, the connecting segment leaves.
        let a = mat![[1.7, 0.6]];
        let b = mat![[0.6, 1.7]];
        assert!(shape.crosses(a.row(0), b.row(0)));
        // A segment within the bottom leg stays inside.
        assert!(!shape.crosses(mat![[0.2, 0.4]].row(0), mat![[1.8, 0.6]].row(0)));
    }

    #[test]
    fn crossing_detection_works_through_cube_faces() {
        let cube = box_boundary([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).unwrap();
        assert!(cube.crosses(mat![[0.4, 0.4, 0.4]].row(0), mat![[0.4, 0.4, 1.6]].row(0)));
        assert!(!cube.crosses(mat![[0.2, 0.3, 0.4]].row(0), mat![[0.7, 0.6, 0.5]].row(0)));
    }

    #[test]
    fn separation_tolerates_endpoints_on_the_boundary() {
        let square = rectangle_boundary([0.0, 0.0], [1.0, 1.0]).unwrap();

        // Segment ending exactly on the right edge: touched but not separated.
        let interior = mat![[0.5, 0.5]];
        let on_edge = mat![[1.0, 0.37]];
        assert!(square.crosses(interior.row(0), on_edge.row(0)));
        assert!(!square.separates(interior.row(0), on_edge.row(0)));

        // Two nodes on the same edge see each other.
        assert!(!square.separates(mat![[1.0, 0.2]].row(0), mat![[1.0, 0.8]].row(0)));

        // A wall strictly between the endpoints separates them.
        assert!(square.separates(mat![[0.5, 0.37]].row(0), mat![[1.5, 0.37]].row(0)));
        assert!(!square.separates(mat![[0.2, 0.3]].row(0), mat![[0.8, 0.7]].row(0)));

        // Concave notch between two interior points.
        let shape = l_shape();
        assert!(shape.separates(mat![[1.7, 0.6]].row(0), mat![[0.6, 1.7]].row(0)));
    }

    #[test]
    fn boundary_measure_matches_hand_calculations() {
        let square = rectangle_boundary([0.0, 0.0], [2.0, 1.0]).unwrap();
        assert!((square.boundary_measure() - 6.0).abs() < 1e-12);

        let cube = box_boundary([0.0, 0.0, 0.0], [1.0, 2.0, 3.0]).unwrap();
        // Surface area of a 1 x 2 x 3 box.
        assert!((cube.boundary_measure() - 22.0).abs() < 1e-12);

        let interval = interval_boundary(0.0, 10.0).unwrap();
        assert_eq!(interval.boundary_measure(), 2.0);
    }

    #[test]
    fn distance_to_simplex_agrees_with_plane_geometry() {
        let square = rectangle_boundary([0.0, 0.0], [1.0, 1.0]).unwrap();
        // Find the bottom edge (centroid y = 0).
        let bottom = (0..square.num_simplices())
            .find(|&s| square.simplex_centroid(s)[1] == 0.0)
            .unwrap();
        assert!((square.distance_to_simplex(mat![[0.5, 0.3]].row(0), bottom) - 0.3).abs() < 1e-12);
        // Beyond the edge endpoints the distance is to the nearest corner.
        let expected = (0.5_f64 * 0.5 + 0.2 * 0.2).sqrt();
        assert!(
            (square.distance_to_simplex(mat![[-0.5, 0.2]].row(0), bottom) - expected).abs() < 1e-12
        );
    }
}
