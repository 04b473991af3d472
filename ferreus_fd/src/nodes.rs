/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements quasi-uniform node generation over simplicial-complex domains.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # nodes
//!
//! Generates the scattered node sets the finite-difference machinery operates on.
//! A [`NodeSet`] holds boundary nodes pinned to the domain simplices followed by
//! interior nodes, seeded from a Halton sequence and relaxed by neighbour
//! repulsion until they settle into a quasi-uniform arrangement. An optional
//! density function biases boundary apportionment, interior acceptance, and the
//! repulsion forces, so regions where it is larger end up with proportionally
//! more nodes.
//!
//! Boundary nodes never move once placed. During relaxation they act as fixed
//! repellers, which blends the interior spacing into the boundary spacing, and
//! any interior step that would leave the domain is reflected back off the
//! crossed boundary simplex.

use std::sync::Arc;

use faer::{Mat, Row, RowRef};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use ferreus_fd_utils::{argsort, get_distance};

use crate::fd::FdError;
use crate::fd_config::NodeSettings;
use crate::geometry::SimplicialComplex;
use crate::halton::HaltonSequence;
use crate::kdtree::KdTree;
use crate::progress::{ProgressMsg, ProgressSink};

/// Number of Halton probe points used to estimate the domain volume and the
/// supremum of the density function.
const VOLUME_PROBES: usize = 4096;

/// Fraction of the nominal spacing below which two generated nodes count as
/// coincident.
const SEPARATION_TOL: f64 = 1e-6;

/// Classification of one generated node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The node floats inside the domain and moves during relaxation.
    Interior,

    /// The node is pinned to a boundary simplex.
    Boundary {
        /// Index of the simplex carrying the node.
        simplex: usize,
        /// Outward unit normal of that simplex.
        normal: Row<f64>,
    },
}

/// Outcome of the node relaxation loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelaxationReport {
    /// Iterations actually run.
    pub iterations: usize,

    /// Largest node displacement in the last iteration that ran.
    pub final_max_displacement: f64,

    /// Whether the displacement fell below the convergence tolerance before the
    /// iteration cap. A non-converged set is usable, just less uniform.
    pub converged: bool,
}

/// A generated node set: boundary nodes first, interior nodes after, each row
/// tagged with a [`NodeKind`].
#[derive(Debug, Clone)]
pub struct NodeSet {
    points: Mat<f64>,
    kinds: Vec<NodeKind>,
    num_boundary: usize,
    spacing: f64,
    relaxation: RelaxationReport,
}

impl NodeSet {
    /// Creates a new [`NodeSetBuilder`] for the given node count, domain, and
    /// relaxation settings.
    ///
    /// This is the way to construct a node set.
    ///
    /// # Example
    /// ```
    /// use ferreus_fd::fd_config::NodeSettings;
    /// use ferreus_fd::{rectangle_boundary, NodeSet};
    ///
    /// let domain = rectangle_boundary([0.0, 0.0], [1.0, 1.0])?;
    /// let nodes = NodeSet::builder(100, &domain, NodeSettings::default()).build()?;
    ///
    /// assert_eq!(nodes.len(), 100);
    /// assert!(nodes.num_boundary() > 0);
    /// assert!(nodes.num_interior() > 0);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn builder(
        count: usize,
        complex: &SimplicialComplex,
        settings: NodeSettings,
    ) -> NodeSetBuilder<'_> {
        NodeSetBuilder::new(count, complex, settings)
    }

    /// Node coordinates, one row per node, boundary nodes first.
    pub fn points(&self) -> &Mat<f64> {
        &self.points
    }

    /// Per-node classification, aligned with the rows of [`Self::points`].
    pub fn kinds(&self) -> &[NodeKind] {
        &self.kinds
    }

    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    pub fn dimensions(&self) -> usize {
        self.points.ncols()
    }

    pub fn num_boundary(&self) -> usize {
        self.num_boundary
    }

    pub fn num_interior(&self) -> usize {
        self.points.nrows() - self.num_boundary
    }

    /// Indices of the boundary nodes, always the leading block.
    pub fn boundary_indices(&self) -> Vec<usize> {
        (0..self.num_boundary).collect()
    }

    /// Indices of the interior nodes, always the trailing block.
    pub fn interior_indices(&self) -> Vec<usize> {
        (self.num_boundary..self.points.nrows()).collect()
    }

    /// Nominal spacing `(volume / count)^(1/d)` the relaxation worked towards.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Outcome of the relaxation loop.
    pub fn relaxation(&self) -> &RelaxationReport {
        &self.relaxation
    }
}

/// Convenience builder for constructing a [`NodeSet`].
///
/// Configures the optional density function and progress sink before running
/// the generation pipeline. The builder should be called via the
/// [`NodeSet::builder`] method.
pub struct NodeSetBuilder<'a> {
    count: usize,
    complex: &'a SimplicialComplex,
    settings: NodeSettings,
    density: Box<dyn Fn(RowRef<f64>) -> f64 + Send + Sync + 'a>,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl<'a> NodeSetBuilder<'a> {
    fn new(count: usize, complex: &'a SimplicialComplex, settings: NodeSettings) -> Self {
        Self {
            count,
            complex,
            settings,
            density: Box::new(|_| 1.0),
            progress: None,
        }
    }

    /// Sets a relative density function over the domain.
    ///
    /// Regions where the function is larger receive proportionally more nodes;
    /// only ratios matter, not the absolute scale. The function must be finite
    /// and positive everywhere inside the domain and on its boundary.
    pub fn density<F>(mut self, density: F) -> Self
    where
        F: Fn(RowRef<f64>) -> f64 + Send + Sync + 'a,
    {
        self.density = Box::new(density);
        self
    }

    /// Registers a sink for seeding and relaxation progress events.
    pub fn progress_callback(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Runs the generation pipeline and returns the finished node set.
    ///
    /// # Errors
    ///
    /// Returns [`FdError::InvalidDomain`] when the domain encloses no detectable
    /// volume, when the density function is non-positive or non-finite where it
    /// is sampled, when the node count cannot cover the boundary vertices of a
    /// 1D domain, or when interior candidate generation stalls.
    pub fn build(self) -> Result<NodeSet, FdError> {
        assert!(self.count >= 1, "node count must be at least 1");
        let d = self.complex.dimensions();

        let (volume, density_cap) = self.measure_domain()?;
        let spacing = (volume / self.count as f64).powf(1.0 / d as f64);

        let (boundary_points, mut kinds) = self.place_boundary(volume)?;
        let num_boundary = boundary_points.len();
        let num_interior = self.count - num_boundary;
        let interior_points = self.seed_interior(num_interior, density_cap)?;

        if let Some(sink) = &self.progress {
            sink.emit(ProgressMsg::NodesSeeded {
                num_boundary,
                num_interior,
            });
        }

        let mut points = Mat::zeros(self.count, d);
        for (i, row) in boundary_points
            .iter()
            .chain(interior_points.iter())
            .enumerate()
        {
            for axis in 0..d {
                points[(i, axis)] = row[axis];
            }
        }
        kinds.resize(self.count, NodeKind::Interior);

        let relaxation = self.relax(&mut points, num_boundary, spacing);
        self.check_separation(&points, spacing)?;

        Ok(NodeSet {
            points,
            kinds,
            num_boundary,
            spacing,
            relaxation,
        })
    }

    /// Estimates the domain volume (length, area, or volume by dimension) and an
    /// upper bound on the density function by Halton sampling the bounding box.
    fn measure_domain(&self) -> Result<(f64, f64), FdError> {
        let d = self.complex.dimensions();
        let (mins, maxs) = self.complex.extents().split_at(d);

        let mut halton = HaltonSequence::new(d);
        let mut probes = Mat::zeros(VOLUME_PROBES, d);
        for i in 0..VOLUME_PROBES {
            let q = halton.next_point();
            for axis in 0..d {
                probes[(i, axis)] = mins[axis] + q[axis] * (maxs[axis] - mins[axis]);
            }
        }

        let inside = self.complex.contains(&probes);
        let mut hits = 0usize;
        let mut density_cap = 0.0f64;
        for i in 0..VOLUME_PROBES {
            if !inside[i] {
                continue;
            }
            hits += 1;
            let rho = (self.density)(probes.row(i));
            if !rho.is_finite() || rho <= 0.0 {
                return Err(FdError::InvalidDomain {
                    message: String::from(
                        "density function must be finite and positive inside the domain",
                    ),
                });
            }
            density_cap = density_cap.max(rho);
        }
        if hits == 0 {
            return Err(FdError::InvalidDomain {
                message: String::from("domain encloses no detectable volume"),
            });
        }

        let bbox_volume: f64 = (0..d).map(|axis| maxs[axis] - mins[axis]).product();
        let volume = bbox_volume * hits as f64 / VOLUME_PROBES as f64;
        // The true density peak can fall between probe points, so leave headroom
        // on the sampled supremum.
        Ok((volume, 1.05 * density_cap))
    }

    /// Places the boundary nodes and their kinds.
    ///
    /// 1D pins one node to each boundary vertex. 2D and 3D first choose a total
    /// boundary count whose spacing matches the interior spacing, apportion it
    /// across the simplices by measure times density, then space nodes evenly
    /// along each segment or scatter them over each triangle with a folded
    /// Halton sequence.
    fn place_boundary(&self, volume: f64) -> Result<(Vec<Row<f64>>, Vec<NodeKind>), FdError> {
        let complex = self.complex;
        let d = complex.dimensions();
        let num_simplices = complex.num_simplices();
        let normals = complex.outward_normals();

        if d == 1 {
            if self.count < num_simplices {
                return Err(FdError::InvalidDomain {
                    message: format!(
                        "node count {} cannot cover the {} boundary vertices",
                        self.count, num_simplices
                    ),
                });
            }
            let mut points = Vec::with_capacity(num_simplices);
            let mut kinds = Vec::with_capacity(num_simplices);
            for s in 0..num_simplices {
                points.push(complex.simplex_vertices(s).row(0).to_owned());
                kinds.push(NodeKind::Boundary {
                    simplex: s,
                    normal: normals.row(s).to_owned(),
                });
            }
            return Ok((points, kinds));
        }

        // A d-dimensional volume at spacing h holds (1/h)^d nodes and its
        // boundary holds (1/h)^(d-1) per unit measure.
        let exponent = (d as f64 - 1.0) / d as f64;
        let target = (complex.boundary_measure() * (self.count as f64 / volume).powf(exponent))
            .round() as usize;
        let target = target.min(self.count);

        let mut weights = Vec::with_capacity(num_simplices);
        for s in 0..num_simplices {
            let rho = (self.density)(complex.simplex_centroid(s).as_ref());
            if !rho.is_finite() || rho <= 0.0 {
                return Err(FdError::InvalidDomain {
                    message: String::from(
                        "density function must be finite and positive on the boundary",
                    ),
                });
            }
            weights.push(complex.simplex_measure(s) * rho);
        }
        let shares = apportion(&weights, target);

        let mut points = Vec::with_capacity(target);
        let mut kinds = Vec::with_capacity(target);
        let mut barycentric = HaltonSequence::new(2);
        for (s, &share) in shares.iter().enumerate() {
            if share == 0 {
                continue;
            }
            let vertices = complex.simplex_vertices(s);
            let normal = normals.row(s).to_owned();
            if d == 2 {
                for j in 0..share {
                    let t = (j as f64 + 0.5) / share as f64;
                    points.push(Row::from_fn(d, |axis| {
                        vertices[(0, axis)] + t * (vertices[(1, axis)] - vertices[(0, axis)])
                    }));
                    kinds.push(NodeKind::Boundary {
                        simplex: s,
                        normal: normal.clone(),
                    });
                }
            } else {
                for _ in 0..share {
                    let q = barycentric.next_point();
                    let (mut u, mut v) = (q[0], q[1]);
                    // Fold the unit square onto the unit triangle.
                    if u + v > 1.0 {
                        u = 1.0 - u;
                        v = 1.0 - v;
                    }
                    points.push(Row::from_fn(d, |axis| {
                        vertices[(0, axis)]
                            + u * (vertices[(1, axis)] - vertices[(0, axis)])
                            + v * (vertices[(2, axis)] - vertices[(0, axis)])
                    }));
                    kinds.push(NodeKind::Boundary {
                        simplex: s,
                        normal: normal.clone(),
                    });
                }
            }
        }
        Ok((points, kinds))
    }

    /// Seeds interior nodes by rejection sampling a (d+1)-dimensional Halton
    /// sequence: the first d coordinates map to the bounding box and the last one
    /// drives the density acceptance test.
    fn seed_interior(
        &self,
        num_interior: usize,
        density_cap: f64,
    ) -> Result<Vec<Row<f64>>, FdError> {
        if num_interior == 0 {
            return Ok(Vec::new());
        }
        let d = self.complex.dimensions();
        let (mins, maxs) = self.complex.extents().split_at(d);

        let mut halton = HaltonSequence::new(d + 1);
        let mut accepted = Vec::with_capacity(num_interior);
        let mut draws = 0usize;
        let max_draws = (1000 * num_interior).max(100_000);

        while accepted.len() < num_interior {
            if draws >= max_draws {
                return Err(FdError::InvalidDomain {
                    message: format!(
                        "interior seeding stalled after {} candidates; the domain volume or the density function is degenerate",
                        draws
                    ),
                });
            }

            let deficit = num_interior - accepted.len();
            let batch = (2 * deficit).clamp(256, 8192);
            let mut candidates = Mat::zeros(batch, d);
            let mut thresholds = vec![0.0f64; batch];
            for i in 0..batch {
                let q = halton.next_point();
                for axis in 0..d {
                    candidates[(i, axis)] = mins[axis] + q[axis] * (maxs[axis] - mins[axis]);
                }
                thresholds[i] = q[d];
            }
            draws += batch;

            let inside = self.complex.contains(&candidates);
            for i in 0..batch {
                if accepted.len() == num_interior {
                    break;
                }
                if inside[i] && thresholds[i] * density_cap < (self.density)(candidates.row(i)) {
                    accepted.push(candidates.row(i).to_owned());
                }
            }
        }
        Ok(accepted)
    }

    /// Relaxes the interior nodes in place by iterated neighbour repulsion.
    ///
    /// Every iteration rebuilds the neighbour index over the previous iteration's
    /// positions and then moves each interior node independently, so all
    /// repulsion forces observe one consistent snapshot.
    fn relax(&self, points: &mut Mat<f64>, num_boundary: usize, spacing: f64) -> RelaxationReport {
        let d = self.complex.dimensions();
        let total = points.nrows();
        if num_boundary == total {
            return RelaxationReport {
                iterations: 0,
                final_max_displacement: 0.0,
                converged: true,
            };
        }

        let neighbors = self.settings.resolved_repulsion_neighbors(d);
        let threshold = self.settings.convergence_tolerance * spacing;
        let mut report = RelaxationReport {
            iterations: 0,
            final_max_displacement: 0.0,
            converged: false,
        };

        for iteration in 0..self.settings.max_iterations {
            let current: &Mat<f64> = points;
            let tree = KdTree::new(current);
            let moves: Vec<(Row<f64>, f64)> = (num_boundary..total)
                .into_par_iter()
                .map(|node| self.relax_node(node, current, &tree, neighbors))
                .collect();

            let mut max_displacement = 0.0f64;
            for (offset, (position, displacement)) in moves.iter().enumerate() {
                let node = num_boundary + offset;
                for axis in 0..d {
                    points[(node, axis)] = position[axis];
                }
                max_displacement = max_displacement.max(*displacement);
            }

            report.iterations = iteration + 1;
            report.final_max_displacement = max_displacement;
            if let Some(sink) = &self.progress {
                sink.emit(ProgressMsg::RelaxationIteration {
                    iter: iteration + 1,
                    max_displacement,
                    progress: (iteration + 1) as f64 / self.settings.max_iterations as f64,
                });
            }
            if max_displacement < threshold {
                report.converged = true;
                break;
            }
        }

        if !report.converged && report.iterations > 0 {
            if let Some(sink) = &self.progress {
                sink.emit(ProgressMsg::ConvergenceWarning {
                    iterations: report.iterations,
                    final_max_displacement: report.final_max_displacement,
                    tolerance: threshold,
                });
            }
        }
        report
    }

    /// Computes one relaxation move for one interior node against a snapshot of
    /// all node positions.
    ///
    /// The repulsion from each nearby node decays with the cube of the distance
    /// and is weighted by the density ratio, which drifts nodes towards denser
    /// regions. The step length is the step factor times the nearest-neighbour
    /// distance, scaled by how unbalanced the force sum is so that movement dies
    /// away once a neighbourhood reaches equilibrium.
    fn relax_node(
        &self,
        node: usize,
        current: &Mat<f64>,
        tree: &KdTree,
        neighbors: usize,
    ) -> (Row<f64>, f64) {
        let d = self.complex.dimensions();
        let query = current.row(node);

        // The node itself sits in the tree, so ask for one extra neighbour.
        let found = tree.k_nearest(query, neighbors + 1);
        let rho_node = (self.density)(query);

        let mut force = [0.0f64; 3];
        let mut nearest = f64::INFINITY;
        let mut repellers = 0usize;
        for neighbor in &found {
            if neighbor.id == node || neighbor.distance == 0.0 {
                continue;
            }
            nearest = nearest.min(neighbor.distance);
            repellers += 1;
            let rho_neighbor = (self.density)(current.row(neighbor.id));
            let scale = (rho_node / rho_neighbor) / neighbor.distance.powi(3);
            for axis in 0..d {
                force[axis] += scale * (current[(node, axis)] - current[(neighbor.id, axis)]);
            }
        }

        let magnitude = (force[0] * force[0] + force[1] * force[1] + force[2] * force[2]).sqrt();
        if repellers == 0 || magnitude == 0.0 || !magnitude.is_finite() {
            return (query.to_owned(), 0.0);
        }

        // Dimensionless imbalance of the force sum: near 1 when every neighbour
        // pushes the same way, near 0 at equilibrium.
        let imbalance = (magnitude * nearest * nearest / repellers as f64).min(1.0);
        let step = self.settings.step_factor * nearest * imbalance / magnitude;
        let proposed = Row::from_fn(d, |axis| query[axis] + step * force[axis]);

        let position = self.bounce(query, proposed);
        let displacement = get_distance(position.as_ref(), query);
        (position, displacement)
    }

    /// Applies a proposed move, reflecting any motion that would leave the
    /// domain back off the crossed boundary simplex. If even the reflected point
    /// falls outside, the move is abandoned.
    fn bounce(&self, old: RowRef<f64>, proposed: Row<f64>) -> Row<f64> {
        let Some(crossing) = self.complex.first_crossing(old, proposed.as_ref()) else {
            return proposed;
        };

        let d = self.complex.dimensions();
        let normal = self.complex.outward_normals().row(crossing.simplex);
        let mut along = 0.0;
        for axis in 0..d {
            along += (1.0 - crossing.t) * (proposed[axis] - old[axis]) * normal[axis];
        }
        let reflected = Row::from_fn(d, |axis| proposed[axis] - 2.0 * along * normal[axis]);

        if self.complex.contains_point(reflected.as_ref()) {
            reflected
        } else {
            old.to_owned()
        }
    }

    /// Verifies that no two nodes coincide within the minimum-separation
    /// tolerance.
    fn check_separation(&self, points: &Mat<f64>, spacing: f64) -> Result<(), FdError> {
        if points.nrows() < 2 {
            return Ok(());
        }
        let tree = KdTree::new(points);
        let closest = (0..points.nrows())
            .into_par_iter()
            .map(|node| {
                tree.k_nearest(points.row(node), 2)
                    .last()
                    .map_or(f64::INFINITY, |neighbor| neighbor.distance)
            })
            .reduce(|| f64::INFINITY, f64::min);
        if closest < SEPARATION_TOL * spacing {
            return Err(FdError::InvalidDomain {
                message: format!(
                    "two generated nodes nearly coincide (separation {:.3e})",
                    closest
                ),
            });
        }
        Ok(())
    }
}

/// Splits `total` into integer shares proportional to `weights` by largest
/// remainder, so the shares always sum to `total`.
fn apportion(weights: &[f64], total: usize) -> Vec<usize> {
    let mut shares = vec![0usize; weights.len()];
    let weight_sum: f64 = weights.iter().sum();
    if total == 0 || !(weight_sum > 0.0) {
        return shares;
    }

    let mut assigned = 0usize;
    let mut remainders = Vec::with_capacity(weights.len());
    for (s, weight) in weights.iter().enumerate() {
        let quota = total as f64 * weight / weight_sum;
        shares[s] = quota.floor() as usize;
        assigned += shares[s];
        remainders.push(quota - shares[s] as f64);
    }

    let order = argsort(&remainders);
    for &s in order.iter().rev().take(total - assigned) {
        shares[s] += 1;
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{box_boundary, circle_boundary, interval_boundary, rectangle_boundary};
    use crate::progress::closure_sink;
    use std::sync::Mutex;

    fn l_shape() -> SimplicialComplex {
        let vertices = faer::mat![
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
    fn generates_exactly_the_requested_node_count() {
        let domain = rectangle_boundary([0.0, 0.0], [2.0, 1.0]).unwrap();
        let set = NodeSet::builder(120, &domain, NodeSettings::default())
            .build()
            .unwrap();

        assert_eq!(set.len(), 120);
        assert_eq!(set.dimensions(), 2);
        assert_eq!(set.num_boundary() + set.num_interior(), 120);
        assert!(set.num_boundary() > 30 && set.num_boundary() < 60);

        // Boundary nodes occupy the leading rows.
        for kind in &set.kinds()[..set.num_boundary()] {
            assert!(matches!(kind, NodeKind::Boundary { .. }));
        }
        for kind in &set.kinds()[set.num_boundary()..] {
            assert!(matches!(kind, NodeKind::Interior));
        }
        assert_eq!(set.boundary_indices().len(), set.num_boundary());
        assert_eq!(set.interior_indices().len(), set.num_interior());

        // The box fills its own bounding box, so the volume estimate is exact.
        let expected_spacing = (2.0f64 / 120.0).sqrt();
        assert!((set.spacing() - expected_spacing).abs() < 1e-9);
    }

    #[test]
    fn nodes_are_classified_and_placed_consistently() {
        let domain = rectangle_boundary([0.0, 0.0], [2.0, 1.0]).unwrap();
        let set = NodeSet::builder(90, &domain, NodeSettings::default())
            .build()
            .unwrap();

        for (i, kind) in set.kinds().iter().enumerate() {
            let point = set.points().row(i);
            match kind {
                NodeKind::Boundary { simplex, normal } => {
                    assert!(domain.distance_to_simplex(point, *simplex) < 1e-9);
                    assert_eq!(normal.as_ref(), domain.outward_normals().row(*simplex));
                }
                NodeKind::Interior => {
                    assert!(domain.contains_point(point));
                }
            }
        }
    }

    #[test]
    fn cube_nodes_respect_their_classification() {
        let domain = box_boundary([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).unwrap();
        let settings = NodeSettings::builder().max_iterations(20).build();
        let set = NodeSet::builder(400, &domain, settings).build().unwrap();

        assert_eq!(set.len(), 400);
        assert!(set.num_boundary() > 0);
        assert!(set.num_interior() > 0);
        for (i, kind) in set.kinds().iter().enumerate() {
            let point = set.points().row(i);
            match kind {
                NodeKind::Boundary { simplex, .. } => {
                    assert!(domain.distance_to_simplex(point, *simplex) < 1e-9);
                }
                NodeKind::Interior => {
                    assert!(domain.contains_point(point));
                }
            }
        }
    }

    #[test]
    fn node_generation_is_deterministic() {
        let domain = circle_boundary([0.0, 0.0], 1.0, 32).unwrap();
        let first = NodeSet::builder(90, &domain, NodeSettings::default())
            .build()
            .unwrap();
        let second = NodeSet::builder(90, &domain, NodeSettings::default())
            .build()
            .unwrap();

        assert_eq!(first.kinds(), second.kinds());
        assert_eq!(first.relaxation(), second.relaxation());
        for i in 0..first.len() {
            for axis in 0..first.dimensions() {
                assert_eq!(first.points()[(i, axis)], second.points()[(i, axis)]);
            }
        }
    }

    #[test]
    fn relaxation_stops_at_the_cap_with_a_warning() {
        let domain = circle_boundary([0.0, 0.0], 1.0, 32).unwrap();
        let settings = NodeSettings::builder().max_iterations(2).build();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let (sink, handle) = closure_sink(64, move |msg| {
            record.lock().unwrap().push(msg);
        });

        let set = NodeSet::builder(70, &domain, settings)
            .progress_callback(sink)
            .build()
            .unwrap();
        handle.join().unwrap();

        let report = set.relaxation();
        assert_eq!(report.iterations, 2);
        assert!(!report.converged);

        let messages = seen.lock().unwrap();
        let mut seeded = 0;
        let mut iterations = 0;
        let mut warnings = 0;
        for msg in messages.iter() {
            match msg {
                ProgressMsg::NodesSeeded {
                    num_boundary,
                    num_interior,
                } => {
                    seeded += 1;
                    assert_eq!(num_boundary + num_interior, 70);
                }
                ProgressMsg::RelaxationIteration {
                    max_displacement, ..
                } => {
                    iterations += 1;
                    assert!(*max_displacement > 0.0);
                }
                ProgressMsg::ConvergenceWarning {
                    iterations: capped,
                    final_max_displacement,
                    tolerance,
                } => {
                    warnings += 1;
                    assert_eq!(*capped, 2);
                    assert!(final_max_displacement >= tolerance);
                }
                _ => {}
            }
        }
        assert_eq!(seeded, 1);
        assert_eq!(iterations, 2);
        assert_eq!(warnings, 1);
    }

    #[test]
    fn density_function_biases_node_placement() {
        let domain = rectangle_boundary([0.0, 0.0], [1.0, 1.0]).unwrap();
        let set = NodeSet::builder(300, &domain, NodeSettings::default())
            .density(|p| 1.0 + 9.0 * p[0])
            .build()
            .unwrap();
        assert_eq!(set.len(), 300);

        let mut left_interior = 0usize;
        let mut right_interior = 0usize;
        let mut per_simplex = [0usize; 4];
        for (i, kind) in set.kinds().iter().enumerate() {
            match kind {
                NodeKind::Interior => {
                    if set.points()[(i, 0)] < 0.5 {
                        left_interior += 1;
                    } else {
                        right_interior += 1;
                    }
                }
                NodeKind::Boundary { simplex, .. } => per_simplex[*simplex] += 1,
            }
        }

        // Interior nodes follow the density towards the right half.
        assert!(right_interior as f64 > 1.5 * left_interior as f64);
        // Simplex 1 is the right edge, simplex 3 the left edge.
        assert!(per_simplex[1] > 3 * per_simplex[3]);
    }

    #[test]
    fn interval_nodes_pin_both_endpoints() {
        let domain = interval_boundary(0.0, 2.0).unwrap();
        let set = NodeSet::builder(15, &domain, NodeSettings::default())
            .build()
            .unwrap();

        assert_eq!(set.len(), 15);
        assert_eq!(set.num_boundary(), 2);
        let endpoints = [set.points()[(0, 0)], set.points()[(1, 0)]];
        assert!(endpoints.contains(&0.0));
        assert!(endpoints.contains(&2.0));
        for i in 2..set.len() {
            let x = set.points()[(i, 0)];
            assert!(x > 0.0 && x < 2.0);
        }
        assert!(set.relaxation().iterations >= 1);
    }

    #[test]
    fn an_empty_interior_yields_a_trivially_converged_report() {
        let domain = interval_boundary(-1.0, 1.0).unwrap();
        let set = NodeSet::builder(2, &domain, NodeSettings::default())
            .build()
            .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.num_interior(), 0);
        assert_eq!(
            set.relaxation(),
            &RelaxationReport {
                iterations: 0,
                final_max_displacement: 0.0,
                converged: true,
            }
        );
    }

    #[test]
    fn l_shaped_domains_keep_relaxed_nodes_inside() {
        let domain = l_shape();
        let settings = NodeSettings::builder().max_iterations(40).build();
        let set = NodeSet::builder(150, &domain, settings).build().unwrap();

        assert_eq!(set.len(), 150);
        for &i in &set.interior_indices() {
            assert!(domain.contains_point(set.points().row(i)));
        }
    }

    #[test]
    fn apportionment_is_exact_and_proportional() {
        assert_eq!(apportion(&[1.0, 1.0, 1.0], 9), vec![3, 3, 3]);
        assert_eq!(apportion(&[2.0, 1.0, 1.0], 8), vec![4, 2, 2]);
        assert_eq!(apportion(&[1.0, 1.0], 0), vec![0, 0]);

        let shares = apportion(&[0.3, 0.2, 0.1, 0.4], 7);
        assert_eq!(shares.iter().sum::<usize>(), 7);
        // The largest weight takes the extra node left by the floors.
        assert_eq!(shares[3], 3);
    }
}
