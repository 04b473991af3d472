/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines user-facing configuration types for node generation and weight computation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # fd_config
//!
//! Builder-style settings for the two long-running pipelines: scattered node
//! generation ([`NodeSettings`]) and stencil weight computation
//! ([`WeightSettings`]).

pub use ferreus_fd_utils::RbfKernel;
use serde::{Deserialize, Serialize};

/// How the weight-matrix build responds to per-center stencil failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Abort the whole build on the first center whose stencil system fails.
    FailFast,
    /// Keep solving the remaining centers. A failed center keeps an empty row in
    /// the matrix and is returned in the failure report.
    CollectFailures,
}

/// Settings controlling the per-center stencil weight systems.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightSettings {
    /// RBF family used for the stencil interpolation systems.
    pub kernel: RbfKernel,
    /// Shape parameter passed to the kernel; must be finite and positive.
    pub shape_parameter: f64,
    /// Number of nearest nodes (including the center) in every stencil.
    pub stencil_size: usize,
    /// Total degree of the monomial augmentation.
    pub poly_order: usize,
    /// Per-center failure handling during the weight-matrix build.
    pub failure_policy: FailurePolicy,
}

impl WeightSettings {
    /// Creates a builder for [`WeightSettings`] with the given kernel family.
    ///
    /// Defaults: `shape_parameter` 1.0, `stencil_size` 20, `poly_order` 2,
    /// `failure_policy` [`FailurePolicy::FailFast`].
    pub fn builder(kernel: RbfKernel) -> WeightSettingsBuilder {
        WeightSettingsBuilder {
            kernel,
            shape_parameter: 1.0,
            stencil_size: 20,
            poly_order: 2,
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

pub struct WeightSettingsBuilder {
    kernel: RbfKernel,
    shape_parameter: f64,
    stencil_size: usize,
    poly_order: usize,
    failure_policy: FailurePolicy,
}

impl WeightSettingsBuilder {
    pub fn shape_parameter(mut self, shape_parameter: f64) -> Self {
        self.shape_parameter = shape_parameter;
        self
    }

    pub fn stencil_size(mut self, stencil_size: usize) -> Self {
        self.stencil_size = stencil_size;
        self
    }

    pub fn poly_order(mut self, poly_order: usize) -> Self {
        self.poly_order = poly_order;
        self
    }

    pub fn failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn build(self) -> WeightSettings {
        assert!(self.stencil_size >= 1, "a stencil needs at least one node");
        WeightSettings {
            kernel: self.kernel,
            shape_parameter: self.shape_parameter,
            stencil_size: self.stencil_size,
            poly_order: self.poly_order,
            failure_policy: self.failure_policy,
        }
    }
}

/// Settings controlling node generation and the repulsion relaxation loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Iteration cap for the relaxation loop.
    pub max_iterations: usize,
    /// Number of nearest neighbours each interior node is repelled by.
    /// `None` resolves to `dimensions + 3` at generation time.
    pub repulsion_neighbors: Option<usize>,
    /// Fraction of the local nearest-neighbour distance moved per iteration.
    pub step_factor: f64,
    /// Relaxation stops once the largest per-iteration displacement falls below
    /// this fraction of the average node spacing.
    pub convergence_tolerance: f64,
}

impl NodeSettings {
    /// Creates a builder for [`NodeSettings`].
    ///
    /// Defaults: `max_iterations` 100, `repulsion_neighbors` auto
    /// (`dimensions + 3`), `step_factor` 0.1, `convergence_tolerance` 1e-3.
    pub fn builder() -> NodeSettingsBuilder {
        NodeSettingsBuilder {
            max_iterations: 100,
            repulsion_neighbors: None,
            step_factor: 0.1,
            convergence_tolerance: 1e-3,
        }
    }

    /// The repulsion neighbour count for a domain of the given dimension.
    pub fn resolved_repulsion_neighbors(&self, dimensions: usize) -> usize {
        self.repulsion_neighbors.unwrap_or(dimensions + 3)
    }
}

impl Default for NodeSettings {
    fn default() -> Self {
        NodeSettings::builder().build()
    }
}

pub struct NodeSettingsBuilder {
    max_iterations: usize,
    repulsion_neighbors: Option<usize>,
    step_factor: f64,
    convergence_tolerance: f64,
}

impl NodeSettingsBuilder {
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn repulsion_neighbors(mut self, repulsion_neighbors: usize) -> Self {
        self.repulsion_neighbors = Some(repulsion_neighbors);
        self
    }

    pub fn step_factor(mut self, step_factor: f64) -> Self {
        self.step_factor = step_factor;
        self
    }

    pub fn convergence_tolerance(mut self, convergence_tolerance: f64) -> Self {
        self.convergence_tolerance = convergence_tolerance;
        self
    }

    pub fn build(self) -> NodeSettings {
        assert!(
            self.step_factor > 0.0 && self.step_factor < 1.0,
            "step factor must sit strictly between 0 and 1"
        );
        NodeSettings {
            max_iterations: self.max_iterations,
            repulsion_neighbors: self.repulsion_neighbors,
            step_factor: self.step_factor,
            convergence_tolerance: self.convergence_tolerance,
        }
    }
}
