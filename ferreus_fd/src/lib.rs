/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for RBF finite-difference operators.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Radial Basis Function generated Finite Differences (RBF-FD).
//!
//! The RBF-FD method discretises differential operators on scattered nodes
//! instead of structured grids. For each node a small stencil of nearby nodes
//! is selected, a local interpolation problem built from a radial basis
//! function plus a polynomial tail is solved, and the resulting weights are
//! placed into one row of a sparse matrix. Applying that matrix to a vector of
//! field values approximates the requested derivative at every stencil center,
//! so meshing a complicated domain is replaced by scattering nodes over it.
//!
//! This crate covers the whole pipeline: domains are described as simplicial
//! complexes (vertex pairs in 1D, polygonal boundaries in 2D, triangulated
//! surfaces in 3D), quasi-uniform nodes are generated over them with an
//! optional spatially varying density, and differentiation weight matrices are
//! assembled for arbitrary combinations of partial derivatives up to fourth
//! order. The discretised operator can then be handed to any linear solver to
//! solve PDEs, as the examples directory in the repository demonstrates.
//!
//! # Features
//! - Supports 1D, 2D, and 3D domains bounded by simplicial complexes
//! - Quasi-uniform node generation with boundary conformity and an optional
//!   density function, refined by parallel neighbour-repulsion relaxation
//! - Polyharmonic spline, Gaussian, and multiquadric kernel families with
//!   exact derivatives up to fourth order
//! - Polynomial augmentation for consistency up to a configurable degree
//! - Weight rows solved independently in parallel and assembled into a sparse
//!   operator matrix
//! - Built on [`faer`](https://docs.rs/faer/latest/faer/) for linear algebra,
//!   avoiding complex build dependencies
//!
//! # Examples
//!
//! ```
//! use ferreus_fd::fd_config::{NodeSettings, RbfKernel, WeightSettings};
//! use ferreus_fd::{rectangle_boundary, NodeSet, WeightMatrix};
//!
//! // Describe the domain and scatter nodes over it
//! let domain = rectangle_boundary([0.0, 0.0], [1.0, 1.0])?;
//! let nodes = NodeSet::builder(200, &domain, NodeSettings::default()).build()?;
//!
//! // Solve for Laplacian differentiation weights at every interior node
//! let interior = nodes.interior_indices();
//! let settings = WeightSettings::builder(RbfKernel::Phs3)
//!     .stencil_size(12)
//!     .poly_order(2)
//!     .build();
//! let laplacian = WeightMatrix::builder(
//!     &interior,
//!     nodes.points(),
//!     vec![vec![2, 0], vec![0, 2]],
//!     settings,
//! )
//! .build()?;
//!
//! // One sparse row per interior node, one column per node
//! assert_eq!(laplacian.num_centers(), interior.len());
//! assert_eq!(laplacian.num_nodes(), nodes.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # References
//! 1.  A. I. Tolstykh and D. A. Shirobokov. On using radial basis functions in a
//!     "finite difference mode" with applications to elasticity problems.
//!     Computational Mechanics, 33(1):68-79, 2003.
//! 2.  B. Fornberg and N. Flyer. A Primer on Radial Basis Functions with
//!     Applications to the Geosciences. SIAM, 2015.
//! 3.  N. Flyer, B. Fornberg, V. Bayona, and G. A. Barnett. On the role of
//!     polynomials in RBF-FD approximations: I. Interpolation and accuracy.
//!     J. Comput. Phys., 321:21-38, 2016.
//! 4.  V. Bayona, N. Flyer, B. Fornberg, and G. A. Barnett. On the role of
//!     polynomials in RBF-FD approximations: II. Numerical solution of elliptic
//!     PDEs. J. Comput. Phys., 332:257-273, 2017.
pub mod fd_config;

mod common;

mod geometry;

mod nodes;

mod fd;

mod operator;

mod polynomials;

mod halton;

mod kdtree;

mod rtree;

pub mod progress;

pub use {
    common::{
        box_boundary, circle_boundary, create_evaluation_grid, generate_random_points,
        interval_boundary, point_arrays_to_csv, rectangle_boundary,
    },
    fd::{FdError, WeightMatrixBuilder, fd_weights},
    geometry::{GeometryError, SegmentCrossing, SimplicialComplex},
    nodes::{NodeKind, NodeSet, NodeSetBuilder, RelaxationReport},
    operator::{StencilFailure, WeightMatrix, WeightRow, assemble_operator},
    polynomials::basis_size,
};
