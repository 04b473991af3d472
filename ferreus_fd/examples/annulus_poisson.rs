/////////////////////////////////////////////////////////////////////////////////////////////
//
// Example RBF-FD solution of a Poisson problem on an annulus with Dirichlet conditions,
// compared against the radially symmetric analytic solution.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use std::f64::consts::TAU;
use std::sync::Arc;

use faer::linalg::solvers::Solve;
use faer::Mat;
use ferreus_fd::fd_config::{NodeSettings, RbfKernel, WeightSettings};
use ferreus_fd::progress::{closure_sink, ProgressMsg, ProgressSink};
use ferreus_fd::{point_arrays_to_csv, GeometryError, NodeSet, SimplicialComplex, WeightMatrix};

/// Builds the two-circle boundary of an annulus as a single simplicial complex:
/// the outer ring's segments followed by the inner ring's segments.
fn annulus_boundary(
    inner_radius: f64,
    outer_radius: f64,
    segments: usize,
) -> Result<SimplicialComplex, GeometryError> {
    let step = TAU / segments as f64;
    let vertices = Mat::from_fn(2 * segments, 2, |i, j| {
        let (radius, k) = if i < segments {
            (outer_radius, i)
        } else {
            (inner_radius, i - segments)
        };
        let angle = step * k as f64;
        match j {
            0 => radius * angle.cos(),
            _ => radius * angle.sin(),
        }
    });

    let mut simplices: Vec<Vec<usize>> = (0..segments)
        .map(|i| vec![i, (i + 1) % segments])
        .collect();
    simplices.extend((0..segments).map(|i| vec![segments + i, segments + (i + 1) % segments]));

    SimplicialComplex::new(vertices, simplices)
}

/// Analytic solution of -(u_xx + u_yy) = 1 on the annulus 1 <= r <= 2 with
/// u = 0 on both circles: u(r) = -r^2/4 + A ln(r) + 1/4 where A = 3/(4 ln 2).
fn analytic_solution(x: f64, y: f64) -> f64 {
    let r = x.hypot(y);
    let a = 0.75 / 2.0f64.ln();
    -0.25 * r * r + a * r.ln() + 0.25
}

/// Generates a callback closure_sink that prints generation and solver progress.
fn get_callback_sink() -> Arc<dyn ProgressSink> {
    let (sink, _listener) = closure_sink(256, |msg| match msg {
        ProgressMsg::NodesSeeded {
            num_boundary,
            num_interior,
        } => {
            println!("Seeded {num_boundary} boundary and {num_interior} interior nodes");
        }
        ProgressMsg::RelaxationIteration {
            iter,
            max_displacement,
            ..
        } => {
            if iter % 20 == 0 {
                println!("Relaxation iteration {iter:>3}    max displacement {max_displacement:>.3E}");
            }
        }
        ProgressMsg::ConvergenceWarning {
            iterations,
            final_max_displacement,
            tolerance,
        } => {
            println!(
                "Relaxation stopped after {iterations} iterations at displacement {final_max_displacement:>.3E} (tolerance {tolerance:>.3E})"
            );
        }
        ProgressMsg::WeightRowsSolved {
            completed,
            total,
            progress,
        } => {
            println!("Solved {completed:>4} / {total} weight rows    {:>.1}%", progress * 100.0);
        }
    });

    sink
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Describe the annulus 1 <= r <= 2 by its two boundary circles
    let domain = annulus_boundary(1.0, 2.0, 100)?;

    // Scatter quasi-uniform nodes over the annulus
    let callback = get_callback_sink();
    let num_nodes = 600;
    let nodes = NodeSet::builder(num_nodes, &domain, NodeSettings::default())
        .progress_callback(callback.clone())
        .build()?;
    let interior = nodes.interior_indices();
    let boundary = nodes.boundary_indices();

    // Differentiation weights for the negated Laplacian at every interior node
    let interior_settings = WeightSettings::builder(RbfKernel::Phs3)
        .stencil_size(15)
        .poly_order(2)
        .build();
    let laplacian = WeightMatrix::builder(
        &interior,
        nodes.points(),
        vec![vec![2, 0], vec![0, 2]],
        interior_settings,
    )
    .coefficients(vec![-1.0, -1.0])
    .progress_callback(callback.clone())
    .build()?;

    // Identity rows pin the boundary nodes to the Dirichlet value
    let boundary_settings = WeightSettings::builder(RbfKernel::Phs3)
        .stencil_size(1)
        .poly_order(0)
        .build();
    let identity = WeightMatrix::builder(&boundary, nodes.points(), vec![vec![0, 0]], boundary_settings)
        .build()?;

    // Stack both row groups into the global system -lap(u) = 1, u = 0 on the boundary
    let mut system = Mat::<f64>::zeros(num_nodes, num_nodes);
    let mut rhs = Mat::<f64>::zeros(num_nodes, 1);
    let laplacian_rows = laplacian.to_dense();
    for (row, &center) in interior.iter().enumerate() {
        for col in 0..num_nodes {
            system[(center, col)] = laplacian_rows[(row, col)];
        }
        rhs[(center, 0)] = 1.0;
    }
    let identity_rows = identity.to_dense();
    for (row, &center) in boundary.iter().enumerate() {
        for col in 0..num_nodes {
            system[(center, col)] = identity_rows[(row, col)];
        }
    }

    // Solve the discretised PDE
    let solution = system.partial_piv_lu().solve(&rhs);

    // Compare against the analytic solution
    let mut max_error = 0.0f64;
    let mut sum_squared = 0.0f64;
    for i in 0..num_nodes {
        let x = nodes.points()[(i, 0)];
        let y = nodes.points()[(i, 1)];
        let error = solution[(i, 0)] - analytic_solution(x, y);
        max_error = max_error.max(error.abs());
        sum_squared += error * error;
    }
    let rms_error = (sum_squared / num_nodes as f64).sqrt();

    println!();
    println!("Nodes:     {num_nodes} ({} boundary, {} interior)", boundary.len(), interior.len());
    println!("Max error: {max_error:>.3E}");
    println!("RMS error: {rms_error:>.3E}");

    // Save the solution for plotting
    point_arrays_to_csv(nodes.points(), &solution, "annulus_poisson_solution.csv")?;
    println!("Solution written to annulus_poisson_solution.csv");

    Ok(())
}
