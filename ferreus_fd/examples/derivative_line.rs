use std::f64::consts::TAU;

use faer::Mat;
use ferreus_fd::{
    WeightMatrix, create_evaluation_grid,
    fd_config::{RbfKernel, WeightSettings},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Define a uniform 1D grid over one full period and sample sin(x) on it
    let num_points = 41usize;
    let points = create_evaluation_grid(&[(0.0, TAU)], &[num_points]);
    let values = Mat::from_fn(num_points, 1, |i, _| points[(i, 0)].sin());

    // Request a first-derivative row at every node, including the one-sided
    // stencils at both ends of the interval
    let centers: Vec<usize> = (0..num_points).collect();
    let diffs = vec![vec![1]];

    println!("d/dx sin(x) on {num_points} nodes over [0, 2*pi], stencil size 7:");

    for (name, kernel, shape_parameter) in [
        ("phs3", RbfKernel::Phs3, 1.0),
        ("phs5", RbfKernel::Phs5, 1.0),
        ("gaussian", RbfKernel::Ga, 3.0),
        ("multiquadric", RbfKernel::Mq, 3.0),
    ] {
        let settings = WeightSettings::builder(kernel)
            .shape_parameter(shape_parameter)
            .stencil_size(7)
            .poly_order(3)
            .build();

        // Solve for the weights and apply them to the sampled values
        let derivative = WeightMatrix::builder(&centers, &points, diffs.clone(), settings).build()?;
        let dense = derivative.to_dense();
        let approximation = &dense * &values;

        // Compare against the exact derivative cos(x)
        let mut max_error = 0.0f64;
        for i in 0..num_points {
            let error = (approximation[(i, 0)] - points[(i, 0)].cos()).abs();
            max_error = max_error.max(error);
        }
        println!("  {name:>12}    max error = {max_error:.3e}");
    }

    Ok(())
}
