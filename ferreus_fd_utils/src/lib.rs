/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports kernel families, derivative evaluation, and helper functions for ferreus_fd.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities for the [`ferreus_fd`] crate
//!
//! Kernel family definitions, exact kernel derivative evaluation, and the small
//! shared helpers the node generation and weight assembly pipelines lean on.
mod kernel_derivatives;
mod rbf_kernels;
mod utils;

pub use {
    kernel_derivatives::{MAX_DERIVATIVE_ORDER, rbf_matrix},
    rbf_kernels::{KernelError, ORIGIN_TOL, RbfKernel},
    utils::{argsort, get_distance, get_pointarray_extents, select_mat_rows},
};
