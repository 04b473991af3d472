/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the supported RBF kernel families and their radial derivative profiles.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # RBF Kernels
//!
//! The radial basis function families supported by the weight solver, each with a
//! closed-form radial profile `phi(r)` and the chain of radial quotient derivatives
//! `g_m(r) = ((1/r) d/dr)^m phi(r)` that the derivative tables in
//! [`kernel_derivatives`](crate::kernel_derivatives) are built on.
//!
//! Supported families (`e = shape parameter`):
//! - Polyharmonic splines `phs1`..`phs8`: `(e*r)^k` for odd `k`, `(e*r)^k * ln(e*r)` for even `k`
//! - Gaussian `ga`: `exp(-(e*r)^2)`
//! - Multiquadric `mq`: `(1 + (e*r)^2)^(1/2)`
//! - Inverse multiquadric `imq`: `(1 + (e*r)^2)^(-1/2)`
//! - Inverse quadratic `iq`: `(1 + (e*r)^2)^(-1)`

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kernel_derivatives::MAX_DERIVATIVE_ORDER;

/// Radial distances below this threshold are treated as coincident with a kernel
/// centre, and derivative evaluations take the documented limit value instead of
/// the closed-form expression.
pub const ORIGIN_TOL: f64 = 1e-10;

/// The supported radial basis function families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RbfKernel {
    /// Polyharmonic spline of order 1, `(e*r)`.
    Phs1,
    /// Polyharmonic spline of order 2, `(e*r)^2 * ln(e*r)`.
    Phs2,
    /// Polyharmonic spline of order 3, `(e*r)^3`.
    Phs3,
    /// Polyharmonic spline of order 4, `(e*r)^4 * ln(e*r)`.
    Phs4,
    /// Polyharmonic spline of order 5, `(e*r)^5`.
    Phs5,
    /// Polyharmonic spline of order 6, `(e*r)^6 * ln(e*r)`.
    Phs6,
    /// Polyharmonic spline of order 7, `(e*r)^7`.
    Phs7,
    /// Polyharmonic spline of order 8, `(e*r)^8 * ln(e*r)`.
    Phs8,
    /// Gaussian, `exp(-(e*r)^2)`.
    Ga,
    /// Multiquadric, `(1 + (e*r)^2)^(1/2)`.
    Mq,
    /// Inverse multiquadric, `(1 + (e*r)^2)^(-1/2)`.
    Imq,
    /// Inverse quadratic, `(1 + (e*r)^2)^(-1)`.
    Iq,
}

/// Internal dispatch over the closed-form structure shared within each family class.
enum KernelClass {
    /// `(e*r)^k` for odd `k`.
    PolyharmonicOdd(i32),
    /// `(e*r)^k * ln(e*r)` for even `k`.
    PolyharmonicEven(i32),
    /// `exp(-(e*r)^2)`.
    Gaussian,
    /// `t^p` with `t = 1 + (e*r)^2`; covers mq, imq and iq via the exponent.
    GeneralisedMultiquadric(f64),
}

impl RbfKernel {
    /// Every supported kernel family, in declaration order.
    pub const ALL: [RbfKernel; 12] = [
        RbfKernel::Phs1,
        RbfKernel::Phs2,
        RbfKernel::Phs3,
        RbfKernel::Phs4,
        RbfKernel::Phs5,
        RbfKernel::Phs6,
        RbfKernel::Phs7,
        RbfKernel::Phs8,
        RbfKernel::Ga,
        RbfKernel::Mq,
        RbfKernel::Imq,
        RbfKernel::Iq,
    ];

    fn class(self) -> KernelClass {
        match self {
            RbfKernel::Phs1 => KernelClass::PolyharmonicOdd(1),
            RbfKernel::Phs2 => KernelClass::PolyharmonicEven(2),
            RbfKernel::Phs3 => KernelClass::PolyharmonicOdd(3),
            RbfKernel::Phs4 => KernelClass::PolyharmonicEven(4),
            RbfKernel::Phs5 => KernelClass::PolyharmonicOdd(5),
            RbfKernel::Phs6 => KernelClass::PolyharmonicEven(6),
            RbfKernel::Phs7 => KernelClass::PolyharmonicOdd(7),
            RbfKernel::Phs8 => KernelClass::PolyharmonicEven(8),
            RbfKernel::Ga => KernelClass::Gaussian,
            RbfKernel::Mq => KernelClass::GeneralisedMultiquadric(0.5),
            RbfKernel::Imq => KernelClass::GeneralisedMultiquadric(-0.5),
            RbfKernel::Iq => KernelClass::GeneralisedMultiquadric(-1.0),
        }
    }

    /// Returns the polyharmonic spline order `k`, or `None` for the smooth families.
    pub fn phs_order(self) -> Option<usize> {
        match self.class() {
            KernelClass::PolyharmonicOdd(k) | KernelClass::PolyharmonicEven(k) => Some(k as usize),
            _ => None,
        }
    }

    /// The largest total derivative order this family supports.
    ///
    /// Smooth families support every order the derivative tables are generated for.
    /// A polyharmonic spline of order `k` is capped at `k - 1`: at total order `k`
    /// and above its derivative has no finite limit at the centre, so every stencil
    /// (whose centre-to-centre entry sits exactly at `r = 0`) would be poisoned.
    pub fn max_derivative_order(self) -> usize {
        match self.phs_order() {
            Some(k) => MAX_DERIVATIVE_ORDER.min(k - 1),
            None => MAX_DERIVATIVE_ORDER,
        }
    }

    /// Validates the shape parameter for this family.
    pub fn validate_shape(self, shape_parameter: f64) -> Result<(), KernelError> {
        if !shape_parameter.is_finite() || shape_parameter <= 0.0 {
            return Err(KernelError::InvalidShapeParameter {
                value: shape_parameter,
            });
        }
        Ok(())
    }

    /// Evaluates the radial profile `phi(r)`.
    ///
    /// Polyharmonic splines of even order take their limit value `0` below
    /// [`ORIGIN_TOL`], where the `ln(e*r)` factor is undefined.
    #[inline(always)]
    pub fn phi(self, r: f64, shape_parameter: f64) -> f64 {
        let er = shape_parameter * r;
        match self.class() {
            KernelClass::PolyharmonicOdd(k) => er.powi(k),
            KernelClass::PolyharmonicEven(k) => {
                if r < ORIGIN_TOL {
                    0.0
                } else {
                    er.powi(k) * er.ln()
                }
            }
            KernelClass::Gaussian => (-er * er).exp(),
            KernelClass::GeneralisedMultiquadric(p) => (1.0 + er * er).powf(p),
        }
    }

    /// Evaluates the radial quotient derivative `g_m(r) = ((1/r) d/dr)^m phi(r)`.
    ///
    /// Closed forms per family class (`e = shape parameter`, `A(k, m)` the falling
    /// product `k * (k-2) * .. * (k-2m+2)`):
    /// - phs, odd `k`:  `e^k * A(k, m) * r^(k-2m)`
    /// - phs, even `k`: `e^k * r^(k-2m) * (a_m * ln(e*r) + b_m)` with `a_0 = 1`,
    ///   `b_0 = 0`, `a_(m+1) = (k-2m) * a_m`, `b_(m+1) = (k-2m) * b_m + a_m`
    /// - ga:            `(-2e^2)^m * exp(-(e*r)^2)`
    /// - mq/imq/iq:     `(2e^2)^m * p * (p-1) * .. * (p-m+1) * t^(p-m)` with
    ///   `t = 1 + (e*r)^2`
    ///
    /// For polyharmonic splines the expression is singular as `r -> 0`; callers must
    /// take the origin limit below [`ORIGIN_TOL`] instead of evaluating this.
    #[inline(always)]
    pub fn radial_quotient(self, m: usize, r: f64, shape_parameter: f64) -> f64 {
        if m == 0 {
            return self.phi(r, shape_parameter);
        }
        let eps = shape_parameter;
        match self.class() {
            KernelClass::PolyharmonicOdd(k) => {
                let mut coeff = 1.0;
                for j in 0..m {
                    coeff *= (k - 2 * j as i32) as f64;
                }
                eps.powi(k) * coeff * r.powi(k - 2 * m as i32)
            }
            KernelClass::PolyharmonicEven(k) => {
                let mut log_coeff = 1.0;
                let mut const_coeff = 0.0;
                for j in 0..m {
                    let factor = (k - 2 * j as i32) as f64;
                    const_coeff = factor * const_coeff + log_coeff;
                    log_coeff *= factor;
                }
                let er = eps * r;
                eps.powi(k) * r.powi(k - 2 * m as i32) * (log_coeff * er.ln() + const_coeff)
            }
            KernelClass::Gaussian => {
                let er = eps * r;
                (-2.0 * eps * eps).powi(m as i32) * (-er * er).exp()
            }
            KernelClass::GeneralisedMultiquadric(p) => {
                let mut coeff = 1.0;
                for j in 0..m {
                    coeff *= p - j as f64;
                }
                let t = 1.0 + (eps * r) * (eps * r);
                (2.0 * eps * eps).powi(m as i32) * coeff * t.powf(p - m as f64)
            }
        }
    }
}

impl fmt::Display for RbfKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RbfKernel::Phs1 => "phs1",
            RbfKernel::Phs2 => "phs2",
            RbfKernel::Phs3 => "phs3",
            RbfKernel::Phs4 => "phs4",
            RbfKernel::Phs5 => "phs5",
            RbfKernel::Phs6 => "phs6",
            RbfKernel::Phs7 => "phs7",
            RbfKernel::Phs8 => "phs8",
            RbfKernel::Ga => "ga",
            RbfKernel::Mq => "mq",
            RbfKernel::Imq => "imq",
            RbfKernel::Iq => "iq",
        };
        write!(f, "{}", name)
    }
}

/// Errors raised when a kernel evaluation request is invalid.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// The shape parameter was not finite and positive.
    InvalidShapeParameter { value: f64 },
    /// The requested total derivative order exceeds what the family supports.
    UnsupportedDerivative { kernel: RbfKernel, order: usize },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::InvalidShapeParameter { value } => {
                write!(f, "invalid shape parameter {} (must be finite and positive)", value)
            }
            KernelError::UnsupportedDerivative { kernel, order } => {
                write!(
                    f,
                    "derivative order {} is not supported by the {} kernel",
                    order, kernel
                )
            }
        }
    }
}

impl Error for KernelError {}
