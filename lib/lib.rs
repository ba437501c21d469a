#![allow(dead_code, non_snake_case)]

//! Provides an explicit finite-difference time-domain (FDTD) integrator for
//! the one-dimensional, time-dependent Schrödinger equation
//! ```text
//!   ∂Ψ      1 ∂²Ψ
//! i -- = - - --- + V(x) Ψ
//!   ∂t      2 ∂x²
//! ```
//! on a uniform grid, with the per-step stencil handed off to a compute
//! [`backend`].
//!
//! Provides implementations for the following numerical routines:
//! - Forward-Euler (first order, two-buffer ping-pong)
//! - Leapfrog (second order, three-buffer rotation)
//! - Staggered-time leapfrog (second order, real and imaginary parts offset by
//!   half a step and updated in place in two passes)
//! - Mur first-order absorbing boundaries
//! - Closed-form free Gaussian wave packet, used both to seed buffers and as an
//!   oracle for the evolved state
//!
//! ```
//! use fdspace::{
//!     diagnostics,
//!     grid::GridParameters,
//!     integrator::{ Integrator, IntegratorConfig },
//!     kernel::Scheme,
//!     packet::WavePacket,
//! };
//!
//! let n = 401;
//! let l = 40.0;
//! let dx = l / (n - 1) as f64;
//! let grid = GridParameters::free(0.2 * dx * dx, n, l).unwrap();
//! let packet = WavePacket::new(20.0, 2.0, 2.0).unwrap();
//! let config = IntegratorConfig::new(Scheme::Leapfrog);
//! let mut integ = Integrator::new(grid, &packet, config).unwrap();
//! let n0 = diagnostics::norm(integ.latest(), dx);
//! assert_eq!(integ.step(100), 100);
//! let n1 = diagnostics::norm(integ.latest(), dx);
//! assert!((n1 - n0).abs() / n0 < 1e-3);
//! ```
//!
//! See [`docs`] for theoretical background.

pub mod error;
pub mod grid;
pub mod buffer;
pub mod packet;
pub mod kernel;
pub mod boundary;
pub mod backend;
pub mod integrator;
pub mod diagnostics;
pub mod utils;

pub mod docs;

/// Default number of grid points handled by one workgroup.
pub(crate) const DEF_WORKGROUP: usize = 64;
/// Grids shorter than this are stepped sequentially by the host backend.
pub(crate) const DEF_MIN_PARALLEL: usize = 1 << 14;

pub type Arr1<S> = ndarray::ArrayBase<S, ndarray::Ix1>;
