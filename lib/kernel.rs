//! Per-point FDTD stencils.
//!
//! Writing Ψ = R + iI, the Schrödinger equation splits into
//! ```text
//! ∂R/∂t =  H I
//! ∂I/∂t = -H R
//! H u[i] = -(u[i + 1] - 2 u[i] + u[i - 1]) / (2 dx²) + V[i] u[i]
//! ```
//! and each [`Scheme`] discretizes the time derivative differently. Every
//! point's update reads only its own and its two neighbors' previous values,
//! so a pass is a data-parallel map over the grid.
//!
//! Neighbor indices are clamped to `[0, N - 1]` rather than wrapped. At the
//! edges this amounts to a reflecting wall; when absorbing boundaries are
//! enabled, the two edge values are overwritten afterward by
//! [`boundary`][crate::boundary].

use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{ Deserialize, Serialize };
use crate::{
    buffer::WaveBuffer,
    grid::{ GridParameters, spectral_radius },
};

/// Time-stepping scheme.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Scheme {
    /// Forward Euler in time, first-order accurate.
    ///
    /// Reads `Ψ(t)` and writes `Ψ(t + dt)` into the other of two buffers.
    /// Every mode is amplified by `√(1 + (λ dt)²)` per step, so this scheme has
    /// no stable time step; it is usable only for short runs with `dt` well
    /// below `dx²`.
    Euler,
    /// Centered difference in time, second-order accurate.
    ///
    /// Reads `Ψ(t - dt)` and `Ψ(t)` and writes `Ψ(t + dt)`, cycling through
    /// three buffers.
    #[default]
    Leapfrog,
    /// Centered difference in time with the real part living on whole steps
    /// and the imaginary part on half steps, second-order accurate.
    ///
    /// Ψ is held in a single buffer and updated in place in two passes (real,
    /// then imaginary) separated by a full barrier. A second buffer keeps the
    /// values from before each pass for the absorbing boundary.
    Staggered,
}

impl Scheme {
    /// Number of physical buffers the scheme needs.
    pub fn buffers(&self) -> usize {
        match self {
            Self::Euler => 2,
            Self::Leapfrog => 3,
            Self::Staggered => 2,
        }
    }

    /// Number of kernel passes per time step.
    pub fn passes(&self) -> usize {
        match self {
            Self::Euler | Self::Leapfrog => 1,
            Self::Staggered => 2,
        }
    }

    /// Order of accuracy in time.
    pub fn order(&self) -> usize {
        match self {
            Self::Euler => 1,
            Self::Leapfrog | Self::Staggered => 2,
        }
    }

    /// Largest stable time step for grid spacing `dx` and potential values
    /// within `v_range`, or `None` if no time step is stable.
    ///
    /// With `ρ` the [spectral radius][spectral_radius] of the discrete
    /// Hamiltonian, leapfrog is stable for `ρ dt ≤ 1` and the staggered scheme
    /// for `ρ dt ≤ 2`. Accuracy degrades well before either bound is reached.
    pub fn stability_limit(&self, dx: f64, v_range: (f64, f64)) -> Option<f64> {
        let rho = spectral_radius(dx, v_range);
        match self {
            Self::Euler => None,
            Self::Leapfrog => Some(rho.recip()),
            Self::Staggered => Some(2.0 * rho.recip()),
        }
    }
}

/// Indices of the left and right neighbors of grid point `i`, clamped to
/// `[0, n - 1]`.
#[inline]
pub fn neighbors(i: usize, n: usize) -> (usize, usize) {
    (i.saturating_sub(1), (i + 1).min(n - 1))
}

// action of the Hamiltonian on `u` at a single grid point, with clamped
// neighbors
#[inline]
fn hamiltonian(u: &[f64], V: &[f64], i: usize, inv_dx2: f64) -> f64 {
    let (l, r) = neighbors(i, u.len());
    -0.5 * (u[r] - 2.0 * u[i] + u[l]) * inv_dx2 + V[i] * u[i]
}

/// How a pass is laid out over the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Exec {
    /// Grid points per workgroup.
    pub workgroup: usize,
    /// Run workgroups concurrently.
    pub parallel: bool,
}

// write `f(i)` to both components of every point, one workgroup per chunk
fn map_points<F>(re: &mut [f64], im: &mut [f64], exec: Exec, f: F)
where F: Fn(usize) -> (f64, f64) + Sync
{
    let wg = exec.workgroup.max(1);
    let group = |(g, (re_g, im_g)): (usize, (&mut [f64], &mut [f64]))| {
        let base = g * wg;
        re_g.iter_mut().zip(im_g.iter_mut()).enumerate()
            .for_each(|(j, (r, m))| {
                let (a, b) = f(base + j);
                *r = a;
                *m = b;
            });
    };
    if exec.parallel {
        re.par_chunks_mut(wg).zip(im.par_chunks_mut(wg)).enumerate()
            .for_each(group);
    } else {
        re.chunks_mut(wg).zip(im.chunks_mut(wg)).enumerate()
            .for_each(group);
    }
}

// overwrite one component in place with `f(i, u[i])`
fn map_component<F>(u: &mut [f64], exec: Exec, f: F)
where F: Fn(usize, f64) -> f64 + Sync
{
    let wg = exec.workgroup.max(1);
    let group = |(g, u_g): (usize, &mut [f64])| {
        let base = g * wg;
        u_g.iter_mut().enumerate()
            .for_each(|(j, uj)| { *uj = f(base + j, *uj); });
    };
    if exec.parallel {
        u.par_chunks_mut(wg).enumerate().for_each(group);
    } else {
        u.chunks_mut(wg).enumerate().for_each(group);
    }
}

/// Forward-Euler pass: `dst ← src - i dt H src`.
pub(crate) fn euler(
    grid: &GridParameters,
    src: &WaveBuffer,
    dst: &mut WaveBuffer,
    exec: Exec,
) {
    let dt = grid.dt();
    let inv_dx2 = grid.dx().powi(2).recip();
    let V = grid.potential_slice();
    let (re, im) = (&src.re, &src.im);
    map_points(&mut dst.re, &mut dst.im, exec, |i| {
        (
            re[i] + dt * hamiltonian(im, V, i, inv_dx2),
            im[i] - dt * hamiltonian(re, V, i, inv_dx2),
        )
    });
}

/// Leapfrog pass: `next ← old - 2 i dt H cur`.
pub(crate) fn leapfrog(
    grid: &GridParameters,
    old: &WaveBuffer,
    cur: &WaveBuffer,
    next: &mut WaveBuffer,
    exec: Exec,
) {
    let dt2 = 2.0 * grid.dt();
    let inv_dx2 = grid.dx().powi(2).recip();
    let V = grid.potential_slice();
    map_points(&mut next.re, &mut next.im, exec, |i| {
        (
            old.re[i] + dt2 * hamiltonian(&cur.im, V, i, inv_dx2),
            old.im[i] - dt2 * hamiltonian(&cur.re, V, i, inv_dx2),
        )
    });
}

/// First half of a staggered step: `R ← R + dt H I`, in place.
pub(crate) fn staggered_real(grid: &GridParameters, psi: &mut WaveBuffer, exec: Exec) {
    let dt = grid.dt();
    let inv_dx2 = grid.dx().powi(2).recip();
    let V = grid.potential_slice();
    let WaveBuffer { re, im } = psi;
    let im: &[f64] = &im[..];
    map_component(re, exec, |i, r| r + dt * hamiltonian(im, V, i, inv_dx2));
}

/// Second half of a staggered step: `I ← I - dt H R`, in place.
pub(crate) fn staggered_imag(grid: &GridParameters, psi: &mut WaveBuffer, exec: Exec) {
    let dt = grid.dt();
    let inv_dx2 = grid.dx().powi(2).recip();
    let V = grid.potential_slice();
    let WaveBuffer { re, im } = psi;
    let re: &[f64] = &re[..];
    map_component(im, exec, |i, m| m - dt * hamiltonian(re, V, i, inv_dx2));
}
