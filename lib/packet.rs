//! Closed-form free-particle Gaussian wave packet.
//!
//! With ħ = m = 1, a packet initially centered on `x0` with width `w` and wave
//! number `k` evolves freely as
//! ```text
//! θ(t) = ½ atan(2t / w²)
//! φ(t) = -θ(t) - k² t / 2
//! a(t) = w⁴ + 4t²
//! b(x, t) = (x - x0 - k t)²
//! c(x, t) = φ(t) + k (x - x0) + 2 t b / a
//!
//! Ψ(x, t) = (2 w² / (π a))^¼ exp(-b w² / a) exp(i c)
//! ```
//! which is normalized to 1 at all times. It seeds the integrator's buffers
//! and serves as the exact reference for free evolution.

use std::f64::consts::PI;
use ndarray as nd;
use num_complex::Complex64 as C64;
#[cfg(feature = "serde")]
use serde::{ Deserialize, Serialize };
use crate::{
    buffer::WaveBuffer,
    error::ConfigError,
    grid::GridParameters,
};

/// A free Gaussian wave packet.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WavePacket {
    x0: f64,
    w: f64,
    k: f64,
}

impl WavePacket {
    /// Create a new wave packet centered on `x0` with width `w` and wave number
    /// `k`.
    ///
    /// Fails if `w ≤ 0`.
    pub fn new(x0: f64, w: f64, k: f64) -> Result<Self, ConfigError> {
        ConfigError::check_width(w)?;
        Ok(Self { x0, w, k })
    }

    /// Initial center.
    pub fn x0(&self) -> f64 { self.x0 }

    /// Initial width.
    pub fn w(&self) -> f64 { self.w }

    /// Central wave number.
    pub fn k(&self) -> f64 { self.k }

    /// Kinetic energy of the central wave number, `k² / 2`.
    pub fn energy(&self) -> f64 { self.k.powi(2) / 2.0 }

    /// Speed of the packet envelope, `k`.
    pub fn group_velocity(&self) -> f64 { self.k }

    /// Speed of the central plane wave's phase fronts, `√(E / 2) = |k| / 2`.
    pub fn phase_velocity(&self) -> f64 { (self.energy() / 2.0).sqrt() }

    /// Center of the envelope at time `t`.
    pub fn center(&self, t: f64) -> f64 { self.x0 + self.k * t }

    /// Largest value of |Ψ| at time `t`.
    pub fn peak(&self, t: f64) -> f64 {
        let a = self.w.powi(4) + 4.0 * t.powi(2);
        (2.0 * self.w.powi(2) / (PI * a)).powf(0.25)
    }

    /// Evaluate Ψ(x, t).
    pub fn value(&self, x: f64, t: f64) -> C64 {
        let w2 = self.w.powi(2);
        let theta = 0.5 * (2.0 * t / w2).atan();
        let phi = -theta - self.k.powi(2) * t / 2.0;
        let a = w2.powi(2) + 4.0 * t.powi(2);
        let b = (x - self.x0 - self.k * t).powi(2);
        let c = phi + self.k * (x - self.x0) + 2.0 * t * b / a;
        let amp = (2.0 * w2 / (PI * a)).powf(0.25) * (-b * w2 / a).exp();
        amp * C64::cis(c)
    }

    /// Evaluate Ψ at every grid point at time `t`.
    pub fn sample(&self, grid: &GridParameters, t: f64) -> nd::Array1<C64> {
        (0..grid.n()).map(|i| self.value(grid.x(i), t)).collect()
    }

    /// Evaluate Ψ at every grid point at time `t` as a [`WaveBuffer`].
    pub fn evaluate(&self, grid: &GridParameters, t: f64) -> WaveBuffer {
        WaveBuffer::from_complex(&self.sample(grid, t))
    }

    /// Evaluate the real part of Ψ at time `t_re` and the imaginary part at time
    /// `t_im`, as needed by the staggered scheme.
    pub fn evaluate_staggered(&self, grid: &GridParameters, t_re: f64, t_im: f64)
        -> WaveBuffer
    {
        let mut buf = WaveBuffer {
            re: Vec::with_capacity(grid.n()),
            im: Vec::with_capacity(grid.n()),
        };
        self.fill(grid, t_re, t_im, &mut buf);
        buf
    }

    /// Overwrite `buf` in place with the real part of Ψ at `t_re` and the
    /// imaginary part at `t_im`.
    pub(crate) fn fill(
        &self,
        grid: &GridParameters,
        t_re: f64,
        t_im: f64,
        buf: &mut WaveBuffer,
    ) {
        buf.re.clear();
        buf.im.clear();
        for i in 0..grid.n() {
            let x = grid.x(i);
            buf.re.push(self.value(x, t_re).re);
            buf.im.push(self.value(x, t_im).im);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::trapz;

    #[test]
    fn rejects_non_positive_width() {
        assert_eq!(WavePacket::new(0.0, 0.0, 1.0), Err(ConfigError::BadWidth(0.0)));
        assert_eq!(WavePacket::new(0.0, -2.0, 1.0), Err(ConfigError::BadWidth(-2.0)));
        assert!(WavePacket::new(0.0, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn initial_state_is_plane_wave_times_gaussian() {
        let p = WavePacket::new(1.0, 2.0, 3.0).unwrap();
        let x = 1.7;
        let expected
            = (2.0 / (PI * 4.0)).powf(0.25)
            * (-(x - 1.0_f64).powi(2) / 4.0).exp()
            * C64::cis(3.0 * (x - 1.0));
        assert!((p.value(x, 0.0) - expected).norm() < 1e-14);
        assert!((p.value(1.0, 0.0).norm() - p.peak(0.0)).abs() < 1e-14);
    }

    #[test]
    fn stays_normalized_while_moving() {
        let grid = GridParameters::free(1e-3, 2001, 40.0).unwrap();
        let p = WavePacket::new(10.0, 2.0, 2.0).unwrap();
        for t in [0.0, 1.0, 3.0] {
            let rho = p.evaluate(&grid, t).density();
            let norm = trapz(&rho, grid.dx());
            assert!((norm - 1.0).abs() < 1e-9, "norm at t = {t} is {norm}");
            let mean = trapz(&(&rho * &grid.coords()), grid.dx());
            assert!((mean - p.center(t)).abs() < 1e-9, "mean at t = {t} is {mean}");
        }
    }

    #[test]
    fn staggered_evaluation_offsets_components() {
        let grid = GridParameters::free(1e-3, 101, 10.0).unwrap();
        let p = WavePacket::new(5.0, 1.0, 1.0).unwrap();
        let buf = p.evaluate_staggered(&grid, 0.0, 0.5);
        let re = p.evaluate(&grid, 0.0);
        let im = p.evaluate(&grid, 0.5);
        assert_eq!(buf.re(), re.re());
        assert_eq!(buf.im(), im.im());
    }

    #[test]
    fn velocities() {
        let p = WavePacket::new(0.0, 1.0, 4.0).unwrap();
        assert_eq!(p.energy(), 8.0);
        assert_eq!(p.phase_velocity(), 2.0);
        assert_eq!(p.group_velocity(), 4.0);
    }
}
