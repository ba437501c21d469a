//! Measurements on evolved wavefunctions.
//!
//! None of these are on the stepping path; all of them read a [`WaveBuffer`]
//! (e.g. [`Integrator::latest`] or a [`Snapshot`][crate::buffer::Snapshot])
//! with a plain sequential scan.

use std::ops::Range;
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    backend::Backend,
    buffer::WaveBuffer,
    grid::GridParameters,
    integrator::Integrator,
    packet::WavePacket,
    utils,
};

/// ∫|Ψ|² dx by the trapezoidal rule.
///
/// *Panics if `psi` has fewer than 2 samples*.
pub fn norm(psi: &WaveBuffer, dx: f64) -> f64 {
    utils::trapz(&psi.density(), dx)
}

/// ∫|Ψ|² dx by Simpson's rule.
///
/// *Panics if `psi` has fewer than 2 samples*.
pub fn norm_simpson(psi: &WaveBuffer, dx: f64) -> f64 {
    utils::simpson(&psi.density(), dx)
}

/// Inner product ⟨φ|ψ⟩.
///
/// *Panics if either buffer has fewer than 2 samples*.
pub fn inner(phi: &WaveBuffer, psi: &WaveBuffer, dx: f64) -> C64 {
    utils::wf_dot(&phi.to_complex(), &psi.to_complex(), dx)
}

/// Overlap |⟨φ|ψ⟩|² of the normalized states, in `[0, 1]`.
///
/// *Panics if either buffer has fewer than 2 samples*.
pub fn fidelity(phi: &WaveBuffer, psi: &WaveBuffer, dx: f64) -> f64 {
    inner(phi, psi, dx).norm_sqr() / (norm(phi, dx) * norm(psi, dx))
}

/// Largest pointwise deviation |ψ[i] - ψ_ref[i]|.
///
/// *Panics if the buffers differ in length*.
pub fn max_error(psi: &WaveBuffer, reference: &WaveBuffer) -> f64 {
    assert_eq!(psi.len(), reference.len(), "buffers differ in length");
    (0..psi.len())
        .map(|i| (psi.get(i) - reference.get(i)).norm())
        .fold(0.0, f64::max)
}

/// Probability contained in the grid points `range`, by the trapezoidal rule.
///
/// Ranges of fewer than two points contain nothing.
///
/// *Panics if `range` extends past the end of `psi`*.
pub fn probability_in(psi: &WaveBuffer, dx: f64, range: Range<usize>) -> f64 {
    if range.len() < 2 { return 0.0; }
    let rho = psi.density();
    utils::trapz(&rho.slice(nd::s![range]), dx)
}

/// Index and value of the largest |Ψ|.
pub fn peak(psi: &WaveBuffer) -> (usize, f64) {
    (0..psi.len())
        .map(|i| (i, psi.get(i).norm()))
        .fold((0, 0.0), |(ib, b), (i, a)| if a > b { (i, a) } else { (ib, b) })
}

/// Expectation value ⟨x⟩ of the normalized state.
pub fn mean_position(psi: &WaveBuffer, grid: &GridParameters) -> f64 {
    let rho = psi.density();
    let dx = grid.dx();
    utils::trapz(&(&rho * &grid.coords()), dx) / utils::trapz(&rho, dx)
}

/// Expectation value ⟨k⟩ of the normalized state, from its power spectrum.
///
/// Only meaningful for well-resolved states, whose spectrum vanishes near the
/// Nyquist wave number.
pub fn mean_wavenumber(psi: &WaveBuffer, dx: f64) -> f64 {
    let (f, k) = utils::do_fft(&psi.to_complex(), dx);
    let power = f.mapv(|fk| fk.norm_sqr());
    (&power * &k).sum() / power.sum()
}

/// Largest pointwise deviation of `psi` from the closed-form free packet
/// evaluated with its real part at `t_re` and imaginary part at `t_im`.
pub fn oracle_error_at(
    psi: &WaveBuffer,
    grid: &GridParameters,
    packet: &WavePacket,
    t_re: f64,
    t_im: f64,
) -> f64
{
    max_error(psi, &packet.evaluate_staggered(grid, t_re, t_im))
}

/// Largest pointwise deviation of an integrator's latest state from the
/// closed-form free packet at the same simulated time(s).
///
/// Only meaningful for a free grid seeded with `packet`.
pub fn oracle_error<B>(integ: &Integrator<B>, packet: &WavePacket) -> f64
where B: Backend
{
    let (t_re, t_im) = integ.times();
    oracle_error_at(integ.latest(), integ.grid(), packet, t_re, t_im)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet_on_grid(n: usize) -> (GridParameters, WavePacket, WaveBuffer) {
        let grid = GridParameters::free(1e-3, n, 40.0).unwrap();
        let packet = WavePacket::new(15.0, 2.0, 3.0).unwrap();
        let psi = packet.evaluate(&grid, 0.0);
        (grid, packet, psi)
    }

    #[test]
    fn norms_of_closed_form_packet() {
        let (grid, _, psi) = packet_on_grid(801);
        let dx = grid.dx();
        assert!((norm(&psi, dx) - 1.0).abs() < 1e-10);
        assert!((norm_simpson(&psi, dx) - 1.0).abs() < 1e-10);
        assert!((fidelity(&psi, &psi, dx) - 1.0).abs() < 1e-12);
        assert!((inner(&psi, &psi, dx).re - norm(&psi, dx)).abs() < 1e-12);
    }

    #[test]
    fn moments_recover_packet_parameters() {
        let (grid, packet, psi) = packet_on_grid(801);
        assert!((mean_position(&psi, &grid) - packet.x0()).abs() < 1e-8);
        assert!((mean_wavenumber(&psi, grid.dx()) - packet.k()).abs() < 1e-6);
        let (i, a) = peak(&psi);
        assert!((grid.x(i) - packet.x0()).abs() <= grid.dx());
        assert!((a - packet.peak(0.0)).abs() < 1e-3);
    }

    #[test]
    fn region_probability() {
        let (grid, _, psi) = packet_on_grid(801);
        let dx = grid.dx();
        let mid = 300; // x = 15
        let left = probability_in(&psi, dx, 0..mid + 1);
        let right = probability_in(&psi, dx, mid..psi.len());
        assert!((left - 0.5).abs() < 1e-6);
        assert!((left + right - norm(&psi, dx)).abs() < 1e-12);
        assert_eq!(probability_in(&psi, dx, 5..6), 0.0);
    }

    #[test]
    fn errors_against_closed_form() {
        let (grid, packet, psi) = packet_on_grid(201);
        assert_eq!(oracle_error_at(&psi, &grid, &packet, 0.0, 0.0), 0.0);
        assert!(oracle_error_at(&psi, &grid, &packet, 0.5, 0.5) > 1e-2);
        let zero = WaveBuffer::try_zeros(psi.len()).unwrap();
        assert!((max_error(&psi, &zero) - peak(&psi).1).abs() < 1e-15);
    }
}
