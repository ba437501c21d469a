//! Immutable simulation constants: time step, resolution, domain length, and
//! the potential sampled on the grid.
//!
//! Grid points sit at `x[i] = i L / (N - 1)` for `i ∊ {0, ..., N - 1}`; the
//! spacing `dx` is always derived from `L` and `N` and never stored.

use ndarray as nd;
#[cfg(feature = "serde")]
use serde::{ Deserialize, Serialize };
use crate::{
    Arr1,
    error::ConfigError,
    kernel::Scheme,
};

pub type GResult<T> = Result<T, ConfigError>;

/// Simulation constants shared by every kernel.
///
/// Immutable once built; changing the resolution means building a new
/// [`Integrator`][crate::integrator::Integrator].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridParameters {
    dt: f64,
    n: usize,
    l: f64,
    V: Vec<f64>,
}

impl GridParameters {
    /// Create a new set of grid parameters.
    ///
    /// Fails if `dt ≤ 0`, `n < 3`, `l ≤ 0`, or `V` does not have exactly `n`
    /// samples.
    pub fn new<S>(dt: f64, n: usize, l: f64, V: &Arr1<S>) -> GResult<Self>
    where S: nd::Data<Elem = f64>
    {
        ConfigError::check_dt(dt)?;
        ConfigError::check_n(n)?;
        ConfigError::check_l(l)?;
        ConfigError::check_potential(n, V)?;
        Ok(Self { dt, n, l, V: V.iter().copied().collect() })
    }

    /// Create a new set of grid parameters with zero potential.
    pub fn free(dt: f64, n: usize, l: f64) -> GResult<Self> {
        Self::new(dt, n, l, &nd::Array1::<f64>::zeros(n))
    }

    /// Create a new set of grid parameters with the potential sampled from a
    /// [`Potential`] shape.
    pub fn with_potential(dt: f64, n: usize, l: f64, potential: &Potential)
        -> GResult<Self>
    {
        ConfigError::check_n(n)?;
        ConfigError::check_l(l)?;
        Self::new(dt, n, l, &potential.sample(n, l))
    }

    /// Time step.
    pub fn dt(&self) -> f64 { self.dt }

    /// Number of grid points.
    pub fn n(&self) -> usize { self.n }

    /// Physical length of the domain.
    pub fn l(&self) -> f64 { self.l }

    /// Grid spacing, `L / (N - 1)`.
    pub fn dx(&self) -> f64 { self.l / (self.n - 1) as f64 }

    /// Potential energy at each grid point.
    pub fn potential(&self) -> nd::ArrayView1<'_, f64> { nd::aview1(&self.V) }

    pub(crate) fn potential_slice(&self) -> &[f64] { &self.V }

    /// Coordinate of the `i`-th grid point.
    pub fn x(&self, i: usize) -> f64 { i as f64 * self.l / (self.n - 1) as f64 }

    /// All grid coordinates.
    pub fn coords(&self) -> nd::Array1<f64> {
        (0..self.n).map(|i| self.x(i)).collect()
    }

    /// Smallest and largest values of the potential.
    pub fn potential_range(&self) -> (f64, f64) {
        self.V.iter()
            .fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), &v| (lo.min(v), hi.max(v)),
            )
    }

    /// Largest stable time step for `scheme` on this grid, or `None` if the
    /// scheme has no stable time step at all.
    ///
    /// See [`Scheme::stability_limit`].
    pub fn stability_limit(&self, scheme: Scheme) -> Option<f64> {
        scheme.stability_limit(self.dx(), self.potential_range())
    }

    /// Return a copy of `self` with a different time step.
    pub fn with_dt(&self, dt: f64) -> GResult<Self> {
        ConfigError::check_dt(dt)?;
        Ok(Self { dt, ..self.clone() })
    }
}

/// Bound on the magnitude of the discrete Hamiltonian's spectrum for spacing
/// `dx` and potential values within `v_range`.
///
/// The clamped second-difference operator has eigenvalues in `[-4/dx², 0]`,
/// so `H = -½ ∂² + V` has eigenvalues in `[min V, 2/dx² + max V]`.
pub fn spectral_radius(dx: f64, v_range: (f64, f64)) -> f64 {
    let (vmin, vmax) = v_range;
    vmin.abs().max((2.0 / dx.powi(2) + vmax).abs())
}

/// Common potential shapes that can be sampled onto a grid.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Potential {
    /// `V = 0` everywhere.
    Free,
    /// Rectangular barrier of the given height, centered on `center`.
    Barrier { height: f64, center: f64, width: f64 },
    /// `V = height` for `x > position`.
    Step { height: f64, position: f64 },
    /// `V = ½ ω² (x - center)²`.
    Harmonic { center: f64, omega: f64 },
}

impl Potential {
    /// Evaluate at a single coordinate.
    pub fn at(&self, x: f64) -> f64 {
        match *self {
            Self::Free => 0.0,
            Self::Barrier { height, center, width } => {
                if (x - center).abs() <= width / 2.0 { height } else { 0.0 }
            },
            Self::Step { height, position } => {
                if x > position { height } else { 0.0 }
            },
            Self::Harmonic { center, omega } => {
                0.5 * omega.powi(2) * (x - center).powi(2)
            },
        }
    }

    /// Sample over `n` evenly spaced points covering `[0, l]`.
    pub fn sample(&self, n: usize, l: f64) -> nd::Array1<f64> {
        let dx = if n > 1 { l / (n - 1) as f64 } else { 0.0 };
        (0..n).map(|i| self.at(i as f64 * dx)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(GridParameters::free(0.0, 10, 1.0), Err(ConfigError::BadTimeStep(0.0)));
        assert_eq!(GridParameters::free(-1e-3, 10, 1.0), Err(ConfigError::BadTimeStep(-1e-3)));
        assert_eq!(GridParameters::free(1e-3, 2, 1.0), Err(ConfigError::BadResolution(2)));
        assert_eq!(GridParameters::free(1e-3, 0, 1.0), Err(ConfigError::BadResolution(0)));
        assert_eq!(GridParameters::free(1e-3, 10, 0.0), Err(ConfigError::BadLength(0.0)));
        let V: nd::Array1<f64> = nd::Array1::zeros(9);
        assert_eq!(
            GridParameters::new(1e-3, 10, 1.0, &V),
            Err(ConfigError::PotentialLength(10, 9)),
        );
    }

    #[test]
    fn spacing_is_derived() {
        let grid = GridParameters::free(1e-3, 11, 2.0).unwrap();
        assert!((grid.dx() - 0.2).abs() < 1e-15);
        assert_eq!(grid.x(0), 0.0);
        assert!((grid.x(10) - 2.0).abs() < 1e-15);
        assert_eq!(grid.coords().len(), 11);
        let grid = grid.with_dt(5e-4).unwrap();
        assert!((grid.dx() - 0.2).abs() < 1e-15);
        assert_eq!(grid.dt(), 5e-4);
    }

    #[test]
    fn potential_shapes() {
        let barrier = Potential::Barrier { height: 3.0, center: 5.0, width: 2.0 };
        assert_eq!(barrier.at(5.5), 3.0);
        assert_eq!(barrier.at(7.5), 0.0);
        let step = Potential::Step { height: 1.0, position: 1.0 };
        assert_eq!(step.at(0.5), 0.0);
        assert_eq!(step.at(1.5), 1.0);
        let ho = Potential::Harmonic { center: 1.0, omega: 2.0 };
        assert!((ho.at(2.0) - 2.0).abs() < 1e-15);
        let grid = GridParameters::with_potential(1e-3, 11, 10.0, &barrier).unwrap();
        assert_eq!(grid.potential_range(), (0.0, 3.0));
        assert_eq!(grid.potential()[5], 3.0);
    }

    #[test]
    fn spectral_radius_accounts_for_potential() {
        let dx = 0.1;
        assert!((spectral_radius(dx, (0.0, 0.0)) - 200.0).abs() < 1e-9);
        assert!((spectral_radius(dx, (0.0, 50.0)) - 250.0).abs() < 1e-9);
        assert!((spectral_radius(dx, (-1000.0, 0.0)) - 1000.0).abs() < 1e-9);
    }
}
