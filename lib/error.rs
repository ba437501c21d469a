//! Collection of all error types.
//!
//! All errors derive [`thiserror::Error`], making them composable when allowed
//! and compatible with application code using [`anyhow`][anyhow].
//!
//! Only configuration and initialization can fail. Once an
//! [`Integrator`][crate::integrator::Integrator] exists, stepping it never
//! returns an error; numerical instability shows up as diverging (or
//! non-finite) values instead.
//!
//! [anyhow]: https://crates.io/crates/anyhow

use ndarray as nd;
use thiserror::Error;

/// Returned when a simulation parameter fails validation.
///
/// These are always raised before any buffer is allocated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Returned when a non-positive (or non-finite) time step is encountered.
    #[error("time step `dt` must be greater than 0; got {0}")]
    BadTimeStep(f64),

    /// Returned when the grid has fewer than 3 points.
    #[error("grid resolution `n` must be at least 3; got {0}")]
    BadResolution(usize),

    /// Returned when a non-positive (or non-finite) domain length is
    /// encountered.
    #[error("domain length `l` must be greater than 0; got {0}")]
    BadLength(f64),

    /// Returned when a wave packet has non-positive (or non-finite) width.
    #[error("wave packet width `w` must be greater than 0; got {0}")]
    BadWidth(f64),

    /// Returned when a boundary is configured with a non-positive energy.
    #[error("boundary energy `e` must be greater than 0; got {0}")]
    BadEnergy(f64),

    /// Returned when the potential array does not match the grid resolution.
    #[error("potential `V` must have one sample per grid point; expected {0}, got {1}")]
    PotentialLength(usize, usize),

    /// Returned when a workgroup is configured to hold zero grid points.
    #[error("`workgroup_size` must be greater than 0; got {0}")]
    BadWorkgroup(usize),

    /// Returned when a fused dispatch is asked to fuse zero steps.
    #[error("fused dispatch `iterations` must be greater than 0; got {0}")]
    BadIterations(usize),
}

impl ConfigError {
    pub(crate) fn check_dt(dt: f64) -> Result<(), Self> {
        (dt.is_finite() && dt > 0.0).then_some(()).ok_or(Self::BadTimeStep(dt))
    }

    pub(crate) fn check_n(n: usize) -> Result<(), Self> {
        (n >= 3).then_some(()).ok_or(Self::BadResolution(n))
    }

    pub(crate) fn check_l(l: f64) -> Result<(), Self> {
        (l.is_finite() && l > 0.0).then_some(()).ok_or(Self::BadLength(l))
    }

    pub(crate) fn check_width(w: f64) -> Result<(), Self> {
        (w.is_finite() && w > 0.0).then_some(()).ok_or(Self::BadWidth(w))
    }

    pub(crate) fn check_energy(e: f64) -> Result<(), Self> {
        (e.is_finite() && e > 0.0).then_some(()).ok_or(Self::BadEnergy(e))
    }

    pub(crate) fn check_potential<S>(n: usize, V: &nd::ArrayBase<S, nd::Ix1>)
        -> Result<(), Self>
    where S: nd::Data<Elem = f64>
    {
        let nv = V.len();
        (nv == n).then_some(()).ok_or(Self::PotentialLength(n, nv))
    }

    pub(crate) fn check_workgroup(size: usize) -> Result<(), Self> {
        (size != 0).then_some(()).ok_or(Self::BadWorkgroup(size))
    }

    pub(crate) fn check_iterations(iterations: usize) -> Result<(), Self> {
        (iterations != 0).then_some(()).ok_or(Self::BadIterations(iterations))
    }
}

/// Returned by a [`Backend`][crate::backend::Backend] when it cannot honor a
/// request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Returned when a requested configuration exceeds a device limit.
    #[error("unsupported configuration: {what} of {requested} exceeds the device limit of {limit}")]
    Unsupported {
        /// Name of the limited quantity.
        what: &'static str,
        /// Requested value.
        requested: usize,
        /// Device limit.
        limit: usize,
    },

    /// Returned when buffer storage cannot be reserved.
    #[error("failed to allocate a buffer of {0} complex samples")]
    Allocation(usize),

    /// Returned when the device itself cannot be brought up.
    #[error("failed to initialize compute device: {0}")]
    Device(String),

    /// Returned when buffers bound to the same pass have unequal lengths.
    #[error("encountered buffers with incompatible lengths; got {0} and {1}")]
    Length(usize, usize),
}

impl BackendError {
    pub(crate) fn check_limit(what: &'static str, requested: usize, limit: usize)
        -> Result<(), Self>
    {
        (requested <= limit).then_some(())
            .ok_or(Self::Unsupported { what, requested, limit })
    }
}

/// Returned from [`Integrator`][crate::integrator::Integrator] construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FdError {
    /// [`ConfigError`]
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// [`BackendError`]
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_parameter() {
        let err = ConfigError::BadResolution(2);
        assert_eq!(err.to_string(), "grid resolution `n` must be at least 3; got 2");
        let err = ConfigError::BadWidth(-1.0);
        assert!(err.to_string().contains("`w`"));
        let err = ConfigError::PotentialLength(5, 4);
        assert!(err.to_string().contains("`V`"));
    }

    #[test]
    fn checks_reject_non_finite_values() {
        assert!(ConfigError::check_dt(f64::NAN).is_err());
        assert!(ConfigError::check_dt(0.0).is_err());
        assert!(ConfigError::check_dt(1e-3).is_ok());
        assert!(ConfigError::check_l(f64::INFINITY).is_err());
        assert!(ConfigError::check_width(0.0).is_err());
        assert!(ConfigError::check_energy(-2.0).is_err());
        assert!(ConfigError::check_iterations(0).is_err());
    }

    #[test]
    fn unsupported_is_distinguishable() {
        let err = BackendError::check_limit("workgroup size", 2048, 1024)
            .unwrap_err();
        assert_eq!(
            err,
            BackendError::Unsupported {
                what: "workgroup size",
                requested: 2048,
                limit: 1024,
            }
        );
        let wrapped: FdError = err.into();
        assert!(matches!(wrapped, FdError::Backend(BackendError::Unsupported { .. })));
        assert!(wrapped.to_string().starts_with("backend error: unsupported configuration"));
    }
}
