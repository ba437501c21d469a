//! Mur first-order absorbing boundaries.
//!
//! Near the edges, an outgoing packet with a narrow spread of wave numbers
//! looks like a plane wave traveling at its phase velocity `vp`, and so
//! approximately satisfies the one-way wave equation
//! ```text
//! ∂Ψ/∂t ± vp ∂Ψ/∂x = 0
//! ```
//! (`+` at the right edge, `-` at the left). Centering this at the half-cell
//! between the edge and its neighbor and at the half-step between the old and
//! new values gives
//! ```text
//! Ψ'[0] = Ψ[1] + κ (Ψ'[1] - Ψ[0])
//! κ = (vp dt - dx) / (vp dt + dx)
//! ```
//! where primes denote values after the interior update; the right edge is the
//! mirror image. Waves whose phase velocity matches `vp` leave the domain
//! without reflection; others are partially reflected.

#[cfg(feature = "serde")]
use serde::{ Deserialize, Serialize };
use tracing::debug;
use crate::{
    buffer::{ Component, WaveBuffer },
    error::ConfigError,
    packet::WavePacket,
};

/// Absorbing boundary tuned to a fixed phase velocity.
///
/// Holds no state between steps; each application reads only the buffers it
/// is handed.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MurBoundary {
    vp: f64,
}

impl MurBoundary {
    /// Tune the boundary to waves of energy `e`, for which `vp = √(e / 2)`.
    ///
    /// Fails if `e ≤ 0`.
    pub fn from_energy(e: f64) -> Result<Self, ConfigError> {
        ConfigError::check_energy(e)?;
        Ok(Self { vp: (e / 2.0).sqrt() })
    }

    /// Tune the boundary to the central energy of a wave packet.
    ///
    /// Fails if the packet is at rest.
    pub fn for_packet(packet: &WavePacket) -> Result<Self, ConfigError> {
        Self::from_energy(packet.energy())
    }

    /// Phase velocity the boundary absorbs.
    pub fn phase_velocity(&self) -> f64 { self.vp }

    /// Mixing coefficient `κ` for time step `dt` and grid spacing `dx`.
    ///
    /// Zero when `vp dt = dx`, in which case each edge takes on the old value
    /// of its neighbor.
    pub fn coefficient(&self, dt: f64, dx: f64) -> f64 {
        let cdt = self.vp * dt;
        (cdt - dx) / (cdt + dx)
    }

    /// Overwrite both edge values of one component of `new`, given the
    /// values of the same component from before the interior update in `old`.
    ///
    /// *Panics if the arrays have fewer than 2 elements or differ in length*.
    pub fn apply_slice(&self, kappa: f64, old: &[f64], new: &mut [f64]) {
        let n = new.len();
        new[0] = old[1] + kappa * (new[1] - old[0]);
        new[n - 1] = old[n - 2] + kappa * (new[n - 2] - old[n - 1]);
    }

    /// Overwrite the edge values of the selected component(s) of `new`.
    pub fn apply(
        &self,
        dt: f64,
        dx: f64,
        comp: Component,
        old: &WaveBuffer,
        new: &mut WaveBuffer,
    ) {
        let kappa = self.coefficient(dt, dx);
        if kappa == 0.0 {
            debug!("mur boundary: vp dt = dx; edges copy their old neighbors");
        }
        if matches!(comp, Component::Real | Component::Both) {
            self.apply_slice(kappa, &old.re, &mut new.re);
        }
        if matches!(comp, Component::Imag | Component::Both) {
            self.apply_slice(kappa, &old.im, &mut new.im);
        }
    }
}
