//! Theoretical background.
//!
//! # Contents
//! - [Background](#background)
//! - [Units](#units)
//! - [Time-stepping schemes](#time-stepping-schemes)
//! - [Stability](#stability)
//! - [Absorbing boundaries](#absorbing-boundaries)
//! - [Buffer discipline](#buffer-discipline)
//!
//! # Background
//! The time-dependent Schrödinger equation (TDSE) for a single particle in one
//! dimension,
//! ```text
//!   ∂Ψ     ħ² ∂²Ψ
//! iħ -- = - --- --- + V(x) Ψ
//!   ∂t     2 m ∂x²
//! ```
//! is a linear, first-order-in-time PDE for the complex-valued wavefunction
//! Ψ(*x*, *t*). The finite-difference time-domain (FDTD) approach samples Ψ on
//! a uniform grid
//! ```text
//! x[i] = i δx, i ∊ {0, ..., N - 1}
//! δx = L / (N - 1)
//! ```
//! and replaces the second spatial derivative with the centered three-point
//! difference
//! ```text
//! ∂²Ψ      Ψ[i + 1] - 2 Ψ[i] + Ψ[i - 1]
//! --- [i] ≈ --------------------------- + O(δx²)
//! ∂x²                 δx²
//! ```
//! which turns the TDSE into a large system of coupled ODEs, one per grid
//! point, to be advanced by an explicit time-stepping rule. Because each grid
//! point's update reads only itself and its two neighbors, every point of a
//! single update can be computed independently of every other, and the update
//! maps directly onto a data-parallel dispatch.
//!
//! At the ends of the grid, missing neighbors are replaced by the nearest
//! valid index (`i - 1` clamps to 0 and `i + 1` clamps to *N* - 1). The clamped
//! stencil acts as a reflecting wall; see
//! [Absorbing boundaries](#absorbing-boundaries) for the alternative.
//!
//! # Units
//! Everything in this crate works with *ħ* = *m* = 1, so that the equation
//! being integrated is
//! ```text
//!   ∂Ψ      1 ∂²Ψ
//! i -- = - - --- + V(x) Ψ ≡ H Ψ
//!   ∂t      2 ∂x²
//! ```
//! Splitting Ψ = *R* + *i* *I* into real and imaginary parts, the TDSE becomes
//! the pair of real equations
//! ```text
//! ∂R         ∂I
//! -- = H I,  -- = -H R
//! ∂t         ∂t
//! ```
//! which couple the two parts in the same way that the electric and magnetic
//! fields are coupled in Maxwell's equations. This analogy underlies the
//! staggered scheme below.
//!
//! The free Gaussian packet of width *w* and wave number *k* has energy
//! *E* = *k*²/2, group velocity *k*, and phase velocity √(*E*/2) = *k*/2. The
//! closed form used by [`WavePacket`][crate::packet::WavePacket] is normalized
//! to 1 for all time, so the discrete norm of an evolved free packet is a
//! direct measure of the error of a scheme.
//!
//! # Time-stepping schemes
//! Write *H* for the discretized Hamiltonian above and *δt* for the time step.
//!
//! **Forward Euler** advances both parts from the same instant,
//! ```text
//! R(t + δt) = R(t) + δt H I(t)
//! I(t + δt) = I(t) - δt H R(t)
//! ```
//! This needs only two buffers (read one, write the other), and is first order
//! in time. It is also unconditionally unstable for the TDSE: each step
//! multiplies every eigenmode of energy *ε* by a factor of magnitude
//! √(1 + *ε*² *δt*²) > 1, so the norm grows slowly for small *δt* and quickly
//! otherwise.
//!
//! **Leapfrog** (centered differences in time) uses two previous instants,
//! ```text
//! Ψ(t + δt) = Ψ(t - δt) - 2 i δt H Ψ(t)
//! ```
//! which is second order in time and requires three buffers. It needs two
//! initial time levels, which are seeded from the closed-form packet at
//! *t* = 0 and *t* = *δt*.
//!
//! **Staggered (Visscher) leapfrog**[^1] defines the real part at integer
//! times and the imaginary part at half-integer times,
//! ```text
//! R(t + δt)      = R(t)      + δt H I(t + δt/2)
//! I(t + 3δt/2)   = I(t + δt/2) - δt H R(t + δt)
//! ```
//! This is also second order, but each part is only ever read by the update of
//! the other, so both can live in a single buffer updated in place in two
//! passes per step, provided the first pass has completed at every grid point
//! before the second begins. The quantity
//! ```text
//! P(t) = R(t)² + I(t + δt/2) I(t - δt/2)
//! ```
//! is exactly conserved by this scheme, which is why its norm barely moves.
//!
//! # Stability
//! Let *ρ* be the spectral radius of the discrete Hamiltonian. For potentials
//! bounded by *V*<sub>min</sub> ≤ *V* ≤ *V*<sub>max</sub>, Gershgorin's theorem
//! gives
//! ```text
//! ρ ≤ max(|V_min|, 2/δx² + V_max)
//! ```
//! The leapfrog scheme is stable when *δt* ≤ 1/*ρ* and the staggered scheme
//! when *δt* ≤ 2/*ρ*[^1]. For a free particle these reduce to *δt*/*δx*² ≤ ½
//! and *δt*/*δx*² ≤ 1. Forward Euler has no stable time step. Exceeding the
//! limit is not an error; the integrator will log a warning and run anyway, and
//! the highest-frequency modes will grow exponentially until the state is
//! dominated by noise (eventually non-finite).
//!
//! # Absorbing boundaries
//! Near the edges of the grid, an outgoing packet with a narrow spread of wave
//! numbers is approximately a plane wave moving at its phase velocity
//! *v*<sub>p</sub>, and hence approximately satisfies the one-way wave equation
//! ```text
//! ∂Ψ      ∂Ψ
//! -- ± vp -- = 0
//! ∂t      ∂x
//! ```
//! with `+` at the right edge and `-` at the left. Discretizing this at the
//! half-cell between an edge point and its neighbor and at the half step
//! between the values before and after the interior update gives Mur's
//! first-order absorbing boundary condition[^2]
//! ```text
//! Ψ'[0]     = Ψ[1]     + κ (Ψ'[1]     - Ψ[0])
//! Ψ'[N - 1] = Ψ[N - 2] + κ (Ψ'[N - 2] - Ψ[N - 1])
//!
//!     vp δt - δx
//! κ = ----------
//!     vp δt + δx
//! ```
//! where primes denote values after the interior update. Only waves with phase
//! velocity equal to *v*<sub>p</sub> are absorbed exactly, so the boundary is
//! tuned to the central energy of the packet being simulated and partially
//! reflects the rest of its spectrum. In the staggered scheme the condition is
//! applied separately after each of the two passes, to the part that pass just
//! wrote.
//!
//! # Buffer discipline
//! No buffer is ever read and written by the same pass, except for the
//! single-component in-place passes of the staggered scheme, where the
//! component being written is never read. The buffer to be written next is
//! chosen by a rotation index that advances only after all passes of a step
//! have been issued:
//! ```text
//!  Euler       (step % 2)  -> read,  ((step + 1) % 2) -> write
//!  leapfrog    (step % 3)  -> old,   ((step + 1) % 3) -> current,
//!                                    ((step + 2) % 3) -> write
//!  staggered   buffer 0    -> updated in place,
//!              buffer 1    -> copy of buffer 0 from before the latest pass
//! ```
//! The second staggered buffer exists only to supply the pre-update values
//! needed by the absorbing boundary.
//!
//! [^1]: P. B. Visscher, "A fast explicit algorithm for the time-dependent
//! Schrödinger equation." Computers in Physics **5** 596-598 (1991).
//!
//! [^2]: G. Mur, "Absorbing boundary conditions for the finite-difference
//! approximation of the time-domain electromagnetic-field equations." IEEE
//! Transactions on Electromagnetic Compatibility **EMC-23** 4 377-382 (1981).
