//! Wavefunction storage.
//!
//! A [`WaveBuffer`] holds Ψ at one instant as two separate arrays of real and
//! imaginary parts. Keeping the components apart lets the staggered scheme
//! overwrite one component in place while every grid point reads the other.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    Arr1,
    error::BackendError,
};

pub type BResult<T> = Result<T, BackendError>;

/// Selects one or both components of a [`WaveBuffer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    /// Real part only.
    Real,
    /// Imaginary part only.
    Imag,
    /// Both parts.
    Both,
}

/// Ψ sampled at every grid point at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveBuffer {
    pub(crate) re: Vec<f64>,
    pub(crate) im: Vec<f64>,
}

fn try_zeroed(n: usize) -> BResult<Vec<f64>> {
    let mut v: Vec<f64> = Vec::new();
    v.try_reserve_exact(n).map_err(|_| BackendError::Allocation(n))?;
    v.resize(n, 0.0);
    Ok(v)
}

impl WaveBuffer {
    /// Allocate a zeroed buffer of `n` samples, reporting allocation failure
    /// instead of aborting.
    pub fn try_zeros(n: usize) -> BResult<Self> {
        Ok(Self { re: try_zeroed(n)?, im: try_zeroed(n)? })
    }

    /// Build from separate real and imaginary arrays.
    pub fn from_parts<S, T>(re: &Arr1<S>, im: &Arr1<T>) -> BResult<Self>
    where
        S: nd::Data<Elem = f64>,
        T: nd::Data<Elem = f64>,
    {
        (re.len() == im.len()).then_some(())
            .ok_or(BackendError::Length(re.len(), im.len()))?;
        Ok(Self {
            re: re.iter().copied().collect(),
            im: im.iter().copied().collect(),
        })
    }

    /// Build from complex samples.
    pub fn from_complex<S>(psi: &Arr1<S>) -> Self
    where S: nd::Data<Elem = C64>
    {
        Self {
            re: psi.iter().map(|z| z.re).collect(),
            im: psi.iter().map(|z| z.im).collect(),
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize { self.re.len() }

    /// `true` if the buffer holds no samples.
    pub fn is_empty(&self) -> bool { self.re.is_empty() }

    /// Real parts.
    pub fn re(&self) -> nd::ArrayView1<'_, f64> { nd::aview1(&self.re) }

    /// Imaginary parts.
    pub fn im(&self) -> nd::ArrayView1<'_, f64> { nd::aview1(&self.im) }

    /// The `i`-th sample.
    ///
    /// *Panics if `i` is out of bounds*.
    pub fn get(&self, i: usize) -> C64 { C64::new(self.re[i], self.im[i]) }

    /// Collect into complex samples.
    pub fn to_complex(&self) -> nd::Array1<C64> {
        self.re.iter().zip(&self.im)
            .map(|(re, im)| C64::new(*re, *im))
            .collect()
    }

    /// |Ψ|² at every grid point.
    pub fn density(&self) -> nd::Array1<f64> {
        self.re.iter().zip(&self.im)
            .map(|(re, im)| re * re + im * im)
            .collect()
    }

    /// Overwrite `self` with the contents of `other`.
    ///
    /// *Panics if the buffers differ in length*.
    pub fn assign(&mut self, other: &Self) {
        self.re.copy_from_slice(&other.re);
        self.im.copy_from_slice(&other.im);
    }

    /// Overwrite a single component of `self` with that of `other`.
    ///
    /// *Panics if the buffers differ in length*.
    pub fn assign_component(&mut self, other: &Self, comp: Component) {
        match comp {
            Component::Real => self.re.copy_from_slice(&other.re),
            Component::Imag => self.im.copy_from_slice(&other.im),
            Component::Both => self.assign(other),
        }
    }

    /// `true` if every sample is finite.
    pub fn is_finite(&self) -> bool {
        self.re.iter().chain(&self.im).all(|x| x.is_finite())
    }
}

/// Physical buffers of an integrator, laid out per scheme.
#[derive(Clone, Debug, PartialEq)]
pub enum BufferSet {
    /// Forward Euler: Ψ(t) is `[step % 2]`, the other is written next.
    PingPong([WaveBuffer; 2]),
    /// Leapfrog: Ψ(t - dt) is `[step % 3]`, Ψ(t) is `[(step + 1) % 3]`, and
    /// the third is written next.
    Triple([WaveBuffer; 3]),
    /// Staggered: `psi` is updated in place and `old` holds its contents from
    /// before the latest pass.
    Staggered { psi: WaveBuffer, old: WaveBuffer },
}

impl BufferSet {
    /// Index of the buffer holding the most recently completed state after
    /// `step` steps.
    pub fn latest_index(&self, step: usize) -> usize {
        match self {
            Self::PingPong(_) => step % 2,
            Self::Triple(_) => (step + 1) % 3,
            Self::Staggered { .. } => 0,
        }
    }

    /// Index of the buffer written by step `step + 1`.
    pub fn write_index(&self, step: usize) -> usize {
        match self {
            Self::PingPong(_) => (step + 1) % 2,
            Self::Triple(_) => (step + 2) % 3,
            Self::Staggered { .. } => 0,
        }
    }

    /// Physical buffer `idx`, if it exists.
    pub fn get(&self, idx: usize) -> Option<&WaveBuffer> {
        match self {
            Self::PingPong(pair) => pair.get(idx),
            Self::Triple(trio) => trio.get(idx),
            Self::Staggered { psi, old } => match idx {
                0 => Some(psi),
                1 => Some(old),
                _ => None,
            },
        }
    }

    /// The most recently completed state after `step` steps.
    pub fn latest(&self, step: usize) -> &WaveBuffer {
        match self {
            Self::PingPong(pair) => &pair[step % 2],
            Self::Triple(trio) => &trio[(step + 1) % 3],
            Self::Staggered { psi, .. } => psi,
        }
    }
}

/// An independent copy of an integrator's most recently completed buffer.
///
/// In the staggered scheme the two components of Ψ live at different times,
/// so each carries its own timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Copied wavefunction.
    pub psi: WaveBuffer,
    /// Simulated time of the real part.
    pub t_re: f64,
    /// Simulated time of the imaginary part.
    pub t_im: f64,
    /// Number of completed steps when the copy was taken.
    pub step: usize,
}

impl Snapshot {
    /// Simulated time of the snapshot, taken as that of the real part.
    pub fn time(&self) -> f64 { self.t_re }
}
