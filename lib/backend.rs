//! Compute backends.
//!
//! A [`Backend`] owns everything device-specific: its limits, buffer
//! allocation, and the execution of kernel passes. The
//! [`Integrator`][crate::integrator::Integrator] consults
//! [`Backend::capabilities`] once at construction and afterward only issues
//! [`Pass`]es in order.
//!
//! Consecutive time steps can also be handed over as a single [`Batch`]. A
//! device backend runs a batch as one kernel with a barrier between steps,
//! which is only possible when one workgroup spans the whole grid.
//!
//! [`HostBackend`] runs passes on the CPU, splitting the grid into workgroups
//! executed on a rayon thread pool. Its dispatches complete before returning,
//! so [`Backend::synchronize`] has nothing to wait on.
//!
//! A backend that defers work only has to make [`Backend::synchronize`] wait
//! for it; [`Backend::copy`] is then how a completed buffer is read back.
//! Since stepping borrows the integrator mutably, no read can overlap a
//! submission, so a snapshot is simply synchronize followed by copy.

use rayon::{ ThreadPool, ThreadPoolBuilder };
use tracing::trace;
use crate::{
    buffer::{ BResult, BufferSet, Component, WaveBuffer },
    boundary::MurBoundary,
    error::BackendError,
    grid::GridParameters,
    kernel::{ self, Exec },
    DEF_MIN_PARALLEL,
};

/// Device limits relevant to the integrator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Largest number of grid points in one workgroup.
    pub max_workgroup_size: usize,
    /// Largest number of workgroups in one dispatch.
    pub max_workgroups: usize,
    /// Largest buffer, in complex samples.
    pub max_buffer_len: usize,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            max_workgroup_size: 1024,
            max_workgroups: 65535,
            max_buffer_len: 1 << 28,
        }
    }
}

impl Capabilities {
    /// Check that a grid of `n` points can be dispatched in workgroups of
    /// `workgroup` points.
    pub fn check(&self, n: usize, workgroup: usize) -> BResult<()> {
        BackendError::check_limit("buffer length", n, self.max_buffer_len)?;
        BackendError::check_limit(
            "workgroup size", workgroup, self.max_workgroup_size)?;
        BackendError::check_limit(
            "workgroup count", n.div_ceil(workgroup.max(1)), self.max_workgroups)?;
        Ok(())
    }
}

/// A single kernel invocation together with its buffer bindings.
///
/// Read-only bindings never alias the written one.
#[derive(Debug)]
pub enum Pass<'a> {
    /// Forward-Euler update of `dst` from `src`.
    Euler { src: &'a WaveBuffer, dst: &'a mut WaveBuffer },
    /// Leapfrog update of `next` from `old` and `cur`.
    Leapfrog {
        old: &'a WaveBuffer,
        cur: &'a WaveBuffer,
        next: &'a mut WaveBuffer,
    },
    /// In-place update of the real part of `psi`.
    StaggeredReal { psi: &'a mut WaveBuffer },
    /// In-place update of the imaginary part of `psi`.
    StaggeredImag { psi: &'a mut WaveBuffer },
    /// Absorbing-boundary update of the edge values of `new`, given the
    /// values from before the preceding interior pass in `old`.
    Boundary {
        mur: &'a MurBoundary,
        comp: Component,
        old: &'a WaveBuffer,
        new: &'a mut WaveBuffer,
    },
}

impl Pass<'_> {
    fn name(&self) -> &'static str {
        match self {
            Self::Euler { .. } => "euler",
            Self::Leapfrog { .. } => "leapfrog",
            Self::StaggeredReal { .. } => "staggered-real",
            Self::StaggeredImag { .. } => "staggered-imag",
            Self::Boundary { .. } => "boundary",
        }
    }
}

/// A run of consecutive time steps submitted as one unit.
#[derive(Debug)]
pub struct Batch<'a> {
    /// Buffers being stepped.
    pub bufs: &'a mut BufferSet,
    /// Absorbing boundary, if any.
    pub boundary: Option<&'a MurBoundary>,
    /// Steps completed before the first step of the batch.
    pub first_step: usize,
    /// Number of steps in the batch.
    pub iterations: usize,
}

/// Issue every pass of the time step following `step` completed steps.
///
/// Each interior pass writes a buffer that is not among its inputs and is
/// followed by the boundary pass on that buffer. The staggered scheme does
/// this twice, with a barrier in between.
pub fn issue_step<B>(
    backend: &mut B,
    grid: &GridParameters,
    workgroup: usize,
    boundary: Option<&MurBoundary>,
    bufs: &mut BufferSet,
    step: usize,
)
where B: Backend + ?Sized
{
    match bufs {
        BufferSet::PingPong(pair) => {
            let [a, b] = pair;
            let (src, dst)
                = if step % 2 == 0 { (&*a, b) } else { (&*b, a) };
            backend.dispatch(grid, workgroup, Pass::Euler { src, dst: &mut *dst });
            if let Some(mur) = boundary {
                let pass = Pass::Boundary { mur, comp: Component::Both, old: src, new: dst };
                backend.dispatch(grid, 2, pass);
            }
        },
        BufferSet::Triple(trio) => {
            let [a, b, c] = trio;
            let (old, cur, next)
                = match step % 3 {
                    0 => (&*a, &*b, c),
                    1 => (&*b, &*c, a),
                    _ => (&*c, &*a, b),
                };
            backend.dispatch(grid, workgroup, Pass::Leapfrog { old, cur, next: &mut *next });
            if let Some(mur) = boundary {
                let pass = Pass::Boundary { mur, comp: Component::Both, old: cur, new: next };
                backend.dispatch(grid, 2, pass);
            }
        },
        BufferSet::Staggered { psi, old } => {
            backend.copy(psi, old);
            backend.dispatch(grid, workgroup, Pass::StaggeredReal { psi: &mut *psi });
            if let Some(mur) = boundary {
                let pass = Pass::Boundary {
                    mur,
                    comp: Component::Real,
                    old: &*old,
                    new: &mut *psi,
                };
                backend.dispatch(grid, 2, pass);
            }
            // every real value must be final before any imaginary value is
            // computed from it
            backend.synchronize();
            backend.copy(psi, old);
            backend.dispatch(grid, workgroup, Pass::StaggeredImag { psi: &mut *psi });
            if let Some(mur) = boundary {
                let pass = Pass::Boundary {
                    mur,
                    comp: Component::Imag,
                    old: &*old,
                    new: &mut *psi,
                };
                backend.dispatch(grid, 2, pass);
            }
        },
    }
}

/// Issue the passes of every step in `batch`, one step after another.
pub fn run_batch<B>(backend: &mut B, grid: &GridParameters, workgroup: usize, batch: Batch<'_>)
where B: Backend + ?Sized
{
    let Batch { bufs, boundary, first_step, iterations } = batch;
    for step in first_step..first_step + iterations {
        issue_step(backend, grid, workgroup, boundary, bufs, step);
    }
}

/// Interface to a device able to run FDTD passes.
pub trait Backend {
    /// Device limits.
    fn capabilities(&self) -> &Capabilities;

    /// Allocate a zeroed buffer of `n` samples.
    fn allocate(&mut self, n: usize) -> BResult<WaveBuffer> {
        BackendError::check_limit(
            "buffer length", n, self.capabilities().max_buffer_len)?;
        WaveBuffer::try_zeros(n)
    }

    /// Execute `pass` over the grid in workgroups of `workgroup` points.
    ///
    /// Passes take effect in submission order.
    fn dispatch(&mut self, grid: &GridParameters, workgroup: usize, pass: Pass<'_>);

    /// Execute all `batch.iterations` steps of `batch` as one submission.
    ///
    /// The default issues each step's passes through [`Self::dispatch`]. A
    /// backend overrides this to run the batch as one unit, e.g. a single
    /// kernel looping over steps with a workgroup barrier between them.
    fn dispatch_batch(&mut self, grid: &GridParameters, workgroup: usize, batch: Batch<'_>) {
        run_batch(self, grid, workgroup, batch);
    }

    /// Copy the contents of `src` into `dst`.
    ///
    /// On a deferred backend this is also how results are read back, so it
    /// must observe all work submitted before it.
    fn copy(&mut self, src: &WaveBuffer, dst: &mut WaveBuffer) {
        dst.assign(src);
    }

    /// Block until all submitted work has completed.
    ///
    /// A backend that queues dispatches must wait here for the queue to
    /// drain; afterward every buffer may be read.
    fn synchronize(&mut self) { }
}

/// CPU backend backed by rayon.
#[derive(Debug)]
pub struct HostBackend {
    caps: Capabilities,
    pool: Option<ThreadPool>,
    min_parallel: usize,
}

impl Default for HostBackend {
    fn default() -> Self { Self::new() }
}

impl HostBackend {
    /// Create a new host backend running on rayon's global thread pool.
    pub fn new() -> Self {
        Self {
            caps: Capabilities::default(),
            pool: None,
            min_parallel: DEF_MIN_PARALLEL,
        }
    }

    /// Create a new host backend with its own pool of `threads` threads.
    pub fn with_threads(threads: usize) -> BResult<Self> {
        let pool
            = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|k| format!("fdspace-host-{k}"))
            .build()
            .map_err(|e| BackendError::Device(e.to_string()))?;
        Ok(Self { pool: Some(pool), ..Self::new() })
    }

    /// Report different device limits, e.g. to mimic a smaller device.
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Step grids with fewer than `min_parallel` points on the calling thread.
    pub fn with_min_parallel(mut self, min_parallel: usize) -> Self {
        self.min_parallel = min_parallel;
        self
    }

    fn run(grid: &GridParameters, exec: Exec, pass: Pass<'_>) {
        match pass {
            Pass::Euler { src, dst }
                => kernel::euler(grid, src, dst, exec),
            Pass::Leapfrog { old, cur, next }
                => kernel::leapfrog(grid, old, cur, next, exec),
            Pass::StaggeredReal { psi }
                => kernel::staggered_real(grid, psi, exec),
            Pass::StaggeredImag { psi }
                => kernel::staggered_imag(grid, psi, exec),
            Pass::Boundary { mur, comp, old, new }
                => mur.apply(grid.dt(), grid.dx(), comp, old, new),
        }
    }
}

impl Backend for HostBackend {
    fn capabilities(&self) -> &Capabilities { &self.caps }

    fn dispatch(&mut self, grid: &GridParameters, workgroup: usize, pass: Pass<'_>) {
        let n = grid.n();
        let exec = Exec {
            workgroup,
            parallel: n >= self.min_parallel && workgroup < n,
        };
        trace!(pass = pass.name(), workgroups = n.div_ceil(workgroup.max(1)), "dispatch");
        match &self.pool {
            Some(pool) => pool.install(|| Self::run(grid, exec, pass)),
            None => Self::run(grid, exec, pass),
        }
    }

    fn dispatch_batch(&mut self, grid: &GridParameters, workgroup: usize, batch: Batch<'_>) {
        trace!(first = batch.first_step, steps = batch.iterations, "batch");
        // enter the pool once for the whole batch; passes inside it run on
        // the pool directly
        match self.pool.take() {
            Some(pool) => {
                pool.install(|| run_batch(self, grid, workgroup, batch));
                self.pool = Some(pool);
            },
            None => run_batch(self, grid, workgroup, batch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_checks() {
        let caps = Capabilities {
            max_workgroup_size: 64,
            max_workgroups: 4,
            max_buffer_len: 1000,
        };
        assert!(caps.check(256, 64).is_ok());
        assert_eq!(
            caps.check(257, 64),
            Err(BackendError::Unsupported {
                what: "workgroup count",
                requested: 5,
                limit: 4,
            }),
        );
        assert!(matches!(
            caps.check(100, 128),
            Err(BackendError::Unsupported { what: "workgroup size", .. }),
        ));
        assert!(matches!(
            caps.check(1001, 64),
            Err(BackendError::Unsupported { what: "buffer length", .. }),
        ));
    }

    #[test]
    fn allocation_respects_limits() {
        let mut host = HostBackend::new()
            .with_capabilities(Capabilities { max_buffer_len: 8, ..Default::default() });
        assert_eq!(host.allocate(8).unwrap().len(), 8);
        assert!(host.allocate(9).is_err());
    }

    #[test]
    fn pools_give_identical_results() {
        let grid = GridParameters::free(1e-4, 64, 1.0).unwrap();
        let src = WaveBuffer {
            re: (0..64).map(|i| (i as f64 * 0.1).sin()).collect(),
            im: (0..64).map(|i| (i as f64 * 0.1).cos()).collect(),
        };
        let mut seq = HostBackend::new();
        let mut par = HostBackend::with_threads(3).unwrap().with_min_parallel(0);
        let mut a = WaveBuffer::try_zeros(64).unwrap();
        let mut b = WaveBuffer::try_zeros(64).unwrap();
        seq.dispatch(&grid, 8, Pass::Euler { src: &src, dst: &mut a });
        par.dispatch(&grid, 8, Pass::Euler { src: &src, dst: &mut b });
        par.synchronize();
        assert_eq!(a, b);
        let mut c = WaveBuffer::try_zeros(64).unwrap();
        par.copy(&b, &mut c);
        assert_eq!(b, c);
    }

    #[test]
    fn batches_match_single_steps() {
        let grid = GridParameters::free(1e-4, 64, 1.0).unwrap();
        let seed = WaveBuffer {
            re: (0..64).map(|i| (i as f64 * 0.1).sin()).collect(),
            im: (0..64).map(|i| (i as f64 * 0.1).cos()).collect(),
        };
        let fresh = || BufferSet::Staggered { psi: seed.clone(), old: seed.clone() };
        let mur = MurBoundary::from_energy(2.0).unwrap();

        let mut single = HostBackend::new();
        let mut stepped = fresh();
        (0..10).for_each(|k| issue_step(&mut single, &grid, 64, Some(&mur), &mut stepped, k));

        let mut pooled = HostBackend::with_threads(2).unwrap();
        let mut batched = fresh();
        let batch = Batch {
            bufs: &mut batched,
            boundary: Some(&mur),
            first_step: 0,
            iterations: 10,
        };
        pooled.dispatch_batch(&grid, 64, batch);
        assert!(pooled.pool.is_some());
        assert_eq!(batched, stepped);
    }
}
