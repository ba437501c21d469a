//! Time evolution driver.
//!
//! An [`Integrator`] owns every wavefunction buffer for the lifetime of a run
//! and advances them by issuing kernel [`Pass`][crate::backend::Pass]es to a
//! [`Backend`]. Each time
//! step
//! 1. dispatches the scheme's stencil over the whole grid, reading from source
//!    buffer(s) and writing to a buffer that is never among them;
//! 2. if absorbing boundaries are enabled, dispatches the boundary update on
//!    the just-written buffer;
//! 3. advances the rotation index, so that the buffer just written becomes the
//!    most recently completed one.
//!
//! The staggered scheme repeats 1 and 2 twice per step (real part, then
//! imaginary part) with a full barrier in between.
//!
//! Buffers are allocated once at construction and only ever overwritten
//! afterward. Since stepping borrows the integrator mutably, nothing can read
//! a buffer while a step is being written to it.

use std::sync::{
    Arc,
    atomic::{ AtomicBool, Ordering },
};
#[cfg(feature = "serde")]
use serde::{ Deserialize, Serialize };
use tracing::{ debug, trace, warn };
use crate::{
    backend::{ self, Backend, Batch, HostBackend },
    boundary::MurBoundary,
    buffer::{ BufferSet, Snapshot, WaveBuffer },
    error::{ ConfigError, FdError },
    grid::GridParameters,
    kernel::Scheme,
    packet::WavePacket,
    DEF_WORKGROUP,
};

pub type FResult<T> = Result<T, FdError>;

/// How steps are grouped into dispatches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DispatchMode {
    /// One dispatch per pass; a stop request is honored before any step.
    #[default]
    PerStep,
    /// Submit up to `iterations` steps at a time as one [`Batch`], run over
    /// one workgroup spanning the whole grid.
    ///
    /// A stop request is only honored between batches. Requires the grid to
    /// fit in a single workgroup.
    Fused { iterations: usize },
}

/// Integrator settings besides the grid itself.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntegratorConfig {
    /// Time-stepping scheme.
    pub scheme: Scheme,
    /// Absorbing boundary, or `None` for the clamped (reflecting) edges.
    pub boundary: Option<MurBoundary>,
    /// Batching of steps into dispatches.
    pub dispatch: DispatchMode,
    /// Grid points per workgroup in per-step mode.
    pub workgroup_size: usize,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            boundary: None,
            dispatch: DispatchMode::default(),
            workgroup_size: DEF_WORKGROUP,
        }
    }
}

impl IntegratorConfig {
    /// Default settings for `scheme`.
    pub fn new(scheme: Scheme) -> Self { Self { scheme, ..Self::default() } }

    /// Enable absorbing boundaries.
    pub fn with_boundary(mut self, mur: MurBoundary) -> Self {
        self.boundary = Some(mur);
        self
    }

    /// Set the dispatch mode.
    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Set the number of grid points per workgroup.
    pub fn with_workgroup_size(mut self, workgroup_size: usize) -> Self {
        self.workgroup_size = workgroup_size;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_workgroup(self.workgroup_size)?;
        if let DispatchMode::Fused { iterations } = self.dispatch {
            ConfigError::check_iterations(iterations)?;
        }
        Ok(())
    }

    // a fused dispatch synchronizes within a single workgroup, so that
    // workgroup has to cover the whole grid
    fn workgroup(&self, n: usize) -> usize {
        match self.dispatch {
            DispatchMode::PerStep => self.workgroup_size,
            DispatchMode::Fused { .. } => n,
        }
    }

    fn batch(&self) -> usize {
        match self.dispatch {
            DispatchMode::PerStep => 1,
            DispatchMode::Fused { iterations } => iterations,
        }
    }
}

/// Shareable handle used to stop an [`Integrator`] from another thread.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request that the integrator stop before its next step (or batch).
    pub fn stop(&self) { self.0.store(false, Ordering::Release); }

    /// `true` if no stop has been requested since the last resume.
    pub fn is_running(&self) -> bool { self.0.load(Ordering::Acquire) }
}

/// FDTD integrator for a fixed grid and scheme.
pub struct Integrator<B = HostBackend>
where B: Backend
{
    grid: GridParameters,
    config: IntegratorConfig,
    backend: B,
    bufs: BufferSet,
    workgroup: usize,
    step: usize,
    running: Arc<AtomicBool>,
}

impl Integrator<HostBackend> {
    /// Create a new integrator on the default [`HostBackend`], seeded with
    /// `packet`.
    ///
    /// Fails if the configuration is invalid, exceeds the backend's
    /// capabilities, or the buffers cannot be allocated.
    pub fn new(
        grid: GridParameters,
        packet: &WavePacket,
        config: IntegratorConfig,
    ) -> FResult<Self>
    {
        Self::with_backend(HostBackend::new(), grid, packet, config)
    }
}

impl<B> Integrator<B>
where B: Backend
{
    /// Create a new integrator on a specific backend, seeded with `packet`.
    ///
    /// Fails if the configuration is invalid, exceeds the backend's
    /// capabilities, or the buffers cannot be allocated.
    pub fn with_backend(
        mut backend: B,
        grid: GridParameters,
        packet: &WavePacket,
        config: IntegratorConfig,
    ) -> FResult<Self>
    {
        config.validate()?;
        let n = grid.n();
        let workgroup = config.workgroup(n);
        backend.capabilities().check(n, workgroup)?;

        match grid.stability_limit(config.scheme) {
            Some(limit) if grid.dt() > limit => {
                warn!(
                    dt = grid.dt(),
                    limit,
                    scheme = ?config.scheme,
                    "time step exceeds the stability limit; expect divergence",
                );
            },
            None => {
                debug!(scheme = ?config.scheme, "scheme has no stable time step");
            },
            _ => { },
        }

        let bufs = match config.scheme {
            Scheme::Euler => BufferSet::PingPong([
                backend.allocate(n)?,
                backend.allocate(n)?,
            ]),
            Scheme::Leapfrog => BufferSet::Triple([
                backend.allocate(n)?,
                backend.allocate(n)?,
                backend.allocate(n)?,
            ]),
            Scheme::Staggered => BufferSet::Staggered {
                psi: backend.allocate(n)?,
                old: backend.allocate(n)?,
            },
        };

        let mut integ = Self {
            grid,
            config,
            backend,
            bufs,
            workgroup,
            step: 0,
            running: Arc::new(AtomicBool::new(true)),
        };
        integ.seed(packet);
        debug!(
            n,
            dt = integ.grid.dt(),
            dx = integ.grid.dx(),
            scheme = ?integ.config.scheme,
            absorbing = integ.config.boundary.is_some(),
            "integrator ready",
        );
        Ok(integ)
    }

    // fill the buffers holding the initial time levels
    fn seed(&mut self, packet: &WavePacket) {
        let grid = &self.grid;
        let dt = grid.dt();
        match &mut self.bufs {
            BufferSet::PingPong([a, _]) => {
                packet.fill(grid, 0.0, 0.0, a);
            },
            BufferSet::Triple([a, b, _]) => {
                packet.fill(grid, 0.0, 0.0, a);
                packet.fill(grid, dt, dt, b);
            },
            BufferSet::Staggered { psi, old } => {
                packet.fill(grid, 0.0, 0.5 * dt, psi);
                self.backend.copy(psi, old);
            },
        }
        self.step = 0;
    }

    /// Overwrite the current state with `packet` and reset the clock.
    ///
    /// Reuses the existing buffers.
    pub fn reseed(&mut self, packet: &WavePacket) {
        self.backend.synchronize();
        self.seed(packet);
        debug!("integrator reseeded");
    }

    /// Advance by up to `count` time steps, returning the number actually
    /// taken.
    ///
    /// Fewer than `count` steps are taken only if a stop is requested (see
    /// [`Self::stop`] and [`StopHandle`]); the request is checked before each
    /// step, or before each batch in [`DispatchMode::Fused`]. Every step is
    /// either taken in full or not at all.
    pub fn step(&mut self, count: usize) -> usize {
        let batch = self.config.batch();
        let mut done: usize = 0;
        while done < count {
            if !self.running.load(Ordering::Acquire) {
                debug!(done, count, "stop requested; halting");
                break;
            }
            let k = batch.min(count - done);
            match self.config.dispatch {
                DispatchMode::PerStep => {
                    backend::issue_step(
                        &mut self.backend,
                        &self.grid,
                        self.workgroup,
                        self.config.boundary.as_ref(),
                        &mut self.bufs,
                        self.step,
                    );
                },
                DispatchMode::Fused { .. } => {
                    let run = Batch {
                        bufs: &mut self.bufs,
                        boundary: self.config.boundary.as_ref(),
                        first_step: self.step,
                        iterations: k,
                    };
                    self.backend.dispatch_batch(&self.grid, self.workgroup, run);
                },
            }
            self.step += k;
            done += k;
            trace!(done, count, "batch queued");
        }
        self.backend.synchronize();
        done
    }

    /// Request that any in-progress or future call to [`Self::step`] halt
    /// before its next step.
    pub fn stop(&self) { self.running.store(false, Ordering::Release); }

    /// Allow stepping again after a stop.
    pub fn resume(&self) { self.running.store(true, Ordering::Release); }

    /// `true` if no stop has been requested since the last resume.
    pub fn is_running(&self) -> bool { self.running.load(Ordering::Acquire) }

    /// Get a handle that can stop this integrator from another thread.
    pub fn stop_handle(&self) -> StopHandle { StopHandle(Arc::clone(&self.running)) }

    /// Index of the buffer holding the most recently completed state.
    pub fn latest_index(&self) -> usize { self.bufs.latest_index(self.step) }

    /// Index of the buffer the next step writes to.
    ///
    /// The staggered scheme updates its state in place, so there this is the
    /// same as [`Self::latest_index`].
    pub fn write_index(&self) -> usize { self.bufs.write_index(self.step) }

    /// Physical buffer `idx`, if it exists.
    pub fn buffer(&self, idx: usize) -> Option<&WaveBuffer> { self.bufs.get(idx) }

    /// The most recently completed state.
    pub fn latest(&self) -> &WaveBuffer { self.bufs.latest(self.step) }

    /// Copy the most recently completed state after waiting for all
    /// submitted work.
    ///
    /// On a backend that defers its dispatches, [`Backend::synchronize`]
    /// drains the queue first, so the copy never sees a partial step. Taking
    /// `&mut self` keeps any further step from being submitted meanwhile.
    pub fn snapshot(&mut self) -> Snapshot {
        self.backend.synchronize();
        let (t_re, t_im) = self.times();
        Snapshot {
            psi: self.latest().clone(),
            t_re,
            t_im,
            step: self.step,
        }
    }

    /// Simulated times of the real and imaginary parts of
    /// [`Self::latest`].
    pub fn times(&self) -> (f64, f64) {
        let dt = self.grid.dt();
        let k = self.step as f64;
        match self.config.scheme {
            Scheme::Euler => (k * dt, k * dt),
            Scheme::Leapfrog => ((k + 1.0) * dt, (k + 1.0) * dt),
            Scheme::Staggered => (k * dt, (k + 0.5) * dt),
        }
    }

    /// Simulated time of [`Self::latest`], taken as that of its real part.
    pub fn time(&self) -> f64 { self.times().0 }

    /// Number of steps taken since construction or the last reseed.
    pub fn steps_taken(&self) -> usize { self.step }

    /// Grid parameters.
    pub fn grid(&self) -> &GridParameters { &self.grid }

    /// Settings.
    pub fn config(&self) -> &IntegratorConfig { &self.config }

    /// Time-stepping scheme.
    pub fn scheme(&self) -> Scheme { self.config.scheme }

    /// Grid points per workgroup actually dispatched.
    pub fn workgroup(&self) -> usize { self.workgroup }

    /// Compute backend.
    pub fn backend(&self) -> &B { &self.backend }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ backend::Capabilities, error::BackendError };

    fn setup(scheme: Scheme) -> Integrator {
        let grid = GridParameters::free(1e-3, 64, 8.0).unwrap();
        let packet = WavePacket::new(4.0, 1.0, 1.0).unwrap();
        Integrator::new(grid, &packet, IntegratorConfig::new(scheme)).unwrap()
    }

    #[test]
    fn seeds_follow_scheme() {
        let integ = setup(Scheme::Leapfrog);
        let packet = WavePacket::new(4.0, 1.0, 1.0).unwrap();
        let grid = integ.grid().clone();
        assert_eq!(integ.buffer(0).unwrap(), &packet.evaluate(&grid, 0.0));
        assert_eq!(integ.latest(), &packet.evaluate(&grid, grid.dt()));
        assert_eq!(integ.time(), grid.dt());

        let integ = setup(Scheme::Staggered);
        assert_eq!(integ.latest(), &packet.evaluate_staggered(&grid, 0.0, grid.dt() / 2.0));
        assert_eq!(integ.times(), (0.0, grid.dt() / 2.0));

        let integ = setup(Scheme::Euler);
        assert_eq!(integ.latest(), &packet.evaluate(&grid, 0.0));
        assert_eq!(integ.time(), 0.0);
    }

    #[test]
    fn ping_pong_rotation() {
        let mut integ = setup(Scheme::Euler);
        for k in 1..=5 {
            assert_eq!(integ.step(1), 1);
            assert_eq!(integ.latest_index(), k % 2);
            assert_ne!(integ.write_index(), integ.latest_index());
            assert!(std::ptr::eq(integ.latest(), integ.buffer(k % 2).unwrap()));
        }
        assert_eq!(integ.steps_taken(), 5);
    }

    #[test]
    fn triple_rotation_never_writes_its_inputs() {
        let mut integ = setup(Scheme::Leapfrog);
        for _ in 0..7 {
            let latest = integ.latest_index();
            let write = integ.write_index();
            assert_ne!(latest, write);
            integ.step(1);
            assert_eq!(integ.latest_index(), write);
        }
    }

    #[test]
    fn stop_and_resume() {
        let mut integ = setup(Scheme::Staggered);
        let handle = integ.stop_handle();
        assert!(handle.is_running());
        handle.stop();
        assert!(!integ.is_running());
        assert_eq!(integ.step(10), 0);
        integ.resume();
        assert_eq!(integ.step(10), 10);
        integ.stop();
        assert_eq!(integ.step(10), 0);
        assert_eq!(integ.steps_taken(), 10);
    }

    #[test]
    fn reseed_resets_clock() {
        let mut integ = setup(Scheme::Leapfrog);
        integ.step(5);
        let packet = WavePacket::new(3.0, 0.5, -1.0).unwrap();
        integ.reseed(&packet);
        assert_eq!(integ.steps_taken(), 0);
        let grid = integ.grid().clone();
        assert_eq!(integ.latest(), &packet.evaluate(&grid, grid.dt()));
    }

    #[test]
    fn fused_mode_needs_one_workgroup() {
        let grid = GridParameters::free(1e-3, 2048, 8.0).unwrap();
        let packet = WavePacket::new(4.0, 1.0, 1.0).unwrap();
        let config
            = IntegratorConfig::new(Scheme::Leapfrog)
            .with_dispatch(DispatchMode::Fused { iterations: 16 });
        let err = Integrator::new(grid.clone(), &packet, config).err();
        assert_eq!(
            err,
            Some(FdError::Backend(BackendError::Unsupported {
                what: "workgroup size",
                requested: 2048,
                limit: 1024,
            })),
        );
        let config = IntegratorConfig::new(Scheme::Leapfrog);
        assert!(Integrator::new(grid, &packet, config).is_ok());
    }

    #[test]
    fn invalid_settings_are_rejected_up_front() {
        let grid = GridParameters::free(1e-3, 64, 8.0).unwrap();
        let packet = WavePacket::new(4.0, 1.0, 1.0).unwrap();
        let config = IntegratorConfig::default().with_workgroup_size(0);
        assert_eq!(
            Integrator::new(grid.clone(), &packet, config).err(),
            Some(FdError::Config(ConfigError::BadWorkgroup(0))),
        );
        let config
            = IntegratorConfig::default()
            .with_dispatch(DispatchMode::Fused { iterations: 0 });
        assert_eq!(
            Integrator::new(grid.clone(), &packet, config).err(),
            Some(FdError::Config(ConfigError::BadIterations(0))),
        );
        let small = HostBackend::new()
            .with_capabilities(Capabilities { max_workgroups: 1, ..Default::default() });
        let config = IntegratorConfig::default().with_workgroup_size(16);
        let res = Integrator::with_backend(small, grid, &packet, config);
        assert!(matches!(
            res.err(),
            Some(FdError::Backend(BackendError::Unsupported { what: "workgroup count", .. })),
        ));
    }

    #[test]
    fn snapshot_is_an_independent_copy() {
        let mut integ = setup(Scheme::Euler);
        integ.step(3);
        let snap = integ.snapshot();
        assert_eq!(snap.step, 3);
        assert_eq!(&snap.psi, integ.latest());
        integ.step(1);
        assert_ne!(&snap.psi, integ.latest());
        assert!((snap.time() - 3e-3).abs() < 1e-15);
    }
}
