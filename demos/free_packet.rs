use fdspace::{
    boundary::MurBoundary,
    diagnostics,
    grid::GridParameters,
    integrator::{ Integrator, IntegratorConfig },
    kernel::Scheme,
    packet::WavePacket,
};

// evolve a free Gaussian packet with each scheme, tracking its norm and its
// distance from the exact solution, then let it run out through an absorbing
// edge

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    const L: f64 = 40.0; // domain length
    const N: usize = 401; // grid points
    const FRAMES: usize = 8;
    const T_FRAME: f64 = 0.5;

    let dx = L / (N - 1) as f64;
    let packet = WavePacket::new(L / 2.0, 2.0, 2.0)?;

    for (scheme, ratio) in [
        (Scheme::Euler, 0.02),
        (Scheme::Leapfrog, 0.2),
        (Scheme::Staggered, 0.4),
    ] {
        // ratio = dt / dx²
        let grid = GridParameters::free(ratio * dx * dx, N, L)?;
        let steps = (T_FRAME / grid.dt()).round() as usize;
        let mut integ = Integrator::new(grid, &packet, IntegratorConfig::new(scheme))?;
        println!("{scheme:?}: dt = {:.3e}, {steps} steps per frame", integ.grid().dt());
        println!("{:>8}  {:>12}  {:>12}  {:>8}", "t", "norm - 1", "max error", "<x>");
        for _ in 0..FRAMES {
            integ.step(steps);
            let snap = integ.snapshot();
            println!(
                "{:8.3}  {:12.3e}  {:12.3e}  {:8.3}",
                snap.time(),
                diagnostics::norm(&snap.psi, dx) - 1.0,
                diagnostics::oracle_error(&integ, &packet),
                diagnostics::mean_position(&snap.psi, integ.grid()),
            );
        }
        println!();
    }

    // fast packet through a Mur boundary
    let fast = WavePacket::new(L / 2.0, 4.0, 5.0)?;
    let grid = GridParameters::free(0.4 * dx * dx, N, L)?;
    let steps = (T_FRAME / grid.dt()).round() as usize;
    let config
        = IntegratorConfig::new(Scheme::Staggered)
        .with_boundary(MurBoundary::for_packet(&fast)?);
    let mut integ = Integrator::new(grid, &fast, config)?;
    println!("absorbing edges: vp = {:.3}", fast.phase_velocity());
    println!("{:>8}  {:>12}  {:>12}", "t", "norm", "right half");
    for _ in 0..2 * FRAMES {
        integ.step(steps);
        let psi = integ.latest();
        println!(
            "{:8.3}  {:12.3e}  {:12.3e}",
            integ.time(),
            diagnostics::norm(psi, dx),
            diagnostics::probability_in(psi, dx, N / 2..N),
        );
    }
    Ok(())
}
