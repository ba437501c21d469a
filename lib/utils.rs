//! Miscellaneous tools.

use std::f64::consts::TAU;
use ndarray::{ self as nd, Ix1, concatenate };
use num_complex::Complex64 as C64;
use num_traits::{ Float, NumCast };
use rustfft as fft;

/// Integrate using the trapezoidal rule.
///
/// *Panics if `y` has length less than 2*.
pub fn trapz<S, A>(y: &nd::ArrayBase<S, Ix1>, dx: A) -> A
where
    S: nd::Data<Elem = A>,
    A: Float,
{
    let n: usize = y.len();
    let two = A::one() + A::one();
    (dx / two) * (y[0] + two * y.slice(nd::s![1..n - 1]).sum() + y[n - 1])
}

/// Integrate using the composite Simpson's rule.
///
/// For an even number of intervals this is the usual 1-4-2-4-...-4-1 rule.
/// Otherwise the last three intervals are handled by Simpson's 3/8 rule.
/// Two points fall back to the trapezoidal rule.
///
/// *Panics if `y` has length less than 2*.
pub fn simpson<S, A>(y: &nd::ArrayBase<S, Ix1>, dx: A) -> A
where
    S: nd::Data<Elem = A>,
    A: Float,
{
    let n: usize = y.len();
    if n == 2 { return trapz(y, dx); }
    let c = |x: f64| <A as NumCast>::from(x).unwrap_or_else(A::nan);
    let (m, tail)
        = if (n - 1) % 2 == 0 {
            (n, A::zero())
        } else {
            let j = n - 4;
            let tail
                = c(3.0) * dx / c(8.0)
                * (y[j] + c(3.0) * y[j + 1] + c(3.0) * y[j + 2] + y[j + 3]);
            (n - 3, tail)
        };
    if m < 3 { return tail; }
    let inner
        = y.iter().enumerate().take(m - 1).skip(1)
        .fold(A::zero(), |acc, (k, yk)| {
            acc + if k % 2 == 1 { c(4.0) * *yk } else { c(2.0) * *yk }
        });
    (y[0] + inner + y[m - 1]) * dx / c(3.0) + tail
}

/// Calculate the inner product ⟨q|p⟩ of two wavefunctions using the
/// trapezoidal rule.
///
/// *Panics if either array has length less than 2*.
pub fn wf_dot<S, T>(
    q: &nd::ArrayBase<S, Ix1>,
    p: &nd::ArrayBase<T, Ix1>,
    dx: f64,
) -> C64
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    let n: usize = q.len().min(p.len());
    (dx / 2.0) * (
        q[0].conj() * p[0]
        + 2.0 * q.iter().zip(p).skip(1).take(n - 2)
            .fold(C64::new(0.0, 0.0), |acc, (qk, pk)| acc + qk.conj() * *pk)
        + q[n - 1].conj() * p[n - 1]
    )
}

/// Generate an array of angular wave numbers to accompany a FFT of `n` points
/// with grid spacing `dx`, in standard (unshifted) order.
pub fn fft_freq(n: usize, dx: f64) -> nd::Array1<f64> {
    let dk = TAU / (n as f64 * dx);
    let fp: nd::Array1<f64>
        = (0..(n + 1) / 2)
        .map(|k| k as f64 * dk)
        .collect();
    let fm: nd::Array1<f64>
        = (1..n / 2 + 1).rev()
        .map(|k| -(k as f64) * dk)
        .collect();
    concatenate!(nd::Axis(0), fp, fm)
}

/// Perform the one-dimensional, complex-valued FFT.
pub fn fft<S>(x: &nd::ArrayBase<S, Ix1>) -> nd::Array1<C64>
where S: nd::Data<Elem = C64>
{
    let n: usize = x.len();
    let mut f: Vec<C64> = x.iter().copied().collect();
    let mut plan = fft::FftPlanner::new();
    let fft_plan = plan.plan_fft_forward(n);
    fft_plan.process(&mut f);
    nd::Array1::from(f)
}

/// Perform the one-dimensional, complex-valued FFT and return the result along
/// with the accompanying array of [wave numbers][fft_freq].
pub fn do_fft<S>(x: &nd::ArrayBase<S, Ix1>, dx: f64)
    -> (nd::Array1<C64>, nd::Array1<f64>)
where S: nd::Data<Elem = C64>
{
    let n: usize = x.len();
    (fft(x), fft_freq(n, dx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrature_exactness() {
        // trapezoid is exact for lines, simpson for cubics
        let dx = 0.1;
        let x: nd::Array1<f64> = (0..11).map(|k| k as f64 * dx).collect();
        assert!((trapz(&(2.0 * &x + 1.0), dx) - 2.0).abs() < 1e-12);
        let cubic = x.mapv(|xk| xk.powi(3));
        assert!((simpson(&cubic, dx) - 0.25).abs() < 1e-12);
        // odd number of intervals takes the 3/8 tail
        let x: nd::Array1<f64> = (0..10).map(|k| k as f64 * dx).collect();
        let cubic = x.mapv(|xk| xk.powi(3));
        assert!((simpson(&cubic, dx) - 0.9_f64.powi(4) / 4.0).abs() < 1e-12);
        let short = nd::array![1.0, 3.0];
        assert_eq!(simpson(&short, 0.5), 1.0);
    }

    #[test]
    fn simpson_with_four_points() {
        let dx = 0.5;
        let y = nd::array![0.0, 0.125, 1.0, 3.375];
        assert!((simpson(&y, dx) - 1.5_f64.powi(4) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn wavenumbers_match_fft_order() {
        let k = fft_freq(4, 1.0);
        let dk = TAU / 4.0;
        assert_eq!(k, nd::array![0.0, dk, -2.0 * dk, -dk]);
        let k = fft_freq(5, 1.0);
        let dk = TAU / 5.0;
        assert_eq!(k, nd::array![0.0, dk, 2.0 * dk, -2.0 * dk, -dk]);
    }

    #[test]
    fn plane_wave_peaks_at_its_wavenumber() {
        let n = 16;
        let dx = 0.25;
        let k0 = fft_freq(n, dx)[3];
        let x: nd::Array1<C64>
            = (0..n).map(|j| C64::cis(k0 * j as f64 * dx)).collect();
        let (f, k) = do_fft(&x, dx);
        let (imax, _)
            = f.iter().enumerate()
            .fold((0, 0.0), |(ib, b), (i, fi)| {
                if fi.norm() > b { (i, fi.norm()) } else { (ib, b) }
            });
        assert_eq!(k[imax], k0);
        assert!((f[imax].norm() - n as f64).abs() < 1e-9);
    }

    #[test]
    fn wavefunction_products() {
        let dx = 0.01;
        let q: nd::Array1<C64>
            = (0..101).map(|j| C64::cis(j as f64 * dx)).collect();
        assert!((wf_dot(&q, &q, dx) - C64::new(1.0, 0.0)).norm() < 1e-12);
        assert!(wf_dot(&q, &q, dx).im.abs() < 1e-15);
        let p = q.mapv(|qk| qk * C64::i());
        assert!((wf_dot(&q, &p, dx) - C64::i()).norm() < 1e-12);
    }
}
