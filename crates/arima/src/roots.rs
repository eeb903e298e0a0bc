//! Polynomial root finding.
//!
//! Root finding sits behind [`RootFinder`] so the numeric method can be
//! swapped or tested independently of the models that consume it.

use num_complex::Complex64;

/// Finds the complex roots of a real polynomial.
pub trait RootFinder: Send + Sync {
    /// Returns all roots of the polynomial with ascending `coefficients`.
    ///
    /// The highest coefficient must be non-zero. The result has
    /// `coefficients.len() - 1` entries (with multiplicity).
    fn find_roots(&self, coefficients: &[f64]) -> Vec<Complex64>;
}

/// Laguerre's method with deflation and polishing against the undeflated
/// polynomial.
#[derive(Clone, Copy, Debug)]
pub struct LaguerreSolver {
    max_iterations: usize,
}

impl LaguerreSolver {
    /// Creates a solver with an explicit iteration cap per root.
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    /// Returns the iteration cap per root.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl Default for LaguerreSolver {
    fn default() -> Self {
        Self::new(200)
    }
}

impl RootFinder for LaguerreSolver {
    fn find_roots(&self, coefficients: &[f64]) -> Vec<Complex64> {
        let original: Vec<Complex64> = coefficients
            .iter()
            .map(|c| Complex64::new(*c, 0.0))
            .collect();
        let n = original.len().saturating_sub(1);
        let mut roots = Vec::with_capacity(n);
        let mut deflated = original.clone();

        for j in (1..=n).rev() {
            let mut x = laguerre(&deflated, Complex64::new(0.0, 0.0), self.max_iterations);
            if x.im.abs() <= 2e-15 * x.re.abs() {
                x = Complex64::new(x.re, 0.0);
            }
            roots.push(x);
            // synthetic division by (z - x)
            let mut b = deflated[j];
            for jj in (0..j).rev() {
                let c = deflated[jj];
                deflated[jj] = b;
                b = x * b + c;
            }
            deflated.truncate(j);
        }

        roots
            .into_iter()
            .map(|r| {
                let polished = laguerre(&original, r, self.max_iterations);
                if polished.im.abs() <= 2e-15 * polished.re.abs() {
                    Complex64::new(polished.re, 0.0)
                } else {
                    polished
                }
            })
            .collect()
    }
}

/// One Laguerre iteration sequence starting at `x`.
fn laguerre(a: &[Complex64], mut x: Complex64, max_iterations: usize) -> Complex64 {
    let m = a.len() - 1;
    let mf = m as f64;
    let zero = Complex64::new(0.0, 0.0);

    for it in 0..max_iterations {
        let mut b = a[m];
        let mut d = zero;
        let mut f = zero;
        let abx = x.norm();
        let mut err = b.norm();
        for j in (0..m).rev() {
            f = x * f + d;
            d = x * d + b;
            b = x * b + a[j];
            err = b.norm() + abx * err;
        }
        err *= 1e-15;
        if b.norm() <= err {
            return x;
        }

        let g = d / b;
        let g2 = g * g;
        let h = g2 - f * 2.0 / b;
        let sq = ((h * mf - g2) * (mf - 1.0)).sqrt();
        let gp = g + sq;
        let gm = g - sq;
        let den = if gp.norm() >= gm.norm() { gp } else { gm };
        let dx = if den.norm() > 0.0 {
            Complex64::new(mf, 0.0) / den
        } else {
            Complex64::new(0.0, it as f64).exp() * (1.0 + abx)
        };

        let x1 = x - dx;
        if x1 == x {
            return x;
        }
        // fractional step every tenth iteration breaks limit cycles
        x = if it % 10 == 9 { x - dx * 0.5 } else { x1 };
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sorted_by_re(mut roots: Vec<Complex64>) -> Vec<Complex64> {
        roots.sort_by(|a, b| a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im)));
        roots
    }

    #[test]
    fn quadratic_real_roots() {
        // (1 - B/2)(1 - B/4) = 1 - 0.75 B + 0.125 B^2
        let roots = sorted_by_re(LaguerreSolver::default().find_roots(&[1.0, -0.75, 0.125]));
        assert_eq!(roots.len(), 2);
        assert_abs_diff_eq!(roots[0].re, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(roots[1].re, 4.0, epsilon = 1e-12);
        assert_eq!(roots[0].im, 0.0);
    }

    #[test]
    fn seasonal_unit_roots() {
        // 1 - B^4 has roots 1, -1, i, -i
        let roots = LaguerreSolver::default().find_roots(&[1.0, 0.0, 0.0, 0.0, -1.0]);
        assert_eq!(roots.len(), 4);
        for r in &roots {
            assert_abs_diff_eq!(r.norm(), 1.0, epsilon = 1e-10);
        }
        let real: Vec<_> = roots.iter().filter(|r| r.im.abs() < 1e-10).collect();
        assert_eq!(real.len(), 2);
    }

    #[test]
    fn complex_pair() {
        // 1 + B^2 has roots ±i
        let roots = sorted_by_re(LaguerreSolver::new(100).find_roots(&[1.0, 0.0, 1.0]));
        for r in &roots {
            assert_abs_diff_eq!(r.re, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(r.im.abs(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn residuals_vanish() {
        let coefficients = [1.0, -0.4, 0.0, 0.0, 0.0, 0.0, 0.0, -0.6, 0.24];
        let roots = LaguerreSolver::default().find_roots(&coefficients);
        for z in roots {
            let value = coefficients
                .iter()
                .rev()
                .fold(Complex64::new(0.0, 0.0), |acc, c| acc * z + *c);
            assert!(value.norm() < 1e-10, "p({z}) = {value}");
        }
    }

    #[test]
    fn solver_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<LaguerreSolver>();
    }
}
