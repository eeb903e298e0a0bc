//! Symmetric filters `s(B, F) = s0 + Σ s_k (B^k + F^k)`.
//!
//! A symmetric filter evaluated at `B = e^{-iω}` is a real, even function of
//! the frequency: the (pseudo-)spectrum numerator of an ARIMA model is the
//! symmetric filter `σ² θ(B) θ(F)`. Any such filter is a polynomial in
//! `x = cos ω`, which is where factorization and partial fractions happen.

use num_complex::Complex64;

use crate::error::ArimaError;
use crate::linalg;
use crate::polynomial::Polynomial;

/// Roots of the x-polynomial closer than this to `±1` are snapped onto the
/// unit circle.
const UNIT_SNAP: f64 = 1e-6;

/// Symmetric filter stored by its one-sided weights `s0, s1, …, sq`.
#[derive(Clone, Debug, PartialEq)]
pub struct SymmetricFilter {
    weights: Vec<f64>,
}

impl SymmetricFilter {
    /// Creates a filter from its one-sided weights `s0..sq`.
    pub fn new(weights: Vec<f64>) -> Self {
        if weights.is_empty() {
            return Self::zero();
        }
        Self { weights }
    }

    /// The zero filter.
    pub fn zero() -> Self {
        Self { weights: vec![0.0] }
    }

    /// The filter `p(B) p(F)`: `s_k = Σ_i p_i p_{i+k}`.
    pub fn of(p: &Polynomial) -> Self {
        let c = p.coefficients();
        let q = p.degree();
        let weights = (0..=q)
            .map(|k| (0..=q - k).map(|i| c[i] * c[i + k]).sum())
            .collect();
        Self { weights }
    }

    /// Returns the one-sided weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Returns the highest lag `q`.
    pub fn degree(&self) -> usize {
        self.weights.len() - 1
    }

    /// Returns weight `k`, or zero beyond the degree.
    pub fn get(&self, k: usize) -> f64 {
        self.weights.get(k).copied().unwrap_or(0.0)
    }

    /// Returns `true` when every weight is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.weights.iter().all(|w| *w == 0.0)
    }

    /// Returns the product of two symmetric filters.
    pub fn times(&self, other: &SymmetricFilter) -> SymmetricFilter {
        let a = self.two_sided();
        let b = other.two_sided();
        let mut full = vec![0.0; a.len() + b.len() - 1];
        for (i, x) in a.iter().enumerate() {
            for (j, y) in b.iter().enumerate() {
                full[i + j] += x * y;
            }
        }
        let centre = (full.len() - 1) / 2;
        SymmetricFilter::new(full[centre..].to_vec())
    }

    /// Returns the sum of two symmetric filters.
    pub fn plus(&self, other: &SymmetricFilter) -> SymmetricFilter {
        let n = self.weights.len().max(other.weights.len());
        SymmetricFilter::new((0..n).map(|k| self.get(k) + other.get(k)).collect())
    }

    /// Returns `k · self`.
    pub fn scaled(&self, k: f64) -> SymmetricFilter {
        SymmetricFilter::new(self.weights.iter().map(|w| w * k).collect())
    }

    /// Evaluates `s0 + 2 Σ s_k cos(kω)`.
    pub fn eval(&self, omega: f64) -> f64 {
        self.weights
            .iter()
            .enumerate()
            .skip(1)
            .fold(self.weights[0], |acc, (k, s)| {
                acc + 2.0 * s * (k as f64 * omega).cos()
            })
    }

    /// Converts to the polynomial `S(x)` with `s(e^{-iω}) = S(cos ω)`.
    pub fn to_chebyshev(&self) -> Polynomial {
        let basis = chebyshev_basis(self.degree());
        let mut out = Polynomial::constant(self.weights[0]);
        for (k, s) in self.weights.iter().enumerate().skip(1) {
            out = out.plus(&basis[k].scaled(2.0 * s));
        }
        out.trimmed(0.0)
    }

    /// Inverse of [`SymmetricFilter::to_chebyshev`].
    pub fn from_chebyshev(p: &Polynomial) -> SymmetricFilter {
        let n = p.degree();
        let basis = chebyshev_basis(n);
        let mut rest = p.coefficients().to_vec();
        let mut c = vec![0.0; n + 1];
        for k in (0..=n).rev() {
            let tk = basis[k].coefficients();
            let ck = rest[k] / tk[k];
            c[k] = ck;
            for (j, t) in tk.iter().enumerate() {
                rest[j] -= ck * t;
            }
        }
        let mut weights = Vec::with_capacity(n + 1);
        weights.push(c[0]);
        weights.extend(c[1..].iter().map(|x| x / 2.0));
        SymmetricFilter::new(weights)
    }

    /// Spectral factorization: finds `θ(B)` with `θ(0) = 1` and `σ² ≥ 0` such
    /// that `self = σ² θ(B) θ(F)`.
    ///
    /// The roots of `θ` are chosen on or outside the unit circle.
    ///
    /// # Errors
    ///
    /// [`ArimaError::NegativeSpectrum`] when the filter takes negative values
    /// on `[0, π]`.
    pub fn factorize(&self) -> Result<(Polynomial, f64), ArimaError> {
        factorize_chebyshev(&self.to_chebyshev())
    }

    /// Solves `self = g(B) θ(F) + g(F) θ(B)` for `g`.
    ///
    /// The result has degree `max(deg self, deg θ)`. Used for autocovariances
    /// (`θ` the AR polynomial) and for the Wiener-Kolmogorov gains (`θ` the
    /// MA polynomial).
    pub fn split(&self, theta: &Polynomial) -> Result<Polynomial, ArimaError> {
        let q = theta.degree();
        let m = self.degree();
        let r = q.max(m);
        let mut a = ndarray::Array2::<f64>::zeros((r + 1, r + 1));
        for k in 0..=r {
            for i in 0..=r {
                let mut v = 0.0;
                if i >= k && i - k <= q {
                    v += theta.get(i - k);
                }
                if i + k <= q {
                    v += theta.get(i + k);
                }
                a[[k, i]] = v;
            }
        }
        let b = ndarray::Array1::from_iter((0..=r).map(|k| self.get(k)));
        let g = linalg::lu_solve(&a, &b)?;
        Ok(Polynomial::new(g.to_vec()))
    }

    fn two_sided(&self) -> Vec<f64> {
        let mut full: Vec<f64> = self.weights[1..].iter().rev().copied().collect();
        full.extend_from_slice(&self.weights);
        full
    }
}

/// Chebyshev polynomials `T_0..=T_n` as polynomials in `x`.
fn chebyshev_basis(n: usize) -> Vec<Polynomial> {
    let mut basis = vec![Polynomial::one(), Polynomial::new(vec![0.0, 1.0])];
    let two_x = Polynomial::new(vec![0.0, 2.0]);
    while basis.len() <= n {
        let k = basis.len();
        let next = two_x.times(&basis[k - 1]).minus(&basis[k - 2]);
        basis.push(next);
    }
    basis.truncate(n + 1);
    basis
}

/// Factorizes a polynomial in `x = cos ω` that is non-negative on `[-1, 1]`.
///
/// Every root `x_i` maps to a root `r_i` of `θ` through
/// `x_i = (r_i + 1/r_i) / 2`. Real roots inside `(-1, 1)` are zeros of the
/// spectrum on the unit circle; they come in (numerically split) pairs which
/// are merged into one conjugate pair of unit roots.
pub fn factorize_chebyshev(p: &Polynomial) -> Result<(Polynomial, f64), ArimaError> {
    let scale = p.max_abs();
    if scale == 0.0 {
        return Ok((Polynomial::one(), 0.0));
    }
    let p = p.trimmed(1e-15 * scale);
    if p.is_constant() {
        let c = p.get(0);
        if c < 0.0 {
            return Err(ArimaError::NegativeSpectrum);
        }
        return Ok((Polynomial::one(), c));
    }

    let mut roots: Vec<Complex64> = Vec::with_capacity(p.degree());
    let mut inner: Vec<f64> = Vec::new();
    for x in p.roots() {
        if x.im.abs() < UNIT_SNAP && (x.re.abs() - 1.0).abs() < UNIT_SNAP {
            roots.push(Complex64::new(x.re.signum(), 0.0));
        } else if x.im.abs() < UNIT_SNAP && x.re.abs() < 1.0 {
            inner.push(x.re);
        } else {
            let s = (x * x - 1.0).sqrt();
            let (r1, r2) = (x + s, x - s);
            roots.push(if r1.norm() >= r2.norm() { r1 } else { r2 });
        }
    }
    if inner.len() % 2 == 1 {
        return Err(ArimaError::NegativeSpectrum);
    }
    inner.sort_by(f64::total_cmp);
    for pair in inner.chunks_exact(2) {
        let mean = 0.5 * (pair[0] + pair[1]);
        let r = Complex64::new(mean, (1.0 - mean * mean).max(0.0).sqrt());
        roots.push(r);
        roots.push(r.conj());
    }

    let theta = Polynomial::from_roots(&roots);
    let lead = p.get(p.degree());
    let product = roots
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, r| acc * (-r / 2.0));
    let variance = lead * product.re;
    if variance < 0.0 {
        return Err(ArimaError::NegativeSpectrum);
    }
    Ok((theta, variance))
}
