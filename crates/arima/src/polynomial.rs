//! Lag polynomials in the backshift operator `B`.
//!
//! Coefficients are stored in ascending order: `c[0] + c[1] B + c[2] B^2 + …`.
//! Lag polynomials of ARIMA models are normalized with `c[0] = 1` and use
//! the additive sign convention `φ(B) = 1 + φ1 B + … + φp B^p`.

use num_complex::Complex64;

use crate::roots::{LaguerreSolver, RootFinder};

/// Remainders below this bound (relative to the dividend) count as zero when
/// testing for exact factors.
const FACTOR_TOLERANCE: f64 = 1e-9;

/// A real polynomial with ascending coefficients.
///
/// Used both for lag polynomials in `B` and for the polynomials in
/// `x = cos ω` produced by [`SymmetricFilter::to_chebyshev`](crate::SymmetricFilter::to_chebyshev).
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Creates a polynomial from ascending coefficients.
    ///
    /// An empty vector yields the zero polynomial.
    pub fn new(coefficients: Vec<f64>) -> Self {
        if coefficients.is_empty() {
            return Self::constant(0.0);
        }
        Self { coefficients }
    }

    /// Creates a polynomial from a slice of ascending coefficients.
    pub fn from_slice(coefficients: &[f64]) -> Self {
        Self::new(coefficients.to_vec())
    }

    /// The constant polynomial `1`.
    pub fn one() -> Self {
        Self::constant(1.0)
    }

    /// The constant polynomial `c`.
    pub fn constant(c: f64) -> Self {
        Self {
            coefficients: vec![c],
        }
    }

    /// Builds `1 + c1 B + … + cn B^n` from the lag coefficients `c1..cn`.
    ///
    /// # Example
    ///
    /// ```
    /// use seats_arima::Polynomial;
    ///
    /// let ma = Polynomial::from_lags(&[-0.4]);
    /// assert_eq!(ma.coefficients(), &[1.0, -0.4]);
    /// ```
    pub fn from_lags(lags: &[f64]) -> Self {
        let mut coefficients = Vec::with_capacity(lags.len() + 1);
        coefficients.push(1.0);
        coefficients.extend_from_slice(lags);
        Self { coefficients }
    }

    /// Builds `1 + c1 B^s + … + cn B^{ns}` from seasonal lag coefficients.
    pub fn seasonal(lags: &[f64], period: usize) -> Self {
        let period = period.max(1);
        let mut coefficients = vec![0.0; lags.len() * period + 1];
        coefficients[0] = 1.0;
        for (k, c) in lags.iter().enumerate() {
            coefficients[(k + 1) * period] = *c;
        }
        Self { coefficients }
    }

    /// The regular differencing operator `(1 - B)^d`.
    pub fn difference(d: usize) -> Self {
        Self::seasonal_difference(1, d)
    }

    /// The seasonal differencing operator `(1 - B^s)^d`.
    pub fn seasonal_difference(period: usize, d: usize) -> Self {
        let factor = Self::seasonal(&[-1.0], period);
        (0..d).fold(Self::one(), |acc, _| acc.times(&factor))
    }

    /// Returns the ascending coefficients.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Returns the coefficients of lags `1..=degree`.
    pub fn lags(&self) -> &[f64] {
        &self.coefficients[1..]
    }

    /// Returns the degree (number of coefficients minus one).
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Returns coefficient `i`, or zero beyond the degree.
    pub fn get(&self, i: usize) -> f64 {
        self.coefficients.get(i).copied().unwrap_or(0.0)
    }

    /// Returns `true` for a constant polynomial.
    pub fn is_constant(&self) -> bool {
        self.coefficients.len() == 1
    }

    /// Returns `true` for the identity polynomial `1`.
    pub fn is_one(&self) -> bool {
        self.is_constant() && self.coefficients[0] == 1.0
    }

    /// Returns the product `self · other`.
    pub fn times(&self, other: &Polynomial) -> Polynomial {
        let mut out = vec![0.0; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            if *a == 0.0 {
                continue;
            }
            for (j, b) in other.coefficients.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynomial::new(out)
    }

    /// Returns the sum `self + other`.
    pub fn plus(&self, other: &Polynomial) -> Polynomial {
        let n = self.coefficients.len().max(other.coefficients.len());
        Polynomial::new((0..n).map(|i| self.get(i) + other.get(i)).collect())
    }

    /// Returns the difference `self - other`.
    pub fn minus(&self, other: &Polynomial) -> Polynomial {
        self.plus(&other.scaled(-1.0))
    }

    /// Returns `k · self`.
    pub fn scaled(&self, k: f64) -> Polynomial {
        Polynomial::new(self.coefficients.iter().map(|c| c * k).collect())
    }

    /// Euclidean division: returns `(quotient, remainder)` with
    /// `self = quotient · divisor + remainder` and `deg remainder < deg divisor`.
    pub fn div_rem(&self, divisor: &Polynomial) -> (Polynomial, Polynomial) {
        let divisor = divisor.trimmed(0.0);
        let dn = divisor.degree();
        let mut num = self.coefficients.clone();
        if num.len() <= dn {
            return (Polynomial::constant(0.0), Polynomial::new(num));
        }
        let lead = divisor.coefficients[dn];
        let mut quotient = vec![0.0; num.len() - dn];
        for k in (0..quotient.len()).rev() {
            let c = num[k + dn] / lead;
            quotient[k] = c;
            for (j, d) in divisor.coefficients.iter().enumerate() {
                num[k + j] -= c * d;
            }
        }
        num.truncate(dn.max(1));
        if dn == 0 {
            num = vec![0.0];
        }
        (Polynomial::new(quotient), Polynomial::new(num))
    }

    /// Divides by `divisor` when it is an exact factor.
    ///
    /// Returns `None` when the remainder is not negligible.
    pub fn exact_div(&self, divisor: &Polynomial) -> Option<Polynomial> {
        let (quotient, remainder) = self.div_rem(divisor);
        let scale = self.max_abs().max(1.0);
        if remainder.max_abs() <= FACTOR_TOLERANCE * scale {
            Some(quotient)
        } else {
            None
        }
    }

    /// Drops trailing coefficients whose magnitude is at most `tolerance`,
    /// keeping at least the constant term.
    pub fn trimmed(&self, tolerance: f64) -> Polynomial {
        let mut coefficients = self.coefficients.clone();
        while coefficients.len() > 1 && coefficients[coefficients.len() - 1].abs() <= tolerance {
            coefficients.pop();
        }
        Polynomial { coefficients }
    }

    /// Largest coefficient magnitude.
    pub fn max_abs(&self) -> f64 {
        self.coefficients.iter().fold(0.0_f64, |m, c| m.max(c.abs()))
    }

    /// Evaluates the polynomial at a real point (Horner).
    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    /// Evaluates the polynomial at a complex point (Horner).
    pub fn eval_complex(&self, z: Complex64) -> Complex64 {
        self.coefficients
            .iter()
            .rev()
            .fold(Complex64::new(0.0, 0.0), |acc, c| acc * z + *c)
    }

    /// Finds the roots with the default Laguerre solver.
    pub fn roots(&self) -> Vec<Complex64> {
        self.roots_with(&LaguerreSolver::default())
    }

    /// Finds the roots with the given solver.
    pub fn roots_with(&self, finder: &dyn RootFinder) -> Vec<Complex64> {
        let trimmed = self.trimmed(0.0);
        if trimmed.is_constant() {
            return Vec::new();
        }
        finder.find_roots(&trimmed.coefficients)
    }

    /// Reconstructs `∏ (1 - B / z)` from the roots `z`.
    ///
    /// Complex roots must come in conjugate pairs for the result to be real;
    /// imaginary residues are discarded.
    pub fn from_roots(roots: &[Complex64]) -> Polynomial {
        let mut acc = vec![Complex64::new(1.0, 0.0)];
        for z in roots {
            let inv = -z.inv();
            let mut next = vec![Complex64::new(0.0, 0.0); acc.len() + 1];
            for (i, c) in acc.iter().enumerate() {
                next[i] += *c;
                next[i + 1] += *c * inv;
            }
            acc = next;
        }
        Polynomial::new(acc.into_iter().map(|c| c.re).collect())
    }

    /// Splits off every `(1 - B)` factor.
    ///
    /// Returns the number of unit roots at frequency zero and the remaining
    /// cofactor.
    pub fn split_unit_roots(&self) -> (usize, Polynomial) {
        let unit = Polynomial::difference(1);
        let mut count = 0;
        let mut rest = self.clone();
        while !rest.is_constant() {
            match rest.exact_div(&unit) {
                Some(q) => {
                    rest = q;
                    count += 1;
                }
                None => break,
            }
        }
        (count, rest)
    }
}

/// Expands `num(B) / den(B)` as a power series and returns its first `n` terms.
///
/// `den` must have a non-zero constant term.
pub fn expand_ratio(num: &Polynomial, den: &Polynomial, n: usize) -> Vec<f64> {
    let d0 = den.get(0);
    let mut out: Vec<f64> = Vec::with_capacity(n);
    for k in 0..n {
        let mut v = num.get(k);
        for j in 1..=k.min(den.degree()) {
            v -= den.get(j) * out[k - j];
        }
        out.push(v / d0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn lags_and_degree() {
        let p = Polynomial::from_lags(&[0.5, -0.2]);
        assert_eq!(p.degree(), 2);
        assert_eq!(p.lags(), &[0.5, -0.2]);
        assert_eq!(p.get(5), 0.0);
    }

    #[test]
    fn seasonal_expansion() {
        let p = Polynomial::seasonal(&[-0.6], 4);
        assert_eq!(p.coefficients(), &[1.0, 0.0, 0.0, 0.0, -0.6]);
    }

    #[test]
    fn airline_differencing() {
        let delta = Polynomial::difference(1).times(&Polynomial::seasonal_difference(12, 1));
        assert_eq!(delta.degree(), 13);
        assert_abs_diff_eq!(delta.get(0), 1.0);
        assert_abs_diff_eq!(delta.get(1), -1.0);
        assert_abs_diff_eq!(delta.get(12), -1.0);
        assert_abs_diff_eq!(delta.get(13), 1.0);
    }

    #[test]
    fn division_round_trip() {
        let a = Polynomial::from_lags(&[0.3, -0.1, 0.05]);
        let b = Polynomial::from_lags(&[-0.7]);
        let (q, r) = a.div_rem(&b);
        let back = q.times(&b).plus(&r);
        for i in 0..=a.degree() {
            assert_abs_diff_eq!(back.get(i), a.get(i), epsilon = 1e-12);
        }
        assert!(r.degree() < b.degree());
    }

    #[test]
    fn exact_division() {
        let f = Polynomial::from_lags(&[-0.5]);
        let g = Polynomial::from_lags(&[0.2, 0.1]);
        let q = f.times(&g).exact_div(&f).unwrap();
        for i in 0..=g.degree() {
            assert_abs_diff_eq!(q.get(i), g.get(i), epsilon = 1e-12);
        }
        assert!(g.exact_div(&f).is_none());
    }

    #[test]
    fn unit_roots_of_airline() {
        let delta = Polynomial::difference(1).times(&Polynomial::seasonal_difference(12, 1));
        let (count, rest) = delta.split_unit_roots();
        assert_eq!(count, 2);
        // 1 + B + ... + B^11
        assert_eq!(rest.degree(), 11);
        for c in rest.coefficients() {
            assert_abs_diff_eq!(*c, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn roots_reconstruct() {
        let p = Polynomial::from_lags(&[-0.4])
            .times(&Polynomial::seasonal(&[-0.6], 4))
            .times(&Polynomial::from_lags(&[0.3, 0.2]));
        let back = Polynomial::from_roots(&p.roots());
        assert_eq!(back.degree(), p.degree());
        for i in 0..=p.degree() {
            assert_abs_diff_eq!(back.get(i), p.get(i), epsilon = 1e-10);
        }
    }

    #[test]
    fn ratio_expansion_ma1_over_ar1() {
        // (1 + 0.5B) / (1 - 0.8B): psi_0 = 1, psi_k = 1.3 * 0.8^(k-1)
        let psi = expand_ratio(
            &Polynomial::from_lags(&[0.5]),
            &Polynomial::from_lags(&[-0.8]),
            5,
        );
        assert_abs_diff_eq!(psi[0], 1.0, epsilon = 1e-12);
        for (k, value) in psi.iter().enumerate().skip(1) {
            assert_abs_diff_eq!(*value, 1.3 * 0.8_f64.powi(k as i32 - 1), epsilon = 1e-12);
        }
    }

    #[test]
    fn trimming_keeps_constant() {
        let p = Polynomial::new(vec![0.0, 0.0, 1e-20]);
        assert_eq!(p.trimmed(1e-15).coefficients(), &[0.0]);
    }
}
