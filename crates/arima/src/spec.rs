//! Seasonal ARIMA orders.

/// Orders of a multiplicative seasonal ARIMA `(p,d,q)(bp,bd,bq)_s` model.
///
/// Create a non-seasonal spec with [`SarimaSpec::new()`] and add orders with
/// the builder methods, or use [`SarimaSpec::airline()`].
///
/// # Example
///
/// ```
/// use seats_arima::SarimaSpec;
///
/// let spec = SarimaSpec::new(12).with_regular(0, 1, 1).with_seasonal(0, 1, 1);
/// assert_eq!(spec, SarimaSpec::airline(12));
/// assert_eq!(spec.differencing_degree(), 13);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SarimaSpec {
    period: usize,
    p: usize,
    d: usize,
    q: usize,
    bp: usize,
    bd: usize,
    bq: usize,
}

impl SarimaSpec {
    /// Creates a `(0,0,0)(0,0,0)_period` specification.
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            p: 0,
            d: 0,
            q: 0,
            bp: 0,
            bd: 0,
            bq: 0,
        }
    }

    /// The airline model `(0,1,1)(0,1,1)_period`.
    pub fn airline(period: usize) -> Self {
        Self::new(period).with_regular(0, 1, 1).with_seasonal(0, 1, 1)
    }

    /// Sets the regular orders `(p, d, q)`.
    pub fn with_regular(mut self, p: usize, d: usize, q: usize) -> Self {
        self.p = p;
        self.d = d;
        self.q = q;
        self
    }

    /// Sets the seasonal orders `(bp, bd, bq)`.
    pub fn with_seasonal(mut self, bp: usize, bd: usize, bq: usize) -> Self {
        self.bp = bp;
        self.bd = bd;
        self.bq = bq;
        self
    }

    /// Returns the seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Returns the regular AR order.
    pub fn p(&self) -> usize {
        self.p
    }

    /// Returns the regular differencing order.
    pub fn d(&self) -> usize {
        self.d
    }

    /// Returns the regular MA order.
    pub fn q(&self) -> usize {
        self.q
    }

    /// Returns the seasonal AR order.
    pub fn bp(&self) -> usize {
        self.bp
    }

    /// Returns the seasonal differencing order.
    pub fn bd(&self) -> usize {
        self.bd
    }

    /// Returns the seasonal MA order.
    pub fn bq(&self) -> usize {
        self.bq
    }

    /// Returns `true` when any seasonal order is non-zero.
    pub fn has_seasonal_part(&self) -> bool {
        self.bp + self.bd + self.bq > 0
    }

    /// Returns the degree of the differencing polynomial, `d + s·bd`.
    pub fn differencing_degree(&self) -> usize {
        self.d + self.period * self.bd
    }

    /// Returns the number of ARMA coefficients `p + bp + q + bq`.
    pub fn parameter_count(&self) -> usize {
        self.p + self.bp + self.q + self.bq
    }
}

impl std::fmt::Display for SarimaSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{},{})({},{},{})_{}",
            self.p, self.d, self.q, self.bp, self.bd, self.bq, self.period
        )
    }
}
