//! # seats-arima
//!
//! Polynomial, spectral and ARIMA primitives for signal extraction:
//! lag polynomials and their roots, symmetric filters with spectral
//! factorization, ARIMA models with exact forecasts, the Harvey
//! state-space form and maximum-likelihood re-estimation.
//!
//! ## Building Blocks
//!
//! ```mermaid
//! graph LR
//!     A["SarimaSpec"] -->|"SarimaModel::from_parameters(..)?"| B["SarimaModel"]
//!     B -->|".to_arima()"| C["ArimaModel"]
//!     C --> D[".spectrum(): PseudoSpectrum"]
//!     C --> E[".autocovariances(n)?"]
//!     C --> F["forecast / backcast"]
//!     C --> G["StateSpace::from_arima(..)?"]
//!     D -->|".factorize_numerator()?"| H["(θ, σ²)"]
//!     I["MaximumLikelihood"] -->|".estimate(spec, mean, series, start)?"| B
//! ```
//!
//! ## Sign Convention
//!
//! Lag polynomials carry their coefficients in ascending powers of the
//! backshift operator with a unit constant: `φ(B) = 1 + φ1 B + … + φp B^p`.
//! An AR(1) `x_t = 0.7 x_{t-1} + a_t` is `Polynomial::from_lags(&[-0.7])`.
//!
//! ```ignore
//! let airline = SarimaModel::airline(12, -0.4, -0.6).to_arima();
//! let fc = forecast(&airline, &series, 12)?;
//! ```
//!
//! ## Mathematical Glossary
//!
//! | Symbol | Accessor | Meaning |
//! |--------|----------|---------|
//! | φ | [`ArimaModel::ar()`] | stationary autoregressive polynomial |
//! | δ | [`ArimaModel::delta()`] | differencing polynomial, roots on the unit circle |
//! | θ | [`ArimaModel::ma()`] | moving-average polynomial |
//! | σ² | [`ArimaModel::innovation_variance()`] | innovation variance |
//! | ψ | [`ArimaModel::psi_weights()`] | MA(∞) weights of `θ / φδ` |

mod error;
mod estimator;
mod forecast;
mod linalg;
mod model;
mod polynomial;
mod roots;
mod sarima;
mod spec;
mod spectrum;
mod state_space;
mod symmetric;

pub(crate) mod kalman;
pub(crate) mod optimizer;
pub(crate) mod params;

pub use error::ArimaError;
pub use estimator::{MaximumLikelihood, ModelEstimator};
pub use forecast::{backcast, forecast, forecast_variances};
pub use linalg::{cholesky_psd, lq_lower, lu_solve};
pub use model::{ArimaModel, autocovariances};
pub use polynomial::{Polynomial, expand_ratio};
pub use roots::{LaguerreSolver, RootFinder};
pub use sarima::SarimaModel;
pub use spec::SarimaSpec;
pub use spectrum::PseudoSpectrum;
pub use state_space::StateSpace;
pub use symmetric::{SymmetricFilter, factorize_chebyshev};
