//! # seats-estimate
//!
//! Estimates the unobserved components of a series from its UCARIMA model:
//! Wiener-Kolmogorov filtering with Burman's finite-sample algorithm or a
//! Kalman smoother on the composite state-space form, the deterministic
//! mean effect, and the bias-corrected final decomposition.
//!
//! ## Estimation Flow
//!
//! ```mermaid
//! graph LR
//!     A["series"] -->|"Transformation::apply(..)?"| B["transformed"]
//!     B -->|"MeanEffect::remove(..)"| C["centered"]
//!     C -->|"ComponentsEstimator::estimate(..)?"| D["ComponentEstimates"]
//!     D -->|".with_effect(Trend, ..)"| E["ComponentEstimates"]
//!     E -->|"BiasCorrector::initial(..)"| F["ComponentDecomposition"]
//!     F -->|"BiasCorrector::correct(..)"| G["ComponentDecomposition"]
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use seats_estimate::{BiasCorrector, EstimationMethod, Horizons, SeriesKind, series_estimate};
//!
//! let estimator = EstimationMethod::Burman.estimator();
//! let estimates = estimator.estimate(&ucm, &series, Horizons::symmetric(12))?;
//! let observed = series_estimate(ucm.aggregate(), &series, Horizons::symmetric(12))?;
//!
//! let corrector = BiasCorrector::default();
//! let decomposition = corrector.correct(&corrector.initial(&observed, &estimates));
//! let sa = decomposition.get(SeriesKind::SeasonallyAdjusted);
//! ```
//!
//! ## Estimators
//!
//! | Method | Estimates | Standard errors |
//! |--------|-----------|-----------------|
//! | [`BurmanEstimator`] | two one-sided recursions on the series extended by forecasts and backcasts | final error plus revision variances of the WK filter |
//! | [`KalmanEstimator`] | exact diffuse square-root filter and fixed-interval smoother | smoothed state covariances |
//!
//! Both treat forecasts and backcasts of each component the same way as
//! in-sample values and agree to numerical precision.

mod bias;
mod burman;
mod components;
mod error;
mod estimator;
mod kalman;
mod mean;
mod wiener_kolmogorov;

pub use bias::{BiasCorrection, BiasCorrector, Transformation};
pub use burman::BurmanEstimator;
pub use components::{
    ComponentDecomposition, ComponentEstimates, DecompositionMode, Horizons, SeriesEstimate,
    SeriesKind,
};
pub use error::EstimateError;
pub use estimator::{ComponentsEstimator, EstimationMethod, series_estimate};
pub use kalman::KalmanEstimator;
pub use mean::MeanEffect;
