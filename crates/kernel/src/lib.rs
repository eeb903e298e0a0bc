//! # seats-kernel
//!
//! Orchestrates the SEATS decomposition of one series: validation of the
//! fitted model, canonical decomposition with the bounded approximation
//! loop, components estimation and bias correction.
//!
//! ## Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["SarimaModel + series"] -->|"Transformation"| B["transformed series"]
//!     B -->|"ModelValidator"| C["validated model"]
//!     C -->|"ModelDecomposer"| D{"decomposable?"}
//!     D -->|"no, round < max_rounds"| E["ModelApproximator"]
//!     E --> C
//!     D -->|"yes"| F["UcarimaModel"]
//!     F -->|"ComponentsEstimator"| G["initial decomposition"]
//!     G -->|"BiasCorrector"| H["SeatsResults"]
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use seats_arima::SarimaModel;
//! use seats_kernel::{Kernel, KernelConfig, SeriesKind};
//!
//! let kernel = Kernel::new(KernelConfig::default())?;
//! let results = kernel.process(&SarimaModel::airline(12, -0.4, -0.6), &series)?;
//! for note in results.notes() {
//!     println!("{note}");
//! }
//! let trend = results.decomposition().get(SeriesKind::Trend);
//! ```
//!
//! ## Diagnostics
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | MA roots corrected by the validator | [`Note::ParametersCutOff`] |
//! | model replaced by an approximation | [`Note::ModelApproximated`] |
//! | decomposition only with added noise | [`Note::NoisyModel`] |
//! | numeric failure in a component | [`Note::EstimationFallback`] |
//! | round bound exhausted | [`DecompositionError::NonDecomposable`] |

mod config;
mod error;
mod kernel;
mod result;

pub use config::KernelConfig;
pub use error::DecompositionError;
pub use kernel::Kernel;
pub use result::{Note, SeatsResults};

// Re-export the types needed to configure a kernel and read its results.
pub use seats_decompose::{
    ApproximationMode, ApproximationStep, ApproximatorConfig, ComponentType, DecomposerConfig,
    UcarimaModel, ValidatorConfig,
};
pub use seats_estimate::{
    BiasCorrection, ComponentDecomposition, DecompositionMode, EstimationMethod, Horizons,
    SeriesEstimate, SeriesKind, Transformation,
};
