//! # seats-decompose
//!
//! Turns a fitted seasonal ARIMA model into an unobserved-components model:
//! MA-root validation, canonical spectral decomposition into trend,
//! seasonal, cycle and irregular components, and the approximation cascade
//! used when no decomposition exists.
//!
//! ## Decomposition Flow
//!
//! ```mermaid
//! graph LR
//!     A["SarimaModel"] -->|"ModelValidator::validate(..)?"| B["Validation"]
//!     B -->|".into_model()"| C["SarimaModel"]
//!     C -->|"ModelDecomposer::decompose(..)"| D{"Option"}
//!     D -->|"Some"| E["UcarimaModel"]
//!     D -->|"None"| F["ModelApproximator::approximate(..)"]
//!     F -->|"Approximation"| C
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use seats_arima::SarimaModel;
//! use seats_decompose::{DecomposerConfig, ModelDecomposer, ModelValidator, ValidatorConfig};
//!
//! let model = SarimaModel::airline(12, -0.4, -0.6);
//! let model = ModelValidator::new(ValidatorConfig::default())?.validate(&model)?.into_model();
//! let ucm = ModelDecomposer::new(DecomposerConfig::default())?
//!     .decompose(&model)
//!     .expect("airline models decompose");
//! for c in ucm.components() {
//!     println!("{}: σ² = {}", c.kind(), c.model().innovation_variance());
//! }
//! ```
//!
//! ## Canonical Decomposition
//!
//! | Component | AR part | Spectrum |
//! |-----------|---------|----------|
//! | trend | `(1-B)^d` and large real positive AR roots | minimum moved to the irregular |
//! | seasonal | seasonal unit roots and AR roots near seasonal frequencies | minimum moved to the irregular |
//! | cycle | all other AR roots | minimum moved to the irregular |
//! | irregular | none | white noise |

mod approximator;
mod decomposer;
mod error;
mod patterns;
mod selector;
mod ucarima;
mod validator;

pub use approximator::{
    Approximation, ApproximationMode, ApproximationStep, ApproximatorConfig, ModelApproximator,
};
pub use decomposer::{DecomposerConfig, ModelDecomposer};
pub use error::DecomposeError;
pub use selector::{RootPartition, RootSelector, SeasonalSelector, TrendSelector, partition};
pub use ucarima::{ComponentType, UcComponent, UcarimaModel};
pub use validator::{ModelValidator, Validation, ValidatorConfig};
