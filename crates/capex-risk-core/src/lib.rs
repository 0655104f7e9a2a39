pub mod error;
pub mod projection;
pub mod time_value;
pub mod types;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

#[cfg(feature = "risk_matrix")]
pub mod risk_matrix;

#[cfg(feature = "narrative")]
pub mod narrative;

pub use error::CapexRiskError;
pub use types::*;

/// Standard result type for all capex-risk operations
pub type CapexRiskResult<T> = Result<T, CapexRiskError>;
