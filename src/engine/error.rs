//! Error types for the estimation pipeline

use rust_decimal::Decimal;
use thiserror::Error;

use crate::engine::formula::FormulaError;
use crate::engine::validate::ValidationErrors;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    /// User input failed validation; nothing was calculated
    #[error("input validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The snapshot lacks an entry the calculation needs
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("multiplier {name} = {value} is outside the sane band [{min}, {max}]")]
    OutOfRangeMultiplier {
        name: String,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("formula error: {0}")]
    Formula(#[from] FormulaError),
}

impl EstimateError {
    /// Configuration-class failures are server-side data gaps, not user mistakes
    pub fn is_internal(&self) -> bool {
        !matches!(self, EstimateError::Validation(_))
    }
}

impl From<ValidationErrors> for EstimateError {
    fn from(errors: ValidationErrors) -> Self {
        EstimateError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, EstimateError>;
