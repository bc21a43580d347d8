//! Construction estimate engine
//!
//! Stateless pipeline over a project input and an immutable configuration
//! snapshot:
//! 1. Validate: reject bad input with every field problem at once
//! 2. Geometry: built-up area, carpet area, structural concrete volumes
//! 3. Quantity: cement, steel, bricks, finishes, MEP points, features
//! 4. Cost: regional/quality/market-adjusted prices, labor, overheads
//! 5. Timeline: phase durations, critical path, phase cost allocation
//! 6. Cash flow and confidence scoring

pub mod cashflow;
pub mod confidence;
pub mod cost;
pub mod error;
pub mod estimate;
pub mod export;
pub mod formula;
pub mod geometry;
pub mod quantity;
pub mod snapshot;
pub mod timeline;
pub mod types;
pub mod utils;
pub mod validate;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{EstimateError, Result};
pub use estimate::{calculate_estimate, CalculationOptions, EstimateReport};
pub use snapshot::ConfigurationSnapshot;
pub use types::ProjectInput;
