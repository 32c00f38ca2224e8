//! gravida-common: Shared types, errors, and helpers used across all Gravida crates.

pub mod error;
pub mod entities;
pub mod confidence;
pub mod sandbox;
pub mod text;

// Re-export commonly used types
pub use entities::{
    ConsolidatedRecord, Language, RiskCategory, RiskLevel, SourceId, Trimester, TrimesterSafety,
};
pub use error::{GravidaError, Result};
