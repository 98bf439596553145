//! Descriptive statistics: profiling and correlation.

pub mod correlation;
pub mod describe;
pub mod profile;

pub use correlation::CorrelationMatrix;
pub use profile::{profile, ColumnProfile, ColumnSummary, ProfileReport};
