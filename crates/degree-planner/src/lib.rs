//! Degree planning core: prerequisite eligibility and major progress over
//! identifier-addressed academic records.

pub mod config;
pub mod error;
pub mod planning;
pub mod telemetry;
