//! Core domain models for the UniNinja gateway
//!
//! This crate contains the records the gateway serves (universities and
//! courses), the raw shapes returned by the Unistats API, and the rules that
//! turn one into the other.

pub mod course;
pub mod error;
pub mod lenient;
pub mod types;
pub mod university;

// Re-exports for convenience
pub use course::{Course, CourseDetailRecord, CourseSummary, CourseSummaryRecord};
pub use error::{DomainError, Result};
pub use types::{CourseId, Pubukprn, StudyMode};
pub use university::{InstitutionRecord, University, UniversitySupplement};
