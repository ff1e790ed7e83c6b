//! Admission capacity accounting and idempotent application submission.
//!
//! The crate exposes the domain model for program offerings, applicant profiles and student
//! applications, the services that resolve seat usage and accept submissions, and an axum router
//! that binds those services to HTTP.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
