//! Admission capacity accounting and idempotent application submission.
//!
//! Applicants apply to a program offering (program x batch x academic calendar) that has a
//! fixed, possibly unlimited, number of seats. Submissions for the same offering are serialized
//! so the seat count can never be exceeded, and each (profile, offering) pair owns at most one
//! application that later submissions update in place.

pub mod capacity;
pub mod domain;
pub mod eligibility;
pub mod identity;
pub(crate) mod locks;
pub mod memory;
pub mod profiles;
pub mod repository;
pub mod router;
pub mod seed;
pub mod service;

#[cfg(test)]
mod tests;

pub use capacity::{CapacityResolver, CapacityView};
pub use domain::{
    AcademicCalendar, ApplicantProfile, ApplicationId, ApplicationStatus, ApplicationView,
    InvalidTransition, ProgramOffering, StudentApplication, UserIdentity,
};
pub use eligibility::{EligibilityGate, Ineligibility};
pub use identity::{InvalidReference, RecordKey, RecordRef};
pub use memory::InMemoryAdmissionStore;
pub use profiles::{ProfileLinkage, ProfileResolver, ResolvedProfile};
pub use repository::{
    AdmissionStore, ApplicationRepository, OfferingRepository, ProfileQuery, ProfileRepository,
    RepositoryError,
};
pub use router::{admission_router, ReviewRequest, SubmitApplicationRequest};
pub use seed::{seed_store, SeedError};
pub use service::{
    ApplicationServiceError, ApplicationUpsertService, OfferingAvailability, SubmissionOutcome,
    SubmissionRejection,
};
