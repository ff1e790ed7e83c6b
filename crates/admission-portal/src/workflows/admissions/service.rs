use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::capacity::{CapacityResolver, CapacityView};
use super::domain::{
    ApplicationId, ApplicationStatus, InvalidTransition, ProgramOffering, StudentApplication,
    UserIdentity,
};
use super::eligibility::{EligibilityGate, Ineligibility};
use super::identity::{InvalidReference, RecordKey, RecordRef};
use super::locks::OfferingLocks;
use super::profiles::{ProfileResolver, ResolvedProfile};
use super::repository::{AdmissionStore, RepositoryError};

/// Accepts applications so that each (profile, offering) pair has at most one record and an
/// offering never holds more seat-holding applications than its capacity.
pub struct ApplicationUpsertService<S> {
    store: Arc<S>,
    capacity: CapacityResolver<S>,
    profiles: ProfileResolver<S>,
    locks: OfferingLocks,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Result of an accepted submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub application: StudentApplication,
    pub created: bool,
}

/// Offering summary paired with its advisory seat usage.
#[derive(Debug, Clone, Serialize)]
pub struct OfferingAvailability {
    pub offering: RecordRef,
    pub program: String,
    pub batch: String,
    pub open: bool,
    #[serde(flatten)]
    pub capacity: CapacityView,
}

impl<S> ApplicationUpsertService<S>
where
    S: AdmissionStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        let capacity = CapacityResolver::new(store.clone());
        let profiles = ProfileResolver::new(store.clone());
        Self::with_resolvers(store, capacity, profiles)
    }

    pub fn with_resolvers(
        store: Arc<S>,
        capacity: CapacityResolver<S>,
        profiles: ProfileResolver<S>,
    ) -> Self {
        Self {
            store,
            capacity,
            profiles,
            locks: OfferingLocks::default(),
        }
    }

    /// Resolve the caller's profile, then submit against the referenced offering.
    pub fn submit_for_user(
        &self,
        user: &UserIdentity,
        offering: &RecordRef,
        requested: Option<ApplicationStatus>,
    ) -> Result<SubmissionOutcome, ApplicationServiceError> {
        // Reject malformed references before touching the store.
        offering.preferred()?;

        let resolved = self
            .profiles
            .resolve_for_user(user)?
            .ok_or(SubmissionRejection::ProfileRequired)?;

        self.submit(&resolved.profile.reference(), offering, requested)
    }

    /// Create or update the application for `(profile, offering)`. Applicants may only request
    /// `Draft` or `Submitted`; terminal outcomes go through [`Self::review`].
    ///
    /// The offering is looked up once to learn its canonical key; everything after that runs
    /// inside the offering's critical section against freshly read data: the open-state gate,
    /// the existing-application lookup, the capacity check and the write.
    pub fn submit(
        &self,
        profile: &RecordRef,
        offering: &RecordRef,
        requested: Option<ApplicationStatus>,
    ) -> Result<SubmissionOutcome, ApplicationServiceError> {
        if let Some(status) = requested.filter(|status| status.is_terminal()) {
            return Err(SubmissionRejection::ReviewOnlyStatus(status).into());
        }
        let offering_key = offering.preferred()?;
        let profile_key = profile.preferred()?;

        let canonical = self
            .store
            .offering(&offering_key)?
            .ok_or(SubmissionRejection::OfferingNotFound)?
            .key();

        self.locks.with_lock(&canonical, || {
            self.submit_locked(profile, &profile_key, &canonical, requested)
        })
    }

    fn submit_locked(
        &self,
        profile: &RecordRef,
        profile_key: &RecordKey,
        offering_key: &RecordKey,
        requested: Option<ApplicationStatus>,
    ) -> Result<SubmissionOutcome, ApplicationServiceError> {
        let offering = self
            .store
            .offering(offering_key)?
            .ok_or(SubmissionRejection::OfferingNotFound)?;

        if let Err(reason) = EligibilityGate::check_open(&offering, &offering.academic_calendar) {
            info!(offering = %offering_key, ?reason, "submission rejected: offering not open");
            return Err(SubmissionRejection::NotOpen.into());
        }

        if let Some(existing) = self.store.find_for_pair(profile_key, offering_key)? {
            return self.update_existing(existing, requested);
        }

        let capacity = self.capacity.resolve_strict(&offering)?;
        if let Err(Ineligibility::Full) =
            EligibilityGate::evaluate(&offering, &offering.academic_calendar, &capacity)
        {
            info!(
                offering = %offering_key,
                used = capacity.used,
                capacity = ?capacity.capacity,
                "submission rejected: capacity exhausted"
            );
            return Err(SubmissionRejection::CapacityExceeded.into());
        }

        self.insert_new(profile, profile_key, &offering, requested)
    }

    fn insert_new(
        &self,
        profile: &RecordRef,
        profile_key: &RecordKey,
        offering: &ProgramOffering,
        requested: Option<ApplicationStatus>,
    ) -> Result<SubmissionOutcome, ApplicationServiceError> {
        let status = requested.unwrap_or(ApplicationStatus::Draft);
        let application = StudentApplication::new(
            next_application_id(),
            profile.clone(),
            offering,
            status,
            Utc::now(),
        );

        match self.store.insert(application) {
            Ok(stored) => {
                info!(
                    application_id = %stored.application_id,
                    offering = %offering.key(),
                    status = %stored.application_status,
                    "application created"
                );
                Ok(SubmissionOutcome {
                    application: stored,
                    created: true,
                })
            }
            Err(RepositoryError::Conflict) => {
                // Another writer created the pair outside this process; fold into an update.
                warn!(
                    offering = %offering.key(),
                    profile = %profile_key,
                    "insert conflicted with an existing application; updating in place"
                );
                let existing = self
                    .store
                    .find_for_pair(profile_key, &offering.key())?
                    .ok_or_else(|| {
                        ApplicationServiceError::StoreUnavailable(
                            "conflicting application could not be read back".to_string(),
                        )
                    })?;
                self.update_existing(existing, requested)
            }
            Err(other) => Err(other.into()),
        }
    }

    fn update_existing(
        &self,
        mut application: StudentApplication,
        requested: Option<ApplicationStatus>,
    ) -> Result<SubmissionOutcome, ApplicationServiceError> {
        let next = requested.unwrap_or(application.application_status);
        application.transition(next, Utc::now())?;
        self.store.update(application.clone())?;

        info!(
            application_id = %application.application_id,
            status = %application.application_status,
            "application updated"
        );
        Ok(SubmissionOutcome {
            application,
            created: false,
        })
    }

    /// Downstream review decision on an existing application.
    pub fn review(
        &self,
        application_id: &ApplicationId,
        decision: ApplicationStatus,
    ) -> Result<StudentApplication, ApplicationServiceError> {
        let located = self.application(application_id)?;
        let offering_key = self.filed_offering(&located.program_offering)?.key();

        self.locks.with_lock(&offering_key, || {
            let current = self.application(application_id)?;
            self.update_existing(current, Some(decision))
                .map(|outcome| outcome.application)
        })
    }

    /// Offering an application was filed against. The stored reference was written from the
    /// offering record, so its numeric id is used when the document id is unusable.
    fn filed_offering(
        &self,
        reference: &RecordRef,
    ) -> Result<ProgramOffering, ApplicationServiceError> {
        let key = match (reference.preferred(), reference.id) {
            (Ok(key), _) => key,
            (Err(_), Some(id)) => RecordKey::Numeric(id),
            (Err(invalid), None) => return Err(invalid.into()),
        };
        self.store
            .offering(&key)?
            .ok_or_else(|| SubmissionRejection::OfferingNotFound.into())
    }

    pub fn application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<StudentApplication, ApplicationServiceError> {
        self.store
            .fetch(application_id)?
            .ok_or(ApplicationServiceError::ApplicationNotFound)
    }

    pub fn resolve_profile(
        &self,
        user: &UserIdentity,
    ) -> Result<ResolvedProfile, ApplicationServiceError> {
        self.profiles
            .resolve_for_user(user)?
            .ok_or_else(|| SubmissionRejection::ProfileRequired.into())
    }

    /// Advisory seat usage for one offering. Count failures are absorbed.
    pub fn availability(
        &self,
        offering: &RecordKey,
    ) -> Result<OfferingAvailability, ApplicationServiceError> {
        let offering = self
            .store
            .offering(offering)?
            .ok_or(SubmissionRejection::OfferingNotFound)?;
        Ok(self.describe(&offering))
    }

    /// Offerings currently accepting applications, with advisory seat usage.
    pub fn open_offerings(&self) -> Result<Vec<OfferingAvailability>, ApplicationServiceError> {
        let offerings = self.store.offerings()?;
        Ok(offerings
            .iter()
            .map(|offering| self.describe(offering))
            .filter(|availability| availability.open)
            .collect())
    }

    fn describe(&self, offering: &ProgramOffering) -> OfferingAvailability {
        let capacity = self.capacity.resolve(offering);
        let open = EligibilityGate::is_eligible(offering, &offering.academic_calendar, &capacity);
        OfferingAvailability {
            offering: offering.reference(),
            program: offering.program.clone(),
            batch: offering.batch.clone(),
            open,
            capacity,
        }
    }
}

/// Business rejections, each surfaced to the caller with its own message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionRejection {
    #[error("an applicant profile is required before applying")]
    ProfileRequired,
    #[error("program offering not found")]
    OfferingNotFound,
    #[error("program offering is not open for applications")]
    NotOpen,
    #[error("program offering has no remaining seats")]
    CapacityExceeded,
    #[error("{0} is a review outcome and cannot be requested by the applicant")]
    ReviewOnlyStatus(ApplicationStatus),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl SubmissionRejection {
    pub const fn reason(&self) -> &'static str {
        match self {
            SubmissionRejection::ProfileRequired => "profile_required",
            SubmissionRejection::OfferingNotFound => "offering_not_found",
            SubmissionRejection::NotOpen => "not_open",
            SubmissionRejection::CapacityExceeded => "capacity_exceeded",
            SubmissionRejection::ReviewOnlyStatus(_) => "review_only_status",
            SubmissionRejection::InvalidTransition(_) => "invalid_transition",
        }
    }
}

/// Error raised by the admission service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Rejected(#[from] SubmissionRejection),
    #[error(transparent)]
    InvalidReference(#[from] InvalidReference),
    #[error("application not found")]
    ApplicationNotFound,
    #[error("admission store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<InvalidTransition> for ApplicationServiceError {
    fn from(value: InvalidTransition) -> Self {
        Self::Rejected(SubmissionRejection::InvalidTransition(value))
    }
}

impl From<RepositoryError> for ApplicationServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Unavailable(message) => Self::StoreUnavailable(message),
            RepositoryError::NotFound => Self::ApplicationNotFound,
            RepositoryError::Conflict => {
                Self::StoreUnavailable("unexpected write conflict".to_string())
            }
        }
    }
}
