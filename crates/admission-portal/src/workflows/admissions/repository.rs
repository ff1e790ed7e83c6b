use super::domain::{ApplicantProfile, ApplicationId, ProgramOffering, StudentApplication};
use super::identity::RecordKey;

/// Read access to offerings and their calendars.
pub trait OfferingRepository: Send + Sync {
    fn offering(&self, key: &RecordKey) -> Result<Option<ProgramOffering>, RepositoryError>;
    fn offerings(&self) -> Result<Vec<ProgramOffering>, RepositoryError>;
}

/// Profile lookups, one linkage field at a time.
pub trait ProfileRepository: Send + Sync {
    fn find(&self, query: &ProfileQuery) -> Result<Vec<ApplicantProfile>, RepositoryError>;
}

/// Application storage. Implementations must reject an insert for a (profile, offering) pair
/// that already has an application with [`RepositoryError::Conflict`].
pub trait ApplicationRepository: Send + Sync {
    /// Count the seat-holding applications filed against an offering.
    fn count_for_offering(&self, offering: &RecordKey) -> Result<u32, RepositoryError>;
    fn find_for_pair(
        &self,
        profile: &RecordKey,
        offering: &RecordKey,
    ) -> Result<Option<StudentApplication>, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<StudentApplication>, RepositoryError>;
    fn insert(
        &self,
        application: StudentApplication,
    ) -> Result<StudentApplication, RepositoryError>;
    fn update(&self, application: StudentApplication) -> Result<(), RepositoryError>;
}

/// Everything the admission services need from the backing store.
pub trait AdmissionStore: OfferingRepository + ProfileRepository + ApplicationRepository {}

impl<T> AdmissionStore for T where T: OfferingRepository + ProfileRepository + ApplicationRepository {}

/// Exact-match filter over a single profile linkage field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileQuery {
    UserRelation(u64),
    Email(String),
    LegacyUserId(String),
    UserEmail(String),
}

impl ProfileQuery {
    pub fn matches(&self, profile: &ApplicantProfile) -> bool {
        match self {
            ProfileQuery::UserRelation(id) => profile.user_id == Some(*id),
            ProfileQuery::Email(email) => profile.email.as_deref() == Some(email.as_str()),
            ProfileQuery::LegacyUserId(id) => {
                profile.legacy_user_id.as_deref() == Some(id.as_str())
            }
            ProfileQuery::UserEmail(email) => {
                profile.user_email.as_deref() == Some(email.as_str())
            }
        }
    }
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
