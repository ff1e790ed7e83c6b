use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::admissions::domain::{
    AcademicCalendar, ApplicantProfile, ApplicationId, ProgramOffering, StudentApplication,
};
use crate::workflows::admissions::identity::RecordKey;
use crate::workflows::admissions::memory::InMemoryAdmissionStore;
use crate::workflows::admissions::repository::{
    ApplicationRepository, OfferingRepository, ProfileQuery, ProfileRepository, RepositoryError,
};
use crate::workflows::admissions::{admission_router, ApplicationUpsertService, UserIdentity};

pub(super) fn calendar(is_active: bool) -> AcademicCalendar {
    AcademicCalendar {
        id: 1,
        document_id: Some("ay-2025-26".to_string()),
        is_active,
    }
}

pub(super) fn offering(id: u64, capacity: Option<u32>) -> ProgramOffering {
    ProgramOffering {
        id,
        document_id: Some(format!("offering-{id}")),
        program: "BSc Computer Science".to_string(),
        batch: "Fall 2025".to_string(),
        is_open_for_apply: true,
        capacity,
        academic_calendar: calendar(true),
        application_count: None,
    }
}

pub(super) fn profile(id: u64, user_id: Option<u64>) -> ApplicantProfile {
    ApplicantProfile {
        id,
        document_id: Some(format!("profile-{id}")),
        user_id,
        user_email: None,
        email: None,
        legacy_user_id: None,
        full_name: format!("Applicant {id}"),
    }
}

pub(super) fn user(id: u64) -> UserIdentity {
    UserIdentity { id, email: None }
}

pub(super) fn user_with_email(id: u64, email: &str) -> UserIdentity {
    UserIdentity {
        id,
        email: Some(email.to_string()),
    }
}

/// Store seeded with one offering and profiles linked to users 100 + n.
pub(super) fn seeded_store(capacity: Option<u32>, profiles: u64) -> Arc<InMemoryAdmissionStore> {
    let store = InMemoryAdmissionStore::default();
    store
        .put_offering(offering(1, capacity))
        .expect("offering stored");
    for id in 1..=profiles {
        store
            .put_profile(profile(id, Some(100 + id)))
            .expect("profile stored");
    }
    Arc::new(store)
}

pub(super) fn build_service(
    store: Arc<InMemoryAdmissionStore>,
) -> ApplicationUpsertService<InMemoryAdmissionStore> {
    ApplicationUpsertService::new(store)
}

pub(super) fn application_router_with_store(store: Arc<InMemoryAdmissionStore>) -> axum::Router {
    admission_router(Arc::new(build_service(store)))
}

pub(super) fn edit_offering(
    store: &InMemoryAdmissionStore,
    id: u64,
    edit: impl FnOnce(&mut ProgramOffering),
) {
    let mut current = store
        .offering(&RecordKey::Numeric(id))
        .expect("store reachable")
        .expect("offering exists");
    edit(&mut current);
    store.put_offering(current).expect("offering stored");
}

/// Wraps the in-memory store with switchable failure modes.
#[derive(Default)]
pub(super) struct FlakyStore {
    pub(super) inner: InMemoryAdmissionStore,
    pub(super) fail_counts: AtomicBool,
    pub(super) fail_profiles: AtomicBool,
    pub(super) fail_writes: AtomicBool,
    /// Hide existing pairs from the next lookup, as if another writer raced us.
    pub(super) hide_pair_once: AtomicBool,
}

impl FlakyStore {
    pub(super) fn wrapping(inner: InMemoryAdmissionStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }
}

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("backend offline".to_string())
}

impl OfferingRepository for FlakyStore {
    fn offering(&self, key: &RecordKey) -> Result<Option<ProgramOffering>, RepositoryError> {
        self.inner.offering(key)
    }

    fn offerings(&self) -> Result<Vec<ProgramOffering>, RepositoryError> {
        self.inner.offerings()
    }
}

impl ProfileRepository for FlakyStore {
    fn find(&self, query: &ProfileQuery) -> Result<Vec<ApplicantProfile>, RepositoryError> {
        if self.fail_profiles.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.inner.find(query)
    }
}

impl ApplicationRepository for FlakyStore {
    fn count_for_offering(&self, offering: &RecordKey) -> Result<u32, RepositoryError> {
        if self.fail_counts.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.inner.count_for_offering(offering)
    }

    fn find_for_pair(
        &self,
        profile: &RecordKey,
        offering: &RecordKey,
    ) -> Result<Option<StudentApplication>, RepositoryError> {
        if self.hide_pair_once.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_for_pair(profile, offering)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<StudentApplication>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn insert(
        &self,
        application: StudentApplication,
    ) -> Result<StudentApplication, RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.inner.insert(application)
    }

    fn update(&self, application: StudentApplication) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.inner.update(application)
    }
}

pub(super) fn flaky_store(capacity: Option<u32>, profiles: u64) -> Arc<FlakyStore> {
    let seeded = seeded_store(capacity, profiles);
    Arc::new(FlakyStore::wrapping(seeded.as_ref().clone()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
