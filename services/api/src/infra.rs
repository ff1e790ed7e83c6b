use admission_portal::config::CatalogConfig;
use admission_portal::workflows::admissions::{
    seed_store, AcademicCalendar, ApplicantProfile, InMemoryAdmissionStore, ProgramOffering,
    RepositoryError, SeedError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Build the process-local store, loading any configured CSV exports.
pub(crate) fn catalog_store(catalog: &CatalogConfig) -> Result<InMemoryAdmissionStore, SeedError> {
    let store = InMemoryAdmissionStore::default();
    seed_store(
        &store,
        catalog.offerings_csv.as_deref(),
        catalog.profiles_csv.as_deref(),
    )?;
    Ok(store)
}

pub(crate) const SAMPLE_OFFERING: &str = "bsc-cs-fall-2025";

/// Seed one limited offering plus `applicants` profiles linked to users 1..=applicants.
pub(crate) fn seed_sample_catalog(
    store: &InMemoryAdmissionStore,
    seats: Option<u32>,
    applicants: u64,
) -> Result<(), RepositoryError> {
    store.put_offering(ProgramOffering {
        id: 1,
        document_id: Some(SAMPLE_OFFERING.to_string()),
        program: "BSc Computer Science".to_string(),
        batch: "Fall 2025".to_string(),
        is_open_for_apply: true,
        capacity: seats,
        academic_calendar: AcademicCalendar {
            id: 1,
            document_id: Some("ay-2025-26".to_string()),
            is_active: true,
        },
        application_count: None,
    })?;

    for id in 1..=applicants {
        store.put_profile(ApplicantProfile {
            id,
            document_id: Some(format!("applicant-{id:03}")),
            user_id: Some(id),
            user_email: Some(format!("applicant{id}@example.edu")),
            email: None,
            legacy_user_id: None,
            full_name: format!("Sample Applicant {id}"),
        })?;
    }
    Ok(())
}
