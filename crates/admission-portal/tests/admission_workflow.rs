//! Integration specifications for concurrent admission submissions.
//!
//! Scenarios drive the public service facade from many threads at once and then inspect the
//! store to confirm seat limits and per-pair uniqueness held throughout.

mod common {
    use std::sync::Arc;
    use std::time::Duration;

    use admission_portal::workflows::admissions::{
        AcademicCalendar, ApplicantProfile, ApplicationUpsertService, InMemoryAdmissionStore,
        ProgramOffering,
    };

    pub(super) fn offering(id: u64, capacity: Option<u32>) -> ProgramOffering {
        ProgramOffering {
            id,
            document_id: Some(format!("bsc-cs-{id}")),
            program: "BSc Computer Science".to_string(),
            batch: "2025".to_string(),
            is_open_for_apply: true,
            capacity,
            academic_calendar: AcademicCalendar {
                id: 1,
                document_id: Some("ay-2025".to_string()),
                is_active: true,
            },
            application_count: None,
        }
    }

    pub(super) fn applicant(id: u64) -> ApplicantProfile {
        ApplicantProfile {
            id,
            document_id: None,
            user_id: Some(1_000 + id),
            user_email: None,
            email: None,
            legacy_user_id: None,
            full_name: format!("Applicant {id}"),
        }
    }

    pub(super) fn service_with(
        offerings: Vec<ProgramOffering>,
        applicants: u64,
    ) -> (
        ApplicationUpsertService<InMemoryAdmissionStore>,
        Arc<InMemoryAdmissionStore>,
    ) {
        let store = InMemoryAdmissionStore::with_latency(Duration::from_millis(1));
        for offering in offerings {
            store.put_offering(offering).expect("offering stored");
        }
        for id in 1..=applicants {
            store.put_profile(applicant(id)).expect("profile stored");
        }
        let store = Arc::new(store);
        (ApplicationUpsertService::new(store.clone()), store)
    }
}

use std::collections::HashSet;
use std::thread;

use admission_portal::workflows::admissions::{
    ApplicationServiceError, ApplicationStatus, RecordRef, SubmissionRejection, UserIdentity,
};
use common::{offering, service_with};

fn user(profile_id: u64) -> UserIdentity {
    UserIdentity {
        id: 1_000 + profile_id,
        email: None,
    }
}

#[test]
fn many_applicants_never_exceed_capacity() {
    let (service, store) = service_with(vec![offering(1, Some(3))], 12);
    let target = RecordRef::from_document("bsc-cs-1");

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (1..=12)
            .map(|profile_id| {
                let service = &service;
                let target = &target;
                scope.spawn(move || {
                    service.submit_for_user(
                        &user(profile_id),
                        target,
                        Some(ApplicationStatus::Submitted),
                    )
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("submission thread"))
            .collect()
    });

    let accepted = results.iter().filter(|result| result.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|result| {
            matches!(
                result,
                Err(ApplicationServiceError::Rejected(
                    SubmissionRejection::CapacityExceeded
                ))
            )
        })
        .count();

    assert_eq!(accepted, 3);
    assert_eq!(rejected, 9);
    let stored = store.applications().expect("store readable");
    assert_eq!(stored.len(), 3);
}

#[test]
fn identical_concurrent_submissions_share_one_record() {
    let (service, store) = service_with(vec![offering(1, None)], 1);
    let target = RecordRef::from_id(1);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = &service;
                let target = &target;
                scope.spawn(move || service.submit_for_user(&user(1), target, None))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("submission thread"))
            .collect()
    });

    let outcomes: Vec<_> = results
        .into_iter()
        .map(|result| result.expect("every retry succeeds"))
        .collect();
    let created = outcomes.iter().filter(|outcome| outcome.created).count();
    let ids: HashSet<_> = outcomes
        .iter()
        .map(|outcome| outcome.application.application_id.clone())
        .collect();

    assert_eq!(created, 1);
    assert_eq!(ids.len(), 1);
    assert_eq!(store.applications().expect("store readable").len(), 1);
}

#[test]
fn offerings_are_serialized_independently() {
    let (service, store) = service_with(vec![offering(1, Some(1)), offering(2, Some(1))], 4);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (1..=4)
            .map(|profile_id| {
                let service = &service;
                let target = if profile_id % 2 == 0 {
                    RecordRef::from_document("bsc-cs-2")
                } else {
                    RecordRef::from_document("bsc-cs-1")
                };
                scope.spawn(move || service.submit_for_user(&user(profile_id), &target, None))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("submission thread"))
            .collect()
    });

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 2);
    let stored = store.applications().expect("store readable");
    let per_offering: HashSet<_> = stored
        .iter()
        .map(|application| application.program_offering.id)
        .collect();
    assert_eq!(per_offering.len(), 2);
}
