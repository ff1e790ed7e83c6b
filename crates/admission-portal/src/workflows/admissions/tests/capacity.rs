use super::common::*;
use chrono::Utc;
use std::sync::atomic::Ordering;

use crate::workflows::admissions::capacity::{CapacityResolver, CapacityView};
use crate::workflows::admissions::domain::{ApplicationId, ApplicationStatus, StudentApplication};
use crate::workflows::admissions::identity::RecordRef;
use crate::workflows::admissions::repository::ApplicationRepository;

fn file_application(
    store: &impl ApplicationRepository,
    id: &str,
    profile_id: u64,
    offering_id: u64,
    status: ApplicationStatus,
) {
    let application = StudentApplication::new(
        ApplicationId(id.to_string()),
        RecordRef::from_id(profile_id),
        &offering(offering_id, Some(10)),
        status,
        Utc::now(),
    );
    store.insert(application).expect("insert succeeds");
}

#[test]
fn advisory_reads_use_the_embedded_count_without_querying_the_store() {
    let store = flaky_store(Some(5), 0);
    store.fail_counts.store(true, Ordering::SeqCst);
    let resolver = CapacityResolver::new(store);

    let mut embedded = offering(1, Some(5));
    embedded.application_count = Some(3);

    let view = resolver.resolve(&embedded);
    assert_eq!(view, CapacityView::new(Some(5), 3));
    assert_eq!(view.remaining, Some(2));
    assert!(!view.degraded);
}

#[test]
fn strict_reads_ignore_a_stale_embedded_count() {
    let store = seeded_store(Some(2), 0);
    file_application(store.as_ref(), "a", 1, 1, ApplicationStatus::Submitted);
    file_application(store.as_ref(), "b", 2, 1, ApplicationStatus::Draft);
    let resolver = CapacityResolver::new(store);

    let mut stale = offering(1, Some(2));
    stale.application_count = Some(0);

    let view = resolver
        .resolve_strict(&stale)
        .expect("live count succeeds");
    assert_eq!(view.used, 2);
    assert!(!view.has_room());
}

#[test]
fn falls_back_to_counting_seat_holding_applications() {
    let store = seeded_store(Some(5), 0);
    file_application(store.as_ref(), "a", 1, 1, ApplicationStatus::Draft);
    file_application(store.as_ref(), "b", 2, 1, ApplicationStatus::Submitted);
    file_application(store.as_ref(), "c", 3, 1, ApplicationStatus::Rejected);
    file_application(store.as_ref(), "d", 4, 2, ApplicationStatus::Submitted);
    let resolver = CapacityResolver::new(store);

    let view = resolver.resolve(&offering(1, Some(5)));

    assert_eq!(view.used, 2);
    assert_eq!(view.remaining, Some(3));
    assert!(!view.degraded);
}

#[test]
fn count_query_matches_numeric_offerings_without_document_ids() {
    let store = seeded_store(None, 0);
    let mut numeric_only = offering(9, Some(4));
    numeric_only.document_id = None;
    let application = StudentApplication::new(
        ApplicationId("numeric".to_string()),
        RecordRef::from_id(1),
        &numeric_only,
        ApplicationStatus::Submitted,
        Utc::now(),
    );
    store.insert(application).expect("insert succeeds");

    let view = CapacityResolver::new(store).resolve(&numeric_only);

    assert_eq!(view.used, 1);
}

#[test]
fn remaining_never_goes_negative() {
    let store = seeded_store(None, 0);
    let resolver = CapacityResolver::new(store);

    let mut overfull = offering(1, Some(3));
    overfull.application_count = Some(5);

    let view = resolver.resolve(&overfull);
    assert_eq!(view.used, 5);
    assert_eq!(view.remaining, Some(0));
    assert!(!view.has_room());
}

#[test]
fn unlimited_offerings_report_unbounded_remaining() {
    let store = seeded_store(None, 0);
    let resolver = CapacityResolver::new(store);

    let mut unlimited = offering(1, None);
    unlimited.application_count = Some(10_000);

    let view = resolver.resolve(&unlimited);
    assert_eq!(view.capacity, None);
    assert_eq!(view.remaining, None);
    assert!(view.has_room());
}

#[test]
fn advisory_reads_absorb_count_failures() {
    let store = flaky_store(Some(2), 0);
    file_application(&store.inner, "a", 1, 1, ApplicationStatus::Submitted);
    file_application(&store.inner, "b", 2, 1, ApplicationStatus::Submitted);
    store.fail_counts.store(true, Ordering::SeqCst);
    let resolver = CapacityResolver::new(store);

    let view = resolver.resolve(&offering(1, Some(2)));
    assert!(view.degraded);
    assert_eq!(view.used, 0);
    assert_eq!(view.remaining, Some(2));

    assert!(resolver.resolve_strict(&offering(1, Some(2))).is_err());
}
