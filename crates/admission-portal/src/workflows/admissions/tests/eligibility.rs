use super::common::*;

use crate::workflows::admissions::capacity::CapacityView;
use crate::workflows::admissions::eligibility::{EligibilityGate, Ineligibility};

#[test]
fn open_offering_with_seats_is_eligible() {
    let offering = offering(1, Some(2));
    let view = CapacityView::new(Some(2), 1);
    assert!(EligibilityGate::is_eligible(
        &offering,
        &offering.academic_calendar,
        &view
    ));
}

#[test]
fn closed_offering_is_rejected_first() {
    let mut offering = offering(1, Some(2));
    offering.is_open_for_apply = false;
    let full = CapacityView::new(Some(2), 2);

    assert_eq!(
        EligibilityGate::evaluate(&offering, &calendar(false), &full),
        Err(Ineligibility::ClosedForApplications)
    );
}

#[test]
fn inactive_calendar_closes_the_offering() {
    let offering = offering(1, Some(2));
    let view = CapacityView::new(Some(2), 0);

    assert_eq!(
        EligibilityGate::evaluate(&offering, &calendar(false), &view),
        Err(Ineligibility::CalendarInactive)
    );
}

#[test]
fn full_offering_is_not_eligible() {
    let offering = offering(1, Some(2));
    let view = CapacityView::new(Some(2), 2);

    assert_eq!(
        EligibilityGate::evaluate(&offering, &offering.academic_calendar, &view),
        Err(Ineligibility::Full)
    );
}

#[test]
fn unlimited_capacity_never_rejects_on_seats() {
    let offering = offering(1, None);
    let view = CapacityView::new(None, u32::MAX);

    assert!(EligibilityGate::is_eligible(
        &offering,
        &offering.academic_calendar,
        &view
    ));
}
