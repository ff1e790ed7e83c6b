use serde::Serialize;

use super::capacity::CapacityView;
use super::domain::{AcademicCalendar, ProgramOffering};

/// First condition that keeps an offering from accepting new applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ineligibility {
    ClosedForApplications,
    CalendarInactive,
    Full,
}

/// Decides whether an offering is open for new submissions.
pub struct EligibilityGate;

impl EligibilityGate {
    pub fn is_eligible(
        offering: &ProgramOffering,
        calendar: &AcademicCalendar,
        capacity: &CapacityView,
    ) -> bool {
        Self::evaluate(offering, calendar, capacity).is_ok()
    }

    /// Checks run in a fixed order: the offering flag, the calendar, then seats.
    pub fn evaluate(
        offering: &ProgramOffering,
        calendar: &AcademicCalendar,
        capacity: &CapacityView,
    ) -> Result<(), Ineligibility> {
        Self::check_open(offering, calendar)?;
        if offering.capacity.is_some() && !capacity.has_room() {
            return Err(Ineligibility::Full);
        }
        Ok(())
    }

    /// The state-only half of the gate, independent of seat usage.
    pub fn check_open(
        offering: &ProgramOffering,
        calendar: &AcademicCalendar,
    ) -> Result<(), Ineligibility> {
        if !offering.is_open_for_apply {
            return Err(Ineligibility::ClosedForApplications);
        }
        if !calendar.is_active {
            return Err(Ineligibility::CalendarInactive);
        }
        Ok(())
    }
}
