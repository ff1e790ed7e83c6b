use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{RecordKey, RecordRef};

/// Identifier wrapper for stored applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Academic calendar an offering runs under. Offerings only accept applications while the
/// calendar is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicCalendar {
    pub id: u64,
    #[serde(default)]
    pub document_id: Option<String>,
    pub is_active: bool,
}

impl AcademicCalendar {
    pub fn reference(&self) -> RecordRef {
        RecordRef::new(Some(self.id), self.document_id.as_deref())
    }
}

/// A program x batch x calendar combination applicants can apply to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramOffering {
    pub id: u64,
    #[serde(default)]
    pub document_id: Option<String>,
    pub program: String,
    pub batch: String,
    pub is_open_for_apply: bool,
    /// `None` means unlimited seats.
    #[serde(default)]
    pub capacity: Option<u32>,
    pub academic_calendar: AcademicCalendar,
    /// Seat-holding application count when the store embeds it in the offering record.
    #[serde(default)]
    pub application_count: Option<u32>,
}

impl ProgramOffering {
    pub fn reference(&self) -> RecordRef {
        RecordRef::new(Some(self.id), self.document_id.as_deref())
    }

    /// Key used for locking and store filters. Falls back to the numeric id when the stored
    /// document id is unusable.
    pub fn key(&self) -> RecordKey {
        self.reference()
            .preferred()
            .unwrap_or(RecordKey::Numeric(self.id))
    }
}

/// Applicant biographical record. `user_id` is the owning-user relation; `email` and
/// `legacy_user_id` only link records created before that relation existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub id: u64,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub legacy_user_id: Option<String>,
    pub full_name: String,
}

impl ApplicantProfile {
    pub fn reference(&self) -> RecordRef {
        RecordRef::new(Some(self.id), self.document_id.as_deref())
    }
}

/// Authenticated caller as handed over by the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: u64,
    #[serde(default)]
    pub email: Option<String>,
}

/// Application lifecycle: `Draft -> Submitted -> {Approved, Rejected}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "Draft",
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    const fn stage(self) -> u8 {
        match self {
            ApplicationStatus::Draft => 0,
            ApplicationStatus::Submitted => 1,
            ApplicationStatus::Approved | ApplicationStatus::Rejected => 2,
        }
    }

    pub const fn is_terminal(self) -> bool {
        self.stage() == 2
    }

    /// Rejected applications release their seat.
    pub const fn holds_seat(self) -> bool {
        !matches!(self, ApplicationStatus::Rejected)
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self == next || (!self.is_terminal() && next.stage() > self.stage())
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Attempted status change that the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move application from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

/// Stored application for one (profile, offering) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentApplication {
    pub application_id: ApplicationId,
    pub student_profile: RecordRef,
    pub program_offering: RecordRef,
    pub academic_calendar: RecordRef,
    pub application_status: ApplicationStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl StudentApplication {
    /// Start a new application. Anything other than a draft counts as submitted now.
    pub fn new(
        application_id: ApplicationId,
        profile: RecordRef,
        offering: &ProgramOffering,
        status: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> Self {
        let submitted_at = (status != ApplicationStatus::Draft).then_some(now);
        Self {
            application_id,
            student_profile: profile,
            program_offering: offering.reference(),
            academic_calendar: offering.academic_calendar.reference(),
            application_status: status,
            submitted_at,
            updated_at: now,
        }
    }

    /// Apply a status write. `submitted_at` is stamped the first time the application leaves
    /// `Draft` and never changes afterwards.
    pub fn transition(
        &mut self,
        next: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        let current = self.application_status;
        if !current.can_transition_to(next) {
            return Err(InvalidTransition {
                from: current,
                to: next,
            });
        }
        if next != ApplicationStatus::Draft && self.submitted_at.is_none() {
            self.submitted_at = Some(now);
        }
        self.application_status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn view(&self) -> ApplicationView {
        ApplicationView {
            application_id: self.application_id.clone(),
            status: self.application_status.label(),
            student_profile: self.student_profile.clone(),
            program_offering: self.program_offering.clone(),
            academic_calendar: self.academic_calendar.clone(),
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
        }
    }
}

/// Serialized shape of an application exposed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub student_profile: RecordRef,
    pub program_offering: RecordRef,
    pub academic_calendar: RecordRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
