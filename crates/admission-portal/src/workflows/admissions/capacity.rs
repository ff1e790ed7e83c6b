use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::domain::ProgramOffering;
use super::repository::{ApplicationRepository, RepositoryError};

/// Seat usage for one offering at the moment it was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityView {
    pub capacity: Option<u32>,
    pub used: u32,
    /// `None` when the offering has unlimited seats.
    pub remaining: Option<u32>,
    /// Set when the count query failed and `used` is the zero default.
    pub degraded: bool,
}

impl CapacityView {
    pub fn new(capacity: Option<u32>, used: u32) -> Self {
        Self {
            capacity,
            used,
            remaining: capacity.map(|seats| seats.saturating_sub(used)),
            degraded: false,
        }
    }

    fn degraded(capacity: Option<u32>) -> Self {
        Self {
            degraded: true,
            ..Self::new(capacity, 0)
        }
    }

    pub fn has_room(&self) -> bool {
        self.capacity.map_or(true, |seats| self.used < seats)
    }
}

/// Derives seat usage from a count query against the application store. Display reads may
/// short-cut through a count embedded in the offering record.
pub struct CapacityResolver<R: ?Sized> {
    applications: Arc<R>,
}

impl<R> CapacityResolver<R>
where
    R: ApplicationRepository + ?Sized,
{
    pub fn new(applications: Arc<R>) -> Self {
        Self { applications }
    }

    /// Advisory read for display paths. An embedded count is taken as-is; otherwise a failed
    /// count is reported as `used = 0` with `degraded` set, which can only overstate availability.
    pub fn resolve(&self, offering: &ProgramOffering) -> CapacityView {
        if let Some(count) = offering.application_count {
            return CapacityView::new(offering.capacity, count);
        }
        match self.resolve_strict(offering) {
            Ok(view) => view,
            Err(error) => {
                warn!(
                    offering = %offering.key(),
                    %error,
                    "application count unavailable; reporting approximate capacity"
                );
                CapacityView::degraded(offering.capacity)
            }
        }
    }

    /// Read used by the submission path. Always counts live seat-holding applications, since an
    /// embedded count is a snapshot the store does not maintain; store failures propagate.
    pub fn resolve_strict(
        &self,
        offering: &ProgramOffering,
    ) -> Result<CapacityView, RepositoryError> {
        let used = self.applications.count_for_offering(&offering.key())?;
        Ok(CapacityView::new(offering.capacity, used))
    }
}
