use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use super::domain::{ApplicantProfile, ApplicationId, ProgramOffering, StudentApplication};
use super::identity::RecordKey;
use super::repository::{
    ApplicationRepository, OfferingRepository, ProfileQuery, ProfileRepository, RepositoryError,
};

/// Process-local admission store. Enforces the (profile, offering) uniqueness constraint on
/// insert; an optional per-call latency simulates a remote backend.
#[derive(Default, Clone)]
pub struct InMemoryAdmissionStore {
    offerings: Arc<Mutex<BTreeMap<u64, ProgramOffering>>>,
    profiles: Arc<Mutex<BTreeMap<u64, ApplicantProfile>>>,
    applications: Arc<Mutex<BTreeMap<ApplicationId, StudentApplication>>>,
    latency: Option<Duration>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
}

impl InMemoryAdmissionStore {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    fn round_trip(&self) {
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }
    }

    pub fn put_offering(&self, offering: ProgramOffering) -> Result<(), RepositoryError> {
        lock(&self.offerings)?.insert(offering.id, offering);
        Ok(())
    }

    pub fn put_profile(&self, profile: ApplicantProfile) -> Result<(), RepositoryError> {
        lock(&self.profiles)?.insert(profile.id, profile);
        Ok(())
    }

    pub fn applications(&self) -> Result<Vec<StudentApplication>, RepositoryError> {
        Ok(lock(&self.applications)?.values().cloned().collect())
    }
}

impl OfferingRepository for InMemoryAdmissionStore {
    fn offering(&self, key: &RecordKey) -> Result<Option<ProgramOffering>, RepositoryError> {
        self.round_trip();
        let offerings = lock(&self.offerings)?;
        Ok(offerings
            .values()
            .find(|offering| offering.reference().matches(key))
            .cloned())
    }

    fn offerings(&self) -> Result<Vec<ProgramOffering>, RepositoryError> {
        self.round_trip();
        Ok(lock(&self.offerings)?.values().cloned().collect())
    }
}

impl ProfileRepository for InMemoryAdmissionStore {
    fn find(&self, query: &ProfileQuery) -> Result<Vec<ApplicantProfile>, RepositoryError> {
        self.round_trip();
        let profiles = lock(&self.profiles)?;
        Ok(profiles
            .values()
            .filter(|profile| query.matches(profile))
            .cloned()
            .collect())
    }
}

fn same_pair(left: &StudentApplication, right: &StudentApplication) -> bool {
    left.student_profile.same_record(&right.student_profile)
        && left.program_offering.same_record(&right.program_offering)
}

impl ApplicationRepository for InMemoryAdmissionStore {
    fn count_for_offering(&self, offering: &RecordKey) -> Result<u32, RepositoryError> {
        self.round_trip();
        let applications = lock(&self.applications)?;
        let count = applications
            .values()
            .filter(|application| application.program_offering.matches(offering))
            .filter(|application| application.application_status.holds_seat())
            .count();
        u32::try_from(count)
            .map_err(|_| RepositoryError::Unavailable("application count overflow".to_string()))
    }

    fn find_for_pair(
        &self,
        profile: &RecordKey,
        offering: &RecordKey,
    ) -> Result<Option<StudentApplication>, RepositoryError> {
        self.round_trip();
        let applications = lock(&self.applications)?;
        Ok(applications
            .values()
            .find(|application| {
                application.student_profile.matches(profile)
                    && application.program_offering.matches(offering)
            })
            .cloned())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<StudentApplication>, RepositoryError> {
        self.round_trip();
        Ok(lock(&self.applications)?.get(id).cloned())
    }

    fn insert(
        &self,
        application: StudentApplication,
    ) -> Result<StudentApplication, RepositoryError> {
        self.round_trip();
        let mut applications = lock(&self.applications)?;
        let duplicate = applications.contains_key(&application.application_id)
            || applications
                .values()
                .any(|existing| same_pair(existing, &application));
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        applications.insert(application.application_id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: StudentApplication) -> Result<(), RepositoryError> {
        self.round_trip();
        let mut applications = lock(&self.applications)?;
        match applications.get_mut(&application.application_id) {
            Some(slot) => {
                *slot = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}
