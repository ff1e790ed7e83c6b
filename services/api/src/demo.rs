use crate::infra::{seed_sample_catalog, SAMPLE_OFFERING};
use admission_portal::error::AppError;
use admission_portal::workflows::admissions::{
    ApplicationServiceError, ApplicationStatus, ApplicationUpsertService, InMemoryAdmissionStore,
    RecordKey, RecordRef, SeedError, SubmissionRejection, UserIdentity,
};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of applicants submitting at the same time
    #[arg(long, default_value_t = 8)]
    pub(crate) applicants: u64,
    /// Seats on the contested offering (omit for unlimited)
    #[arg(long)]
    pub(crate) seats: Option<u32>,
    /// Simulated store round-trip in milliseconds
    #[arg(long, default_value_t = 5)]
    pub(crate) latency_ms: u64,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DemoTally {
    pub(crate) created: usize,
    pub(crate) updated: usize,
    pub(crate) capacity_exceeded: usize,
    pub(crate) other_failures: usize,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        applicants,
        seats,
        latency_ms,
    } = args;

    let store = InMemoryAdmissionStore::with_latency(Duration::from_millis(latency_ms));
    seed_sample_catalog(&store, seats, applicants).map_err(SeedError::from)?;
    let service = Arc::new(ApplicationUpsertService::new(Arc::new(store)));

    println!("Admission contention demo");
    println!(
        "  offering: {SAMPLE_OFFERING} ({} seats), applicants: {applicants}",
        seats.map_or_else(|| "unlimited".to_string(), |seats| seats.to_string())
    );

    let tally = race_for_seats(service.clone(), applicants).await;
    println!(
        "  created: {}, updated: {}, capacity exceeded: {}, other failures: {}",
        tally.created, tally.updated, tally.capacity_exceeded, tally.other_failures
    );

    let availability = tokio::task::spawn_blocking(move || {
        service.availability(&RecordKey::Document(SAMPLE_OFFERING.to_string()))
    })
    .await
    .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))?;

    match availability {
        Ok(view) => println!(
            "  seats used: {}, remaining: {}",
            view.capacity.used,
            view.capacity
                .remaining
                .map_or_else(|| "unlimited".to_string(), |left| left.to_string())
        ),
        Err(error) => println!("  capacity unavailable: {error}"),
    }

    Ok(())
}

/// Submit one application per sample applicant concurrently.
pub(crate) async fn race_for_seats(
    service: Arc<ApplicationUpsertService<InMemoryAdmissionStore>>,
    applicants: u64,
) -> DemoTally {
    let offering = RecordRef::from_document(SAMPLE_OFFERING);
    let handles: Vec<_> = (1..=applicants)
        .map(|user_id| {
            let service = service.clone();
            let offering = offering.clone();
            tokio::task::spawn_blocking(move || {
                let user = UserIdentity {
                    id: user_id,
                    email: None,
                };
                service.submit_for_user(&user, &offering, Some(ApplicationStatus::Submitted))
            })
        })
        .collect();

    let mut tally = DemoTally::default();
    for handle in handles {
        match handle.await {
            Ok(Ok(outcome)) if outcome.created => tally.created += 1,
            Ok(Ok(_)) => tally.updated += 1,
            Ok(Err(ApplicationServiceError::Rejected(SubmissionRejection::CapacityExceeded))) => {
                tally.capacity_exceeded += 1
            }
            Ok(Err(_)) | Err(_) => tally.other_failures += 1,
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn race_admits_exactly_the_seat_count() {
        let store = InMemoryAdmissionStore::with_latency(Duration::from_millis(1));
        seed_sample_catalog(&store, Some(3), 10).expect("sample catalog");
        let service = Arc::new(ApplicationUpsertService::new(Arc::new(store)));

        let tally = race_for_seats(service, 10).await;

        assert_eq!(
            tally,
            DemoTally {
                created: 3,
                updated: 0,
                capacity_exceeded: 7,
                other_failures: 0,
            }
        );
    }

    #[tokio::test]
    async fn unlimited_offering_admits_everyone() {
        let store = InMemoryAdmissionStore::default();
        seed_sample_catalog(&store, None, 5).expect("sample catalog");
        let service = Arc::new(ApplicationUpsertService::new(Arc::new(store)));

        let tally = race_for_seats(service, 5).await;

        assert_eq!(tally.created, 5);
        assert_eq!(tally.capacity_exceeded, 0);
    }
}
