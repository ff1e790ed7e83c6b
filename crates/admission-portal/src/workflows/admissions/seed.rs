use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::info;

use super::domain::{AcademicCalendar, ApplicantProfile, ProgramOffering};
use super::memory::InMemoryAdmissionStore;
use super::repository::RepositoryError;

/// Failure while loading catalog seed data.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("unable to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed seed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub fn parse_offerings<R: Read>(reader: R) -> Result<Vec<ProgramOffering>, SeedError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut offerings = Vec::new();

    for (index, record) in csv_reader.deserialize::<OfferingRow>().enumerate() {
        let row = record?;
        offerings.push(row.into_offering(index + 1)?);
    }

    Ok(offerings)
}

pub fn parse_profiles<R: Read>(reader: R) -> Result<Vec<ApplicantProfile>, SeedError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut profiles = Vec::new();

    for (index, record) in csv_reader.deserialize::<ProfileRow>().enumerate() {
        let row = record?;
        if row.id == 0 {
            return Err(SeedError::InvalidRow {
                row: index + 1,
                message: "profile id must be at least 1".to_string(),
            });
        }
        profiles.push(row.into_profile());
    }

    Ok(profiles)
}

/// Load whichever seed files are configured into `store`, returning (offerings, profiles).
pub fn seed_store(
    store: &InMemoryAdmissionStore,
    offerings_csv: Option<&Path>,
    profiles_csv: Option<&Path>,
) -> Result<(usize, usize), SeedError> {
    let mut offering_count = 0;
    if let Some(path) = offerings_csv {
        for offering in parse_offerings(open(path)?)? {
            store.put_offering(offering)?;
            offering_count += 1;
        }
    }

    let mut profile_count = 0;
    if let Some(path) = profiles_csv {
        for profile in parse_profiles(open(path)?)? {
            store.put_profile(profile)?;
            profile_count += 1;
        }
    }

    if offering_count + profile_count > 0 {
        info!(
            offerings = offering_count,
            profiles = profile_count,
            "seeded admission catalog"
        );
    }
    Ok((offering_count, profile_count))
}

fn open(path: &Path) -> Result<File, SeedError> {
    File::open(path).map_err(|source| SeedError::Open {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Deserialize)]
struct OfferingRow {
    id: u64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    document_id: Option<String>,
    program: String,
    batch: String,
    #[serde(deserialize_with = "flag")]
    is_open_for_apply: bool,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    capacity: Option<String>,
    calendar_id: u64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    calendar_document_id: Option<String>,
    #[serde(deserialize_with = "flag")]
    calendar_is_active: bool,
}

impl OfferingRow {
    fn into_offering(self, row: usize) -> Result<ProgramOffering, SeedError> {
        if self.id == 0 || self.calendar_id == 0 {
            return Err(SeedError::InvalidRow {
                row,
                message: "offering and calendar ids must be at least 1".to_string(),
            });
        }

        let capacity = self
            .capacity
            .map(|raw| {
                raw.parse::<u32>().map_err(|_| SeedError::InvalidRow {
                    row,
                    message: format!("capacity '{raw}' is not a seat count"),
                })
            })
            .transpose()?;

        Ok(ProgramOffering {
            id: self.id,
            document_id: self.document_id,
            program: self.program,
            batch: self.batch,
            is_open_for_apply: self.is_open_for_apply,
            capacity,
            academic_calendar: AcademicCalendar {
                id: self.calendar_id,
                document_id: self.calendar_document_id,
                is_active: self.calendar_is_active,
            },
            application_count: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: u64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    document_id: Option<String>,
    #[serde(default)]
    user_id: Option<u64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    user_email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    legacy_user_id: Option<String>,
    full_name: String,
}

impl ProfileRow {
    fn into_profile(self) -> ApplicantProfile {
        ApplicantProfile {
            id: self.id,
            document_id: self.document_id,
            user_id: self.user_id,
            user_email: self.user_email,
            email: self.email,
            legacy_user_id: self.legacy_user_id,
            full_name: self.full_name,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean flag, found '{other}'"
        ))),
    }
}
