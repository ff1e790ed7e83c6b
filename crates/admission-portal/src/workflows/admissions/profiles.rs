use std::sync::Arc;

use tracing::debug;

use super::domain::{ApplicantProfile, UserIdentity};
use super::repository::{ProfileQuery, ProfileRepository, RepositoryError};

/// One way of linking an authenticated user to a profile record. Returning `None` skips the
/// strategy for this user (e.g. no email on the session).
pub trait ProfileLinkage: Send + Sync {
    fn name(&self) -> &'static str;
    fn query(&self, user: &UserIdentity) -> Option<ProfileQuery>;
}

/// Owning-user relation.
pub struct UserRelationLinkage;

impl ProfileLinkage for UserRelationLinkage {
    fn name(&self) -> &'static str {
        "user_relation"
    }

    fn query(&self, user: &UserIdentity) -> Option<ProfileQuery> {
        Some(ProfileQuery::UserRelation(user.id))
    }
}

/// Email copied onto the profile itself.
pub struct ProfileEmailLinkage;

impl ProfileLinkage for ProfileEmailLinkage {
    fn name(&self) -> &'static str {
        "profile_email"
    }

    fn query(&self, user: &UserIdentity) -> Option<ProfileQuery> {
        session_email(user).map(ProfileQuery::Email)
    }
}

/// User id stored as a plain string before the relation existed.
pub struct LegacyUserIdLinkage;

impl ProfileLinkage for LegacyUserIdLinkage {
    fn name(&self) -> &'static str {
        "legacy_user_id"
    }

    fn query(&self, user: &UserIdentity) -> Option<ProfileQuery> {
        Some(ProfileQuery::LegacyUserId(user.id.to_string()))
    }
}

/// Email on the related user record.
pub struct UserEmailLinkage;

impl ProfileLinkage for UserEmailLinkage {
    fn name(&self) -> &'static str {
        "user_email"
    }

    fn query(&self, user: &UserIdentity) -> Option<ProfileQuery> {
        session_email(user).map(ProfileQuery::UserEmail)
    }
}

fn session_email(user: &UserIdentity) -> Option<String> {
    user.email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
}

/// Profile found for a user together with the linkage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub profile: ApplicantProfile,
    pub linkage: &'static str,
}

/// Maps an authenticated user to exactly one applicant profile.
pub struct ProfileResolver<P: ?Sized> {
    profiles: Arc<P>,
    linkages: Vec<Box<dyn ProfileLinkage>>,
}

impl<P> ProfileResolver<P>
where
    P: ProfileRepository + ?Sized,
{
    /// Relation id, then profile email, then legacy string id, then the related user's email.
    pub fn new(profiles: Arc<P>) -> Self {
        Self::with_linkages(
            profiles,
            vec![
                Box::new(UserRelationLinkage),
                Box::new(ProfileEmailLinkage),
                Box::new(LegacyUserIdLinkage),
                Box::new(UserEmailLinkage),
            ],
        )
    }

    pub fn with_linkages(profiles: Arc<P>, linkages: Vec<Box<dyn ProfileLinkage>>) -> Self {
        Self { profiles, linkages }
    }

    /// `Ok(None)` means the user has no profile yet, which is not a store failure.
    pub fn resolve_for_user(
        &self,
        user: &UserIdentity,
    ) -> Result<Option<ResolvedProfile>, RepositoryError> {
        for linkage in &self.linkages {
            let Some(query) = linkage.query(user) else {
                continue;
            };

            // Duplicates resolve to the oldest record.
            let found = self
                .profiles
                .find(&query)?
                .into_iter()
                .min_by_key(|profile| profile.id);

            if let Some(profile) = found {
                debug!(
                    user_id = user.id,
                    profile_id = profile.id,
                    linkage = linkage.name(),
                    "resolved applicant profile"
                );
                return Ok(Some(ResolvedProfile {
                    profile,
                    linkage: linkage.name(),
                }));
            }
        }

        Ok(None)
    }
}
