//! Identity resolution: external principal -> internal user

use super::directory::{DirectoryProfile, IdentityDirectory};
use crate::domain::{NewUser, User};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::UserRepository;
use actix_middleware::Principal;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserRepository>,
    directory: Arc<dyn IdentityDirectory>,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserRepository>, directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { users, directory }
    }

    /// Internal id of the calling user.
    ///
    /// Anonymous callers resolve to `None`; an authenticated principal that
    /// was never synced is `NotFound`.
    pub async fn resolve_current_user(
        &self,
        principal: Option<&Principal>,
    ) -> ServiceResult<Option<Uuid>> {
        let Some(principal) = principal else {
            return Ok(None);
        };

        match self.users.find_by_external_id(&principal.subject).await? {
            Some(user) => Ok(Some(user.id)),
            None => Err(ServiceError::NotFound(
                "user not found; sync the identity first".to_string(),
            )),
        }
    }

    /// Viewer for read-only queries: an unsynced principal reads as anonymous
    pub async fn viewer(&self, principal: Option<&Principal>) -> ServiceResult<Option<Uuid>> {
        match self.resolve_current_user(principal).await {
            Err(ServiceError::NotFound(_)) => Ok(None),
            other => other,
        }
    }

    /// Like [`Self::resolve_current_user`] but anonymous callers are rejected
    pub async fn require_current_user(&self, principal: Option<&Principal>) -> ServiceResult<Uuid> {
        self.resolve_current_user(principal)
            .await?
            .ok_or_else(|| ServiceError::Unauthenticated("sign in required".to_string()))
    }

    /// Full record of the synced caller
    pub async fn current_user(&self, principal: &Principal) -> ServiceResult<User> {
        self.users
            .find_by_external_id(&principal.subject)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("user not found; sync the identity first".to_string())
            })
    }

    /// Create the internal user for `principal` on first sight.
    ///
    /// Idempotent: an existing user is returned unchanged.
    pub async fn sync_identity(&self, principal: &Principal) -> ServiceResult<User> {
        if let Some(existing) = self.users.find_by_external_id(&principal.subject).await? {
            return Ok(existing);
        }

        let profile = self.directory.fetch_profile(&principal.subject).await?;
        let new_user = new_user_from_profile(&principal.subject, profile)?;
        let handle = new_user.handle.clone();

        match self.users.insert(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, handle = %user.handle, "User synced");
                Ok(user)
            }
            Err(ServiceError::Conflict(msg)) => {
                // a concurrent sync of the same principal won the insert
                match self.users.find_by_external_id(&principal.subject).await? {
                    Some(user) => {
                        tracing::debug!(user_id = %user.id, "User already synced");
                        Ok(user)
                    }
                    None => {
                        tracing::warn!(handle = %handle, "Handle taken by another account");
                        Err(ServiceError::Conflict(msg))
                    }
                }
            }
            Err(e) => Err(e),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Derive the stored name and handle from the directory profile
fn new_user_from_profile(subject: &str, profile: DirectoryProfile) -> ServiceResult<NewUser> {
    let email = non_blank(profile.primary_email);

    let name_parts: Vec<String> = [profile.first_name, profile.last_name]
        .into_iter()
        .filter_map(non_blank)
        .collect();
    let name = if name_parts.is_empty() {
        None
    } else {
        Some(name_parts.join(" "))
    };

    let handle = non_blank(profile.username)
        .or_else(|| {
            email
                .as_deref()
                .and_then(|e| e.split('@').next())
                .map(str::to_string)
                .filter(|local| !local.is_empty())
        })
        .ok_or_else(|| {
            ServiceError::Validation(
                "identity has neither a username nor an email address".to_string(),
            )
        })?;

    Ok(NewUser {
        external_id: subject.to_string(),
        email,
        name,
        handle,
        image: non_blank(profile.image_url),
    })
}
