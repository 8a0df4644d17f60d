//! Identity directory lookups
//!
//! The identity provider owns sign-up and sessions. On first sync we ask its
//! directory for the profile fields we copy into our own user row.

use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

/// Profile fields known to the identity provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub primary_email: Option<String>,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Profile of the principal with the given subject
    async fn fetch_profile(&self, subject: &str) -> ServiceResult<DirectoryProfile>;
}

#[derive(Debug, Deserialize)]
struct DirectoryEmail {
    id: Option<String>,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct DirectoryUser {
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    image_url: Option<String>,
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<DirectoryEmail>,
}

impl From<DirectoryUser> for DirectoryProfile {
    fn from(user: DirectoryUser) -> Self {
        let primary = user
            .email_addresses
            .iter()
            .find(|e| e.id.is_some() && e.id == user.primary_email_address_id)
            .or_else(|| user.email_addresses.first())
            .map(|e| e.email_address.clone());

        DirectoryProfile {
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            primary_email: primary,
            image_url: user.image_url,
        }
    }
}

/// Directory client over the provider's backend HTTP API
/// (`GET {base_url}/v1/users/{subject}` with a bearer secret key)
pub struct HttpIdentityDirectory {
    client: Client,
    base_url: Url,
    secret_key: String,
}

impl HttpIdentityDirectory {
    pub fn new(base_url: &str, secret_key: &str, timeout: Duration) -> ServiceResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url)
            .map_err(|e| ServiceError::Directory(format!("Invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::Directory(format!(
                "Base URL {} cannot carry a path",
                base_url
            )));
        }
        Ok(Self {
            client,
            base_url,
            secret_key: secret_key.to_string(),
        })
    }

    /// Subject goes in as a single escaped path segment.
    fn user_url(&self, subject: &str) -> ServiceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Directory("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["v1", "users", subject]);
        Ok(url)
    }
}

#[async_trait]
impl IdentityDirectory for HttpIdentityDirectory {
    async fn fetch_profile(&self, subject: &str) -> ServiceResult<DirectoryProfile> {
        let url = self.user_url(subject)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| ServiceError::Directory(format!("Request failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(ServiceError::NotFound(format!(
                    "identity {} unknown to the directory",
                    subject
                )))
            }
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(ServiceError::Directory(format!("{}: {}", status, error_text)));
            }
        }

        let user = response
            .json::<DirectoryUser>()
            .await
            .map_err(|e| ServiceError::Directory(format!("Parse failed: {}", e)))?;

        Ok(user.into())
    }
}

/// Stand-in when no directory is configured
pub struct UnconfiguredDirectory;

#[async_trait]
impl IdentityDirectory for UnconfiguredDirectory {
    async fn fetch_profile(&self, _subject: &str) -> ServiceResult<DirectoryProfile> {
        Err(ServiceError::Unavailable(
            "identity directory is not configured".to_string(),
        ))
    }
}
