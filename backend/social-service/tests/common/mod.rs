#![allow(dead_code)]

use actix_middleware::Principal;
use async_trait::async_trait;
use cache_invalidation::StaleView;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use social_service::domain::User;
use social_service::error::{ServiceError, ServiceResult};
use social_service::repository::{MemoryStore, Repositories};
use social_service::services::{DirectoryProfile, IdentityDirectory, ImageStore, ViewInvalidator};
use social_service::AppState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const JWT_SECRET: &[u8] = b"integration-test-secret";

/// Collects every stale view the services report
#[derive(Default)]
pub struct RecordingInvalidator {
    views: Mutex<Vec<StaleView>>,
}

impl RecordingInvalidator {
    pub fn take(&self) -> Vec<StaleView> {
        std::mem::take(&mut *self.views.lock().unwrap())
    }
}

#[async_trait]
impl ViewInvalidator for RecordingInvalidator {
    async fn invalidate(&self, views: Vec<StaleView>) {
        self.views.lock().unwrap().extend(views);
    }
}

/// Directory answering from a fixed table of subjects
#[derive(Default)]
pub struct FakeDirectory {
    profiles: Mutex<HashMap<String, DirectoryProfile>>,
    lookups: Mutex<usize>,
}

impl FakeDirectory {
    pub fn register(&self, subject: &str, profile: DirectoryProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(subject.to_string(), profile);
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl IdentityDirectory for FakeDirectory {
    async fn fetch_profile(&self, subject: &str) -> ServiceResult<DirectoryProfile> {
        *self.lookups.lock().unwrap() += 1;
        self.profiles
            .lock()
            .unwrap()
            .get(subject)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("directory user {}", subject)))
    }
}

/// Image store that keeps objects in memory
#[derive(Default)]
pub struct FakeImageStore {
    objects: Mutex<Vec<(String, usize, String)>>,
}

impl FakeImageStore {
    /// (key, size, content type) of every stored object
    pub fn objects(&self) -> Vec<(String, usize, String)> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for FakeImageStore {
    async fn store(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> ServiceResult<String> {
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), bytes.len(), content_type.to_string()));
        Ok(format!("https://images.test/{}", key))
    }
}

/// Services over a fresh in-memory store
pub struct TestContext {
    pub store: MemoryStore,
    pub state: AppState,
    pub invalidator: Arc<RecordingInvalidator>,
    pub directory: Arc<FakeDirectory>,
    pub images: Arc<FakeImageStore>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let invalidator = Arc::new(RecordingInvalidator::default());
        let directory = Arc::new(FakeDirectory::default());
        let images = Arc::new(FakeImageStore::default());

        let state = AppState::new(
            Repositories::memory(store.clone()),
            directory.clone(),
            invalidator.clone(),
            Some(images.clone() as Arc<dyn ImageStore>),
        );

        Self {
            store,
            state,
            invalidator,
            directory,
            images,
        }
    }

    pub fn repos(&self) -> Repositories {
        Repositories::memory(self.store.clone())
    }

    /// Register `handle` in the directory and sync it as subject `user_{handle}`
    pub async fn sign_up(&self, handle: &str) -> User {
        let subject = subject_for(handle);
        self.directory.register(
            &subject,
            DirectoryProfile {
                first_name: Some(capitalize(handle)),
                username: Some(handle.to_string()),
                primary_email: Some(format!("{}@example.com", handle)),
                ..Default::default()
            },
        );
        self.state
            .identity
            .sync_identity(&Principal::new(subject))
            .await
            .unwrap()
    }
}

pub fn subject_for(handle: &str) -> String {
    format!("user_{}", handle)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Serialize)]
struct TestClaims<'a> {
    sub: &'a str,
    exp: usize,
}

/// HS256 bearer token for `subject`, valid for ten minutes
pub fn bearer_token(subject: &str) -> String {
    let exp = (std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 600) as usize;
    let token = encode(
        &Header::default(),
        &TestClaims { sub: subject, exp },
        &EncodingKey::from_secret(JWT_SECRET),
    )
    .unwrap();
    format!("Bearer {}", token)
}
