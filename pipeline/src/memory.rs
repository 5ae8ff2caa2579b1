// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! In-memory reference implementations of the adapter traits.
//!
//! These back the test suites and mirror the semantics of the real
//! backends: reads of absent keys fail with `NotFound`, quarantine flags an
//! existing object in place, credential puts overwrite, and user upserts
//! replace the whole configuration. Inspection accessors expose the state
//! the production adapters would leave behind in AWS.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::adapters::{CredentialStore, EndpointAdmin, ObjectStore};
use crate::errors::{CredentialStoreError, EndpointError, ObjectStoreError, RejectReason};
use crate::models::{SecretFields, UserConfig};

/// Object store over a map, with optional per-key read failure injection.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    quarantined: RwLock<BTreeMap<String, String>>,
    unreadable: RwLock<BTreeSet<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.objects.write().await.insert(key.into(), bytes.into());
    }

    /// Makes every read of `key` fail with an I/O fault until the object is
    /// inserted again.
    pub async fn make_unreadable(&self, key: impl Into<String>) {
        self.unreadable.write().await.insert(key.into());
    }

    pub async fn is_quarantined(&self, key: &str) -> bool {
        self.quarantined.read().await.contains_key(key)
    }

    /// The reason tag an object was quarantined with, if any.
    pub async fn quarantine_reason(&self, key: &str) -> Option<String> {
        self.quarantined.read().await.get(key).cloned()
    }

    pub async fn quarantined_keys(&self) -> Vec<String> {
        self.quarantined.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn read(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        if self.unreadable.read().await.contains(key) {
            return Err(ObjectStoreError::io(
                "GetObject",
                key,
                std::io::Error::other("injected read failure"),
            ));
        }
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| ObjectStoreError::not_found(key))
    }

    async fn quarantine(&self, key: &str, reason: &RejectReason) -> Result<(), ObjectStoreError> {
        // mirrors tagging semantics: flagging a vanished object fails
        if !self.objects.read().await.contains_key(key) {
            return Err(ObjectStoreError::not_found(key));
        }
        self.quarantined
            .write()
            .await
            .insert(key.to_string(), reason.tag().to_string());
        Ok(())
    }
}

/// Credential store over a map, counting writes for idempotency checks.
#[derive(Default)]
pub struct MemoryCredentialStore {
    secrets: RwLock<BTreeMap<String, SecretFields>>,
    writes: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, name: impl Into<String>, fields: SecretFields) {
        self.secrets.write().await.insert(name.into(), fields);
    }

    pub async fn stored(&self, name: &str) -> Option<SecretFields> {
        self.secrets.read().await.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        self.secrets.read().await.keys().cloned().collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn put(&self, name: &str, fields: &SecretFields) -> Result<(), CredentialStoreError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.secrets
            .write()
            .await
            .insert(name.to_string(), fields.clone());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<SecretFields, CredentialStoreError> {
        self.secrets
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| CredentialStoreError::not_found(name))
    }
}

/// A host key the endpoint accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedHostKey {
    pub server_id: String,
    pub host_key_id: String,
    pub private_key_openssh: String,
}

/// Transfer endpoint over maps: imported host keys, per-connector trust
/// sets and per-server user configurations.
#[derive(Default)]
pub struct MemoryEndpointAdmin {
    host_keys: RwLock<Vec<ImportedHostKey>>,
    trusted: RwLock<BTreeMap<String, BTreeSet<String>>>,
    users: RwLock<BTreeMap<(String, String), UserConfig>>,
    upserts: AtomicUsize,
}

impl MemoryEndpointAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn imported_host_keys(&self) -> Vec<ImportedHostKey> {
        self.host_keys.read().await.clone()
    }

    pub async fn trusted_keys(&self, connector_id: &str) -> BTreeSet<String> {
        self.trusted
            .read()
            .await
            .get(connector_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn user(&self, server_id: &str, user_name: &str) -> Option<UserConfig> {
        self.users
            .read()
            .await
            .get(&(server_id.to_string(), user_name.to_string()))
            .cloned()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EndpointAdmin for MemoryEndpointAdmin {
    async fn import_host_key(
        &self,
        server_id: &str,
        private_key_openssh: &str,
    ) -> Result<String, EndpointError> {
        let mut host_keys = self.host_keys.write().await;
        // the real endpoint refuses duplicate material; surface that as a
        // quiet upsert returning the existing id
        if let Some(existing) = host_keys
            .iter()
            .find(|hk| hk.server_id == server_id && hk.private_key_openssh == private_key_openssh)
        {
            return Ok(existing.host_key_id.clone());
        }
        let host_key_id = format!("hk-{:04}", host_keys.len() + 1);
        host_keys.push(ImportedHostKey {
            server_id: server_id.to_string(),
            host_key_id: host_key_id.clone(),
            private_key_openssh: private_key_openssh.to_string(),
        });
        Ok(host_key_id)
    }

    async fn trust_connector_host_key(
        &self,
        connector_id: &str,
        public_key_openssh: &str,
    ) -> Result<(), EndpointError> {
        self.trusted
            .write()
            .await
            .entry(connector_id.to_string())
            .or_default()
            .insert(public_key_openssh.to_string());
        Ok(())
    }

    async fn upsert_user(&self, server_id: &str, user: &UserConfig) -> Result<(), EndpointError> {
        self.upserts.fetch_add(1, Ordering::Relaxed);
        self.users
            .write()
            .await
            .insert((server_id.to_string(), user.user_name.clone()), user.clone());
        Ok(())
    }
}
