// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Narrow adapter traits for the three external collaborators.
//!
//! The pipeline core only ever talks to object storage, the credential
//! store and the transfer endpoint through these traits, so the whole flow
//! runs against the in-memory implementations in [`crate::memory`] without
//! any cloud dependency. Every operation visible here is an idempotent
//! upsert or a read; none of the implementations retry internally, faults
//! surface as-is with operation context and the caller decides.

use async_trait::async_trait;

use crate::errors::{CredentialStoreError, EndpointError, ObjectStoreError, RejectReason};
use crate::models::{SecretFields, UserConfig};

/// Read access to the watched key bucket, plus the quarantine flag.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the full content of an object.
    async fn read(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Flags an object as quarantined, in place. Quarantine never deletes:
    /// the material stays put for a human to inspect.
    async fn quarantine(&self, key: &str, reason: &RejectReason) -> Result<(), ObjectStoreError>;
}

/// The secrets store holding one record per logical key name.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Creates or overwrites the record under `name`.
    async fn put(&self, name: &str, fields: &SecretFields) -> Result<(), CredentialStoreError>;

    /// Returns the record under `name`, or
    /// [`CredentialStoreError::NotFound`].
    async fn get(&self, name: &str) -> Result<SecretFields, CredentialStoreError>;
}

/// Administrative surface of the managed transfer endpoint.
#[async_trait]
pub trait EndpointAdmin: Send + Sync {
    /// Installs `private_key_openssh` as the server's host key and returns
    /// the endpoint-assigned key id. Re-importing replaces the active key;
    /// the endpoint keeps the history.
    async fn import_host_key(
        &self,
        server_id: &str,
        private_key_openssh: &str,
    ) -> Result<String, EndpointError>;

    /// Adds `public_key_openssh` to the connector's trusted host keys.
    /// Adding a key that is already trusted is a no-op.
    async fn trust_connector_host_key(
        &self,
        connector_id: &str,
        public_key_openssh: &str,
    ) -> Result<(), EndpointError>;

    /// Creates the user or replaces its configuration wholesale, including
    /// the full authorized-key set.
    async fn upsert_user(&self, server_id: &str, user: &UserConfig) -> Result<(), EndpointError>;
}
