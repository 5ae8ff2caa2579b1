// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Error types for the key pipeline.
//!
//! Adapter faults (`ObjectStoreError`, `CredentialStoreError`,
//! `EndpointError`) always carry the operation name, the identifier it was
//! invoked with, and the underlying cause. Business rejections
//! ([`RejectReason`]) are a separate type and never mixed into the fault
//! enums: a malformed upload is an outcome, not an error.

use serde::Serialize;

use crate::models::{KeyKind, KeyRole};

/// A boxed error type for source chain tracking.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures while parsing or producing OpenSSH key material.
#[derive(thiserror::Error, Debug)]
pub enum KeyError {
    #[error("{role} key is not valid UTF-8")]
    Encoding { role: KeyRole },
    #[error("{role} key is malformed")]
    Malformed {
        role: KeyRole,
        #[source]
        source: ssh_key::Error,
    },
    #[error("private key is passphrase-protected and cannot be validated")]
    EncryptedPrivateKey,
    #[error("key generation failed")]
    Generate {
        #[source]
        source: ssh_key::Error,
    },
}

/// Why an uploaded object was quarantined.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RejectReason {
    #[error("malformed key: {detail}")]
    MalformedKey { detail: String },
    #[error("public and private halves are not a pair")]
    KeyMismatch,
}

impl RejectReason {
    /// Short machine-readable form, safe for object tag values.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::MalformedKey { .. } => "malformed-key",
            Self::KeyMismatch => "key-mismatch",
        }
    }
}

/// Faults from the object storage adapter.
#[derive(thiserror::Error, Debug)]
pub enum ObjectStoreError {
    #[error("object not found: {key}")]
    NotFound { key: String },
    #[error("object store {operation} failed for {key}")]
    Io {
        operation: &'static str,
        key: String,
        #[source]
        source: BoxError,
    },
}

impl ObjectStoreError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn io(
        operation: &'static str,
        key: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Io {
            operation,
            key: key.into(),
            source: Box::new(source),
        }
    }
}

/// Faults from the credential store adapter.
#[derive(thiserror::Error, Debug)]
pub enum CredentialStoreError {
    #[error("secret not found: {name}")]
    NotFound { name: String },
    #[error("credential store {operation} failed for {name}")]
    Io {
        operation: &'static str,
        name: String,
        #[source]
        source: BoxError,
    },
}

impl CredentialStoreError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn io(
        operation: &'static str,
        name: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Io {
            operation,
            name: name.into(),
            source: Box::new(source),
        }
    }
}

/// Faults from the transfer endpoint adapter.
#[derive(thiserror::Error, Debug)]
pub enum EndpointError {
    #[error("endpoint {operation} failed for {entity}")]
    Io {
        operation: &'static str,
        entity: String,
        #[source]
        source: BoxError,
    },
}

impl EndpointError {
    pub fn io(
        operation: &'static str,
        entity: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Io {
            operation,
            entity: entity.into(),
            source: Box::new(source),
        }
    }
}

/// A failure while pushing a validated pair out to the endpoint or the
/// credential store. Always retryable by re-running the whole sequence;
/// every step is an idempotent upsert.
#[derive(thiserror::Error, Debug)]
pub enum PropagationError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error(transparent)]
    Credentials(#[from] CredentialStoreError),
}

/// Failures of the one-time provisioning flow.
///
/// Anything that comes back before the first write means no state was
/// touched; propagation failures are resolved by re-running the bootstrap.
#[derive(thiserror::Error, Debug)]
pub enum BootstrapError {
    #[error("provided {kind} key material is invalid")]
    InvalidMaterial {
        kind: KeyKind,
        #[source]
        source: KeyError,
    },
    #[error("provided {kind} public and private keys are not a pair")]
    PairMismatch { kind: KeyKind },
    #[error("stored secret {name} no longer holds a valid {kind} key pair")]
    StoredPairInvalid { kind: KeyKind, name: String },
    #[error("failed to generate {kind} key pair")]
    Generate {
        kind: KeyKind,
        #[source]
        source: KeyError,
    },
    #[error(transparent)]
    Credentials(#[from] CredentialStoreError),
    #[error(transparent)]
    Propagation(#[from] PropagationError),
}

/// Failures of a single ingest invocation.
///
/// All of these are transient from the caller's point of view: the event
/// should be redelivered and the invocation re-run. Invalid uploads are not
/// errors; they surface as [`crate::models::IngestOutcome::Quarantined`].
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("transient read failure for {key}")]
    TransientRead {
        key: String,
        #[source]
        source: ObjectStoreError,
    },
    #[error("failed to quarantine {key}")]
    Quarantine {
        key: String,
        #[source]
        source: ObjectStoreError,
    },
    #[error(transparent)]
    Propagation(#[from] PropagationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_tags_are_object_tag_safe() {
        let reasons = [
            RejectReason::MalformedKey {
                detail: "x".to_string(),
            },
            RejectReason::KeyMismatch,
        ];
        for reason in &reasons {
            assert!(
                reason
                    .tag()
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
            );
        }
    }

    #[test]
    fn test_adapter_errors_keep_the_identifier() {
        let err = ObjectStoreError::not_found("ssh_keys/alice.pub");
        assert_eq!(err.to_string(), "object not found: ssh_keys/alice.pub");

        let err = CredentialStoreError::io(
            "PutSecretValue",
            "dev/SFTPSecrets/alice",
            std::io::Error::other("throttled"),
        );
        assert!(err.to_string().contains("dev/SFTPSecrets/alice"));
        assert!(err.to_string().contains("PutSecretValue"));
    }
}
