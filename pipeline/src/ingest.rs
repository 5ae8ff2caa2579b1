// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Continuous ingestion of uploaded key material.
//!
//! One invocation handles one object-created event. The flow is
//! re-derivable from storage alone, which is what makes duplicate and
//! concurrent deliveries safe: no state survives an invocation, every
//! external write is an idempotent upsert, and the pair join is recomputed
//! from the bucket on every event.
//!
//! An upload can end in exactly four ways: ignored (not ours), deferred
//! (valid half, counterpart not there yet), quarantined (flagged in place,
//! never deleted) or propagated (endpoint plus credential store updated).

use std::collections::BTreeSet;
use std::sync::Arc;

use ssh_key::{PrivateKey, PublicKey};

use crate::adapters::{CredentialStore, EndpointAdmin, ObjectStore};
use crate::constants::MAX_KEY_OBJECT_BYTES;
use crate::errors::{IngestError, ObjectStoreError, PropagationError, RejectReason};
use crate::keys;
use crate::models::{IngestOutcome, KeyKind, KeyRole, PipelineSettings, SecretFields, UserConfig};
use crate::naming::{self, Classification, KeyObjectName};

#[derive(Clone)]
pub struct IngestProcessor {
    store: Arc<dyn ObjectStore>,
    credentials: Arc<dyn CredentialStore>,
    endpoint: Arc<dyn EndpointAdmin>,
    settings: PipelineSettings,
}

impl IngestProcessor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        credentials: Arc<dyn CredentialStore>,
        endpoint: Arc<dyn EndpointAdmin>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            credentials,
            endpoint,
            settings,
        }
    }

    /// Processes one object-created event to a terminal outcome.
    ///
    /// Returns `Err` only for transient faults worth redelivering; invalid
    /// uploads come back as [`IngestOutcome::Quarantined`].
    #[tracing::instrument(skip(self))]
    pub async fn process(&self, key: &str) -> Result<IngestOutcome, IngestError> {
        // 1. Classify by prefix and extension
        let name = match naming::classify(key) {
            Classification::Foreign => {
                tracing::debug!("[ingest] {} is not key material, ignoring", key);
                return Ok(IngestOutcome::Ignored {
                    key: key.to_string(),
                });
            }
            Classification::Unrecognized { key } => {
                tracing::warn!("[ingest] {} does not name a key, quarantining", key);
                return self
                    .quarantine_one(
                        key,
                        RejectReason::MalformedKey {
                            detail: "unrecognized object name".to_string(),
                        },
                    )
                    .await;
            }
            Classification::Recognized(name) => name,
        };

        // 2. Read the uploaded object; a vanished or unreadable object is
        //    transient and the event should come around again
        let bytes = match self.store.read(&name.key).await {
            Ok(bytes) => bytes,
            Err(source) => {
                return Err(IngestError::TransientRead {
                    key: name.key,
                    source,
                });
            }
        };
        if bytes.len() > MAX_KEY_OBJECT_BYTES {
            return self
                .quarantine_one(
                    name.key,
                    RejectReason::MalformedKey {
                        detail: "object too large to be key material".to_string(),
                    },
                )
                .await;
        }

        // 3. Parse the uploaded half before looking for its counterpart:
        //    a malformed upload is quarantined even while it is alone
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                return self
                    .quarantine_one(
                        name.key,
                        RejectReason::MalformedKey {
                            detail: "not valid UTF-8".to_string(),
                        },
                    )
                    .await;
            }
        };
        match name.role {
            KeyRole::Public => match keys::parse_public_key(text.as_bytes()) {
                Ok(public) => self.join_with_private(&name, public, text).await,
                Err(err) => {
                    self.quarantine_one(
                        name.key,
                        RejectReason::MalformedKey {
                            detail: err.to_string(),
                        },
                    )
                    .await
                }
            },
            KeyRole::Private => match keys::parse_private_key(text.as_bytes()) {
                Ok(private) => self.join_with_public(&name, private, text).await,
                Err(err) => {
                    self.quarantine_one(
                        name.key,
                        RejectReason::MalformedKey {
                            detail: err.to_string(),
                        },
                    )
                    .await
                }
            },
        }
    }

    /// The uploaded half was public; find and parse the private half.
    async fn join_with_private(
        &self,
        name: &KeyObjectName,
        public: PublicKey,
        public_text: String,
    ) -> Result<IngestOutcome, IngestError> {
        let candidates = name.counterpart_keys();
        let Some((counterpart_key, bytes)) = self.read_counterpart(&candidates).await? else {
            tracing::debug!("[ingest] {} is waiting for its private half", name.key);
            return Ok(IngestOutcome::Deferred {
                key: name.key.clone(),
                missing: candidates,
            });
        };

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                return self
                    .quarantine_counterpart(name, counterpart_key, "not valid UTF-8".to_string())
                    .await;
            }
        };
        match keys::parse_private_key(text.as_bytes()) {
            Ok(private) => {
                self.complete(name, counterpart_key, public, public_text, private, text)
                    .await
            }
            Err(err) => {
                self.quarantine_counterpart(name, counterpart_key, err.to_string())
                    .await
            }
        }
    }

    /// The uploaded half was private; find and parse the public half.
    async fn join_with_public(
        &self,
        name: &KeyObjectName,
        private: PrivateKey,
        private_text: String,
    ) -> Result<IngestOutcome, IngestError> {
        let candidates = name.counterpart_keys();
        let Some((counterpart_key, bytes)) = self.read_counterpart(&candidates).await? else {
            tracing::debug!("[ingest] {} is waiting for its public half", name.key);
            return Ok(IngestOutcome::Deferred {
                key: name.key.clone(),
                missing: candidates,
            });
        };

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                return self
                    .quarantine_counterpart(name, counterpart_key, "not valid UTF-8".to_string())
                    .await;
            }
        };
        match keys::parse_public_key(text.as_bytes()) {
            Ok(public) => {
                self.complete(name, counterpart_key, public, text, private, private_text)
                    .await
            }
            Err(err) => {
                self.quarantine_counterpart(name, counterpart_key, err.to_string())
                    .await
            }
        }
    }

    /// Returns the first companion object that exists.
    ///
    /// Absent candidates are skipped; read faults propagate as transient so
    /// the join is retried intact.
    async fn read_counterpart(
        &self,
        candidates: &[String],
    ) -> Result<Option<(String, Vec<u8>)>, IngestError> {
        for candidate in candidates {
            match self.store.read(candidate).await {
                Ok(bytes) => return Ok(Some((candidate.clone(), bytes))),
                Err(ObjectStoreError::NotFound { .. }) => {}
                Err(source) => {
                    return Err(IngestError::TransientRead {
                        key: candidate.clone(),
                        source,
                    });
                }
            }
        }
        Ok(None)
    }

    /// Both halves are parsed; prove they belong together and push them out.
    async fn complete(
        &self,
        name: &KeyObjectName,
        counterpart_key: String,
        public: PublicKey,
        public_text: String,
        private: PrivateKey,
        private_text: String,
    ) -> Result<IngestOutcome, IngestError> {
        // 4. The pairing proof; file naming alone is not trusted
        if !keys::is_pair(&public, &private) {
            tracing::warn!(
                "[ingest] {} and {} are not a pair, quarantining both",
                name.key,
                counterpart_key
            );
            self.flag(&name.key, &RejectReason::KeyMismatch).await?;
            self.flag(&counterpart_key, &RejectReason::KeyMismatch).await?;
            return Ok(IngestOutcome::Quarantined {
                keys: vec![name.key.clone(), counterpart_key],
                reason: RejectReason::KeyMismatch,
            });
        }

        // 5. Idempotent propagation
        match name.kind {
            KeyKind::Host => self.propagate_host(&public_text, private_text).await,
            KeyKind::User => {
                self.propagate_user(&name.logical_name, &public_text, private_text)
                    .await
            }
        }
    }

    /// Installs a validated host pair: server import, connector trust,
    /// secret under the server id.
    async fn propagate_host(
        &self,
        public_text: &str,
        private_text: String,
    ) -> Result<IngestOutcome, IngestError> {
        let server_id = &self.settings.server_id;

        let host_key_id = self
            .endpoint
            .import_host_key(server_id, &private_text)
            .await
            .map_err(PropagationError::from)?;
        tracing::info!("[ingest] imported host key {} on {}", host_key_id, server_id);

        match &self.settings.connector_id {
            Some(connector_id) => {
                self.endpoint
                    .trust_connector_host_key(connector_id, public_text.trim())
                    .await
                    .map_err(PropagationError::from)?;
            }
            None => {
                tracing::debug!("[ingest] no connector configured, skipping host key trust");
            }
        }

        let secret_name = naming::secret_name(&self.settings.stage, server_id);
        self.credentials
            .put(
                &secret_name,
                &SecretFields {
                    username: server_id.clone(),
                    public_key: public_text.trim().to_string(),
                    private_key: private_text,
                },
            )
            .await
            .map_err(PropagationError::from)?;

        Ok(IngestOutcome::Propagated {
            kind: KeyKind::Host,
            logical_name: server_id.clone(),
            secret_name,
        })
    }

    /// Installs a validated user pair: endpoint user upsert, secret under
    /// the user name.
    async fn propagate_user(
        &self,
        user_name: &str,
        public_text: &str,
        private_text: String,
    ) -> Result<IngestOutcome, IngestError> {
        let user_config = UserConfig {
            user_name: user_name.to_string(),
            role_arn: self.settings.user_role_arn.clone(),
            home_bucket: self.settings.sftp_bucket.clone(),
            public_keys: BTreeSet::from([public_text.trim().to_string()]),
        };
        self.endpoint
            .upsert_user(&self.settings.server_id, &user_config)
            .await
            .map_err(PropagationError::from)?;
        tracing::info!(
            "[ingest] upserted user {} on {}",
            user_name,
            self.settings.server_id
        );

        let secret_name = naming::secret_name(&self.settings.stage, user_name);
        self.credentials
            .put(
                &secret_name,
                &SecretFields {
                    username: user_name.to_string(),
                    public_key: public_text.trim().to_string(),
                    private_key: private_text,
                },
            )
            .await
            .map_err(PropagationError::from)?;

        Ok(IngestOutcome::Propagated {
            kind: KeyKind::User,
            logical_name: user_name.to_string(),
            secret_name,
        })
    }

    /// A counterpart that exists but does not parse is flagged right away;
    /// the uploaded half stays pending until a corrected counterpart
    /// arrives and triggers its own event.
    async fn quarantine_counterpart(
        &self,
        name: &KeyObjectName,
        counterpart_key: String,
        detail: String,
    ) -> Result<IngestOutcome, IngestError> {
        tracing::warn!(
            "[ingest] counterpart {} of {} is malformed: {}",
            counterpart_key,
            name.key,
            detail
        );
        self.quarantine_one(counterpart_key, RejectReason::MalformedKey { detail })
            .await
    }

    async fn quarantine_one(
        &self,
        key: String,
        reason: RejectReason,
    ) -> Result<IngestOutcome, IngestError> {
        self.flag(&key, &reason).await?;
        Ok(IngestOutcome::Quarantined {
            keys: vec![key],
            reason,
        })
    }

    async fn flag(&self, key: &str, reason: &RejectReason) -> Result<(), IngestError> {
        self.store
            .quarantine(key, reason)
            .await
            .map_err(|source| IngestError::Quarantine {
                key: key.to_string(),
                source,
            })
    }
}
