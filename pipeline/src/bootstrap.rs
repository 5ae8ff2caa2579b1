// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! One-time provisioning of the endpoint's host key pair and first user.
//!
//! The handler is convergent rather than guarded: every run resolves both
//! pairs (explicitly provided material first, then whatever the credential
//! store already holds, then fresh generation), validates them fully before
//! the first write, and then either stops because nothing changed or runs
//! the whole idempotent propagation sequence. Retrying after a partial
//! failure is always safe because every step is an upsert.

use std::collections::BTreeSet;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::adapters::{CredentialStore, EndpointAdmin};
use crate::constants::DEFAULT_USER_NAME;
use crate::errors::{BootstrapError, CredentialStoreError, PropagationError};
use crate::keys;
use crate::models::{
    BootstrapAction, BootstrapOutput, BootstrapRequest, BootstrapTrigger, KeyKind,
    ProvidedKeyMaterial, SecretFields, UserConfig,
};
use crate::naming;

/// Where a resolved pair came from. `Stored` pairs require no propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairOrigin {
    Provided,
    Stored,
    Generated,
}

struct ResolvedPair {
    public_openssh: String,
    private_openssh: Zeroizing<String>,
    origin: PairOrigin,
}

#[derive(Clone)]
pub struct BootstrapHandler {
    credentials: Arc<dyn CredentialStore>,
    endpoint: Arc<dyn EndpointAdmin>,
}

impl BootstrapHandler {
    pub fn new(credentials: Arc<dyn CredentialStore>, endpoint: Arc<dyn EndpointAdmin>) -> Self {
        Self {
            credentials,
            endpoint,
        }
    }

    /// Runs one provisioning request to completion.
    ///
    /// Nothing is written until both pairs have been resolved and
    /// validated; an invalid pair aborts with the stores untouched.
    #[tracing::instrument(skip(self, request))]
    pub async fn handle(&self, request: &BootstrapRequest) -> Result<BootstrapOutput, BootstrapError> {
        let settings = &request.settings;
        let user_name = request
            .user_name
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
        let physical_id = request
            .physical_id
            .clone()
            .unwrap_or_else(|| naming::bootstrap_physical_id(&settings.stage));
        let host_secret_name = naming::secret_name(&settings.stage, &settings.server_id);
        let user_secret_name = naming::secret_name(&settings.stage, &user_name);

        // 1. Delete never destroys key material; deprovisioning secrets is a
        //    deliberate operator action.
        if request.trigger == BootstrapTrigger::Delete {
            tracing::info!(
                "[bootstrap] delete acknowledged for {}, secrets and endpoint state left in place",
                physical_id
            );
            return Ok(BootstrapOutput {
                physical_id,
                action: BootstrapAction::Deleted,
                user_name,
                host_secret_name,
                user_secret_name,
                host_key_id: None,
            });
        }

        // 2. Resolve and validate both pairs before any write.
        let host = self
            .resolve_pair(
                KeyKind::Host,
                request.host_material.as_ref(),
                &host_secret_name,
                &settings.server_id,
            )
            .await?;
        let user = self
            .resolve_pair(
                KeyKind::User,
                request.user_material.as_ref(),
                &user_secret_name,
                &user_name,
            )
            .await?;

        // 3. Both pairs already live in the credential store: this is a
        //    replay or a no-change update.
        if host.origin == PairOrigin::Stored && user.origin == PairOrigin::Stored {
            tracing::info!(
                "[bootstrap] {} and {} already provisioned, nothing to do",
                host_secret_name,
                user_secret_name
            );
            return Ok(BootstrapOutput {
                physical_id,
                action: BootstrapAction::Reused,
                user_name,
                host_secret_name,
                user_secret_name,
                host_key_id: None,
            });
        }

        // 4. Idempotent propagation: endpoint first, then the records that
        //    make a rerun converge.
        let host_key_id = self
            .endpoint
            .import_host_key(&settings.server_id, &host.private_openssh)
            .await
            .map_err(PropagationError::from)?;
        tracing::debug!(
            "[bootstrap] imported host key {} on {}",
            host_key_id,
            settings.server_id
        );

        match &settings.connector_id {
            Some(connector_id) => {
                self.endpoint
                    .trust_connector_host_key(connector_id, &host.public_openssh)
                    .await
                    .map_err(PropagationError::from)?;
            }
            None => {
                tracing::debug!("[bootstrap] no connector configured, skipping host key trust");
            }
        }

        let user_config = UserConfig {
            user_name: user_name.clone(),
            role_arn: settings.user_role_arn.clone(),
            home_bucket: settings.sftp_bucket.clone(),
            public_keys: BTreeSet::from([user.public_openssh.clone()]),
        };
        self.endpoint
            .upsert_user(&settings.server_id, &user_config)
            .await
            .map_err(PropagationError::from)?;

        self.credentials
            .put(
                &host_secret_name,
                &SecretFields {
                    username: settings.server_id.clone(),
                    public_key: host.public_openssh.clone(),
                    private_key: host.private_openssh.to_string(),
                },
            )
            .await
            .map_err(PropagationError::from)?;
        self.credentials
            .put(
                &user_secret_name,
                &SecretFields {
                    username: user_name.clone(),
                    public_key: user.public_openssh.clone(),
                    private_key: user.private_openssh.to_string(),
                },
            )
            .await
            .map_err(PropagationError::from)?;

        tracing::info!(
            "[bootstrap] provisioned host pair ({:?}) and user pair ({:?}) for {}",
            host.origin,
            user.origin,
            settings.server_id
        );

        Ok(BootstrapOutput {
            physical_id,
            action: BootstrapAction::Provisioned,
            user_name,
            host_secret_name,
            user_secret_name,
            host_key_id: Some(host_key_id),
        })
    }

    /// Resolves one pair: request material, stored secret, fresh generation,
    /// in that order. Whatever the source, the pair leaves here validated.
    async fn resolve_pair(
        &self,
        kind: KeyKind,
        provided: Option<&ProvidedKeyMaterial>,
        secret_name: &str,
        comment: &str,
    ) -> Result<ResolvedPair, BootstrapError> {
        if let Some(material) = provided {
            let (public_openssh, private_openssh) =
                validate_material(kind, &material.public_key, &material.private_key)?;
            tracing::debug!("[bootstrap] using provided {} pair", kind);
            return Ok(ResolvedPair {
                public_openssh,
                private_openssh,
                origin: PairOrigin::Provided,
            });
        }

        match self.credentials.get(secret_name).await {
            Ok(fields) => {
                let (public_openssh, private_openssh) =
                    validate_material(kind, &fields.public_key, &fields.private_key).map_err(
                        |err| {
                            tracing::warn!("[bootstrap] stored secret {} is unusable: {}", secret_name, err);
                            BootstrapError::StoredPairInvalid {
                                kind,
                                name: secret_name.to_string(),
                            }
                        },
                    )?;
                tracing::debug!("[bootstrap] reusing stored {} pair from {}", kind, secret_name);
                Ok(ResolvedPair {
                    public_openssh,
                    private_openssh,
                    origin: PairOrigin::Stored,
                })
            }
            Err(CredentialStoreError::NotFound { .. }) => {
                let generated = keys::generate_keypair(comment)
                    .map_err(|source| BootstrapError::Generate { kind, source })?;
                tracing::info!("[bootstrap] generated fresh {} pair for {}", kind, comment);
                Ok(ResolvedPair {
                    public_openssh: generated.public_openssh,
                    private_openssh: generated.private_openssh,
                    origin: PairOrigin::Generated,
                })
            }
            Err(other) => Err(BootstrapError::Credentials(other)),
        }
    }
}

/// Parses and pair-checks serialized material, returning it normalized for
/// storage (single-line public key, PEM private key).
fn validate_material(
    kind: KeyKind,
    public_openssh: &str,
    private_openssh: &str,
) -> Result<(String, Zeroizing<String>), BootstrapError> {
    let public = keys::parse_public_key(public_openssh.as_bytes())
        .map_err(|source| BootstrapError::InvalidMaterial { kind, source })?;
    let private = keys::parse_private_key(private_openssh.as_bytes())
        .map_err(|source| BootstrapError::InvalidMaterial { kind, source })?;
    if !keys::is_pair(&public, &private) {
        return Err(BootstrapError::PairMismatch { kind });
    }
    Ok((
        public_openssh.trim().to_string(),
        Zeroizing::new(private_openssh.to_string()),
    ))
}
