// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::BTreeSet;

use async_trait::async_trait;
use aws_sdk_transfer::types::{HomeDirectoryType, SftpConnectorConfig, Tag};
use sftp_key_pipeline::adapters::EndpointAdmin;
use sftp_key_pipeline::errors::EndpointError;
use sftp_key_pipeline::models::UserConfig;
use ssh_key::{HashAlg, PrivateKey};

use crate::constants::{CREATED_BY_TAG_KEY, CREATED_BY_TAG_VALUE};

/// Managed SFTP endpoint administration via the Transfer Family API.
///
/// Every operation is an upsert: conflicts from concurrent or redelivered
/// events resolve to the state a single delivery would have produced.
#[derive(Debug, Clone)]
pub struct TransferAdmin {
    client: aws_sdk_transfer::Client,
}

impl TransferAdmin {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_transfer::Client::new(config),
        }
    }

    /// Resolves the id of an already-imported host key by fingerprint.
    async fn existing_host_key_id(
        &self,
        server_id: &str,
        private_key_openssh: &str,
    ) -> Result<Option<String>, EndpointError> {
        let private = PrivateKey::from_openssh(private_key_openssh)
            .map_err(|err| EndpointError::io("ListHostKeys", server_id, err))?;
        let fingerprint = private.public_key().fingerprint(HashAlg::Sha256).to_string();

        let listed = self
            .client
            .list_host_keys()
            .server_id(server_id)
            .send()
            .await
            .map_err(|err| {
                EndpointError::io("ListHostKeys", server_id, err.into_service_error())
            })?;

        Ok(listed
            .host_keys()
            .iter()
            .find(|key| key.fingerprint() == Some(fingerprint.as_str()))
            .and_then(|key| key.host_key_id())
            .map(str::to_string))
    }

    async fn create_user(&self, server_id: &str, user: &UserConfig) -> Result<(), EndpointError> {
        let tag = Tag::builder()
            .key(CREATED_BY_TAG_KEY)
            .value(CREATED_BY_TAG_VALUE)
            .build()
            .map_err(|err| EndpointError::io("CreateUser", &user.user_name, err))?;

        let created = self
            .client
            .create_user()
            .server_id(server_id)
            .user_name(&user.user_name)
            .role(&user.role_arn)
            .home_directory(format!("/{}/home/{}", user.home_bucket, user.user_name))
            .home_directory_type(HomeDirectoryType::Path)
            .tags(tag)
            .send()
            .await;

        match created {
            Ok(_) => {
                tracing::info!("[service] created user {} on {}", user.user_name, server_id);
                Ok(())
            }
            Err(err) => {
                let service_err = err.into_service_error();
                // lost a create race with a concurrent delivery
                if service_err.is_resource_exists_exception() {
                    return Ok(());
                }
                Err(EndpointError::io("CreateUser", &user.user_name, service_err))
            }
        }
    }
}

#[async_trait]
impl EndpointAdmin for TransferAdmin {
    async fn import_host_key(
        &self,
        server_id: &str,
        private_key_openssh: &str,
    ) -> Result<String, EndpointError> {
        let imported = self
            .client
            .import_host_key()
            .server_id(server_id)
            .host_key_body(private_key_openssh)
            .send()
            .await;

        match imported {
            Ok(output) => Ok(output.host_key_id().to_string()),
            Err(err) => {
                let service_err = err.into_service_error();
                if !service_err.is_resource_exists_exception() {
                    return Err(EndpointError::io("ImportHostKey", server_id, service_err));
                }
                // the same material is already on the server; find its id
                match self.existing_host_key_id(server_id, private_key_openssh).await? {
                    Some(host_key_id) => Ok(host_key_id),
                    None => Err(EndpointError::io(
                        "ImportHostKey",
                        server_id,
                        std::io::Error::other("existing host key not found by fingerprint"),
                    )),
                }
            }
        }
    }

    async fn trust_connector_host_key(
        &self,
        connector_id: &str,
        public_key_openssh: &str,
    ) -> Result<(), EndpointError> {
        let described = self
            .client
            .describe_connector()
            .connector_id(connector_id)
            .send()
            .await
            .map_err(|err| {
                EndpointError::io("DescribeConnector", connector_id, err.into_service_error())
            })?;
        let sftp_config = described
            .connector()
            .and_then(|connector| connector.sftp_config());

        let mut trusted: Vec<String> = sftp_config
            .map(|config| config.trusted_host_keys().to_vec())
            .unwrap_or_default();
        if trusted.iter().any(|key| key.trim() == public_key_openssh.trim()) {
            tracing::debug!(
                "[service] connector {} already trusts this host key",
                connector_id
            );
            return Ok(());
        }
        trusted.push(public_key_openssh.to_string());
        let trusted_count = trusted.len();

        // only the trust list changes; the user secret reference is carried
        // over so the update does not clear it
        let config = SftpConnectorConfig::builder()
            .set_trusted_host_keys(Some(trusted))
            .set_user_secret_id(
                sftp_config
                    .and_then(|config| config.user_secret_id())
                    .map(str::to_string),
            )
            .build();

        self.client
            .update_connector()
            .connector_id(connector_id)
            .sftp_config(config)
            .send()
            .await
            .map_err(|err| {
                EndpointError::io("UpdateConnector", connector_id, err.into_service_error())
            })?;

        tracing::info!(
            "[service] connector {} now trusts {} host keys",
            connector_id,
            trusted_count
        );
        Ok(())
    }

    async fn upsert_user(&self, server_id: &str, user: &UserConfig) -> Result<(), EndpointError> {
        // 1. Ensure the user exists
        let described = self
            .client
            .describe_user()
            .server_id(server_id)
            .user_name(&user.user_name)
            .send()
            .await;

        let existing = match described {
            Ok(output) => output
                .user()
                .map(|user| user.ssh_public_keys().to_vec())
                .unwrap_or_default(),
            Err(err) => {
                let service_err = err.into_service_error();
                if !service_err.is_resource_not_found_exception() {
                    return Err(EndpointError::io(
                        "DescribeUser",
                        &user.user_name,
                        service_err,
                    ));
                }
                self.create_user(server_id, user).await?;
                Vec::new()
            }
        };

        // 2. Drop keys that are no longer configured
        let desired: BTreeSet<&str> = user.public_keys.iter().map(|key| key.trim()).collect();
        for key in &existing {
            let body = key.ssh_public_key_body().trim();
            if desired.contains(body) {
                continue;
            }
            let key_id = key.ssh_public_key_id();
            self.client
                .delete_ssh_public_key()
                .server_id(server_id)
                .user_name(&user.user_name)
                .ssh_public_key_id(key_id)
                .send()
                .await
                .map_err(|err| {
                    EndpointError::io(
                        "DeleteSshPublicKey",
                        &user.user_name,
                        err.into_service_error(),
                    )
                })?;
            tracing::info!(
                "[service] removed stale key {} from {}",
                key_id,
                user.user_name
            );
        }

        // 3. Import configured keys the user does not carry yet
        let existing_bodies: BTreeSet<String> = existing
            .iter()
            .map(|key| key.ssh_public_key_body().trim().to_string())
            .collect();
        for body in desired {
            if existing_bodies.contains(body) {
                continue;
            }
            let imported = self
                .client
                .import_ssh_public_key()
                .server_id(server_id)
                .user_name(&user.user_name)
                .ssh_public_key_body(body)
                .send()
                .await;
            if let Err(err) = imported {
                let service_err = err.into_service_error();
                // a concurrent delivery may have imported it first
                if !service_err.is_resource_exists_exception() {
                    return Err(EndpointError::io(
                        "ImportSshPublicKey",
                        &user.user_name,
                        service_err,
                    ));
                }
            }
        }

        Ok(())
    }
}
