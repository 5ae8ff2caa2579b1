// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use async_trait::async_trait;
use sftp_key_pipeline::adapters::CredentialStore;
use sftp_key_pipeline::errors::CredentialStoreError;
use sftp_key_pipeline::models::SecretFields;

use crate::constants::SECRET_DESCRIPTION;

/// Secrets Manager store. Secret payloads are the JSON form of
/// [`SecretFields`] and never appear in logs.
#[derive(Debug, Clone)]
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_secretsmanager::Client::new(config),
        }
    }
}

#[async_trait]
impl CredentialStore for SecretsManagerStore {
    async fn put(&self, name: &str, fields: &SecretFields) -> Result<(), CredentialStoreError> {
        let payload = serde_json::to_string(fields)
            .map_err(|err| CredentialStoreError::io("CreateSecret", name, err))?;

        // create first; an existing secret gets a new version instead
        let created = self
            .client
            .create_secret()
            .name(name)
            .description(SECRET_DESCRIPTION)
            .secret_string(&payload)
            .send()
            .await;

        match created {
            Ok(_) => {
                tracing::info!("[service] created secret {}", name);
                Ok(())
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if !service_err.is_resource_exists_exception() {
                    return Err(CredentialStoreError::io("CreateSecret", name, service_err));
                }
                self.client
                    .put_secret_value()
                    .secret_id(name)
                    .secret_string(&payload)
                    .send()
                    .await
                    .map_err(|err| {
                        CredentialStoreError::io(
                            "PutSecretValue",
                            name,
                            err.into_service_error(),
                        )
                    })?;
                tracing::info!("[service] updated secret {}", name);
                Ok(())
            }
        }
    }

    async fn get(&self, name: &str) -> Result<SecretFields, CredentialStoreError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    CredentialStoreError::not_found(name)
                } else {
                    CredentialStoreError::io("GetSecretValue", name, service_err)
                }
            })?;

        let Some(payload) = output.secret_string() else {
            return Err(CredentialStoreError::io(
                "GetSecretValue",
                name,
                std::io::Error::other("secret has no string payload"),
            ));
        };
        serde_json::from_str(payload)
            .map_err(|err| CredentialStoreError::io("GetSecretValue", name, err))
    }
}
