// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;

use serde::{Deserialize, Serialize};
use sftp_key_pipeline::models::{
    BootstrapAction, BootstrapOutput, BootstrapTrigger, IngestOutcome, PipelineSettings,
    ProvidedKeyMaterial,
};
use validator::Validate;
use zeroize::ZeroizeOnDrop;

use crate::configuration::ServiceOptions;
use crate::constants::{
    MAX_BUCKET_LENGTH, MAX_KEY_MATERIAL_LENGTH, MAX_PHYSICAL_ID_LENGTH, MAX_ROLE_ARN_LENGTH,
    MAX_STAGE_LENGTH, MAX_USER_NAME_LENGTH,
};

/// One provisioning request from the deployment orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    pub request_type: BootstrapTrigger,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = MAX_PHYSICAL_ID_LENGTH))]
    pub physical_id: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub properties: ProvisionProperties,
}

/// Per-request overrides of the service configuration. Everything is
/// optional; unset fields fall back to the deployed options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = MAX_STAGE_LENGTH))]
    pub stage: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_transfer_server_id"))]
    pub server_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_transfer_connector_id"))]
    pub connector_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = MAX_BUCKET_LENGTH))]
    pub key_bucket: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = MAX_BUCKET_LENGTH))]
    pub sftp_bucket: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = MAX_ROLE_ARN_LENGTH))]
    pub user_role: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = MAX_USER_NAME_LENGTH))]
    pub user_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub host_key: Option<KeyMaterial>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub user_key: Option<KeyMaterial>,
}

impl ProvisionProperties {
    /// Explicit properties win over the service's own configuration.
    pub fn merged(&self, options: &ServiceOptions) -> PipelineSettings {
        PipelineSettings {
            stage: self.stage.clone().unwrap_or_else(|| options.stage.clone()),
            server_id: self
                .server_id
                .clone()
                .unwrap_or_else(|| options.server_id.clone()),
            connector_id: self
                .connector_id
                .clone()
                .or_else(|| options.connector_id.clone()),
            key_bucket: self
                .key_bucket
                .clone()
                .unwrap_or_else(|| options.key_bucket.clone()),
            sftp_bucket: self
                .sftp_bucket
                .clone()
                .unwrap_or_else(|| options.sftp_bucket.clone()),
            user_role_arn: self
                .user_role
                .clone()
                .unwrap_or_else(|| options.user_role.clone()),
        }
    }
}

/// Caller-supplied OpenSSH key pair.
#[derive(Clone, Serialize, Deserialize, Validate, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct KeyMaterial {
    #[validate(length(min = 1, max = MAX_KEY_MATERIAL_LENGTH))]
    pub public_key: String,
    #[validate(length(min = 1, max = MAX_KEY_MATERIAL_LENGTH))]
    pub private_key: String,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("public_key", &"[REDACTED]")
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl From<&KeyMaterial> for ProvidedKeyMaterial {
    fn from(material: &KeyMaterial) -> Self {
        ProvidedKeyMaterial {
            public_key: material.public_key.clone(),
            private_key: material.private_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisionStatus {
    Success,
    Failed,
}

/// Outcome document returned to the orchestrator. Business failures are
/// reported here with a `Failed` status, not as transport errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResponse {
    pub status: ProvisionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ProvisionData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionData {
    pub action: BootstrapAction,
    pub user_name: String,
    pub host_secret_name: String,
    pub user_secret_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_key_id: Option<String>,
}

impl ProvisionResponse {
    pub fn success(output: BootstrapOutput) -> Self {
        ProvisionResponse {
            status: ProvisionStatus::Success,
            physical_resource_id: Some(output.physical_id),
            reason: None,
            data: Some(ProvisionData {
                action: output.action,
                user_name: output.user_name,
                host_secret_name: output.host_secret_name,
                user_secret_name: output.user_secret_name,
                host_key_id: output.host_key_id,
            }),
        }
    }

    pub fn failure(physical_resource_id: Option<String>, reason: String) -> Self {
        ProvisionResponse {
            status: ProvisionStatus::Failed,
            physical_resource_id,
            reason: Some(reason),
            data: None,
        }
    }
}

/// Object storage event notification, as delivered by the bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDocument {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: String,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntity {
    pub key: String,
}

impl ObjectEntity {
    /// Event documents carry the object key URL-encoded, with `+` standing
    /// in for spaces.
    pub fn decoded_key(&self) -> String {
        let plus_as_space = self.key.replace('+', " ");
        String::from_utf8_lossy(&urlencoding::decode_binary(plus_as_space.as_bytes())).into_owned()
    }
}

/// Per-record outcomes for one event document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub outcomes: Vec<IngestOutcome>,
}

/// Validates a Transfer server id: `s-` followed by 17 lowercase hex
/// characters.
fn validate_transfer_server_id(server_id: &str) -> Result<(), validator::ValidationError> {
    if !is_prefixed_hex_id(server_id, "s-") {
        return Err(validator::ValidationError::new("invalid_server_id"));
    }
    Ok(())
}

/// Validates a Transfer connector id: `c-` followed by 17 lowercase hex
/// characters.
fn validate_transfer_connector_id(connector_id: &str) -> Result<(), validator::ValidationError> {
    if !is_prefixed_hex_id(connector_id, "c-") {
        return Err(validator::ValidationError::new("invalid_connector_id"));
    }
    Ok(())
}

fn is_prefixed_hex_id(value: &str, prefix: &str) -> bool {
    value.strip_prefix(prefix).is_some_and(|rest| {
        rest.len() == 17
            && rest
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    })
}
