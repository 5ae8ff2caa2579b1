// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use async_trait::async_trait;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::types::{Tag, Tagging};
use sftp_key_pipeline::adapters::ObjectStore;
use sftp_key_pipeline::errors::{ObjectStoreError, RejectReason};

use crate::constants::{
    QUARANTINE_REASON_TAG_KEY, QUARANTINE_STATUS_TAG_KEY, QUARANTINE_STATUS_TAG_VALUE,
};

/// Key material bucket access. One store is bound to one bucket; events
/// for other buckets never reach it.
#[derive(Debug, Clone)]
pub struct S3KeyStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3KeyStore {
    pub fn new(config: &aws_config::SdkConfig, bucket: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3KeyStore {
    async fn read(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    ObjectStoreError::not_found(key)
                } else {
                    ObjectStoreError::io("GetObject", key, service_err)
                }
            })?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|err| ObjectStoreError::io("GetObject", key, err))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn quarantine(&self, key: &str, reason: &RejectReason) -> Result<(), ObjectStoreError> {
        // replaces the object's tag set; quarantined objects are owned by
        // this pipeline from here on
        let tagging = Tagging::builder()
            .tag_set(
                Tag::builder()
                    .key(QUARANTINE_STATUS_TAG_KEY)
                    .value(QUARANTINE_STATUS_TAG_VALUE)
                    .build()
                    .map_err(|err| ObjectStoreError::io("PutObjectTagging", key, err))?,
            )
            .tag_set(
                Tag::builder()
                    .key(QUARANTINE_REASON_TAG_KEY)
                    .value(reason.tag())
                    .build()
                    .map_err(|err| ObjectStoreError::io("PutObjectTagging", key, err))?,
            )
            .build()
            .map_err(|err| ObjectStoreError::io("PutObjectTagging", key, err))?;

        self.client
            .put_object_tagging()
            .bucket(&self.bucket)
            .key(key)
            .tagging(tagging)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                // tagging has no modeled NoSuchKey variant; match on the code
                if service_err.code() == Some("NoSuchKey") {
                    ObjectStoreError::not_found(key)
                } else {
                    ObjectStoreError::io("PutObjectTagging", key, service_err)
                }
            })?;

        tracing::info!("[service] tagged {} as {}", key, reason.tag());
        Ok(())
    }
}
