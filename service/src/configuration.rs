// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use clap::Parser;
use sftp_key_pipeline::models::PipelineSettings;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct ServiceOptions {
    #[arg(long, default_value = "127.0.0.1", env("SERVICE_HTTP_HOST"))]
    pub host: String,
    #[arg(long, default_value = "8080", env("SERVICE_HTTP_PORT"))]
    pub port: u16,
    /// Deployment stage, the first segment of every secret name.
    #[arg(long, default_value = "dev", env("ENV"))]
    pub stage: String,
    /// The managed SFTP server this deployment administers.
    #[arg(long, env("SERVER_ID"))]
    pub server_id: String,
    /// Outbound connector that should trust the host key, if any.
    #[arg(long, env("CONNECTOR_ID"))]
    pub connector_id: Option<String>,
    /// Bucket watched for uploaded key material.
    #[arg(long, env("KEY_BUCKET"))]
    pub key_bucket: String,
    /// Bucket holding SFTP user home directories.
    #[arg(long, env("SFTP_BUCKET"))]
    pub sftp_bucket: String,
    /// IAM role assumed by endpoint users for data access.
    #[arg(long, env("SFTP_USER_ROLE"))]
    pub user_role: String,
    #[arg(long, env("REGION"))]
    pub region: Option<String>,
}

impl ServiceOptions {
    /// The pipeline-facing view of these options.
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            stage: self.stage.clone(),
            server_id: self.server_id.clone(),
            connector_id: self.connector_id.clone(),
            key_bucket: self.key_bucket.clone(),
            sftp_bucket: self.sftp_bucket.clone(),
            user_role_arn: self.user_role.clone(),
        }
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        ServiceOptions {
            host: "127.0.0.1".to_string(),
            port: 8080,
            stage: "dev".to_string(),
            server_id: "s-1111222233334444a".to_string(),
            connector_id: Some("c-5555666677778888b".to_string()),
            key_bucket: "key-bucket".to_string(),
            sftp_bucket: "sftp-data".to_string(),
            user_role: "arn:aws:iam::123456789012:role/sftp-user".to_string(),
            region: None,
        }
    }
}
