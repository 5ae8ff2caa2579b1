// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! AWS-backed implementations of the pipeline adapter traits.
//!
//! - [`s3::S3KeyStore`]: uploaded key material and quarantine tagging
//! - [`secrets::SecretsManagerStore`]: secret upserts and reads
//! - [`transfer::TransferAdmin`]: server host keys, connectors, and users

pub mod s3;
pub mod secrets;
pub mod transfer;

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Shared SDK configuration; an explicit region wins over the default
/// provider chain.
pub async fn sdk_config(region: Option<String>) -> SdkConfig {
    let provider = RegionProviderChain::first_try(region.map(Region::new)).or_default_provider();
    aws_config::defaults(BehaviorVersion::latest())
        .region(provider)
        .load()
        .await
}
