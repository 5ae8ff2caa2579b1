// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

/// Description attached to every secret this service creates.
pub const SECRET_DESCRIPTION: &str = "The key for SFTP user";

/// Tag recorded on endpoint users created by this service.
pub const CREATED_BY_TAG_KEY: &str = "created_by";
pub const CREATED_BY_TAG_VALUE: &str = "sftp-key-service";

// Object tags applied to quarantined uploads. Operators filter on the
// status tag; the reason tag says why the object was flagged.
pub const QUARANTINE_STATUS_TAG_KEY: &str = "sftp-key-pipeline:status";
pub const QUARANTINE_STATUS_TAG_VALUE: &str = "quarantined";
pub const QUARANTINE_REASON_TAG_KEY: &str = "sftp-key-pipeline:reason";

pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024; // 1 MB

// Validation constants for ProvisionRequest and event documents
pub const MAX_PHYSICAL_ID_LENGTH: u64 = 256;
pub const MAX_STAGE_LENGTH: u64 = 64;
pub const MAX_BUCKET_LENGTH: u64 = 63;
pub const MAX_ROLE_ARN_LENGTH: u64 = 2048;
pub const MAX_USER_NAME_LENGTH: u64 = 100;
pub const MAX_KEY_MATERIAL_LENGTH: u64 = 16384;
pub const MAX_RECORDS_COUNT: usize = 100;
