// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

/// Objects under this prefix are SFTP host keys.
pub const HOST_KEY_PREFIX: &str = "host_keys/";
/// Objects under this prefix are end-user SSH keys.
pub const USER_KEY_PREFIX: &str = "ssh_keys/";

/// Extension of the public half of an uploaded key pair.
pub const PUBLIC_KEY_EXTENSION: &str = "pub";
/// Extensions accepted for the private half. `.pem` is what the provisioning
/// flow uploads; `.pri` is a common alternative and checked second.
pub const PRIVATE_KEY_EXTENSIONS: [&str; 2] = ["pem", "pri"];

/// Middle segment of every secret name: `{stage}/SFTPSecrets/{logical name}`.
/// Changing this orphans existing secrets, so don't.
pub const SECRET_NAME_INFIX: &str = "SFTPSecrets";

/// User provisioned when a bootstrap request names no user.
pub const DEFAULT_USER_NAME: &str = "FirstUser";

/// Message signed and verified to prove two uploaded halves belong together.
/// The bytes are arbitrary but fixed; the check only needs one round trip
/// through the private key.
pub const PAIR_CHECK_CHALLENGE: &[u8] = b"sftp-key-pipeline pair check v1";

/// Host keys larger than this are not plausible OpenSSH material.
pub const MAX_KEY_OBJECT_BYTES: usize = 16 * 1024;
