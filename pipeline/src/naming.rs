// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Storage-key classification and the naming conventions that tie the
//! pipeline together.
//!
//! Companion halves of a pair share a stem: `ssh_keys/alice.pub` pairs with
//! `ssh_keys/alice.pem` (or `.pri`), and the logical name of both is
//! `alice`. Secrets are stored under `{stage}/SFTPSecrets/{logical name}`.

use crate::constants::{
    HOST_KEY_PREFIX, PRIVATE_KEY_EXTENSIONS, PUBLIC_KEY_EXTENSION, SECRET_NAME_INFIX,
    USER_KEY_PREFIX,
};
use crate::models::{KeyKind, KeyRole};

/// A storage key recognized as key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyObjectName {
    /// The full storage key.
    pub key: String,
    pub kind: KeyKind,
    pub role: KeyRole,
    /// Key minus extension, shared by both halves of a pair.
    pub stem: String,
    /// File stem; the user name for user keys.
    pub logical_name: String,
}

impl KeyObjectName {
    /// Storage keys where the other half of this pair may live, in the
    /// order they should be checked.
    pub fn counterpart_keys(&self) -> Vec<String> {
        match self.role {
            KeyRole::Public => PRIVATE_KEY_EXTENSIONS
                .iter()
                .map(|ext| format!("{}.{}", self.stem, ext))
                .collect(),
            KeyRole::Private => vec![format!("{}.{}", self.stem, PUBLIC_KEY_EXTENSION)],
        }
    }
}

/// How a creation event's storage key is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Key material under a watched prefix.
    Recognized(KeyObjectName),
    /// Not this pipeline's concern: unrelated prefix or a folder marker.
    Foreign,
    /// Under a watched prefix but not a usable key name. These are
    /// quarantined so that junk in the key bucket surfaces to a human.
    Unrecognized { key: String },
}

/// Classifies a storage key by prefix and extension.
pub fn classify(key: &str) -> Classification {
    let kind = if key.starts_with(HOST_KEY_PREFIX) {
        KeyKind::Host
    } else if key.starts_with(USER_KEY_PREFIX) {
        KeyKind::User
    } else {
        return Classification::Foreign;
    };

    let file_name = key.rsplit('/').next().unwrap_or_default();
    if file_name.is_empty() {
        // folder markers ("ssh_keys/", "ssh_keys/archive/") carry no material
        return Classification::Foreign;
    }

    let Some((file_stem, extension)) = file_name.rsplit_once('.') else {
        return Classification::Unrecognized {
            key: key.to_string(),
        };
    };
    if file_stem.is_empty() {
        return Classification::Unrecognized {
            key: key.to_string(),
        };
    }

    let role = if extension == PUBLIC_KEY_EXTENSION {
        KeyRole::Public
    } else if PRIVATE_KEY_EXTENSIONS.contains(&extension) {
        KeyRole::Private
    } else {
        return Classification::Unrecognized {
            key: key.to_string(),
        };
    };

    let stem_len = key.len() - extension.len() - 1;
    Classification::Recognized(KeyObjectName {
        key: key.to_string(),
        kind,
        role,
        stem: key[..stem_len].to_string(),
        logical_name: file_stem.to_string(),
    })
}

/// The credential store name for a logical key, `{stage}/SFTPSecrets/{name}`.
pub fn secret_name(stage: &str, logical_name: &str) -> String {
    format!("{}/{}/{}", stage, SECRET_NAME_INFIX, logical_name)
}

/// Physical resource id reported for a bootstrap whose request carries none.
/// One per stage; replays of the same environment resolve to the same id.
pub fn bootstrap_physical_id(stage: &str) -> String {
    format!("sftp-key-bootstrap-{}", stage)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn recognized(key: &str) -> KeyObjectName {
        match classify(key) {
            Classification::Recognized(name) => name,
            other => panic!("{} should classify as key material, got {:?}", key, other),
        }
    }

    #[test]
    fn test_classify_user_public_key() {
        let name = recognized("ssh_keys/alice.pub");
        assert_eq!(name.kind, KeyKind::User);
        assert_eq!(name.role, KeyRole::Public);
        assert_eq!(name.stem, "ssh_keys/alice");
        assert_eq!(name.logical_name, "alice");
    }

    #[test]
    fn test_classify_host_private_key() {
        let name = recognized("host_keys/sftp-server.pem");
        assert_eq!(name.kind, KeyKind::Host);
        assert_eq!(name.role, KeyRole::Private);
        assert_eq!(name.logical_name, "sftp-server");
    }

    #[test]
    fn test_classify_accepts_pri_extension() {
        let name = recognized("ssh_keys/alice.pri");
        assert_eq!(name.role, KeyRole::Private);
    }

    #[test]
    fn test_classify_nested_keys_keep_file_stem_as_logical_name() {
        let name = recognized("ssh_keys/team-a/bob.pub");
        assert_eq!(name.logical_name, "bob");
        assert_eq!(name.stem, "ssh_keys/team-a/bob");
    }

    #[test]
    fn test_classify_unrelated_prefix_is_foreign() {
        assert_eq!(classify("uploads/report.pdf"), Classification::Foreign);
        assert_eq!(classify("host_keys"), Classification::Foreign);
        assert_eq!(classify(""), Classification::Foreign);
    }

    #[test]
    fn test_classify_folder_markers_are_foreign() {
        assert_eq!(classify("ssh_keys/"), Classification::Foreign);
        assert_eq!(classify("host_keys/archive/"), Classification::Foreign);
    }

    #[test]
    fn test_classify_junk_under_watched_prefix_is_unrecognized() {
        for key in [
            "ssh_keys/readme",
            "ssh_keys/.gitkeep",
            "ssh_keys/alice.PUB",
            "ssh_keys/archive.tar.gz",
            "host_keys/notes.txt",
        ] {
            assert_eq!(
                classify(key),
                Classification::Unrecognized {
                    key: key.to_string()
                },
                "{}",
                key
            );
        }
    }

    #[test]
    fn test_counterpart_keys_for_public_half() {
        let name = recognized("ssh_keys/alice.pub");
        assert_eq!(
            name.counterpart_keys(),
            vec!["ssh_keys/alice.pem".to_string(), "ssh_keys/alice.pri".to_string()]
        );
    }

    #[test]
    fn test_counterpart_keys_for_private_half() {
        let name = recognized("host_keys/srv.pri");
        assert_eq!(name.counterpart_keys(), vec!["host_keys/srv.pub".to_string()]);
    }

    #[test]
    fn test_secret_name_format() {
        assert_eq!(secret_name("dev", "alice"), "dev/SFTPSecrets/alice");
        assert_eq!(
            secret_name("prod", "s-11112222333344445"),
            "prod/SFTPSecrets/s-11112222333344445"
        );
    }

    #[test]
    fn test_bootstrap_physical_id_is_stage_scoped() {
        assert_eq!(bootstrap_physical_id("dev"), "sftp-key-bootstrap-dev");
        assert_eq!(bootstrap_physical_id("prod"), "sftp-key-bootstrap-prod");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        // classify is total: any byte soup coming out of an event document
        // gets a decision, never a panic.
        #[test]
        fn prop_classify_never_panics(key in ".*") {
            let _ = classify(&key);
        }

        // Keys outside the watched prefixes are always foreign.
        #[test]
        fn prop_unwatched_prefixes_are_foreign(key in "[a-z0-9_/.]{0,64}") {
            prop_assume!(!key.starts_with(HOST_KEY_PREFIX) && !key.starts_with(USER_KEY_PREFIX));
            prop_assert_eq!(classify(&key), Classification::Foreign);
        }

        // Well-formed names always round-trip stem and logical name, and the
        // counterpart of the counterpart includes the original key.
        #[test]
        fn prop_well_formed_names_pair_both_ways(stem in "[a-z][a-z0-9-]{0,24}") {
            let public = format!("{}{}.pub", USER_KEY_PREFIX, stem);
            let name = match classify(&public) {
                Classification::Recognized(name) => name,
                other => return Err(TestCaseError::fail(format!("unexpected {:?}", other))),
            };
            prop_assert_eq!(&name.logical_name, &stem);

            for counterpart in name.counterpart_keys() {
                let back = match classify(&counterpart) {
                    Classification::Recognized(back) => back,
                    other => return Err(TestCaseError::fail(format!("unexpected {:?}", other))),
                };
                prop_assert_eq!(&back.stem, &name.stem);
                prop_assert!(back.counterpart_keys().contains(&name.key));
            }
        }
    }
}
