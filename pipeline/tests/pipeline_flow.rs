// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! End-to-end pipeline scenarios over the in-memory adapters.
//!
//! These tests drive `BootstrapHandler` and `IngestProcessor` together the
//! way a deployment would: provision once, then feed object-created events
//! in realistic (and unrealistic) orders and check that endpoint state,
//! stored secrets, and quarantine flags end up where they should.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use sftp_key_pipeline::bootstrap::BootstrapHandler;
use sftp_key_pipeline::ingest::IngestProcessor;
use sftp_key_pipeline::memory::{MemoryCredentialStore, MemoryEndpointAdmin, MemoryObjectStore};
use sftp_key_pipeline::models::{
    BootstrapAction, BootstrapRequest, BootstrapTrigger, IngestOutcome, PipelineSettings,
};

const ALICE_PUBLIC: &str = include_str!("fixtures/alice.pub");
const ALICE_PRIVATE: &str = include_str!("fixtures/alice.pem");
const BOB_PUBLIC: &str = include_str!("fixtures/bob.pub");
const BOB_PRIVATE: &str = include_str!("fixtures/bob.pem");
const CAROL_PUBLIC: &str = include_str!("fixtures/carol.pub");
const CAROL_PRIVATE: &str = include_str!("fixtures/carol.pem");

const SERVER_ID: &str = "s-1111222233334444a";
const CONNECTOR_ID: &str = "c-5555666677778888b";

struct Pipeline {
    store: Arc<MemoryObjectStore>,
    credentials: Arc<MemoryCredentialStore>,
    endpoint: Arc<MemoryEndpointAdmin>,
    processor: IngestProcessor,
    bootstrap: BootstrapHandler,
}

fn settings() -> PipelineSettings {
    PipelineSettings {
        stage: "dev".to_string(),
        server_id: SERVER_ID.to_string(),
        connector_id: Some(CONNECTOR_ID.to_string()),
        key_bucket: "key-bucket".to_string(),
        sftp_bucket: "sftp-data".to_string(),
        user_role_arn: "arn:aws:iam::123456789012:role/sftp-user".to_string(),
    }
}

fn pipeline() -> Pipeline {
    let store = Arc::new(MemoryObjectStore::new());
    let credentials = Arc::new(MemoryCredentialStore::new());
    let endpoint = Arc::new(MemoryEndpointAdmin::new());
    let processor = IngestProcessor::new(
        store.clone(),
        credentials.clone(),
        endpoint.clone(),
        settings(),
    );
    let bootstrap = BootstrapHandler::new(credentials.clone(), endpoint.clone());
    Pipeline {
        store,
        credentials,
        endpoint,
        processor,
        bootstrap,
    }
}

fn bootstrap_request(trigger: BootstrapTrigger) -> BootstrapRequest {
    BootstrapRequest {
        trigger,
        physical_id: None,
        settings: settings(),
        user_name: None,
        host_material: None,
        user_material: None,
    }
}

// =============================================================================
// Upload Ordering
// =============================================================================

/// A pair completes no matter which half's event lands first.
#[tokio::test]
async fn test_pair_completes_regardless_of_arrival_order() {
    for (first, first_content, second, second_content) in [
        ("ssh_keys/alice.pub", ALICE_PUBLIC, "ssh_keys/alice.pem", ALICE_PRIVATE),
        ("ssh_keys/alice.pem", ALICE_PRIVATE, "ssh_keys/alice.pub", ALICE_PUBLIC),
    ] {
        let p = pipeline();

        // the first event arrives while only that half exists
        p.store.insert(first, first_content).await;
        let early = p.processor.process(first).await.unwrap();
        assert!(
            matches!(early, IngestOutcome::Deferred { .. }),
            "lone {} should defer",
            first
        );

        // the second half lands and its event completes the pair
        p.store.insert(second, second_content).await;
        let outcome = p.processor.process(second).await.unwrap();
        assert!(
            matches!(outcome, IngestOutcome::Propagated { .. }),
            "{} then {} should propagate",
            first,
            second
        );

        let secret = p.credentials.stored("dev/SFTPSecrets/alice").await.unwrap();
        assert_eq!(secret.username, "alice");
        assert_eq!(secret.public_key, ALICE_PUBLIC.trim());
        assert_eq!(secret.private_key, ALICE_PRIVATE);
        assert_eq!(p.endpoint.user_count().await, 1);
    }
}

/// Interleaved uploads for different users never cross-contaminate.
#[tokio::test]
async fn test_interleaved_users_stay_separate() {
    let p = pipeline();

    p.store.insert("ssh_keys/alice.pub", ALICE_PUBLIC).await;
    assert!(matches!(
        p.processor.process("ssh_keys/alice.pub").await.unwrap(),
        IngestOutcome::Deferred { .. }
    ));

    p.store.insert("ssh_keys/bob.pem", BOB_PRIVATE).await;
    assert!(matches!(
        p.processor.process("ssh_keys/bob.pem").await.unwrap(),
        IngestOutcome::Deferred { .. }
    ));

    p.store.insert("ssh_keys/alice.pem", ALICE_PRIVATE).await;
    assert!(matches!(
        p.processor.process("ssh_keys/alice.pem").await.unwrap(),
        IngestOutcome::Propagated { .. }
    ));

    p.store.insert("ssh_keys/bob.pub", BOB_PUBLIC).await;
    assert!(matches!(
        p.processor.process("ssh_keys/bob.pub").await.unwrap(),
        IngestOutcome::Propagated { .. }
    ));

    let alice = p.credentials.stored("dev/SFTPSecrets/alice").await.unwrap();
    assert_eq!(alice.private_key, ALICE_PRIVATE);
    let bob = p.credentials.stored("dev/SFTPSecrets/bob").await.unwrap();
    assert_eq!(bob.private_key, BOB_PRIVATE);

    assert_eq!(p.endpoint.user_count().await, 2);
    let alice_user = p.endpoint.user(SERVER_ID, "alice").await.unwrap();
    assert!(alice_user.public_keys.contains(ALICE_PUBLIC.trim()));
    assert!(!alice_user.public_keys.contains(BOB_PUBLIC.trim()));
}

// =============================================================================
// Redelivery and Convergence
// =============================================================================

/// Every event delivered three times in a messy order ends in exactly the
/// state a single clean pass would produce.
#[tokio::test]
async fn test_duplicate_event_storm_converges() {
    let p = pipeline();
    p.store.insert("ssh_keys/alice.pub", ALICE_PUBLIC).await;
    p.store.insert("ssh_keys/alice.pem", ALICE_PRIVATE).await;
    p.store.insert("host_keys/gateway.pub", CAROL_PUBLIC).await;
    p.store.insert("host_keys/gateway.pem", CAROL_PRIVATE).await;

    let storm = [
        "ssh_keys/alice.pem",
        "host_keys/gateway.pub",
        "ssh_keys/alice.pub",
        "host_keys/gateway.pem",
        "ssh_keys/alice.pub",
        "host_keys/gateway.pub",
        "ssh_keys/alice.pem",
        "host_keys/gateway.pem",
        "host_keys/gateway.pub",
        "ssh_keys/alice.pub",
        "ssh_keys/alice.pem",
        "host_keys/gateway.pem",
    ];
    for key in storm {
        let outcome = p.processor.process(key).await.unwrap();
        assert!(matches!(outcome, IngestOutcome::Propagated { .. }));
    }

    // one user, one imported host key, one trust entry, two secrets,
    // nothing flagged
    assert_eq!(p.endpoint.user_count().await, 1);
    assert_eq!(p.endpoint.imported_host_keys().await.len(), 1);
    assert_eq!(p.endpoint.trusted_keys(CONNECTOR_ID).await.len(), 1);
    assert_eq!(
        p.credentials.names().await,
        vec![
            "dev/SFTPSecrets/alice".to_string(),
            format!("dev/SFTPSecrets/{}", SERVER_ID),
        ]
    );
    assert!(p.store.quarantined_keys().await.is_empty());

    let host_secret = p
        .credentials
        .stored(&format!("dev/SFTPSecrets/{}", SERVER_ID))
        .await
        .unwrap();
    assert_eq!(host_secret.username, SERVER_ID);
    assert_eq!(host_secret.private_key, CAROL_PRIVATE);
}

// =============================================================================
// Provisioning and Rotation
// =============================================================================

/// Bootstrap provisions generated pairs; a later upload rotates the host
/// key without disturbing the bootstrap user.
#[tokio::test]
async fn test_bootstrap_then_host_rotation() {
    let p = pipeline();

    let output = p
        .bootstrap
        .handle(&bootstrap_request(BootstrapTrigger::Create))
        .await
        .unwrap();
    assert_eq!(output.action, BootstrapAction::Provisioned);
    assert_eq!(p.endpoint.imported_host_keys().await.len(), 1);

    // operator uploads a replacement host pair
    p.store.insert("host_keys/rotated.pub", CAROL_PUBLIC).await;
    p.store.insert("host_keys/rotated.pem", CAROL_PRIVATE).await;
    let outcome = p.processor.process("host_keys/rotated.pub").await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Propagated { .. }));

    // the server now carries both keys and the secret holds the new pair
    assert_eq!(p.endpoint.imported_host_keys().await.len(), 2);
    let host_secret = p
        .credentials
        .stored(&format!("dev/SFTPSecrets/{}", SERVER_ID))
        .await
        .unwrap();
    assert_eq!(host_secret.private_key, CAROL_PRIVATE);
    assert!(p
        .endpoint
        .trusted_keys(CONNECTOR_ID)
        .await
        .contains(CAROL_PUBLIC.trim()));

    // the bootstrap user and its secret survived the rotation
    assert!(p.endpoint.user(SERVER_ID, "FirstUser").await.is_some());
    assert!(p
        .credentials
        .stored("dev/SFTPSecrets/FirstUser")
        .await
        .is_some());
}

/// After a rotation the stored pairs are still valid, so a bootstrap
/// update reuses them instead of generating fresh material.
#[tokio::test]
async fn test_bootstrap_update_after_rotation_reuses_stored_pairs() {
    let p = pipeline();
    p.bootstrap
        .handle(&bootstrap_request(BootstrapTrigger::Create))
        .await
        .unwrap();

    p.store.insert("host_keys/rotated.pub", CAROL_PUBLIC).await;
    p.store.insert("host_keys/rotated.pem", CAROL_PRIVATE).await;
    p.processor.process("host_keys/rotated.pem").await.unwrap();

    let writes_before = p.credentials.write_count();
    let output = p
        .bootstrap
        .handle(&bootstrap_request(BootstrapTrigger::Update))
        .await
        .unwrap();

    assert_eq!(output.action, BootstrapAction::Reused);
    assert_eq!(p.credentials.write_count(), writes_before);
    let host_secret = p
        .credentials
        .stored(&format!("dev/SFTPSecrets/{}", SERVER_ID))
        .await
        .unwrap();
    assert_eq!(host_secret.private_key, CAROL_PRIVATE);
}

// =============================================================================
// Quarantine Flows
// =============================================================================

/// A mismatched host pair is flagged in place and nothing reaches the
/// endpoint or the credential store.
#[tokio::test]
async fn test_host_mismatch_leaves_endpoint_untouched() {
    let p = pipeline();
    p.store.insert("host_keys/gateway.pub", ALICE_PUBLIC).await;
    p.store.insert("host_keys/gateway.pem", CAROL_PRIVATE).await;

    let outcome = p.processor.process("host_keys/gateway.pub").await.unwrap();

    match outcome {
        IngestOutcome::Quarantined { keys, .. } => {
            assert_eq!(
                keys,
                vec![
                    "host_keys/gateway.pub".to_string(),
                    "host_keys/gateway.pem".to_string(),
                ]
            );
        }
        other => panic!("expected quarantine, got {:?}", other),
    }
    assert!(p.store.is_quarantined("host_keys/gateway.pub").await);
    assert!(p.store.is_quarantined("host_keys/gateway.pem").await);
    assert!(p.endpoint.imported_host_keys().await.is_empty());
    assert!(p.endpoint.trusted_keys(CONNECTOR_ID).await.is_empty());
    assert!(p.credentials.names().await.is_empty());
}

/// Overwriting the bad half with correct material recovers the pair; the
/// stale flag on the other half does not block reprocessing.
#[tokio::test]
async fn test_corrected_upload_recovers_from_mismatch() {
    let p = pipeline();
    p.store.insert("ssh_keys/alice.pub", ALICE_PUBLIC).await;
    p.store.insert("ssh_keys/alice.pem", BOB_PRIVATE).await;

    let outcome = p.processor.process("ssh_keys/alice.pub").await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Quarantined { .. }));

    // operator uploads the right private half over the bad one
    p.store.insert("ssh_keys/alice.pem", ALICE_PRIVATE).await;
    let outcome = p.processor.process("ssh_keys/alice.pem").await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Propagated { .. }));

    let secret = p.credentials.stored("dev/SFTPSecrets/alice").await.unwrap();
    assert_eq!(secret.private_key, ALICE_PRIVATE);
    assert!(p.endpoint.user(SERVER_ID, "alice").await.is_some());
}

// =============================================================================
// Unmanaged Objects
// =============================================================================

/// Uploads outside the watched prefixes pass through with no side effects.
#[tokio::test]
async fn test_unmanaged_uploads_never_touch_the_endpoint() {
    let p = pipeline();
    for key in [
        "home/alice/notes.txt",
        "uploads/report.pdf",
        "host_keys/",
        "ssh_keys/archive/",
    ] {
        p.store.insert(key, "content").await;
        let outcome = p.processor.process(key).await.unwrap();
        assert!(
            matches!(outcome, IngestOutcome::Ignored { .. }),
            "{} should be ignored",
            key
        );
    }

    assert!(p.store.quarantined_keys().await.is_empty());
    assert!(p.credentials.names().await.is_empty());
    assert_eq!(p.endpoint.user_count().await, 0);
    assert!(p.endpoint.imported_host_keys().await.is_empty());
}
