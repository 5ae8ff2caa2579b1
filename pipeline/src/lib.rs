// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # SFTP Key Pipeline
//!
//! Key lifecycle management for a managed SFTP endpoint backed by object
//! storage.
//!
//! This crate holds the storage-agnostic core: OpenSSH key parsing and pair
//! validation, the naming scheme that ties uploaded objects to servers and
//! users, one-time endpoint bootstrap, and the continuous ingestion flow
//! that turns uploaded key pairs into endpoint configuration and stored
//! credentials.
//!
//! ## Architecture
//!
//! ```text
//! upload event -> IngestProcessor -> ObjectStore (read / quarantine)
//!                       |
//!                       +-> EndpointAdmin    (host keys, users, trust)
//!                       +-> CredentialStore  (secrets)
//!
//! provision request -> BootstrapHandler -> EndpointAdmin + CredentialStore
//! ```
//!
//! Key properties of the design:
//!
//! - **At-least-once tolerant**: every external write is an idempotent
//!   upsert, so duplicate and out-of-order event deliveries converge on the
//!   same state.
//! - **Quarantine, never delete**: rejected uploads are flagged in place
//!   for operator review; the pipeline removes nothing.
//! - **Proven pairs only**: nothing reaches the endpoint or the credential
//!   store until both halves parse and a signature round trip proves they
//!   belong together.
//!
//! ## Modules
//!
//! - [`adapters`]: traits the deployment backend implements
//! - [`bootstrap`]: exactly-once endpoint provisioning
//! - [`constants`]: naming conventions and size bounds
//! - [`errors`]: fault and rejection types
//! - [`ingest`]: per-event processing of uploaded key material
//! - [`keys`]: OpenSSH parsing, pair proof, and generation
//! - [`memory`]: in-memory adapters for tests
//! - [`models`]: requests, outcomes, and stored shapes
//! - [`naming`]: object key classification and secret naming

pub mod adapters;
pub mod bootstrap;
pub mod constants;
pub mod errors;
pub mod ingest;
pub mod keys;
pub mod memory;
pub mod models;
pub mod naming;
