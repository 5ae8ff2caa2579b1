// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # SFTP Key Service
//!
//! The deployment boundary of the SFTP key lifecycle pipeline.
//!
//! This crate provides an HTTP API server that receives the two external
//! triggers (one-time environment bootstrap and per-object storage
//! notifications) and forwards them to the pipeline core, wired to the
//! AWS-backed implementations of the pipeline's adapter traits.
//!
//! ## Architecture
//!
//! ```text
//! orchestrator --> POST /provision --> BootstrapHandler --+--> Transfer Family
//! bucket event --> POST /events    --> IngestProcessor  --+--> Secrets Manager
//!                                                         +--> S3 (read / tag)
//! ```
//!
//! The service runs next to a managed SFTP endpoint and provides:
//!
//! - **HTTP API**: Axum-based server with request validation and body limits
//! - **Bootstrap**: exactly-once provisioning of the initial host and user
//!   key pairs on environment creation
//! - **Ingestion**: per-object processing of uploaded key material into
//!   endpoint trust state and stored credentials
//! - **Quarantine**: invalid uploads are tagged in place, never deleted
//!
//! ## Modules
//!
//! - [`application`]: HTTP server setup with Axum and the body-size limit
//! - [`aws`]: S3, Secrets Manager and Transfer Family adapter implementations
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: naming, tagging and validation constants
//! - [`errors`]: application error types with HTTP response mapping
//! - [`models`]: request/response types with validation
//! - [`routes`]: HTTP route handlers (health, provision, events)
//!
//! ## Usage
//!
//! ```bash
//! sftp-key-service --server-id s-1111222233334444a \
//!     --key-bucket upload-keys --sftp-bucket sftp-data \
//!     --user-role arn:aws:iam::123456789012:role/sftp-user
//! ```
//!
//! ## Security Considerations
//!
//! - Private key material is zeroized on drop and redacted from `Debug`
//!   output and logs
//! - Request validation enforces strict size limits to prevent abuse
//! - Business rejections (malformed keys, mismatched pairs) are reported in
//!   response documents; transport errors are reserved for transient faults
//!   so the event source knows what to redeliver

pub mod application;
pub mod aws;
pub mod configuration;
pub mod constants;
pub mod errors;
pub mod models;
pub mod routes;
