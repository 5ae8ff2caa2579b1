// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::serve::Serve;
use sftp_key_pipeline::adapters::{CredentialStore, EndpointAdmin, ObjectStore};
use sftp_key_pipeline::bootstrap::BootstrapHandler;
use sftp_key_pipeline::ingest::IngestProcessor;
use tokio::net::TcpListener;

use crate::configuration::ServiceOptions;
use crate::constants::MAX_REQUEST_BODY_BYTES;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub options: ServiceOptions,
    pub bootstrap: BootstrapHandler,
    pub ingest: IngestProcessor,
}

pub struct Application {
    port: u16,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    pub async fn build(
        options: ServiceOptions,
        store: Arc<dyn ObjectStore>,
        credentials: Arc<dyn CredentialStore>,
        endpoint: Arc<dyn EndpointAdmin>,
    ) -> Result<Self, std::io::Error> {
        let address = format!("{}:{}", options.host, options.port);
        let listener = TcpListener::bind(address).await?;
        let host = options.host.clone();
        let server = run(listener, options, store, credentials, endpoint)?;
        let port = server.local_addr()?.port();

        tracing::info!("[service] listening at http://{}:{}", host, port);

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Builds the router with its full middleware stack. The integration tests
/// drive this directly without binding a port.
pub fn create_router(
    options: ServiceOptions,
    store: Arc<dyn ObjectStore>,
    credentials: Arc<dyn CredentialStore>,
    endpoint: Arc<dyn EndpointAdmin>,
) -> Router {
    let bootstrap = BootstrapHandler::new(credentials.clone(), endpoint.clone());
    let ingest = IngestProcessor::new(store, credentials, endpoint, options.settings());
    let state = Arc::new(AppState {
        options,
        bootstrap,
        ingest,
    });

    Router::new()
        .route("/health", get(routes::health))
        .route("/provision", post(routes::provision))
        .route("/events", post(routes::events))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

#[tracing::instrument(skip(listener, store, credentials, endpoint))]
pub fn run(
    listener: TcpListener,
    options: ServiceOptions,
    store: Arc<dyn ObjectStore>,
    credentials: Arc<dyn CredentialStore>,
    endpoint: Arc<dyn EndpointAdmin>,
) -> Result<Serve<TcpListener, Router, Router>, std::io::Error> {
    let app = create_router(options, store, credentials, endpoint);
    Ok(axum::serve(listener, app))
}
