// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sftp_key_service::application::Application;
use sftp_key_service::aws;
use sftp_key_service::aws::s3::S3KeyStore;
use sftp_key_service::aws::secrets::SecretsManagerStore;
use sftp_key_service::aws::transfer::TransferAdmin;
use sftp_key_service::configuration::ServiceOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("[service] init");

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        // this needs to be set to false, otherwise ANSI color codes will
        // show up in a confusing manner in CloudWatch logs.
        .with_ansi(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        // remove the name of the function from every log entry
        .with_target(false)
        .init();

    // get configuration options from environment variables
    let options = ServiceOptions::parse();

    tracing::info!("[service] {:?}", &options);

    let config = aws::sdk_config(options.region.clone()).await;
    let store = Arc::new(S3KeyStore::new(&config, options.key_bucket.clone()));
    let credentials = Arc::new(SecretsManagerStore::new(&config));
    let endpoint = Arc::new(TransferAdmin::new(&config));

    let application = Application::build(options, store, credentials, endpoint)
        .await
        .context("failed to start the HTTP listener")?;

    application
        .run_until_stopped()
        .await
        .context("server stopped unexpectedly")
}
