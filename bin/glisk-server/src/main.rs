// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ethers::types::{Address, U256};
use glisk_api::{build_router, AppState};
use glisk_chain::{repair_gaps, ChainReader, KeeperClient};
use glisk_config::{configure_logging, Settings};
use glisk_services::{ImageClient, PinningClient};
use glisk_store::Store;
use glisk_worker::{ContentUploadWorker, ImageGenerationWorker, RevealWorker, Supervisor};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let settings = Settings::from_env()?;
    configure_logging(&settings);

    info!(app_env = %settings.app_env, network = %settings.network, "server.starting");

    let store = Store::connect(&settings.database_url, settings.db_pool_size)
        .context("failed to connect to database")?;
    store.run_migrations().await.context("failed to run migrations")?;
    info!("server.migrations_applied");

    let contract_address: Address = settings
        .glisk_nft_contract_address
        .parse()
        .context("GLISK_NFT_CONTRACT_ADDRESS is not a valid address")?;

    let reader = ChainReader::new(&settings.rpc_url, contract_address)
        .context("failed to construct chain reader")?;

    let max_gas_price_wei = settings
        .max_gas_price_gwei
        .map(|gwei| U256::from((gwei * 1_000_000_000.0) as u64));
    let keeper = KeeperClient::new(
        &settings.rpc_url,
        contract_address,
        &settings.keeper_private_key,
        settings.reveal_gas_buffer,
        max_gas_price_wei,
    )
    .await
    .context("failed to construct keeper client")?;

    let gap_report = repair_gaps(
        &reader,
        &store,
        &settings.glisk_default_author_wallet,
        Some(settings.recovery_batch_size as i64),
    )
    .await
    .context("startup gap repair failed")?;
    info!(
        recovered = gap_report.recovered_count,
        missing = gap_report.missing_count,
        errors = gap_report.errors.len(),
        "server.gap_repair_complete"
    );

    let image_client = Arc::new(ImageClient::new(
        settings.image_api_token.clone(),
        Some(settings.image_model.clone()),
    ));
    let pinning_client = Arc::new(PinningClient::new(settings.pinning_jwt.clone()));

    let poll_interval = Duration::from_secs(settings.poll_interval_seconds);

    let image_worker = Arc::new(ImageGenerationWorker::new(
        store.clone(),
        image_client,
        settings.glisk_default_author_wallet.clone(),
        settings.fallback_censored_prompt.clone(),
        poll_interval,
        settings.worker_batch_size,
    ));
    let upload_worker = Arc::new(ContentUploadWorker::new(
        store.clone(),
        pinning_client,
        poll_interval,
        settings.worker_batch_size,
    ));
    let reveal_worker = Arc::new(RevealWorker::new(
        store.clone(),
        keeper,
        reader,
        poll_interval,
        Duration::from_secs(settings.reveal_batch_wait_seconds),
        Duration::from_secs(settings.transaction_timeout_seconds),
        settings.explorer_base_url.clone(),
    ));

    let supervisor = Supervisor::spawn(image_worker, upload_worker, reveal_worker).await;
    info!("server.supervisor_spawned");

    let state = AppState {
        store,
        webhook_secret: settings.alchemy_webhook_secret.clone(),
        contract_address: settings.glisk_nft_contract_address.clone(),
        default_author_wallet: settings.glisk_default_author_wallet.clone(),
    };
    let router = build_router(state, settings.cors_origins_list());

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server.listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    supervisor.shutdown().await;
    info!("server.stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("server.shutdown_signal_received");
}
