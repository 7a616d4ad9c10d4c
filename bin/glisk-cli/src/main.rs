// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ethers::types::Address;
use glisk_chain::{repair_gaps, replay_logs, ChainReader};
use glisk_config::{configure_logging, Settings};
use glisk_store::{Store, SystemStateRepo};
use tracing::{error, info};

/// Operator recovery commands for the GLISK pipeline (§6).
#[derive(Parser)]
#[command(name = "glisk-cli")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay `BatchMinted` logs from the chain in windowed batches.
    RecoverEvents {
        /// First block to scan. Defaults to `last_processed_block + 1`.
        #[arg(long)]
        from_block: Option<u64>,
        /// Last block to scan, or "latest". Defaults to "latest".
        #[arg(long, default_value = "latest")]
        to_block: String,
        #[arg(long, default_value_t = 2_000)]
        batch_size: u64,
        #[arg(long)]
        dry_run: bool,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Diff `nextTokenId()` against stored tokens and fill every gap.
    RecoverTokens {
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        dry_run: bool,
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to load settings: {e:#}");
            return ExitCode::from(1);
        }
    };
    configure_logging(&settings);

    let interrupted_code = match &cli.command {
        Command::RecoverEvents { .. } => 2,
        Command::RecoverTokens { .. } => 130,
    };

    let result = tokio::select! {
        result = run(cli, settings) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("cli.interrupted");
            return ExitCode::from(interrupted_code);
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %e, "cli.failed");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli, settings: Settings) -> anyhow::Result<u8> {
    let store = Store::connect(&settings.database_url, settings.db_pool_size)?;
    let contract_address: Address = settings.glisk_nft_contract_address.parse()?;
    let reader = ChainReader::new(&settings.rpc_url, contract_address)?;

    match cli.command {
        Command::RecoverEvents {
            from_block,
            to_block,
            batch_size,
            dry_run,
            verbose,
        } => {
            if verbose {
                info!("cli.recover_events.verbose_enabled");
            }

            let from_block = match from_block {
                Some(b) => b,
                None => {
                    let watermark = store
                        .transaction(|conn| SystemStateRepo::get_last_processed_block(conn))
                        .await?;
                    watermark.map(|b| b as u64 + 1).unwrap_or(0)
                }
            };

            let latest_block = reader.provider().get_block_number().await?.as_u64();
            let to_block = if to_block.eq_ignore_ascii_case("latest") {
                latest_block
            } else {
                to_block.parse::<u64>()?
            };

            if from_block > to_block {
                error!(from_block, to_block, "cli.recover_events.invalid_range");
                return Ok(1);
            }

            info!(from_block, to_block, batch_size, dry_run, "cli.recover_events.starting");

            if dry_run {
                info!(
                    blocks = to_block - from_block + 1,
                    "cli.recover_events.dry_run_complete"
                );
                return Ok(0);
            }

            let report = replay_logs(
                &reader,
                &store,
                contract_address,
                &settings.glisk_default_author_wallet,
                from_block,
                to_block,
                batch_size,
            )
            .await?;

            info!(
                blocks_scanned = report.blocks_scanned,
                logs_seen = report.logs_seen,
                created = report.created,
                duplicates = report.duplicates,
                "cli.recover_events.complete"
            );
            Ok(0)
        }
        Command::RecoverTokens {
            limit,
            dry_run,
            verbose,
        } => {
            if verbose {
                info!("cli.recover_tokens.verbose_enabled");
            }

            if dry_run {
                let next_token_id = reader.next_token_id().await?;
                info!(next_token_id, "cli.recover_tokens.dry_run_complete");
                return Ok(0);
            }

            let report = repair_gaps(
                &reader,
                &store,
                &settings.glisk_default_author_wallet,
                limit,
            )
            .await?;

            info!(
                total_on_chain = report.total_on_chain,
                missing = report.missing_count,
                recovered = report.recovered_count,
                skipped_duplicates = report.skipped_duplicate_count,
                errors = report.errors.len(),
                "cli.recover_tokens.complete"
            );

            if report.missing_count == 0 {
                Ok(0)
            } else if report.errors.is_empty() {
                Ok(0)
            } else if report.recovered_count > 0 {
                Ok(2)
            } else {
                Ok(1)
            }
        }
    }
}
