/*
 *  Copyright 2026 pgbackup maintainers
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Long-running process: loads configuration, starts the scheduler, and
//! waits for a shutdown signal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pgbackup_core::dal::DAL;
use pgbackup_core::database::Database;
use pgbackup_core::reconcile::reconcile_stranded_records;
use pgbackup_core::runner::BackupRunner;
use pgbackup_core::scheduler::Scheduler;
use pgbackup_core::version::VersionManager;
use pgbackup_core::Config;

#[derive(Parser, Debug)]
#[command(name = "pgbackup-server", about = "PostgreSQL backup scheduling service")]
struct Args {
    /// Path to the TOML configuration file. Falls back to $PGBACKUP_CONFIG,
    /// then ./pgbackup.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    info!(pool_size = config.database_pool_size, "configuration loaded");

    let database = Database::new(&config.database_url, config.database_pool_size);
    database
        .run_pending_migrations()
        .await
        .context("failed to apply database migrations")?;
    let dal = DAL::new(database);

    let reconciled = reconcile_stranded_records(&dal)
        .await
        .context("startup reconciliation failed")?;
    if reconciled > 0 {
        warn!(count = reconciled, "reconciled records stranded by a prior unclean shutdown");
    }

    let version_manager = Arc::new(VersionManager::new());

    // Each `Run` resolves the StorageConfig referenced by the particular
    // DatabaseConfig it is executing (spec.md §4.2 phase 3), so the runner
    // itself holds no storage state.
    let runner = Arc::new(BackupRunner::new(dal.clone(), version_manager));

    let scheduler = Scheduler::new(dal.clone(), runner);
    scheduler.start().await.context("failed to start scheduler")?;
    info!("scheduler started");

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, stopping scheduler");
    scheduler.stop().await;

    info!(drain_seconds = config.shutdown_drain_seconds, "draining in-flight workers");
    tokio::time::sleep(std::time::Duration::from_secs(config.shutdown_drain_seconds)).await;

    info!("shutdown complete");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();
}
