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

//! Thin clap front-end over `pgbackup-core` for manual operation outside
//! the scheduler: trigger a backup, restore one, or list recent backups.

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use pgbackup_core::dal::DAL;
use pgbackup_core::database::Database;
use pgbackup_core::notify::{NullNotifier, WebhookNotifier};
use pgbackup_core::runner::{BackupRunner, RestoreRunner};
use pgbackup_core::models::RestoreTargetOverride;
use pgbackup_core::version::VersionManager;
use pgbackup_core::Config;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let database = Database::new(&config.database_url, config.database_pool_size);
    let dal = DAL::new(database);

    match cli.command {
        Commands::Trigger { database_config_id } => trigger(&dal, database_config_id).await,
        Commands::Restore {
            backup_id,
            host,
            port,
            dbname,
            user,
            secret,
        } => {
            restore(
                &dal,
                backup_id,
                RestoreTargetOverride {
                    host,
                    port,
                    dbname,
                    user,
                    secret,
                },
            )
            .await
        }
        Commands::List {
            database_config_id,
            limit,
        } => list(&dal, database_config_id, limit).await,
    }
}

async fn trigger(dal: &DAL, database_config_id: Uuid) -> Result<()> {
    let cfg = dal
        .database_configs()
        .get(database_config_id)
        .await
        .context("database config not found")?;

    let version_manager = Arc::new(VersionManager::new());
    let runner = Arc::new(BackupRunner::new(dal.clone(), version_manager));
    let notifier = resolve_notifier(dal, cfg.notification_ref).await?;

    println!("triggering backup for {}...", cfg.name);
    runner.run(&cfg, None, notifier).await;

    let latest = dal
        .backups()
        .list_by_database(cfg.id)
        .await
        .context("failed to load backup history")?;
    match latest.first() {
        Some(b) => println!("backup {} finished with status={}", b.id, b.status),
        None => println!("no backup record found after trigger"),
    }
    Ok(())
}

async fn restore(dal: &DAL, backup_id: Uuid, overrides: RestoreTargetOverride) -> Result<()> {
    let backup = dal
        .backups()
        .get(backup_id)
        .await
        .context("backup not found")?;
    let cfg = dal
        .database_configs()
        .get(backup.database_id)
        .await
        .context("owning database config not found")?;

    let version_manager = Arc::new(VersionManager::new());
    let runner = RestoreRunner::new(dal.clone(), version_manager);
    let notifier = resolve_notifier(dal, cfg.notification_ref).await?;

    println!("restoring backup {backup_id}...");
    let job = runner.run(backup_id, overrides, notifier.as_ref()).await?;
    println!("restore job {} finished with status={}", job.id, job.status);
    Ok(())
}

async fn list(dal: &DAL, database_config_id: Uuid, limit: usize) -> Result<()> {
    let backups = dal
        .backups()
        .list_by_database(database_config_id)
        .await
        .context("failed to list backups")?;

    for backup in backups.into_iter().take(limit) {
        println!(
            "{}\t{}\t{}\t{}",
            backup.id,
            backup.status,
            backup.started_at,
            backup.storage_path.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn resolve_notifier(
    dal: &DAL,
    notification_ref: Option<Uuid>,
) -> Result<Arc<dyn pgbackup_core::notify::Notifier>> {
    match notification_ref {
        Some(id) => {
            let cfg = dal
                .notification_configs()
                .get(id)
                .await
                .context("notification config not found")?;
            Ok(Arc::new(WebhookNotifier::new(cfg.webhook_url)))
        }
        None => Ok(Arc::new(NullNotifier)),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
