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

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "pgbackup-cli",
    version,
    about = "Operator CLI for the PostgreSQL backup scheduling service"
)]
pub struct Cli {
    /// Path to the TOML configuration file. Falls back to $PGBACKUP_CONFIG,
    /// then ./pgbackup.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a backup for a database config immediately, outside its schedule
    Trigger {
        /// DatabaseConfig id
        database_config_id: Uuid,
    },
    /// Restore a successful backup into its originating database or an override target
    Restore {
        /// Backup id to restore from
        backup_id: Uuid,

        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        #[arg(long)]
        dbname: Option<String>,

        #[arg(long)]
        user: Option<String>,

        /// Password for the override target. Never logged.
        #[arg(long, env = "PGBACKUP_RESTORE_SECRET")]
        secret: Option<String>,
    },
    /// List recent backups for a database config
    List {
        /// DatabaseConfig id
        database_config_id: Uuid,

        /// Maximum rows to display
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}
