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

//! Database connection pool management.
//!
//! Wraps a `deadpool_diesel` pool of `diesel::PgConnection`s. Every DAL
//! method borrows a connection with `pool.get()` and runs its diesel calls
//! inside `conn.interact(...)`, which moves the blocking diesel work onto a
//! dedicated thread so the async executor is never blocked.

use deadpool_diesel::postgres::{Manager, Pool, Runtime};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::error::RepositoryError;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../../migrations");

/// A cloneable handle to the shared Postgres connection pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Builds a connection pool against `database_url`.
    ///
    /// # Panics
    /// Panics if the pool cannot be constructed (malformed URL or manager
    /// setup failure) — this is treated as a fatal startup error, the way
    /// the source service refuses to serve traffic without a database.
    pub fn new(database_url: &str, max_size: usize) -> Self {
        let manager = Manager::new(database_url, Runtime::Tokio1);
        let pool = Pool::builder(manager)
            .max_size(max_size)
            .build()
            .expect("failed to build database connection pool");

        info!(max_size, "database connection pool initialized");
        Self { pool }
    }

    pub fn pool(&self) -> Pool {
        self.pool.clone()
    }

    pub async fn get(&self) -> Result<deadpool_diesel::postgres::Connection, RepositoryError> {
        self.pool
            .get()
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))
    }

    /// Applies any migration under `migrations/` not yet recorded in
    /// `__diesel_schema_migrations`. Run once at server startup, before the
    /// scheduler or reconciliation pass touches the schema.
    pub async fn run_pending_migrations(&self) -> Result<(), RepositoryError> {
        let conn = self.get().await?;
        conn.interact(|conn| conn.run_pending_migrations(MIGRATIONS).map(|_| ()))
            .await
            .map_err(|e| RepositoryError::ConnectionPool(e.to_string()))?
            .map_err(|e| RepositoryError::Migration(e.to_string()))
    }
}
