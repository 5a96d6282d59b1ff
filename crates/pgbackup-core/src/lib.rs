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

//! Scheduling and execution for automated PostgreSQL logical backups:
//! a cron-driven scheduler, a dump/upload pipeline with PostgreSQL
//! version awareness, retention enforcement, and on-demand restore.

pub mod config;
pub mod dal;
pub mod database;
pub mod error;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod retention;
pub mod runner;
pub mod scheduler;
pub mod storage;
pub mod version;

pub use config::Config;
pub use dal::DAL;
pub use database::Database;
pub use runner::{BackupRunner, RestoreRunner};
pub use scheduler::Scheduler;
