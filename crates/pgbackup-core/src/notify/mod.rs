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

//! Fire-and-forget notification emission. Consumers of the core never see
//! a failed send: every implementation swallows its own errors and logs.

pub mod webhook;

use async_trait::async_trait;

pub use webhook::WebhookNotifier;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_success(&self, name: &str, bytes: i64, duration_human: &str);
    async fn send_failure(&self, name: &str, reason: &str);
    async fn send_restore_success(&self, source: &str, target: &str);
}

/// A notifier that does nothing, for configs with no `NotificationConfig`.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send_success(&self, _name: &str, _bytes: i64, _duration_human: &str) {}
    async fn send_failure(&self, _name: &str, _reason: &str) {}
    async fn send_restore_success(&self, _source: &str, _target: &str) {}
}
