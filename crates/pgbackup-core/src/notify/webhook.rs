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

//! A blind HTTP POST notifier. The core does not interpret the response —
//! any failure is logged and otherwise ignored (spec.md §7 "Notifier:
//! always non-fatal").

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use super::Notifier;

pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    async fn post(&self, payload: serde_json::Value) {
        if let Err(e) = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
        {
            warn!(error = %e, url = %self.webhook_url, "notification webhook failed");
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_success(&self, name: &str, bytes: i64, duration_human: &str) {
        self.post(json!({
            "event": "backup.success",
            "name": name,
            "bytes": bytes,
            "duration": duration_human,
        }))
        .await;
    }

    async fn send_failure(&self, name: &str, reason: &str) {
        self.post(json!({
            "event": "backup.failure",
            "name": name,
            "reason": reason,
        }))
        .await;
    }

    async fn send_restore_success(&self, source: &str, target: &str) {
        self.post(json!({
            "event": "restore.success",
            "source": source,
            "target": target,
        }))
        .await;
    }
}
