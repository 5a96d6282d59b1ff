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

//! Diesel table definitions, hand-written to match `migrations/`.

diesel::table! {
    storage_configs (id) {
        id -> Uuid,
        provider -> Text,
        bucket -> Text,
        region -> Nullable<Text>,
        endpoint -> Nullable<Text>,
        access_key -> Text,
        secret_key -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    notification_configs (id) {
        id -> Uuid,
        name -> Text,
        webhook_url -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    database_configs (id) {
        id -> Uuid,
        name -> Text,
        host -> Text,
        port -> Int4,
        dbname -> Text,
        db_user -> Text,
        secret -> Text,
        schedule -> Text,
        storage_ref -> Uuid,
        notification_ref -> Nullable<Uuid>,
        rotation_kind -> Text,
        rotation_value -> Int4,
        postgres_version -> Text,
        version_last_checked -> Nullable<Timestamptz>,
        enabled -> Bool,
        paused -> Bool,
        owner_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    backups (id) {
        id -> Uuid,
        name -> Text,
        database_id -> Uuid,
        status -> Text,
        size_bytes -> Nullable<Int8>,
        storage_path -> Nullable<Text>,
        error_message -> Nullable<Text>,
        started_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    restore_jobs (id) {
        id -> Uuid,
        backup_id -> Uuid,
        target_host -> Nullable<Text>,
        target_port -> Nullable<Int4>,
        target_dbname -> Nullable<Text>,
        target_user -> Nullable<Text>,
        target_secret -> Nullable<Text>,
        status -> Text,
        error_message -> Nullable<Text>,
        started_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(database_configs -> storage_configs (storage_ref));
diesel::joinable!(backups -> database_configs (database_id));
diesel::joinable!(restore_jobs -> backups (backup_id));

diesel::allow_tables_to_appear_in_same_query!(
    storage_configs,
    notification_configs,
    database_configs,
    backups,
    restore_jobs,
);
