/*
 *  Copyright 2025 Colliery Software
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

//! Diesel schema for the persisted tables.
//!
//! SQLite-compatible column types: UUIDs as BLOB, timestamps as RFC3339
//! TEXT, durations as BIGINT milliseconds.

diesel::table! {
    signalbox_jobs (id) {
        id -> Integer,
        date -> Text,
        queued_at -> Nullable<Text>,
        processing_at -> Nullable<Text>,
        released_at -> Nullable<Text>,
        processed_at -> Nullable<Text>,
        failed_at -> Nullable<Text>,
        user_id -> Nullable<Text>,
        job -> Text,
        job_uuid -> Binary,
        attempt -> Integer,
        connection -> Text,
        queue -> Text,
        duration -> Nullable<BigInt>,
    }
}

diesel::table! {
    signalbox_exceptions (id) {
        id -> Integer,
        date -> Text,
        class -> Text,
        location -> Text,
        user_id -> Nullable<Text>,
    }
}
