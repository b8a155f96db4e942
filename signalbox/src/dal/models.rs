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

//! SQLite-specific database models
//!
//! Diesel model definitions using SQLite-compatible types: UUIDs are
//! stored as BLOB (`Vec<u8>`) and timestamps as TEXT (RFC3339 strings).
//! These models are used internally by the DAL and converted to/from
//! domain types at the DAL boundary.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::database::schema::{signalbox_exceptions, signalbox_jobs};
use crate::models::{ExceptionRecord, JobRecord};

// ============================================================================
// Job Row Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = signalbox_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteJobRow {
    pub id: i32,
    pub date: String,
    pub queued_at: Option<String>,
    pub processing_at: Option<String>,
    pub released_at: Option<String>,
    pub processed_at: Option<String>,
    pub failed_at: Option<String>,
    pub user_id: Option<String>,
    pub job: String,
    pub job_uuid: Vec<u8>,
    pub attempt: i32,
    pub connection: String,
    pub queue: String,
    pub duration: Option<i64>,
}

/// Insert/update shape for a job row. `treat_none_as_null` because every
/// write carries the row's full merged state, not a sparse patch.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = signalbox_jobs)]
#[diesel(treat_none_as_null = true)]
pub struct NewSqliteJobRow {
    pub date: String,
    pub queued_at: Option<String>,
    pub processing_at: Option<String>,
    pub released_at: Option<String>,
    pub processed_at: Option<String>,
    pub failed_at: Option<String>,
    pub user_id: Option<String>,
    pub job: String,
    pub job_uuid: Vec<u8>,
    pub attempt: i32,
    pub connection: String,
    pub queue: String,
    pub duration: Option<i64>,
}

// ============================================================================
// Exception Row Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = signalbox_exceptions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteExceptionRow {
    pub id: i32,
    pub date: String,
    pub class: String,
    pub location: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = signalbox_exceptions)]
pub struct NewSqliteExceptionRow {
    pub date: String,
    pub class: String,
    pub location: String,
    pub user_id: Option<String>,
}

// ============================================================================
// Conversion Utilities
// ============================================================================

/// Convert a UUID to SQLite BLOB format (`Vec<u8>`)
pub fn uuid_to_blob(uuid: &Uuid) -> Vec<u8> {
    uuid.as_bytes().to_vec()
}

/// Convert SQLite BLOB to UUID
pub fn blob_to_uuid(blob: &[u8]) -> Result<Uuid, uuid::Error> {
    Uuid::from_slice(blob)
}

/// Convert `DateTime<Utc>` to RFC3339 string for SQLite storage
pub fn datetime_to_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse RFC3339 string from SQLite to `DateTime<Utc>`
pub fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

fn optional_datetime_to_string(dt: &Option<DateTime<Utc>>) -> Option<String> {
    dt.as_ref().map(datetime_to_string)
}

fn optional_string_to_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.map(|ts| string_to_datetime(&ts).expect("Invalid timestamp in database"))
}

// ============================================================================
// Conversion Implementations: SQLite models <-> Domain models
// ============================================================================

impl From<SqliteJobRow> for JobRecord {
    fn from(row: SqliteJobRow) -> Self {
        JobRecord {
            date: string_to_datetime(&row.date).expect("Invalid timestamp in database"),
            queued_at: optional_string_to_datetime(row.queued_at),
            processing_at: optional_string_to_datetime(row.processing_at),
            released_at: optional_string_to_datetime(row.released_at),
            processed_at: optional_string_to_datetime(row.processed_at),
            failed_at: optional_string_to_datetime(row.failed_at),
            user_id: row.user_id,
            job: row.job,
            job_uuid: blob_to_uuid(&row.job_uuid).expect("Invalid UUID in database"),
            attempt: row.attempt,
            connection: row.connection,
            queue: row.queue,
            duration: row.duration,
        }
    }
}

impl From<&JobRecord> for NewSqliteJobRow {
    fn from(record: &JobRecord) -> Self {
        NewSqliteJobRow {
            date: datetime_to_string(&record.date),
            queued_at: optional_datetime_to_string(&record.queued_at),
            processing_at: optional_datetime_to_string(&record.processing_at),
            released_at: optional_datetime_to_string(&record.released_at),
            processed_at: optional_datetime_to_string(&record.processed_at),
            failed_at: optional_datetime_to_string(&record.failed_at),
            user_id: record.user_id.clone(),
            job: record.job.clone(),
            job_uuid: uuid_to_blob(&record.job_uuid),
            attempt: record.attempt,
            connection: record.connection.clone(),
            queue: record.queue.clone(),
            duration: record.duration,
        }
    }
}

impl From<SqliteExceptionRow> for ExceptionRecord {
    fn from(row: SqliteExceptionRow) -> Self {
        ExceptionRecord {
            date: string_to_datetime(&row.date).expect("Invalid timestamp in database"),
            class: row.class,
            location: row.location,
            user_id: row.user_id,
        }
    }
}

impl From<&ExceptionRecord> for NewSqliteExceptionRow {
    fn from(record: &ExceptionRecord) -> Self {
        NewSqliteExceptionRow {
            date: datetime_to_string(&record.date),
            class: record.class.clone(),
            location: record.location.clone(),
            user_id: record.user_id.clone(),
        }
    }
}
