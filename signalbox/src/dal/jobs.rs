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

//! Jobs DAL
//!
//! Upsert and read-back operations for job attempt rows, keyed by
//! (`job_uuid`, `attempt`). The upsert is a select-then-branch (SQLite has
//! no `ON CONFLICT DO UPDATE ... RETURNING` on all supported versions):
//! when a row for the key exists, the incoming record is folded into it
//! with the set-once merge; otherwise the record is inserted as-is.
//! Applying the same entry twice is therefore a no-op beyond the first
//! write.

use diesel::prelude::*;
use uuid::Uuid;

use super::models::{uuid_to_blob, NewSqliteJobRow, SqliteJobRow};
use super::DAL;
use crate::database::schema::signalbox_jobs;
use crate::error::StorageError;
use crate::models::JobRecord;

/// Data access layer for job attempt rows.
#[derive(Clone)]
pub struct JobsDAL<'a> {
    dal: &'a DAL,
}

impl<'a> JobsDAL<'a> {
    /// Creates a new JobsDAL instance.
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Inserts or merge-updates the row identified by the record's
    /// (`job_uuid`, `attempt`).
    pub async fn upsert(&self, record: &JobRecord) -> Result<(), StorageError> {
        let conn = self
            .dal
            .database
            .pool()
            .get()
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        let incoming = record.clone();
        conn.interact(move |conn| -> Result<(), diesel::result::Error> {
            let key_blob = uuid_to_blob(&incoming.job_uuid);
            let existing: Option<SqliteJobRow> = signalbox_jobs::table
                .filter(signalbox_jobs::job_uuid.eq(&key_blob))
                .filter(signalbox_jobs::attempt.eq(incoming.attempt))
                .first::<SqliteJobRow>(conn)
                .optional()?;

            match existing {
                Some(row) => {
                    let row_id = row.id;
                    let mut merged = JobRecord::from(row);
                    merged.merge(&incoming);

                    diesel::update(signalbox_jobs::table.find(row_id))
                        .set(&NewSqliteJobRow::from(&merged))
                        .execute(conn)?;
                }
                None => {
                    diesel::insert_into(signalbox_jobs::table)
                        .values(&NewSqliteJobRow::from(&incoming))
                        .execute(conn)?;
                }
            }

            Ok(())
        })
        .await
        .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        Ok(())
    }

    /// Fetches one row by its logical identity.
    pub async fn find(
        &self,
        job_uuid: Uuid,
        attempt: i32,
    ) -> Result<Option<JobRecord>, StorageError> {
        let conn = self
            .dal
            .database
            .pool()
            .get()
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        let key_blob = uuid_to_blob(&job_uuid);
        let row: Option<SqliteJobRow> = conn
            .interact(move |conn| {
                signalbox_jobs::table
                    .filter(signalbox_jobs::job_uuid.eq(&key_blob))
                    .filter(signalbox_jobs::attempt.eq(attempt))
                    .first::<SqliteJobRow>(conn)
                    .optional()
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        Ok(row.map(Into::into))
    }

    /// Fetches all rows, ordered by `date` then `attempt`.
    pub async fn list(&self) -> Result<Vec<JobRecord>, StorageError> {
        let conn = self
            .dal
            .database
            .pool()
            .get()
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        let rows: Vec<SqliteJobRow> = conn
            .interact(|conn| {
                signalbox_jobs::table
                    .order((signalbox_jobs::date.asc(), signalbox_jobs::attempt.asc()))
                    .load(conn)
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Counts the persisted rows.
    pub async fn count(&self) -> Result<i64, StorageError> {
        let conn = self
            .dal
            .database
            .pool()
            .get()
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        let count = conn
            .interact(|conn| signalbox_jobs::table.count().get_result::<i64>(conn))
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        Ok(count)
    }
}
