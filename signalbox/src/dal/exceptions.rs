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

//! Exceptions DAL
//!
//! Exception records are append-only: one insert per captured fault,
//! never updated.

use diesel::prelude::*;

use super::models::{NewSqliteExceptionRow, SqliteExceptionRow};
use super::DAL;
use crate::database::schema::signalbox_exceptions;
use crate::error::StorageError;
use crate::models::ExceptionRecord;

/// Data access layer for exception records.
#[derive(Clone)]
pub struct ExceptionsDAL<'a> {
    dal: &'a DAL,
}

impl<'a> ExceptionsDAL<'a> {
    /// Creates a new ExceptionsDAL instance.
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Appends one exception record.
    pub async fn insert(&self, record: &ExceptionRecord) -> Result<(), StorageError> {
        let conn = self
            .dal
            .database
            .pool()
            .get()
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        let row = NewSqliteExceptionRow::from(record);
        conn.interact(move |conn| {
            diesel::insert_into(signalbox_exceptions::table)
                .values(&row)
                .execute(conn)
        })
        .await
        .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        Ok(())
    }

    /// Fetches all records, ordered by `date`.
    pub async fn list(&self) -> Result<Vec<ExceptionRecord>, StorageError> {
        let conn = self
            .dal
            .database
            .pool()
            .get()
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        let rows: Vec<SqliteExceptionRow> = conn
            .interact(|conn| {
                signalbox_exceptions::table
                    .order(signalbox_exceptions::date.asc())
                    .load(conn)
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Counts the persisted records.
    pub async fn count(&self) -> Result<i64, StorageError> {
        let conn = self
            .dal
            .database
            .pool()
            .get()
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        let count = conn
            .interact(|conn| signalbox_exceptions::table.count().get_result::<i64>(conn))
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        Ok(count)
    }
}
