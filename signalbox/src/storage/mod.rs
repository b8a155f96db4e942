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

//! Storage backends for flushed entries.
//!
//! A [`Storage`] is the destination a flush drains the ingest buffer into.
//! It applies each entry as an insert-or-update keyed by the entry's
//! logical row identity: job rows by (`job_uuid`, `attempt`), exception
//! records as plain appends.
//!
//! [`DatabaseStorage`] is the durable implementation; [`MemoryStorage`]
//! keeps rows in process memory and exists for tests and hosts that want
//! to observe rows without a database.

pub mod memory;

pub use memory::MemoryStorage;

use async_trait::async_trait;

use crate::config::SignalboxConfig;
use crate::dal::DAL;
use crate::database::Database;
use crate::entry::Entry;
use crate::error::StorageError;
use crate::models::{ExceptionRecord, JobRecord};

/// A destination for flushed entries.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Applies one entry against the store, keyed by the entry's logical
    /// row identity.
    async fn upsert(&self, entry: &Entry) -> Result<(), StorageError>;
}

/// Durable storage backed by the database layer.
///
/// Routes each entry by its destination table to the matching DAL
/// operation. Entries for tables this store does not own are an error:
/// silently dropping them would make a misconfigured recorder invisible.
pub struct DatabaseStorage {
    dal: DAL,
    jobs_table: String,
    exceptions_table: String,
}

impl DatabaseStorage {
    /// Opens the configured database, runs pending migrations, and
    /// returns a ready store.
    pub async fn new(config: &SignalboxConfig) -> Result<Self, StorageError> {
        let database = Database::new(&config.storage.url);
        database.run_migrations().await?;
        Ok(Self::with_database(database, config))
    }

    /// Wraps an already-migrated database.
    pub fn with_database(database: Database, config: &SignalboxConfig) -> Self {
        Self {
            dal: DAL::new(database),
            jobs_table: config.jobs.table.clone(),
            exceptions_table: config.exceptions.table.clone(),
        }
    }

    /// The DAL backing this store, for read-back queries.
    ///
    /// Callers outside a flush must wrap reads in
    /// [`RecorderContext::ignore`](crate::RecorderContext::ignore) so the
    /// queries are not themselves observed.
    pub fn dal(&self) -> &DAL {
        &self.dal
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn upsert(&self, entry: &Entry) -> Result<(), StorageError> {
        let table = entry.table();

        if table == self.jobs_table {
            let record: JobRecord = entry.record().map_err(|source| StorageError::Decode {
                table: table.to_string(),
                source,
            })?;
            self.dal.jobs().upsert(&record).await
        } else if table == self.exceptions_table {
            let record: ExceptionRecord =
                entry.record().map_err(|source| StorageError::Decode {
                    table: table.to_string(),
                    source,
                })?;
            self.dal.exceptions().insert(&record).await
        } else {
            Err(StorageError::UnknownTable(table.to_string()))
        }
    }
}
