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

//! In-memory storage backend.
//!
//! Applies the same keyed-upsert semantics as the durable store, but
//! against process memory. Used by the test suites to assert final row
//! state, and usable by hosts that want rows without a database.

use std::sync::Mutex;

use async_trait::async_trait;

use super::Storage;
use crate::config::SignalboxConfig;
use crate::entry::Entry;
use crate::error::StorageError;
use crate::models::{ExceptionRecord, JobRecord};

/// A [`Storage`] holding rows in process memory.
pub struct MemoryStorage {
    jobs_table: String,
    exceptions_table: String,
    jobs: Mutex<Vec<JobRecord>>,
    exceptions: Mutex<Vec<ExceptionRecord>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(&SignalboxConfig::default())
    }
}

impl MemoryStorage {
    /// Creates an empty store routing on the configured table names.
    pub fn new(config: &SignalboxConfig) -> Self {
        Self {
            jobs_table: config.jobs.table.clone(),
            exceptions_table: config.exceptions.table.clone(),
            jobs: Mutex::new(Vec::new()),
            exceptions: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the job rows, in first-write order.
    pub fn jobs(&self) -> Vec<JobRecord> {
        self.jobs.lock().unwrap().clone()
    }

    /// Snapshot of the exception records, in insertion order.
    pub fn exceptions(&self) -> Vec<ExceptionRecord> {
        self.exceptions.lock().unwrap().clone()
    }

    /// Fetches one job row by its logical identity.
    pub fn job(&self, job_uuid: uuid::Uuid, attempt: i32) -> Option<JobRecord> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.key() == (job_uuid, attempt))
            .cloned()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upsert(&self, entry: &Entry) -> Result<(), StorageError> {
        let table = entry.table();

        if table == self.jobs_table {
            let incoming: JobRecord = entry.record().map_err(|source| StorageError::Decode {
                table: table.to_string(),
                source,
            })?;

            let mut jobs = self.jobs.lock().unwrap();
            match jobs.iter_mut().find(|row| row.key() == incoming.key()) {
                Some(row) => row.merge(&incoming),
                None => jobs.push(incoming),
            }
            Ok(())
        } else if table == self.exceptions_table {
            let record: ExceptionRecord =
                entry.record().map_err(|source| StorageError::Decode {
                    table: table.to_string(),
                    source,
                })?;
            self.exceptions.lock().unwrap().push(record);
            Ok(())
        } else {
            Err(StorageError::UnknownTable(table.to_string()))
        }
    }
}
