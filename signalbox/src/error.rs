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

//! Error types for signalbox.
//!
//! Recorders themselves never return errors: telemetry capture must not be
//! able to affect the host operation being observed, so recorder-side
//! problems are logged and degraded to best-effort entries instead. Errors
//! surface only at the persistence tier, where the caller of a flush is
//! responsible for deciding what to do about rows that could not be written.

use thiserror::Error;

/// Errors raised while applying entries to a persistent store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to obtain a connection from the pool, or the pooled
    /// interaction itself failed.
    #[error("Connection pool error: {0}")]
    ConnectionPool(String),

    /// A query failed at the database layer.
    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),

    /// An entry's attributes could not be decoded into the row shape its
    /// table expects.
    #[error("Malformed entry for table '{table}': {source}")]
    Decode {
        /// Table the entry was destined for.
        table: String,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// The entry names a table no store knows how to write.
    #[error("No destination for table '{0}'")]
    UnknownTable(String),

    /// Running embedded migrations failed.
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Raised by a flush when one or more entries could not be persisted.
///
/// The buffer is always fully drained before entries are applied, so a
/// partial failure never leaves stale entries behind to be replayed by a
/// later flush. The entries that failed are reported here; retrying or
/// discarding them is the caller's decision.
#[derive(Debug, Error)]
#[error("Flushed {applied} of {total} entries; {} failed", errors.len())]
pub struct FlushError {
    /// Number of entries successfully applied.
    pub applied: usize,
    /// Number of entries drained from the buffer.
    pub total: usize,
    /// One error per entry that failed to persist, in buffer order.
    pub errors: Vec<StorageError>,
}
