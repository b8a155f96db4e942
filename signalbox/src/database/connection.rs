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

//! Database connection management.
//!
//! This module provides an async connection pool implementation using
//! `deadpool-diesel` for managing SQLite connections. Accepted connection
//! strings are file paths, `sqlite://`-prefixed paths, or `:memory:`.

use deadpool_diesel::sqlite::{Manager, Pool, Runtime};
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use tracing::info;

use crate::error::StorageError;

/// A pool of SQLite connections.
///
/// `Database` is `Clone`; each clone references the same underlying pool,
/// so one instance can be shared by the store and any read-back paths.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Database(sqlite)")
    }
}

impl Database {
    /// Creates a new connection pool for the given connection string.
    ///
    /// # Panics
    ///
    /// Panics if the connection pool cannot be created.
    pub fn new(connection_string: &str) -> Self {
        let connection_url = Self::build_sqlite_url(connection_string);
        let manager = Manager::new(connection_url, Runtime::Tokio1);
        // SQLite has limited concurrent write support even with WAL mode.
        // Using a single connection avoids "database is locked" errors.
        let pool = Pool::builder(manager)
            .max_size(1)
            .build()
            .expect("Failed to create SQLite connection pool");

        info!("SQLite connection pool initialized (size: 1)");

        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Strips the `sqlite://` prefix if present.
    fn build_sqlite_url(connection_string: &str) -> String {
        match connection_string.strip_prefix("sqlite://") {
            Some(path) => path.to_string(),
            None => connection_string.to_string(),
        }
    }

    /// Runs pending embedded migrations.
    ///
    /// Sets WAL mode and a busy timeout on the connection before
    /// migrating, so later writers wait on locks instead of failing.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        conn.interact(|conn| {
            diesel::sql_query("PRAGMA journal_mode=WAL;")
                .execute(conn)
                .map_err(|e| e.to_string())?;
            diesel::sql_query("PRAGMA busy_timeout=30000;")
                .execute(conn)
                .map_err(|e| e.to_string())?;

            conn.run_pending_migrations(super::MIGRATIONS)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| StorageError::Migration(e.to_string()))?
        .map_err(StorageError::Migration)?;

        Ok(())
    }
}
