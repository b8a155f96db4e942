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

//! Data Access Layer
//!
//! CRUD operations for the persisted timeline rows. Domain records cross
//! this boundary; the SQLite-specific row models in [`models`] stay inside
//! it.
//!
//! Everything here runs on pooled connections via the `interact` pattern,
//! and every caller inside the crate reaches it through a flush — which
//! holds the reentrancy guard — so DAL work never feeds back into the
//! recorders.

pub mod exceptions;
pub mod jobs;
pub mod models;

pub use exceptions::ExceptionsDAL;
pub use jobs::JobsDAL;

use crate::database::Database;

/// Entry point for database operations.
///
/// `DAL` is `Clone` and can be shared freely; each clone references the
/// same underlying connection pool.
#[derive(Clone, Debug)]
pub struct DAL {
    /// The database instance with connection pool.
    pub database: Database,
}

impl DAL {
    /// Creates a new DAL instance.
    pub fn new(database: Database) -> Self {
        DAL { database }
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Returns a jobs DAL for job-row operations.
    pub fn jobs(&self) -> JobsDAL {
        JobsDAL::new(self)
    }

    /// Returns an exceptions DAL for exception-record operations.
    pub fn exceptions(&self) -> ExceptionsDAL {
        ExceptionsDAL::new(self)
    }
}
