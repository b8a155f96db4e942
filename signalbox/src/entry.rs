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

//! Entry Model
//!
//! An [`Entry`] is an immutable, timestamped fact destined for one logical
//! table. Recorders construct entries and append them to the ingest buffer;
//! a store later applies each entry as an insert-or-update against durable
//! storage.
//!
//! A recorder may construct several entries over the life of one job
//! attempt, one per lifecycle transition. Each entry carries the *current
//! known state* of the row at that point in time, not a delta; the store's
//! merge rules decide how successive entries for the same row combine.
//!
//! Attributes are held as an order-preserving map of field name to scalar,
//! produced by serializing a typed record and decoded back into the typed
//! record at the storage boundary.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// An immutable fact pending persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Logical table this entry is destined for.
    table: String,
    /// Ordered field-name to scalar mapping.
    attributes: Map<String, Value>,
}

impl Entry {
    /// Creates an entry from a raw attribute map.
    pub fn new(table: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            table: table.into(),
            attributes,
        }
    }

    /// Creates an entry by serializing a typed record.
    ///
    /// Field order in the record is preserved in the attribute map.
    ///
    /// # Errors
    ///
    /// Fails if the record does not serialize to a JSON object.
    pub fn from_record<T: Serialize>(
        table: impl Into<String>,
        record: &T,
    ) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(record)? {
            Value::Object(attributes) => Ok(Self::new(table, attributes)),
            other => Err(serde::ser::Error::custom(format!(
                "expected a map of attributes, got {other}"
            ))),
        }
    }

    /// The logical table this entry is destined for.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The entry's attributes, in construction order.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Looks up a single attribute by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Decodes the attributes back into a typed record.
    pub fn record<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.attributes.clone()))
    }
}
