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

//! Exception Record Model
//!
//! Append-only records of captured faults. Created once per capture and
//! never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A captured fault, reduced to the fields the timeline needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionRecord {
    /// When the fault was captured.
    pub date: DateTime<Utc>,
    /// Class name of the fault (or of its underlying cause for wrapped
    /// template-render faults).
    pub class: String,
    /// `<relative-path>:<line>` with the application root stripped; the
    /// line is omitted when only a source file could be recovered.
    pub location: String,
    /// Identity of the authenticated actor at capture time, if any.
    pub user_id: Option<String>,
}
