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

//! Shared fixtures for the integration suites.

use chrono::{DateTime, Duration, TimeZone, Utc};
use signalbox::JobDescriptor;
use uuid::Uuid;

/// Initializes tracing output for a test, honoring `RUST_LOG`.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A fixed base instant plus `ms` milliseconds.
pub fn t(ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 2, 3, 4, 5).unwrap() + Duration::milliseconds(ms)
}

/// A job descriptor on the default transport.
pub fn descriptor(name: &str) -> JobDescriptor {
    JobDescriptor {
        name: name.to_string(),
        uuid: Uuid::new_v4(),
        connection: "database".to_string(),
        queue: "default".to_string(),
    }
}
