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

//! # Signalbox
//!
//! An embedded telemetry layer that observes the lifecycle of
//! asynchronously executed units of work — queued jobs, listeners,
//! mailables, notifications, console commands — inside a host application,
//! and turns scattered, out-of-order lifecycle callbacks into durable,
//! queryable timeline rows.
//!
//! ## Architecture
//!
//! ```text
//! host lifecycle callback
//!        │
//!        ▼
//! JobsRecorder / ExceptionsRecorder     (stateful correlation)
//!        │  Entry
//!        ▼
//! RecorderContext                       (ingest buffer + reentrancy guard)
//!        │  flush()
//!        ▼
//! Storage                               (keyed upserts → persistent rows)
//! ```
//!
//! Recorders correlate independent callbacks that refer to the same
//! logical job attempt — queued, processing, released/retried,
//! processed/failed — computing derived fields (duration, attempt
//! timeline) without reading storage back. Nothing is durable until the
//! host triggers a flush; the flush runs with the context's reentrancy
//! guard raised so the act of persisting telemetry is never itself
//! recorded.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use signalbox::{
//!     BusJob, DatabaseStorage, JobProcessed, JobProcessing, JobQueued,
//!     JobsRecorder, RecorderContext, SignalboxConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SignalboxConfig::default();
//! let context = Arc::new(RecorderContext::new());
//! let recorder = JobsRecorder::new(context.clone(), &config.jobs);
//!
//! // Wire these calls to the host's queue callbacks.
//! let job = BusJob::new("SendWelcomeEmail", "database", "default");
//! recorder.record_queued(&JobQueued::new(&job));
//! recorder.record_processing(&JobProcessing::new(&job, 1));
//! recorder.record_processed(&JobProcessed::new(&job, 1));
//!
//! // Persist on whatever cadence the host prefers.
//! let storage = DatabaseStorage::new(&config).await?;
//! context.flush(&storage).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod dal;
pub mod database;
pub mod entry;
pub mod error;
pub mod fault;
pub mod models;
pub mod recorders;
pub mod signals;
pub mod storage;

pub use config::{ExceptionsConfig, JobsConfig, SignalboxConfig, StorageConfig};
pub use context::{IgnoreGuard, RecorderContext};
pub use dal::DAL;
pub use database::Database;
pub use entry::Entry;
pub use error::{FlushError, StorageError};
pub use fault::{Fault, FaultOrigin, Frame};
pub use models::{ExceptionRecord, JobRecord};
pub use recorders::{ExceptionsRecorder, JobsRecorder};
pub use signals::{
    BusJob, Dispatchable, JobDescriptor, JobFailed, JobProcessed, JobProcessing, JobQueued,
    JobReleased, QueuedClosure, QueuedCommand, QueuedListener, QueuedMailable, QueuedNotification,
};
pub use storage::{DatabaseStorage, MemoryStorage, Storage};
