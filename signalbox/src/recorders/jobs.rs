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

//! Job Lifecycle Recorder
//!
//! The correlation engine. It observes the five lifecycle signals a job
//! attempt produces and emits entries representing the attempt's row —
//! without ever reading durable storage back.
//!
//! ## Correlation state
//!
//! The only state needed to connect signals is the `queued_at` of the
//! attempt currently in flight and the `processing_at` of the attempt a
//! worker is executing, both keyed by `job_uuid`. For attempt 1 the
//! `queued_at` is the original dispatch time; for attempt N>1 it is the
//! moment the previous attempt was released back onto the queue.
//!
//! This state is strictly per-process. Distinct attempts of the same job
//! may run on different worker processes; a process that lacks the state
//! for an earlier attempt emits a best-effort row with the fields it can
//! derive and leaves the rest null. The persisted row is the only
//! cross-process source of truth, and the store's set-once merge keeps a
//! best-effort row from regressing fields another process already wrote.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::JobsConfig;
use crate::context::RecorderContext;
use crate::entry::Entry;
use crate::models::JobRecord;
use crate::signals::{JobDescriptor, JobFailed, JobProcessed, JobProcessing, JobQueued, JobReleased};

/// Per-process correlation state for one `job_uuid`.
#[derive(Debug, Clone, Copy, Default)]
struct AttemptState {
    /// When the attempt currently in flight was placed on the queue.
    queued_at: Option<DateTime<Utc>>,
    /// When the worker began executing the attempt, if it has.
    processing_at: Option<DateTime<Utc>>,
}

/// Which terminal field finalizes an attempt row.
#[derive(Debug, Clone, Copy)]
enum Terminal {
    Released,
    Processed,
    Failed,
}

/// Records job lifecycle signals as timeline entries.
pub struct JobsRecorder {
    context: Arc<RecorderContext>,
    table: String,
    threshold_ms: u64,
    ignore: Vec<Regex>,
    states: Mutex<HashMap<Uuid, AttemptState>>,
}

impl JobsRecorder {
    /// Creates a recorder bound to `context`.
    ///
    /// Ignore patterns that fail to compile are skipped with a warning —
    /// a bad pattern must not take the recorder down.
    pub fn new(context: Arc<RecorderContext>, config: &JobsConfig) -> Self {
        let ignore = config
            .ignore
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(error) => {
                    warn!(pattern = %pattern, %error, "skipping unparseable ignore pattern");
                    None
                }
            })
            .collect();

        Self {
            context,
            table: config.table.clone(),
            threshold_ms: config.threshold_ms,
            ignore,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Handles the dispatched-to-queue signal.
    ///
    /// Resolves the actor identity once, seeds the correlation state, and
    /// emits the attempt-1 row with `queued_at` set.
    pub fn record_queued(&self, event: &JobQueued) {
        if self.ignores(&event.job.name) {
            return;
        }

        self.states.lock().unwrap().insert(
            event.job.uuid,
            AttemptState {
                queued_at: Some(event.at),
                processing_at: None,
            },
        );

        let record = JobRecord {
            date: event.at,
            queued_at: Some(event.at),
            processing_at: None,
            released_at: None,
            processed_at: None,
            failed_at: None,
            user_id: self.context.resolve_user_id(),
            job: event.job.name.clone(),
            job_uuid: event.job.uuid,
            attempt: 1,
            connection: event.job.connection.clone(),
            queue: event.job.queue.clone(),
            duration: None,
        };
        self.emit(&record);
    }

    /// Handles the start-of-attempt signal.
    ///
    /// Carries the attempt's `queued_at` forward from in-memory state. A
    /// process that never saw the dispatch (or the previous release) has
    /// no state to carry and leaves `queued_at` null.
    pub fn record_processing(&self, event: &JobProcessing) {
        if self.ignores(&event.job.name) {
            return;
        }

        let queued_at = {
            let mut states = self.states.lock().unwrap();
            let state = states.entry(event.job.uuid).or_default();
            state.processing_at = Some(event.at);
            state.queued_at
        };

        if queued_at.is_none() {
            debug!(
                job = %event.job.name,
                attempt = event.attempt,
                "no queued-at state for attempt; emitting best-effort row"
            );
        }

        let record = JobRecord {
            date: event.at,
            queued_at,
            processing_at: Some(event.at),
            released_at: None,
            processed_at: None,
            failed_at: None,
            user_id: None,
            job: event.job.name.clone(),
            job_uuid: event.job.uuid,
            attempt: event.attempt,
            connection: event.job.connection.clone(),
            queue: event.job.queue.clone(),
            duration: None,
        };
        self.emit(&record);
    }

    /// Handles the released signal: finalizes the attempt and opens the
    /// next one.
    ///
    /// The release moment is both the terminal timestamp of this attempt
    /// and the `queued_at` of the next, so a second entry seeding the
    /// attempt+1 row is emitted alongside the finalizing one.
    pub fn record_released(&self, event: &JobReleased) {
        if self.ignores(&event.job.name) {
            return;
        }

        let state = self
            .states
            .lock()
            .unwrap()
            .remove(&event.job.uuid)
            .unwrap_or_default();

        self.emit(&self.terminal_record(
            &event.job,
            event.attempt,
            event.at,
            state,
            Terminal::Released,
        ));

        self.states.lock().unwrap().insert(
            event.job.uuid,
            AttemptState {
                queued_at: Some(event.at),
                processing_at: None,
            },
        );

        let next = JobRecord {
            date: event.at,
            queued_at: Some(event.at),
            processing_at: None,
            released_at: None,
            processed_at: None,
            failed_at: None,
            user_id: None,
            job: event.job.name.clone(),
            job_uuid: event.job.uuid,
            attempt: event.attempt + 1,
            connection: event.job.connection.clone(),
            queue: event.job.queue.clone(),
            duration: None,
        };
        self.emit(&next);
    }

    /// Handles the success signal. Terminal for this `job_uuid`.
    pub fn record_processed(&self, event: &JobProcessed) {
        if self.ignores(&event.job.name) {
            return;
        }

        let state = self
            .states
            .lock()
            .unwrap()
            .remove(&event.job.uuid)
            .unwrap_or_default();

        self.emit(&self.terminal_record(
            &event.job,
            event.attempt,
            event.at,
            state,
            Terminal::Processed,
        ));
    }

    /// Handles the failure signal. Terminal for this `job_uuid`.
    pub fn record_failed(&self, event: &JobFailed) {
        if self.ignores(&event.job.name) {
            return;
        }

        let state = self
            .states
            .lock()
            .unwrap()
            .remove(&event.job.uuid)
            .unwrap_or_default();

        self.emit(&self.terminal_record(
            &event.job,
            event.attempt,
            event.at,
            state,
            Terminal::Failed,
        ));
    }

    /// Builds the row finalizing an attempt.
    fn terminal_record(
        &self,
        job: &JobDescriptor,
        attempt: i32,
        at: DateTime<Utc>,
        state: AttemptState,
        terminal: Terminal,
    ) -> JobRecord {
        let duration = state.processing_at.and_then(|processing_at| {
            let elapsed = (at - processing_at).num_milliseconds();
            (self.threshold_ms == 0 || elapsed >= self.threshold_ms as i64).then_some(elapsed)
        });

        let mut record = JobRecord {
            date: at,
            queued_at: state.queued_at,
            processing_at: state.processing_at,
            released_at: None,
            processed_at: None,
            failed_at: None,
            user_id: None,
            job: job.name.clone(),
            job_uuid: job.uuid,
            attempt,
            connection: job.connection.clone(),
            queue: job.queue.clone(),
            duration,
        };
        match terminal {
            Terminal::Released => record.released_at = Some(at),
            Terminal::Processed => record.processed_at = Some(at),
            Terminal::Failed => record.failed_at = Some(at),
        }
        record
    }

    /// Whether the display name matches any configured ignore pattern.
    fn ignores(&self, name: &str) -> bool {
        self.ignore.iter().any(|pattern| pattern.is_match(name))
    }

    fn emit(&self, record: &JobRecord) {
        match Entry::from_record(&self.table, record) {
            Ok(entry) => self.context.append(entry),
            Err(error) => warn!(job = %record.job, %error, "dropping unencodable job entry"),
        }
    }
}
