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

//! Integration tests for the job-lifecycle correlation engine, end to end
//! through the ingest buffer and a memory-backed store.

mod common;

use std::sync::Arc;

use signalbox::{
    Entry, JobFailed, JobProcessed, JobProcessing, JobQueued, JobRecord, JobReleased, JobsConfig,
    JobsRecorder, MemoryStorage, RecorderContext, SignalboxConfig, StorageError,
};
use tracing_test::traced_test;

use common::{descriptor, t};

fn setup(threshold_ms: u64) -> (Arc<RecorderContext>, JobsRecorder, MemoryStorage) {
    let config = SignalboxConfig {
        jobs: JobsConfig {
            threshold_ms,
            ..JobsConfig::default()
        },
        ..SignalboxConfig::default()
    };
    let context = Arc::new(RecorderContext::new());
    let recorder = JobsRecorder::new(context.clone(), &config.jobs);
    let storage = MemoryStorage::new(&config);
    (context, recorder, storage)
}

#[tokio::test]
async fn test_success_path() {
    common::init_tracing();
    let (context, recorder, storage) = setup(0);
    let job = descriptor("SendWelcomeEmail");

    recorder.record_queued(&JobQueued {
        job: job.clone(),
        at: t(0),
    });
    assert_eq!(context.pending_count(), 1);

    recorder.record_processing(&JobProcessing {
        job: job.clone(),
        attempt: 1,
        at: t(5),
    });
    recorder.record_processed(&JobProcessed {
        job: job.clone(),
        attempt: 1,
        at: t(8),
    });

    let applied = context.flush(&storage).await.unwrap();
    assert_eq!(applied, 3);
    assert_eq!(context.pending_count(), 0);

    let rows = storage.jobs();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.date, t(8));
    assert_eq!(row.queued_at, Some(t(0)));
    assert_eq!(row.processing_at, Some(t(5)));
    assert_eq!(row.released_at, None);
    assert_eq!(row.processed_at, Some(t(8)));
    assert_eq!(row.failed_at, None);
    assert_eq!(row.job, "SendWelcomeEmail");
    assert_eq!(row.job_uuid, job.uuid);
    assert_eq!(row.attempt, 1);
    assert_eq!(row.connection, "database");
    assert_eq!(row.queue, "default");
    assert_eq!(row.duration, Some(3));
}

#[tokio::test]
async fn test_retry_path() {
    let (context, recorder, storage) = setup(0);
    let job = descriptor("FlakyImport");

    recorder.record_queued(&JobQueued {
        job: job.clone(),
        at: t(0),
    });
    recorder.record_processing(&JobProcessing {
        job: job.clone(),
        attempt: 1,
        at: t(5),
    });
    recorder.record_released(&JobReleased {
        job: job.clone(),
        attempt: 1,
        at: t(6),
    });
    recorder.record_processing(&JobProcessing {
        job: job.clone(),
        attempt: 2,
        at: t(6),
    });
    recorder.record_processed(&JobProcessed {
        job: job.clone(),
        attempt: 2,
        at: t(9),
    });

    context.flush(&storage).await.unwrap();

    let rows = storage.jobs();
    assert_eq!(rows.len(), 2);

    let first = storage.job(job.uuid, 1).unwrap();
    assert_eq!(first.queued_at, Some(t(0)));
    assert_eq!(first.processing_at, Some(t(5)));
    assert_eq!(first.released_at, Some(t(6)));
    assert_eq!(first.processed_at, None);
    assert_eq!(first.duration, Some(1));

    let second = storage.job(job.uuid, 2).unwrap();
    // Re-queued the instant the first attempt released.
    assert_eq!(second.queued_at, Some(t(6)));
    assert_eq!(second.processing_at, Some(t(6)));
    assert_eq!(second.processed_at, Some(t(9)));
    assert_eq!(second.released_at, None);
    assert_eq!(second.duration, Some(3));
}

#[tokio::test]
async fn test_exhausted_retries_end_in_failed_not_released() {
    let (context, recorder, storage) = setup(0);
    let job = descriptor("AlwaysThrows");

    recorder.record_queued(&JobQueued {
        job: job.clone(),
        at: t(0),
    });
    recorder.record_processing(&JobProcessing {
        job: job.clone(),
        attempt: 1,
        at: t(1),
    });
    recorder.record_released(&JobReleased {
        job: job.clone(),
        attempt: 1,
        at: t(2),
    });
    recorder.record_processing(&JobProcessing {
        job: job.clone(),
        attempt: 2,
        at: t(3),
    });
    recorder.record_released(&JobReleased {
        job: job.clone(),
        attempt: 2,
        at: t(4),
    });
    recorder.record_processing(&JobProcessing {
        job: job.clone(),
        attempt: 3,
        at: t(5),
    });
    // Attempts exhausted: the third throw fails the job instead of
    // releasing it.
    recorder.record_failed(&JobFailed {
        job: job.clone(),
        attempt: 3,
        at: t(6),
        cause: None,
    });

    context.flush(&storage).await.unwrap();

    let rows = storage.jobs();
    assert_eq!(rows.len(), 3);

    // Attempts form a contiguous sequence starting at 1.
    let mut attempts: Vec<i32> = rows.iter().map(|row| row.attempt).collect();
    attempts.sort_unstable();
    assert_eq!(attempts, [1, 2, 3]);

    let last = storage.job(job.uuid, 3).unwrap();
    assert_eq!(last.failed_at, Some(t(6)));
    assert_eq!(last.released_at, None);
    assert_eq!(last.processed_at, None);
    assert_eq!(last.queued_at, Some(t(4)));
    assert_eq!(last.duration, Some(1));
}

#[tokio::test]
async fn test_duration_below_threshold_is_not_persisted() {
    let (context, recorder, storage) = setup(5000);
    let job = descriptor("QuickJob");

    recorder.record_queued(&JobQueued {
        job: job.clone(),
        at: t(0),
    });
    recorder.record_processing(&JobProcessing {
        job: job.clone(),
        attempt: 1,
        at: t(5),
    });
    recorder.record_processed(&JobProcessed {
        job: job.clone(),
        attempt: 1,
        at: t(8),
    });

    context.flush(&storage).await.unwrap();

    let row = storage.job(job.uuid, 1).unwrap();
    assert_eq!(row.processed_at, Some(t(8)));
    assert_eq!(row.duration, None);
}

#[tokio::test]
async fn test_flush_replay_is_idempotent() {
    let (context, _recorder, storage) = setup(0);

    let job = descriptor("ReplayedJob");
    let record = JobRecord {
        date: t(8),
        queued_at: Some(t(0)),
        processing_at: Some(t(5)),
        released_at: None,
        processed_at: Some(t(8)),
        failed_at: None,
        user_id: None,
        job: job.name.clone(),
        job_uuid: job.uuid,
        attempt: 1,
        connection: job.connection.clone(),
        queue: job.queue.clone(),
        duration: Some(3),
    };
    let entry = Entry::from_record("signalbox_jobs", &record).unwrap();

    context.append(entry.clone());
    context.flush(&storage).await.unwrap();
    let after_first = storage.jobs();

    // Simulated replay of the same entry.
    context.append(entry);
    context.flush(&storage).await.unwrap();
    let after_second = storage.jobs();

    assert_eq!(after_first.len(), 1);
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_entries_recorded_inside_ignore_scope_are_not_retained() {
    let (context, recorder, storage) = setup(0);
    let job = descriptor("ObservedJob");
    let hidden = descriptor("HiddenJob");

    recorder.record_queued(&JobQueued {
        job: job.clone(),
        at: t(0),
    });
    context.ignore(|| {
        recorder.record_queued(&JobQueued {
            job: hidden.clone(),
            at: t(1),
        });
    });

    context.flush(&storage).await.unwrap();

    let rows = storage.jobs();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].job, "ObservedJob");
}

#[traced_test]
#[tokio::test]
async fn test_partial_flush_failure_is_surfaced_and_buffer_drained() {
    let (context, recorder, storage) = setup(0);

    recorder.record_queued(&JobQueued {
        job: descriptor("GoodJob"),
        at: t(0),
    });
    // An entry destined for a table the store does not own.
    context.append(Entry::new("not_a_table", serde_json::Map::new()));

    let error = context.flush(&storage).await.unwrap_err();
    assert_eq!(error.applied, 1);
    assert_eq!(error.total, 2);
    assert_eq!(error.errors.len(), 1);
    assert!(matches!(error.errors[0], StorageError::UnknownTable(_)));
    assert!(logs_contain("failed to persist entry"));

    // The good entry landed; nothing is left to replay.
    assert_eq!(storage.jobs().len(), 1);
    assert_eq!(context.pending_count(), 0);

    let clean = context.flush(&storage).await.unwrap();
    assert_eq!(clean, 0);
    assert_eq!(storage.jobs().len(), 1);
}
