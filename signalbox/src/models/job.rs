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

//! Job Attempt Row Model
//!
//! This module defines the logical row a sequence of job-lifecycle entries
//! converges on. Exactly one row exists per (`job_uuid`, `attempt`) pair;
//! successive entries for the same pair are combined with [`JobRecord::merge`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One execution try of a dispatched unit of work.
///
/// Field order here is the attribute order carried by entries and the
/// column order of the persisted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Timestamp of the most recent lifecycle event affecting this row.
    pub date: DateTime<Utc>,
    /// When the job was placed on the queue for this attempt.
    pub queued_at: Option<DateTime<Utc>>,
    /// When a worker began executing this attempt.
    pub processing_at: Option<DateTime<Utc>>,
    /// When this attempt ended by being put back on the queue.
    pub released_at: Option<DateTime<Utc>>,
    /// When this attempt completed successfully.
    pub processed_at: Option<DateTime<Utc>>,
    /// When this attempt failed terminally.
    pub failed_at: Option<DateTime<Utc>>,
    /// Identity of the authenticated actor at dispatch time, if any.
    pub user_id: Option<String>,
    /// Display name of the unit of work.
    pub job: String,
    /// Correlation identity shared by all attempts of one dispatched job.
    pub job_uuid: Uuid,
    /// 1-based attempt counter.
    pub attempt: i32,
    /// Queue connection the job traveled through.
    pub connection: String,
    /// Queue name the job traveled through.
    pub queue: String,
    /// Elapsed milliseconds between `processing_at` and the terminal event,
    /// when the configured threshold was met.
    pub duration: Option<i64>,
}

impl JobRecord {
    /// The logical row identity used for upserts.
    pub fn key(&self) -> (Uuid, i32) {
        (self.job_uuid, self.attempt)
    }

    /// Folds a later entry for the same (`job_uuid`, `attempt`) into this row.
    ///
    /// `date` always advances to the incoming event's timestamp. Every
    /// nullable field is set at most once: a value already present is never
    /// overwritten, so a replayed or late best-effort entry cannot regress a
    /// finalized row.
    pub fn merge(&mut self, incoming: &JobRecord) {
        self.date = incoming.date;
        self.queued_at = self.queued_at.or(incoming.queued_at);
        self.processing_at = self.processing_at.or(incoming.processing_at);
        self.released_at = self.released_at.or(incoming.released_at);
        self.processed_at = self.processed_at.or(incoming.processed_at);
        self.failed_at = self.failed_at.or(incoming.failed_at);
        self.user_id = self.user_id.take().or_else(|| incoming.user_id.clone());
        self.duration = self.duration.or(incoming.duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_record() -> JobRecord {
        let at = Utc.with_ymd_and_hms(2000, 1, 2, 3, 4, 5).unwrap();
        JobRecord {
            date: at,
            queued_at: Some(at),
            processing_at: None,
            released_at: None,
            processed_at: None,
            failed_at: None,
            user_id: Some("7".to_string()),
            job: "SendWelcomeEmail".to_string(),
            job_uuid: Uuid::new_v4(),
            attempt: 1,
            connection: "database".to_string(),
            queue: "default".to_string(),
            duration: None,
        }
    }

    #[test]
    fn test_merge_fills_null_fields_and_advances_date() {
        let mut row = base_record();
        let queued = row.queued_at;
        let later = row.date + chrono::Duration::seconds(5);

        let incoming = JobRecord {
            date: later,
            queued_at: None,
            processing_at: Some(later),
            user_id: None,
            ..row.clone()
        };
        row.merge(&incoming);

        assert_eq!(row.date, later);
        assert_eq!(row.queued_at, queued);
        assert_eq!(row.processing_at, Some(later));
        assert_eq!(row.user_id, Some("7".to_string()));
    }

    #[test]
    fn test_merge_never_overwrites_a_set_field() {
        let mut row = base_record();
        let original_queued = row.queued_at;
        let later = row.date + chrono::Duration::seconds(10);

        let incoming = JobRecord {
            date: later,
            queued_at: Some(later),
            user_id: Some("99".to_string()),
            ..row.clone()
        };
        row.merge(&incoming);

        assert_eq!(row.queued_at, original_queued);
        assert_eq!(row.user_id, Some("7".to_string()));
    }

    #[test]
    fn test_merge_is_idempotent_under_replay() {
        let mut once = base_record();
        let incoming = JobRecord {
            processing_at: Some(once.date + chrono::Duration::seconds(1)),
            ..once.clone()
        };
        once.merge(&incoming);

        let mut twice = once.clone();
        twice.merge(&incoming);

        assert_eq!(once, twice);
    }
}
