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

//! Lifecycle Signals
//!
//! The host's async-execution subsystem delivers five signals per job
//! attempt: queued, processing, released, processed, and failed. Each
//! signal carries a snapshot of the job's identity plus the attempt number
//! as supplied by the host's queue subsystem — the correlation engine never
//! infers attempts by counting.
//!
//! Units of work come in several shapes (bus jobs, queued closures, queued
//! listeners, queued mail, queued notifications, queued console commands).
//! [`Dispatchable`] reduces all of them to one surface; one adapter exists
//! per host subsystem, and the correlation engine never branches on the
//! concrete kind.

use std::path::Path;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::fault::Fault;

/// A unit of work that can travel through a queue.
pub trait Dispatchable {
    /// Display name of the unit of work.
    fn display_name(&self) -> String;
    /// Correlation identity shared by all attempts of this dispatch.
    fn correlation_id(&self) -> Uuid;
    /// Queue connection the job travels through.
    fn connection(&self) -> &str;
    /// Queue name the job travels through.
    fn queue(&self) -> &str;
}

/// Snapshot of a dispatchable's identity, carried by every signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Display name of the unit of work.
    pub name: String,
    /// Correlation identity.
    pub uuid: Uuid,
    /// Queue connection.
    pub connection: String,
    /// Queue name.
    pub queue: String,
}

impl JobDescriptor {
    /// Snapshots a dispatchable.
    pub fn of(job: &dyn Dispatchable) -> Self {
        Self {
            name: job.display_name(),
            uuid: job.correlation_id(),
            connection: job.connection().to_string(),
            queue: job.queue().to_string(),
        }
    }
}

/// Fired once per dispatched job instance, at attempt 1.
#[derive(Debug, Clone)]
pub struct JobQueued {
    /// The dispatched unit of work.
    pub job: JobDescriptor,
    /// When the dispatch happened.
    pub at: DateTime<Utc>,
}

impl JobQueued {
    /// Creates the signal, stamped with the current time.
    pub fn new(job: &dyn Dispatchable) -> Self {
        Self {
            job: JobDescriptor::of(job),
            at: Utc::now(),
        }
    }
}

/// Fired at the start of each attempt, including retries.
#[derive(Debug, Clone)]
pub struct JobProcessing {
    /// The unit of work being executed.
    pub job: JobDescriptor,
    /// 1-based attempt number, as reported by the queue subsystem.
    pub attempt: i32,
    /// When the worker picked the job up.
    pub at: DateTime<Utc>,
}

impl JobProcessing {
    /// Creates the signal, stamped with the current time.
    pub fn new(job: &dyn Dispatchable, attempt: i32) -> Self {
        Self {
            job: JobDescriptor::of(job),
            attempt,
            at: Utc::now(),
        }
    }
}

/// Fired when an attempt ends by being put back on the queue.
#[derive(Debug, Clone)]
pub struct JobReleased {
    /// The unit of work that was released.
    pub job: JobDescriptor,
    /// The attempt that just ran.
    pub attempt: i32,
    /// When the release happened.
    pub at: DateTime<Utc>,
}

impl JobReleased {
    /// Creates the signal, stamped with the current time.
    pub fn new(job: &dyn Dispatchable, attempt: i32) -> Self {
        Self {
            job: JobDescriptor::of(job),
            attempt,
            at: Utc::now(),
        }
    }
}

/// Fired when an attempt completes successfully. Terminal.
#[derive(Debug, Clone)]
pub struct JobProcessed {
    /// The unit of work that completed.
    pub job: JobDescriptor,
    /// The attempt that succeeded.
    pub attempt: i32,
    /// When the attempt completed.
    pub at: DateTime<Utc>,
}

impl JobProcessed {
    /// Creates the signal, stamped with the current time.
    pub fn new(job: &dyn Dispatchable, attempt: i32) -> Self {
        Self {
            job: JobDescriptor::of(job),
            attempt,
            at: Utc::now(),
        }
    }
}

/// Fired when attempts are exhausted or the job fails explicitly. Terminal.
#[derive(Debug, Clone)]
pub struct JobFailed {
    /// The unit of work that failed.
    pub job: JobDescriptor,
    /// The attempt that failed.
    pub attempt: i32,
    /// When the failure happened.
    pub at: DateTime<Utc>,
    /// The fault that exhausted the job, when the host captured one. The
    /// correlation engine does not consume this; faults reach storage only
    /// through the exceptions recorder.
    pub cause: Option<Fault>,
}

impl JobFailed {
    /// Creates the signal, stamped with the current time.
    pub fn new(job: &dyn Dispatchable, attempt: i32, cause: Option<Fault>) -> Self {
        Self {
            job: JobDescriptor::of(job),
            attempt,
            at: Utc::now(),
            cause,
        }
    }
}

// ---------------------------------------------------------------------------
// Adapters: one per host subsystem producing the Dispatchable shape
// ---------------------------------------------------------------------------

macro_rules! transport_accessors {
    () => {
        fn correlation_id(&self) -> Uuid {
            self.uuid
        }

        fn connection(&self) -> &str {
            &self.connection
        }

        fn queue(&self) -> &str {
            &self.queue
        }
    };
}

/// A job dispatched onto the command bus.
#[derive(Debug, Clone)]
pub struct BusJob {
    /// Class name of the job.
    pub name: String,
    /// Correlation identity assigned at dispatch.
    pub uuid: Uuid,
    /// Queue connection.
    pub connection: String,
    /// Queue name.
    pub queue: String,
}

impl BusJob {
    /// Creates the adapter with a fresh correlation id.
    pub fn new(name: impl Into<String>, connection: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: Uuid::new_v4(),
            connection: connection.into(),
            queue: queue.into(),
        }
    }
}

impl Dispatchable for BusJob {
    fn display_name(&self) -> String {
        self.name.clone()
    }

    transport_accessors!();
}

/// An anonymous unit of work queued as a closure.
#[derive(Debug, Clone)]
pub struct QueuedClosure {
    /// Source file the closure was defined in.
    pub file: String,
    /// Line the closure was defined at.
    pub line: u32,
    /// Correlation identity assigned at dispatch.
    pub uuid: Uuid,
    /// Queue connection.
    pub connection: String,
    /// Queue name.
    pub queue: String,
}

impl QueuedClosure {
    /// Creates the adapter with a fresh correlation id.
    pub fn new(
        file: impl Into<String>,
        line: u32,
        connection: impl Into<String>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            uuid: Uuid::new_v4(),
            connection: connection.into(),
            queue: queue.into(),
        }
    }
}

impl Dispatchable for QueuedClosure {
    /// `Closure (<file>:<line>)`, using the file's base name.
    fn display_name(&self) -> String {
        let file = Path::new(&self.file)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.clone());
        format!("Closure ({}:{})", file, self.line)
    }

    transport_accessors!();
}

/// A listener queued in response to an event.
#[derive(Debug, Clone)]
pub struct QueuedListener {
    /// Class name of the listener.
    pub listener: String,
    /// Correlation identity assigned at dispatch.
    pub uuid: Uuid,
    /// Queue connection.
    pub connection: String,
    /// Queue name.
    pub queue: String,
}

impl QueuedListener {
    /// Creates the adapter with a fresh correlation id.
    pub fn new(
        listener: impl Into<String>,
        connection: impl Into<String>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            listener: listener.into(),
            uuid: Uuid::new_v4(),
            connection: connection.into(),
            queue: queue.into(),
        }
    }
}

impl Dispatchable for QueuedListener {
    fn display_name(&self) -> String {
        self.listener.clone()
    }

    transport_accessors!();
}

/// A mailable queued for background delivery.
#[derive(Debug, Clone)]
pub struct QueuedMailable {
    /// Class name of the mailable.
    pub mailable: String,
    /// Correlation identity assigned at dispatch.
    pub uuid: Uuid,
    /// Queue connection.
    pub connection: String,
    /// Queue name.
    pub queue: String,
}

impl QueuedMailable {
    /// Creates the adapter with a fresh correlation id.
    pub fn new(
        mailable: impl Into<String>,
        connection: impl Into<String>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            mailable: mailable.into(),
            uuid: Uuid::new_v4(),
            connection: connection.into(),
            queue: queue.into(),
        }
    }
}

impl Dispatchable for QueuedMailable {
    fn display_name(&self) -> String {
        self.mailable.clone()
    }

    transport_accessors!();
}

/// A notification queued for background delivery.
#[derive(Debug, Clone)]
pub struct QueuedNotification {
    /// Class name of the notification.
    pub notification: String,
    /// Correlation identity assigned at dispatch.
    pub uuid: Uuid,
    /// Queue connection.
    pub connection: String,
    /// Queue name.
    pub queue: String,
}

impl QueuedNotification {
    /// Creates the adapter with a fresh correlation id.
    pub fn new(
        notification: impl Into<String>,
        connection: impl Into<String>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            notification: notification.into(),
            uuid: Uuid::new_v4(),
            connection: connection.into(),
            queue: queue.into(),
        }
    }
}

impl Dispatchable for QueuedNotification {
    fn display_name(&self) -> String {
        self.notification.clone()
    }

    transport_accessors!();
}

/// A console command queued for background execution.
///
/// The queue wrapper hides the underlying command, so the command name is
/// frequently not introspectable at dispatch time.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    /// Name of the wrapped command, when it could be introspected.
    pub command: Option<String>,
    /// Correlation identity assigned at dispatch.
    pub uuid: Uuid,
    /// Queue connection.
    pub connection: String,
    /// Queue name.
    pub queue: String,
}

impl QueuedCommand {
    /// Creates the adapter with a fresh correlation id.
    pub fn new(
        command: Option<String>,
        connection: impl Into<String>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            command,
            uuid: Uuid::new_v4(),
            connection: connection.into(),
            queue: queue.into(),
        }
    }
}

impl Dispatchable for QueuedCommand {
    /// The wrapped command's name, or the documented fallback
    /// `"QueuedCommand"` when the wrapper could not be introspected.
    fn display_name(&self) -> String {
        self.command
            .clone()
            .unwrap_or_else(|| "QueuedCommand".to_string())
    }

    transport_accessors!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_display_name_uses_file_base_name() {
        let closure = QueuedClosure::new("/app/jobs/reports.rs", 61, "database", "default");
        assert_eq!(closure.display_name(), "Closure (reports.rs:61)");
    }

    #[test]
    fn test_queued_command_falls_back_when_not_introspectable() {
        let known = QueuedCommand::new(Some("reports:send".to_string()), "database", "default");
        assert_eq!(known.display_name(), "reports:send");

        let unknown = QueuedCommand::new(None, "database", "default");
        assert_eq!(unknown.display_name(), "QueuedCommand");
    }

    #[test]
    fn test_descriptor_snapshots_the_dispatchable() {
        let job = BusJob::new("SendWelcomeEmail", "database", "default");
        let descriptor = JobDescriptor::of(&job);

        assert_eq!(descriptor.name, "SendWelcomeEmail");
        assert_eq!(descriptor.uuid, job.uuid);
        assert_eq!(descriptor.connection, "database");
        assert_eq!(descriptor.queue, "default");
    }
}
