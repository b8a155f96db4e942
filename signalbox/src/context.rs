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

//! Recorder Context
//!
//! The [`RecorderContext`] owns the process-wide ingest buffer and the
//! reentrancy guard. It is constructor-injected into every recorder and
//! into the flush path rather than living as ambient global state, which
//! keeps the design testable via multiple independent contexts.
//!
//! ## The reentrancy guard
//!
//! Flushing the buffer performs storage writes, and storage writes are
//! themselves the kind of operation recorders observe. Without suppression,
//! a flush would generate new entries about its own queries and the cycle
//! would never terminate. While the guard is raised, [`RecorderContext::append`]
//! drops entries instead of buffering them. The guard is a depth counter so
//! that guarded code can itself invoke other guarded operations; unwinding
//! restores the prior state even when the guarded closure panics.
//!
//! ## Concurrency
//!
//! Lifecycle signals are delivered synchronously by the host, so the
//! context performs no concurrency of its own; it is merely `Sync` so that
//! recorders and the flush path can share it behind an `Arc`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::{debug, trace, warn};

use crate::entry::Entry;
use crate::error::FlushError;
use crate::storage::Storage;

/// Zero-argument hook resolving the currently authenticated actor.
pub type UserResolver = Box<dyn Fn() -> Option<String> + Send + Sync>;

/// Shared state for the ingest pipeline: the pending-entry buffer, the
/// reentrancy guard, and the identity-resolver hook.
pub struct RecorderContext {
    /// Entries awaiting a flush, in append order.
    pending: Mutex<Vec<Entry>>,
    /// Reentrancy guard depth. Non-zero suppresses `append`.
    ignore_depth: AtomicUsize,
    /// Resolves the authenticated actor's identity at dispatch/capture time.
    user_resolver: Option<UserResolver>,
}

impl std::fmt::Debug for RecorderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderContext")
            .field("pending", &self.pending_count())
            .field("ignore_depth", &self.ignore_depth.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for RecorderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderContext {
    /// Creates a context with an empty buffer and no identity resolver.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            ignore_depth: AtomicUsize::new(0),
            user_resolver: None,
        }
    }

    /// Installs the identity-resolver hook.
    ///
    /// The hook is called once per dispatch (and once per exception
    /// capture); it must not touch the recorders or the buffer.
    pub fn with_user_resolver(
        mut self,
        resolver: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.user_resolver = Some(Box::new(resolver));
        self
    }

    /// Resolves the currently authenticated actor, if a hook is installed.
    pub fn resolve_user_id(&self) -> Option<String> {
        self.user_resolver.as_ref().and_then(|resolver| resolver())
    }

    /// Appends an entry to the pending buffer.
    ///
    /// A no-op while the reentrancy guard is raised anywhere on the call
    /// stack. Never blocks on I/O and never fails.
    pub fn append(&self, entry: Entry) {
        if self.is_ignoring() {
            trace!(table = entry.table(), "guard raised; dropping entry");
            return;
        }
        self.pending.lock().unwrap().push(entry);
    }

    /// Number of entries currently buffered.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Snapshot of the buffered entries, in append order.
    ///
    /// Lets callers and tests assert recorder behavior without forcing a
    /// flush; the buffer is left untouched.
    pub fn pending(&self) -> Vec<Entry> {
        self.pending.lock().unwrap().clone()
    }

    /// Whether the reentrancy guard is currently raised.
    pub fn is_ignoring(&self) -> bool {
        self.ignore_depth.load(Ordering::Relaxed) > 0
    }

    /// Runs `f` with the reentrancy guard raised for its dynamic extent.
    ///
    /// Nests: the guard is only fully lowered once every enclosing scope
    /// has unwound, including unwinds caused by panics inside `f`.
    pub fn ignore<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.ignore_scope();
        f()
    }

    /// Raises the guard until the returned handle is dropped.
    ///
    /// The closure form [`RecorderContext::ignore`] is preferred; this
    /// handle exists for scopes that span `await` points, such as a flush.
    pub fn ignore_scope(&self) -> IgnoreGuard<'_> {
        self.ignore_depth.fetch_add(1, Ordering::SeqCst);
        IgnoreGuard { context: self }
    }

    /// Drains every pending entry and applies each against `storage`.
    ///
    /// Entries are applied in FIFO order with the reentrancy guard raised
    /// for the whole operation, so storage work cannot re-enter the
    /// recorders. The buffer is empty afterwards regardless of per-entry
    /// outcome; entries that failed to persist are surfaced through
    /// [`FlushError`] and are the caller's responsibility.
    pub async fn flush(&self, storage: &dyn Storage) -> Result<usize, FlushError> {
        let entries = std::mem::take(&mut *self.pending.lock().unwrap());
        let total = entries.len();

        let _guard = self.ignore_scope();

        let mut applied = 0;
        let mut errors = Vec::new();
        for entry in &entries {
            match storage.upsert(entry).await {
                Ok(()) => applied += 1,
                Err(error) => {
                    warn!(table = entry.table(), %error, "failed to persist entry");
                    errors.push(error);
                }
            }
        }

        debug!(applied, total, "flushed pending entries");

        if errors.is_empty() {
            Ok(applied)
        } else {
            Err(FlushError {
                applied,
                total,
                errors,
            })
        }
    }
}

/// RAII handle holding the reentrancy guard raised.
#[must_use = "the guard is lowered as soon as this handle is dropped"]
pub struct IgnoreGuard<'a> {
    context: &'a RecorderContext,
}

impl Drop for IgnoreGuard<'_> {
    fn drop(&mut self) {
        self.context.ignore_depth.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn entry(table: &str) -> Entry {
        Entry::new(table, Map::new())
    }

    #[test]
    fn test_append_and_pending_count() {
        let context = RecorderContext::new();
        assert_eq!(context.pending_count(), 0);

        context.append(entry("a"));
        context.append(entry("b"));
        assert_eq!(context.pending_count(), 2);
    }

    #[test]
    fn test_append_is_suppressed_inside_ignore() {
        let context = RecorderContext::new();

        context.append(entry("kept"));
        context.ignore(|| {
            context.append(entry("dropped"));
        });
        context.append(entry("kept"));

        assert_eq!(context.pending_count(), 2);
    }

    #[test]
    fn test_nested_ignore_restores_prior_state() {
        let context = RecorderContext::new();

        context.ignore(|| {
            context.ignore(|| {
                context.append(entry("inner"));
            });
            // Still suppressed: only the outermost scope lowers the guard.
            assert!(context.is_ignoring());
            context.append(entry("outer"));
        });
        assert!(!context.is_ignoring());

        context.append(entry("after"));
        assert_eq!(context.pending_count(), 1);
    }

    #[test]
    fn test_ignore_lowers_guard_when_closure_panics() {
        let context = RecorderContext::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            context.ignore(|| panic!("boom"))
        }));
        assert!(result.is_err());
        assert!(!context.is_ignoring());
    }

    #[test]
    fn test_ignore_returns_the_closure_value() {
        let context = RecorderContext::new();
        let value = context.ignore(|| 41 + 1);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_resolve_user_id() {
        let context = RecorderContext::new();
        assert_eq!(context.resolve_user_id(), None);

        let context = RecorderContext::new().with_user_resolver(|| Some("7".to_string()));
        assert_eq!(context.resolve_user_id(), Some("7".to_string()));
    }
}
