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

//! Exceptions Recorder
//!
//! Converts a captured [`Fault`] into one append-only entry carrying the
//! fault's class name and a source location relative to the application
//! root. Capture never fails: when a detail cannot be derived, the record
//! degrades to whatever could be recovered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::config::ExceptionsConfig;
use crate::context::RecorderContext;
use crate::entry::Entry;
use crate::fault::{Fault, FaultOrigin};
use crate::models::ExceptionRecord;

/// Matches the `(View: <path>)` fragment template engines append to the
/// message of a wrapped render failure.
static VIEW_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(View: (?P<path>.*?)\)").expect("view-path pattern is valid"));

/// Records captured faults as timeline entries.
pub struct ExceptionsRecorder {
    context: Arc<RecorderContext>,
    table: String,
    base_path: PathBuf,
    vendor_path: PathBuf,
}

impl ExceptionsRecorder {
    /// Creates a recorder bound to `context`.
    pub fn new(context: Arc<RecorderContext>, config: &ExceptionsConfig) -> Self {
        let vendor_path = config.base_path.join(&config.vendor_dir);
        Self {
            context,
            table: config.table.clone(),
            base_path: config.base_path.clone(),
            vendor_path,
        }
    }

    /// Records a captured fault.
    ///
    /// Always succeeds; the constructed entry is appended to the buffer and
    /// also returned for inspection.
    pub fn record(&self, fault: &Fault) -> Entry {
        let (class, location) = self.details(fault);

        let record = ExceptionRecord {
            date: Utc::now(),
            class,
            location,
            user_id: self.context.resolve_user_id(),
        };

        let entry = match Entry::from_record(&self.table, &record) {
            Ok(entry) => entry,
            Err(error) => {
                // Degrade rather than fail the capture path.
                warn!(%error, "falling back to an empty exception entry");
                Entry::new(self.table.clone(), serde_json::Map::new())
            }
        };
        self.context.append(entry.clone());
        entry
    }

    /// Derives `(class, location)` for the fault.
    ///
    /// A wrapped template-render fault reports the underlying cause's class
    /// and the original (uncompiled) template path recovered from the
    /// wrapper's message; everything else reports its own class and the
    /// nearest application-side source location.
    fn details(&self, fault: &Fault) -> (String, String) {
        match (&fault.origin, &fault.cause) {
            (FaultOrigin::TemplateRender, Some(cause)) => {
                (cause.class.clone(), self.location_from_template(fault))
            }
            _ => (fault.class.clone(), self.location(fault)),
        }
    }

    /// Recovers the original template path from a render wrapper's message.
    ///
    /// No line number is available in this case. A message without the
    /// fragment degrades to an empty location.
    fn location_from_template(&self, fault: &Fault) -> String {
        match VIEW_PATH
            .captures(&fault.message)
            .and_then(|captures| captures.name("path"))
        {
            Some(path) => self.format_location(path.as_str(), None),
            None => String::new(),
        }
    }

    /// Picks the most useful source location for the fault.
    ///
    /// A fault originating outside the vendor tree reports its own
    /// file/line. One originating inside it reports the first stack frame
    /// outside the tree, falling back to its own file/line when the whole
    /// stack is vendor code.
    fn location(&self, fault: &Fault) -> String {
        if self.is_non_vendor_file(&fault.file) {
            return self.format_location(&fault.file, fault.line);
        }

        match fault
            .trace
            .iter()
            .find(|frame| self.is_non_vendor_file(&frame.file))
        {
            Some(frame) => self.format_location(&frame.file, Some(frame.line)),
            None => self.format_location(&fault.file, fault.line),
        }
    }

    /// Whether a file lies outside the vendor directory tree.
    fn is_non_vendor_file(&self, file: &str) -> bool {
        !Path::new(file).starts_with(&self.vendor_path)
    }

    /// Strips the application root prefix and appends `:<line>` when known.
    fn format_location(&self, file: &str, line: Option<u32>) -> String {
        let relative = Path::new(file)
            .strip_prefix(&self.base_path)
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| file.to_string());

        match line {
            Some(line) => format!("{relative}:{line}"),
            None => relative,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::Frame;

    fn recorder() -> (Arc<RecorderContext>, ExceptionsRecorder) {
        let context = Arc::new(RecorderContext::new());
        let recorder = ExceptionsRecorder::new(
            context.clone(),
            &ExceptionsConfig {
                base_path: PathBuf::from("/srv/app"),
                ..ExceptionsConfig::default()
            },
        );
        (context, recorder)
    }

    #[test]
    fn test_application_fault_reports_its_own_location() {
        let (context, recorder) = recorder();
        let fault = Fault::new("app::ReportError", "boom", "/srv/app/src/reports.rs", 42);

        let entry = recorder.record(&fault);
        let record: ExceptionRecord = entry.record().unwrap();

        assert_eq!(record.class, "app::ReportError");
        assert_eq!(record.location, "src/reports.rs:42");
        assert_eq!(context.pending_count(), 1);
    }

    #[test]
    fn test_vendor_fault_walks_to_first_application_frame() {
        let (_context, recorder) = recorder();
        let fault = Fault::new(
            "orm::QueryError",
            "syntax error",
            "/srv/app/vendor/orm/src/query.rs",
            901,
        )
        .with_trace(vec![
            Frame::new("/srv/app/vendor/orm/src/builder.rs", 77),
            Frame::new("/srv/app/src/reports.rs", 12),
            Frame::new("/srv/app/src/main.rs", 3),
        ]);

        let record: ExceptionRecord = recorder.record(&fault).record().unwrap();
        assert_eq!(record.class, "orm::QueryError");
        assert_eq!(record.location, "src/reports.rs:12");
    }

    #[test]
    fn test_vendor_only_stack_falls_back_to_own_location() {
        let (_context, recorder) = recorder();
        let fault = Fault::new(
            "orm::QueryError",
            "syntax error",
            "/srv/app/vendor/orm/src/query.rs",
            901,
        )
        .with_trace(vec![Frame::new("/srv/app/vendor/orm/src/builder.rs", 77)]);

        let record: ExceptionRecord = recorder.record(&fault).record().unwrap();
        assert_eq!(record.location, "vendor/orm/src/query.rs:901");
    }

    #[test]
    fn test_template_wrapper_reports_cause_class_and_view_path() {
        let (_context, recorder) = recorder();
        let cause = Fault::new(
            "app::UndefinedVariable",
            "undefined variable `total`",
            "/srv/app/storage/compiled/4f2a.rs",
            7,
        );
        let wrapper = Fault::new(
            "templates::RenderError",
            "undefined variable `total` (View: /srv/app/templates/invoice.html)",
            "/srv/app/storage/compiled/4f2a.rs",
            7,
        )
        .template_render(cause);

        let record: ExceptionRecord = recorder.record(&wrapper).record().unwrap();
        assert_eq!(record.class, "app::UndefinedVariable");
        // Original template path, no line number available.
        assert_eq!(record.location, "templates/invoice.html");
    }

    #[test]
    fn test_template_wrapper_without_view_fragment_degrades() {
        let (_context, recorder) = recorder();
        let cause = Fault::new("app::UndefinedVariable", "nope", "/srv/app/x.rs", 1);
        let wrapper =
            Fault::new("templates::RenderError", "nope", "/srv/app/x.rs", 1).template_render(cause);

        let record: ExceptionRecord = recorder.record(&wrapper).record().unwrap();
        assert_eq!(record.class, "app::UndefinedVariable");
        assert_eq!(record.location, "");
    }

    #[test]
    fn test_location_outside_base_path_is_kept_verbatim() {
        let (_context, recorder) = recorder();
        let fault = Fault::new("io::Error", "denied", "/etc/passwd", 1);

        let record: ExceptionRecord = recorder.record(&fault).record().unwrap();
        assert_eq!(record.location, "/etc/passwd:1");
    }

    #[test]
    fn test_user_id_resolved_at_capture_time() {
        let context = Arc::new(RecorderContext::new().with_user_resolver(|| Some("42".into())));
        let recorder = ExceptionsRecorder::new(context, &ExceptionsConfig::default());

        let record: ExceptionRecord = recorder
            .record(&Fault::new("app::Error", "boom", "src/lib.rs", 10))
            .record()
            .unwrap();
        assert_eq!(record.user_id, Some("42".to_string()));
    }
}
