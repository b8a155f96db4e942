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

//! Captured Fault Shape
//!
//! The host hands the exceptions recorder a [`Fault`]: a failure that has
//! already been caught, reduced to the data the recorder needs to derive a
//! class name and a source location. The host's own error machinery stays
//! on the host side of this boundary.

/// One frame of a fault's call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Source file the frame points into.
    pub file: String,
    /// Line within the file.
    pub line: u32,
}

impl Frame {
    /// Creates a stack frame.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// How the fault reached the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultOrigin {
    /// An ordinary runtime failure.
    #[default]
    Runtime,
    /// A failure raised while rendering a template, wrapping the real
    /// cause. The wrapper's message carries a `(View: <path>)` fragment
    /// naming the original template file.
    TemplateRender,
}

/// A captured failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    /// Class name of the failure.
    pub class: String,
    /// Human-readable message.
    pub message: String,
    /// Source file the failure originated in.
    pub file: String,
    /// Line within the file, when known.
    pub line: Option<u32>,
    /// Call stack, outermost frame first.
    pub trace: Vec<Frame>,
    /// The underlying cause, for wrapped failures.
    pub cause: Option<Box<Fault>>,
    /// How the fault reached the recorder.
    pub origin: FaultOrigin,
}

impl Fault {
    /// Creates a plain runtime fault.
    pub fn new(
        class: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
            file: file.into(),
            line: Some(line),
            trace: Vec::new(),
            cause: None,
            origin: FaultOrigin::Runtime,
        }
    }

    /// Creates a fault from a host error value, using its type name as the
    /// class and its display form as the message.
    pub fn from_error<E: std::error::Error>(error: &E, file: impl Into<String>, line: u32) -> Self {
        Self::new(std::any::type_name::<E>(), error.to_string(), file, line)
    }

    /// Attaches the call stack, outermost frame first.
    pub fn with_trace(mut self, trace: Vec<Frame>) -> Self {
        self.trace = trace;
        self
    }

    /// Marks this fault as a template-render wrapper around `cause`.
    pub fn template_render(mut self, cause: Fault) -> Self {
        self.cause = Some(Box::new(cause));
        self.origin = FaultOrigin::TemplateRender;
        self
    }
}
