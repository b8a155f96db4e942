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

//! Recorders
//!
//! A recorder converts host-side happenings into [`Entry`](crate::Entry)
//! values and appends them to the ingest buffer. Recorders are the only
//! producers of entries; they never touch durable storage themselves.
//!
//! Recorder handlers must never let a telemetry problem affect the host
//! operation being observed: they return nothing, degrade to best-effort
//! entries when data is missing, and log rather than propagate.

pub mod exceptions;
pub mod jobs;

pub use exceptions::ExceptionsRecorder;
pub use jobs::JobsRecorder;
