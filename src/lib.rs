// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_inception)]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::new_without_default)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod fingerprint;
pub mod links;
pub mod probes;
pub mod record;
pub mod reports;
pub mod session;
pub mod stats;
pub mod storage;
pub mod track;
pub mod useragent;


pub use fingerprint::{assemble, capture, CapturePipeline, PipelineError};
pub use probes::{CapabilityProvider, CaptureError, PositionOptions, SnapshotEnvironment};
pub use record::{CaptureRecord, DeviceFingerprint, GeoPosition, PermissionStatus};
pub use storage::{HistoryStore, RemoteLeg, StorageError, WriteOutcome};
