// File: mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

pub mod errors;
pub mod history;
pub mod kv;
pub mod local;
pub mod remote;

pub use errors::{StorageError, StorageResult};
pub use history::{HistoryStore, RemoteLeg, WriteOutcome, MAX_HISTORY, REDUCED_HISTORY};
pub use kv::{open_database, MemoryStorage, SledStorage, WebStorage};
pub use local::{LocalHistory, HISTORY_KEY};
pub use remote::{DriveRemote, RemoteError, RemoteStore};
