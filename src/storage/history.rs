// File: history.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

//! The bounded, most-recent-first capture history.
//!
//! The local cache is the record of truth for every operation; the remote
//! store is a best-effort mirror. Writes are two-phase: the remote push is
//! started first and awaited for at most `remote_timeout`, then the local
//! cache is committed no matter how the remote leg went. A push that outlives
//! the timeout keeps running on its own task until the next remote call,
//! which waits for it once more and cancels it if it is still running.
//!
//! Writers inside one process are serialized. Two processes sharing the same
//! remote document still race: the last full overwrite wins.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::errors::{StorageError, StorageResult};
use super::local::LocalHistory;
use super::remote::{RemoteError, RemoteStore};
use crate::record::CaptureRecord;
use crate::stats::HistoryStats;

pub const MAX_HISTORY: usize = 200;
/// Existing entries kept when a write has to be retried after a quota error.
pub const REDUCED_HISTORY: usize = 50;
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLeg {
    Synced,
    /// No remote store is configured.
    Skipped,
    /// Still running in the background when the wait expired.
    Pending,
    Failed(String),
}

impl RemoteLeg {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub remote: RemoteLeg,
    /// Number of records in the history after the write.
    pub retained: usize,
    /// Older entries were dropped to fit the local quota.
    pub reduced: bool,
}

type RemoteTask = JoinHandle<Result<(), RemoteError>>;

pub struct HistoryStore {
    local: LocalHistory,
    remote: Option<Arc<dyn RemoteStore>>,
    max_entries: usize,
    remote_timeout: Duration,
    write_lock: Mutex<()>,
    /// Remote update that outlived its wait. Settled before the next remote call.
    in_flight: Mutex<Option<RemoteTask>>,
}

impl HistoryStore {
    pub fn new(local: LocalHistory) -> Self {
        Self {
            local,
            remote: None,
            max_entries: MAX_HISTORY,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            write_lock: Mutex::new(()),
            in_flight: Mutex::new(None),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn with_remote_timeout(mut self, remote_timeout: Duration) -> Self {
        self.remote_timeout = remote_timeout;
        self
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn save(&self, record: CaptureRecord) -> StorageResult<WriteOutcome> {
        let _guard = self.write_lock.lock().await;
        let existing = self.local.load()?;
        if existing.iter().any(|stored| stored.id == record.id) {
            return Err(StorageError::DuplicateId(record.id));
        }

        let mut updated = Vec::with_capacity(self.max_entries);
        updated.push(record.clone());
        updated.extend(existing.iter().take(self.max_entries - 1).cloned());

        let remote = self.push_remote(updated.clone()).await;

        let outcome = match self.local.store(&updated) {
            Ok(()) => WriteOutcome {
                remote,
                retained: updated.len(),
                reduced: false,
            },
            Err(e) => {
                warn!("Failed to save capture, retrying with reduced history: {}", e);
                let mut reduced = Vec::with_capacity(REDUCED_HISTORY + 1);
                reduced.push(record);
                reduced.extend(existing.into_iter().take(REDUCED_HISTORY.min(self.max_entries - 1)));

                match self.local.store(&reduced) {
                    Ok(()) => WriteOutcome {
                        remote,
                        retained: reduced.len(),
                        reduced: true,
                    },
                    Err(retry) => {
                        // The remote may now hold a record the cache rejected.
                        self.mark_remote_stale();
                        if retry.is_quota() {
                            return Err(StorageError::CapacityExceeded);
                        }
                        return Err(retry);
                    }
                }
            }
        };

        if outcome.reduced {
            // The remote received the full list, the cache only kept the tail.
            self.mark_remote_stale();
        } else {
            self.note_remote_leg(&outcome.remote);
        }
        Ok(outcome)
    }

    /// Current history, reconciled with the remote store when one is
    /// configured. Remote trouble never surfaces here; the local cache is
    /// returned instead.
    pub async fn list(&self) -> StorageResult<Vec<CaptureRecord>> {
        let _guard = self.write_lock.lock().await;
        let local = self.local.load()?;
        let Some(remote) = self.remote.clone() else {
            return Ok(local);
        };

        if self.local.remote_stale() {
            info!("Remote history is behind the local cache, republishing");
            let leg = self.push_remote(local.clone()).await;
            self.note_remote_leg(&leg);
            return Ok(local);
        }

        self.settle_in_flight().await;
        let pulled = match tokio::time::timeout(self.remote_timeout, remote.pull()).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Task("pull timed out".to_string())),
        };

        match pulled {
            // No remote document yet (or an empty one): keep what we have.
            Ok(records) if records.is_empty() => Ok(local),
            Ok(mut records) => {
                records.truncate(self.max_entries);
                if records != local {
                    if let Err(e) = self.local.store(&records) {
                        warn!("Failed to refresh local cache from remote: {}", e);
                    }
                }
                Ok(records)
            }
            Err(e) => {
                warn!("Remote history unavailable, using local cache: {}", e);
                Ok(local)
            }
        }
    }

    /// Local snapshot without consulting the remote store.
    pub fn snapshot(&self) -> StorageResult<Vec<CaptureRecord>> {
        self.local.load()
    }

    pub async fn delete(&self, id: &str) -> StorageResult<WriteOutcome> {
        let _guard = self.write_lock.lock().await;
        let existing = self.local.load()?;
        if !existing.iter().any(|record| record.id == id) {
            return Ok(WriteOutcome {
                remote: RemoteLeg::Skipped,
                retained: existing.len(),
                reduced: false,
            });
        }

        let updated: Vec<CaptureRecord> = existing.into_iter().filter(|record| record.id != id).collect();
        let remote = self.push_remote(updated.clone()).await;
        if let Err(e) = self.local.store(&updated) {
            self.mark_remote_stale();
            return Err(e);
        }
        self.note_remote_leg(&remote);

        Ok(WriteOutcome {
            remote,
            retained: updated.len(),
            reduced: false,
        })
    }

    pub async fn clear(&self) -> StorageResult<WriteOutcome> {
        let _guard = self.write_lock.lock().await;
        let remote = match self.remote.clone() {
            Some(remote) => {
                self.settle_in_flight().await;
                self.await_remote(tokio::spawn(async move { remote.clear().await }))
                    .await
            }
            None => RemoteLeg::Skipped,
        };
        if let Err(e) = self.local.clear() {
            self.mark_remote_stale();
            return Err(e);
        }
        self.note_remote_leg(&remote);

        Ok(WriteOutcome {
            remote,
            retained: 0,
            reduced: false,
        })
    }

    pub async fn stats(&self) -> StorageResult<HistoryStats> {
        let _guard = self.write_lock.lock().await;
        let records = self.local.load()?;
        let footprint = self.local.footprint()?;
        Ok(HistoryStats::derive(&records, footprint))
    }

    async fn push_remote(&self, records: Vec<CaptureRecord>) -> RemoteLeg {
        let Some(remote) = self.remote.clone() else {
            return RemoteLeg::Skipped;
        };
        self.settle_in_flight().await;
        self.await_remote(tokio::spawn(async move { remote.push(&records).await }))
            .await
    }

    async fn await_remote(&self, mut task: RemoteTask) -> RemoteLeg {
        match tokio::time::timeout(self.remote_timeout, &mut task).await {
            Ok(Ok(Ok(()))) => RemoteLeg::Synced,
            Ok(Ok(Err(e))) => {
                warn!("Remote store update failed: {}", e);
                RemoteLeg::Failed(e.to_string())
            }
            Ok(Err(e)) => {
                warn!("Remote store task aborted: {}", e);
                RemoteLeg::Failed(e.to_string())
            }
            Err(_) => {
                warn!(
                    "Remote store did not answer within {:?}, continuing in background",
                    self.remote_timeout
                );
                *self.in_flight.lock().await = Some(task);
                RemoteLeg::Pending
            }
        }
    }

    /// Gives an earlier update one more `remote_timeout` to land, then cancels
    /// it so it cannot overwrite a newer document.
    async fn settle_in_flight(&self) {
        let Some(mut task) = self.in_flight.lock().await.take() else {
            return;
        };
        if task.is_finished() {
            return;
        }
        match tokio::time::timeout(self.remote_timeout, &mut task).await {
            Ok(_) => debug!("Earlier remote update settled"),
            Err(_) => {
                warn!("Earlier remote update still running, cancelling it");
                task.abort();
            }
        }
    }

    fn note_remote_leg(&self, leg: &RemoteLeg) {
        let stale = match leg {
            RemoteLeg::Synced => false,
            RemoteLeg::Pending | RemoteLeg::Failed(_) => true,
            RemoteLeg::Skipped => return,
        };
        if let Err(e) = self.local.set_remote_stale(stale) {
            warn!("Failed to record remote sync state: {}", e);
        }
    }

    /// The remote document may disagree with the cache; the next `list`
    /// republishes the cache instead of pulling.
    fn mark_remote_stale(&self) {
        if self.remote.is_none() {
            return;
        }
        if let Err(e) = self.local.set_remote_stale(true) {
            warn!("Failed to record remote sync state: {}", e);
        }
    }
}
