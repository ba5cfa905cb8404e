// File: track.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Visit handling for tracking links: capture in the background, redirect
//! after a fixed delay whether or not the capture finished.

use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::fingerprint::{CapturePipeline, PipelineError};
use crate::links::{LinkRegistry, DEFAULT_TARGET_URL};
use crate::record::CaptureRecord;
use crate::storage::WriteOutcome;

pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(2500);

pub type CaptureResult = Result<(CaptureRecord, WriteOutcome), PipelineError>;

#[derive(Debug)]
pub enum CaptureState {
    Completed(CaptureResult),
    /// Still running when the redirect fired. The task is never cancelled.
    Pending(JoinHandle<CaptureResult>),
}

impl CaptureState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Waits for a pending capture to settle.
    pub async fn finish(self) -> CaptureResult {
        match self {
            Self::Completed(result) => result,
            Self::Pending(handle) => joined(handle.await),
        }
    }
}

#[derive(Debug)]
pub struct TrackOutcome {
    pub target_url: String,
    pub capture: CaptureState,
}

pub struct Tracker {
    pipeline: Arc<CapturePipeline>,
    links: Arc<LinkRegistry>,
    redirect_delay: Duration,
}

impl Tracker {
    pub fn new(pipeline: Arc<CapturePipeline>, links: Arc<LinkRegistry>) -> Self {
        Self {
            pipeline,
            links,
            redirect_delay: DEFAULT_REDIRECT_DELAY,
        }
    }

    pub fn with_redirect_delay(mut self, redirect_delay: Duration) -> Self {
        self.redirect_delay = redirect_delay;
        self
    }

    /// Handles one visit. Bookkeeping failures are logged and never block the
    /// redirect.
    pub async fn track(&self, link_id: Option<&str>, custom_url: Option<&str>) -> TrackOutcome {
        if let Some(id) = link_id {
            if let Err(e) = self.links.increment_clicks(id) {
                warn!("Failed to count click for link {}: {}", id, e);
            }
        }

        let target_url = match custom_url.filter(|url| !url.is_empty()) {
            Some(url) => url.to_string(),
            None => self
                .links
                .config()
                .map(|config| config.default_target_url)
                .unwrap_or_else(|e| {
                    warn!("Failed to read redirect target: {}", e);
                    DEFAULT_TARGET_URL.to_string()
                }),
        };

        let pipeline = Arc::clone(&self.pipeline);
        let links = Arc::clone(&self.links);
        let link_id = link_id.map(str::to_string);
        let mut task = tokio::spawn(async move {
            let result = pipeline.capture_and_save().await;
            match (&result, link_id) {
                (Ok(_), Some(id)) => {
                    if let Err(e) = links.increment_captures(&id) {
                        warn!("Failed to count capture for link {}: {}", id, e);
                    }
                }
                (Err(e), _) => debug!("Capture before redirect failed: {}", e),
                _ => {}
            }
            result
        });

        let capture = tokio::select! {
            joined_result = &mut task => CaptureState::Completed(joined(joined_result)),
            _ = tokio::time::sleep(self.redirect_delay) => CaptureState::Pending(task),
        };

        TrackOutcome { target_url, capture }
    }
}

fn joined(result: Result<CaptureResult, tokio::task::JoinError>) -> CaptureResult {
    result.unwrap_or_else(|e| Err(PipelineError::Aborted(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::tests::FakeProvider;
    use crate::probes::CaptureError;
    use crate::session::SessionIdentity;
    use crate::storage::{HistoryStore, LocalHistory, MemoryStorage};

    fn tracker(provider: FakeProvider, delay: Duration) -> (Tracker, Arc<HistoryStore>, Arc<LinkRegistry>) {
        let store = Arc::new(HistoryStore::new(LocalHistory::new(Arc::new(
            MemoryStorage::new(),
        ))));
        let pipeline = Arc::new(CapturePipeline::new(
            Arc::new(provider),
            SessionIdentity::new(None),
            store.clone(),
        ));
        let links = Arc::new(LinkRegistry::new(Arc::new(MemoryStorage::new())));
        let tracker = Tracker::new(pipeline, links.clone()).with_redirect_delay(delay);
        (tracker, store, links)
    }

    #[tokio::test]
    async fn test_fast_capture_completes_before_redirect() {
        let (tracker, store, links) = tracker(FakeProvider::fully_equipped(), Duration::from_secs(5));
        let link = links.create(Some("https://target.example")).unwrap();

        let outcome = tracker.track(Some(link.id()), None).await;
        // The link's own target is not consulted, only the custom or default URL.
        assert_eq!(outcome.target_url, DEFAULT_TARGET_URL);
        assert!(!outcome.capture.is_pending());
        assert!(outcome.capture.finish().await.is_ok());

        let stored = links.get(link.id()).unwrap().unwrap();
        assert_eq!(stored.clicks(), 1);
        assert_eq!(stored.captures(), 1);
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_custom_url_wins_over_default() {
        let (tracker, _, _) = tracker(FakeProvider::fully_equipped(), Duration::from_secs(5));
        let outcome = tracker.track(None, Some("https://custom.example")).await;
        assert_eq!(outcome.target_url, "https://custom.example");
    }

    #[tokio::test]
    async fn test_slow_capture_keeps_running_after_redirect() {
        let provider = FakeProvider {
            position_delay: Some(Duration::from_millis(150)),
            ..FakeProvider::fully_equipped()
        };
        let (tracker, store, links) = tracker(provider, Duration::from_millis(10));
        let link = links.create(None).unwrap();

        let outcome = tracker.track(Some(link.id()), None).await;
        assert!(outcome.capture.is_pending());
        assert!(store.snapshot().unwrap().is_empty());

        let (record, _) = outcome.capture.finish().await.unwrap();
        assert_eq!(store.snapshot().unwrap()[0].id, record.id);
        assert_eq!(links.get(link.id()).unwrap().unwrap().captures(), 1);
    }

    #[tokio::test]
    async fn test_failed_capture_still_redirects_and_counts_click() {
        let provider = FakeProvider {
            position: Some(Err(CaptureError::PermissionDenied)),
            ..FakeProvider::fully_equipped()
        };
        let (tracker, store, links) = tracker(provider, Duration::from_secs(5));
        let link = links.create(None).unwrap();

        let outcome = tracker.track(Some(link.id()), None).await;
        assert_eq!(outcome.target_url, DEFAULT_TARGET_URL);
        assert!(matches!(
            outcome.capture.finish().await,
            Err(PipelineError::Capture(CaptureError::PermissionDenied))
        ));

        let stored = links.get(link.id()).unwrap().unwrap();
        assert_eq!(stored.clicks(), 1);
        assert_eq!(stored.captures(), 0);
        assert!(store.snapshot().unwrap().is_empty());
    }
}
