// src/crawler/mod.rs

//! Resumable directory crawler.
//!
//! Building the people directory means fetching every class roster, one
//! postback-free page per class. Done naively that trips the portal's
//! rate limiter, so the crawl runs as a staged pipeline: one class per
//! stage, a fixed delay between stages, and a persisted checkpoint so
//! an interrupted crawl resumes where it stopped instead of re-fetching
//! finished stages.

mod source;

pub use source::{PortalRosterSource, RosterSource};

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CrawlConfig;
use crate::connectivity::Connectivity;
use crate::error::{AppError, Result};
use crate::models::PersonDirectory;
use crate::storage::KvStore;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const CHECKPOINT_KEY: &str = "CRAWL-checkpoint";
const DIRECTORY_KEY: &str = "CRAWL-directory";

/// Why a crawl stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterruptReason {
    /// Deliberate stop (abort call or shutdown).
    #[default]
    None,
    /// The portal served its block page mid-crawl.
    RateLimited,
    /// The network went away mid-crawl.
    Offline,
}

/// Persisted crawl progress. Stage `stage_index` is the next one to
/// run; everything before it is already merged into `partial`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CrawlCheckpoint {
    pub stage_index: usize,
    pub partial: PersonDirectory,
    pub interrupt_reason: InterruptReason,
}

/// How a call to [`DirectoryCrawler::start`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    Completed,
    /// A crawl was already in flight on another task.
    AlreadyRunning,
    /// A completed directory is younger than the cooldown.
    Fresh,
    Interrupted(InterruptReason),
}

pub struct DirectoryCrawler<S> {
    source: S,
    store: Arc<dyn KvStore>,
    connectivity: Arc<dyn Connectivity>,
    config: CrawlConfig,
    running: AtomicBool,
    abort: AtomicBool,
}

impl<S: RosterSource> DirectoryCrawler<S> {
    pub fn new(
        source: S,
        store: Arc<dyn KvStore>,
        connectivity: Arc<dyn Connectivity>,
        config: CrawlConfig,
    ) -> Self {
        Self {
            source,
            store,
            connectivity,
            config,
            running: AtomicBool::new(false),
            abort: AtomicBool::new(false),
        }
    }

    /// Run the crawl to completion or interruption.
    ///
    /// Resumes from a persisted checkpoint when one exists; otherwise
    /// starts fresh, seeded from the portal's bulk people cache. A
    /// directory completed within the cooldown window makes this a
    /// no-op unless `force` is set.
    pub async fn start(&self, force: bool) -> Result<CrawlOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(CrawlOutcome::AlreadyRunning);
        }
        self.abort.store(false, Ordering::SeqCst);

        let outcome = self.run(force).await;
        self.running.store(false, Ordering::SeqCst);
        outcome
    }

    async fn run(&self, force: bool) -> Result<CrawlOutcome> {
        if !force && self.directory_is_fresh().await? {
            log::debug!("directory crawl skipped: completed within cooldown");
            return Ok(CrawlOutcome::Fresh);
        }

        let mut checkpoint = match self.load_checkpoint().await? {
            Some(checkpoint) => {
                log::info!("resuming directory crawl at stage {}", checkpoint.stage_index);
                checkpoint
            }
            None => {
                let mut fresh = CrawlCheckpoint::default();
                // The bulk seed runs only before the first completed
                // crawl; later re-crawls rebuild from rosters alone.
                if self.store.read(DIRECTORY_KEY).await?.is_none() {
                    fresh.partial.merge(self.source.seed().await?);
                    log::info!("starting directory crawl, {} seeded", fresh.partial.len());
                }
                fresh
            }
        };

        let classes = self.source.class_list().await?;

        while checkpoint.stage_index < classes.len() {
            if self.abort.load(Ordering::SeqCst) {
                return self.suspend(checkpoint, InterruptReason::None).await;
            }
            if !self.connectivity.is_connected() {
                return self.suspend(checkpoint, InterruptReason::Offline).await;
            }

            let class = &classes[checkpoint.stage_index];
            match self.source.roster(class).await {
                Ok(Some(roster)) => checkpoint.partial.merge(roster.members),
                // A vanished class is skipped, not fatal.
                Ok(None) => log::warn!("class {} has no roster page", class.label),
                Err(AppError::RateLimited) => {
                    return self.suspend(checkpoint, InterruptReason::RateLimited).await;
                }
                Err(err) => return Err(err),
            }

            checkpoint.stage_index += 1;
            checkpoint.interrupt_reason = InterruptReason::None;
            self.save_checkpoint(&checkpoint).await?;

            if checkpoint.stage_index < classes.len() {
                tokio::time::sleep(self.config.stage_delay()).await;
            }
        }

        let mut directory = checkpoint.partial;
        directory.completed_at = Some(Utc::now());
        self.store
            .write(DIRECTORY_KEY, &serde_json::to_vec(&directory)?)
            .await?;
        self.store.delete(CHECKPOINT_KEY).await?;

        log::info!("directory crawl complete: {} people", directory.len());
        Ok(CrawlOutcome::Completed)
    }

    /// Ask a running crawl to stop after the current stage.
    pub fn abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether a crawl suspended for lack of network should restart now
    /// that connectivity is back. Other interrupt reasons stay parked.
    pub async fn should_resume_on_reconnect(&self) -> Result<bool> {
        Ok(self
            .load_checkpoint()
            .await?
            .is_some_and(|c| c.interrupt_reason == InterruptReason::Offline))
    }

    /// Best available directory: the completed one if present, else the
    /// partial from an in-progress checkpoint, else empty.
    pub async fn get_directory(&self) -> Result<PersonDirectory> {
        if let Some(bytes) = self.store.read(DIRECTORY_KEY).await? {
            return Ok(serde_json::from_slice(&bytes)?);
        }
        if let Some(checkpoint) = self.load_checkpoint().await? {
            return Ok(checkpoint.partial);
        }
        Ok(PersonDirectory::default())
    }

    async fn suspend(
        &self,
        mut checkpoint: CrawlCheckpoint,
        reason: InterruptReason,
    ) -> Result<CrawlOutcome> {
        checkpoint.interrupt_reason = reason;
        self.save_checkpoint(&checkpoint).await?;
        log::info!(
            "directory crawl suspended at stage {} ({reason:?})",
            checkpoint.stage_index
        );
        Ok(CrawlOutcome::Interrupted(reason))
    }

    async fn directory_is_fresh(&self) -> Result<bool> {
        let Some(bytes) = self.store.read(DIRECTORY_KEY).await? else {
            return Ok(false);
        };
        let directory: PersonDirectory = match serde_json::from_slice(&bytes) {
            Ok(directory) => directory,
            Err(_) => return Ok(false),
        };
        let Some(completed_at) = directory.completed_at else {
            return Ok(false);
        };
        let cooldown = ChronoDuration::from_std(self.config.cooldown())
            .unwrap_or_else(|_| ChronoDuration::days(7));
        Ok(Utc::now() - completed_at < cooldown)
    }

    async fn load_checkpoint(&self) -> Result<Option<CrawlCheckpoint>> {
        let Some(bytes) = self.store.read(CHECKPOINT_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(err) => {
                log::warn!("dropping corrupt crawl checkpoint: {err}");
                self.store.delete(CHECKPOINT_KEY).await?;
                Ok(None)
            }
        }
    }

    async fn save_checkpoint(&self, checkpoint: &CrawlCheckpoint) -> Result<()> {
        self.store
            .write(CHECKPOINT_KEY, &serde_json::to_vec(checkpoint)?)
            .await
    }
}

/// Restart a suspended crawl whenever connectivity returns, but only
/// when the suspension was for lack of network.
pub async fn resume_on_reconnect<S: RosterSource>(
    crawler: Arc<DirectoryCrawler<S>>,
    connectivity: Arc<dyn Connectivity>,
) {
    let mut rx = connectivity.subscribe();
    loop {
        if rx.changed().await.is_err() {
            return;
        }
        if !*rx.borrow() {
            continue;
        }
        match crawler.should_resume_on_reconnect().await {
            Ok(true) => {
                if let Err(err) = crawler.start(false).await {
                    log::warn!("crawl restart after reconnect failed: {err}");
                }
            }
            Ok(false) => {}
            Err(err) => log::warn!("checkpoint inspection failed: {err}"),
        }
    }
}
