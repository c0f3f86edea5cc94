// src/client.rs

//! High-level portal client: one typed method per domain page, all of
//! them routed through the cache's stale-while-revalidate path.

use chrono::Duration as ChronoDuration;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::{CacheDomain, CacheStore, Refresh, Ttl, fetch_with_cache};
use crate::config::Config;
use crate::connectivity::Connectivity;
use crate::crawler::{DirectoryCrawler, PortalRosterSource};
use crate::dom::Dom;
use crate::error::{AppError, Result};
use crate::models::{
    AbsenceReport, Book, Folder, GradeSheet, MessageThread, ModuleTally, OutgoingMessage,
    RoomStatus, ScheduleWeek, ThreadSummary,
};
use crate::scrape::{
    FetchStatus, absence, books, documents, grades, messages, modules, rooms, schedule,
};
use crate::session::{CredentialStore, Session};
use crate::storage::KvStore;

use std::sync::Arc;
use std::time::Duration;

const SCHEDULE_PAGE: &str = "SkemaNy.aspx";
const ABSENCE_PAGE: &str = "subnav/fravaerelev.aspx";
const GRADES_PAGE: &str = "grades/grade_report.aspx";
const MESSAGES_PAGE: &str = "beskeder2.aspx";
const DOCUMENTS_PAGE: &str = "dokumentarkiv.aspx";
const BOOKS_PAGE: &str = "BD/UserReservations.aspx";
const ROOMS_PAGE: &str = "SkemaAvanceret.aspx";
const MODULES_PAGE: &str = "subnav/modulregnskab.aspx";

/// Cache key for the single message inbox.
const INBOX_ID: &str = "inbox";

pub struct PortalClient {
    session: Session,
    cache: CacheStore,
    store: Arc<dyn KvStore>,
    connectivity: Arc<dyn Connectivity>,
    config: Config,
}

impl PortalClient {
    pub fn new(
        config: Config,
        store: Arc<dyn KvStore>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Result<Self> {
        config.validate()?;
        let session = Session::new(&config)?;
        let sweep_interval = Duration::from_secs(config.cache.sweep_interval_hours * 3600);
        Ok(Self {
            session,
            cache: CacheStore::new(store.clone(), sweep_interval),
            store,
            connectivity,
            config,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        self.session.login(username, password).await
    }

    /// Sign in with whatever the credential store holds.
    pub async fn login_stored(&self, credentials: &dyn CredentialStore) -> Result<bool> {
        let Some(creds) = credentials.load().await? else {
            return Err(AppError::auth("no stored credentials"));
        };
        self.login(&creds.username, &creds.password).await
    }

    /// Switch the active school term for this session.
    pub async fn select_term(&self, term_id: &str) -> Result<()> {
        self.session.select_term(term_id).await
    }

    /// Weekly schedule, cached per week.
    pub async fn schedule(
        &self,
        week: u32,
        year: i32,
        deliver: impl FnMut(Refresh<ScheduleWeek>),
    ) -> Result<()> {
        self.refresh(
            CacheDomain::Schedule,
            &format!("{week}-{year}"),
            Ttl::After(ChronoDuration::hours(1)),
            SCHEDULE_PAGE,
            &[("week", format!("{week:02}{year}"))],
            |dom| schedule::extract(dom, week, year),
            deliver,
        )
        .await
    }

    pub async fn absence(&self, deliver: impl FnMut(Refresh<AbsenceReport>)) -> Result<()> {
        self.refresh(
            CacheDomain::Absence,
            "me",
            Ttl::After(ChronoDuration::hours(6)),
            ABSENCE_PAGE,
            &[],
            absence::extract,
            deliver,
        )
        .await
    }

    pub async fn grades(&self, deliver: impl FnMut(Refresh<GradeSheet>)) -> Result<()> {
        self.refresh(
            CacheDomain::Grades,
            "me",
            Ttl::After(ChronoDuration::hours(12)),
            GRADES_PAGE,
            &[],
            grades::extract,
            deliver,
        )
        .await
    }

    pub async fn message_threads(
        &self,
        deliver: impl FnMut(Refresh<Vec<ThreadSummary>>),
    ) -> Result<()> {
        self.refresh(
            CacheDomain::Messages,
            INBOX_ID,
            Ttl::After(ChronoDuration::minutes(15)),
            MESSAGES_PAGE,
            &[],
            messages::extract_threads,
            deliver,
        )
        .await
    }

    pub async fn message_thread(
        &self,
        thread_id: &str,
        deliver: impl FnMut(Refresh<MessageThread>),
    ) -> Result<()> {
        self.refresh(
            CacheDomain::MessageThread,
            thread_id,
            Ttl::Never,
            MESSAGES_PAGE,
            &[("id", thread_id.to_string())],
            messages::extract_thread,
            deliver,
        )
        .await
    }

    pub async fn documents(
        &self,
        folder_id: &str,
        deliver: impl FnMut(Refresh<Folder>),
    ) -> Result<()> {
        self.refresh(
            CacheDomain::Documents,
            folder_id,
            Ttl::After(ChronoDuration::hours(1)),
            DOCUMENTS_PAGE,
            &[("folderid", folder_id.to_string())],
            documents::extract,
            deliver,
        )
        .await
    }

    pub async fn books(&self, deliver: impl FnMut(Refresh<Vec<Book>>)) -> Result<()> {
        self.refresh(
            CacheDomain::Books,
            "me",
            Ttl::After(ChronoDuration::hours(24)),
            BOOKS_PAGE,
            &[],
            books::extract,
            deliver,
        )
        .await
    }

    /// Room occupancy is near-realtime; the cache only bridges rapid
    /// repeat views.
    pub async fn rooms(&self, deliver: impl FnMut(Refresh<Vec<RoomStatus>>)) -> Result<()> {
        self.refresh(
            CacheDomain::Rooms,
            "now",
            Ttl::After(ChronoDuration::minutes(5)),
            ROOMS_PAGE,
            &[("type", "lokaler".to_string())],
            rooms::extract,
            deliver,
        )
        .await
    }

    pub async fn module_accounting(
        &self,
        deliver: impl FnMut(Refresh<Vec<ModuleTally>>),
    ) -> Result<()> {
        self.refresh(
            CacheDomain::Modules,
            "me",
            Ttl::After(ChronoDuration::hours(12)),
            MODULES_PAGE,
            &[],
            modules::extract,
            deliver,
        )
        .await
    }

    /// Send a message, then drop the cached inbox so the next read
    /// reflects the new thread.
    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<()> {
        self.session.send_message(message).await?;
        self.cache.delete(CacheDomain::Messages, INBOX_ID).await
    }

    /// Directory crawler bound to this client's session and store.
    pub fn directory_crawler(&self) -> DirectoryCrawler<PortalRosterSource> {
        DirectoryCrawler::new(
            PortalRosterSource::new(self.session.clone()),
            self.store.clone(),
            self.connectivity.clone(),
            self.config.crawl.clone(),
        )
    }

    async fn refresh<T, X>(
        &self,
        domain: CacheDomain,
        id: &str,
        ttl: Ttl,
        path: &str,
        query: &[(&str, String)],
        extract: X,
        deliver: impl FnMut(Refresh<T>),
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
        X: FnOnce(&Dom) -> Option<T>,
    {
        fetch_with_cache(
            &self.cache,
            self.connectivity.as_ref(),
            domain,
            id,
            ttl,
            false,
            || async move {
                let page = self.session.fetch_page(path, query).await?;
                match page.status {
                    FetchStatus::RateLimited => Err(AppError::RateLimited),
                    FetchStatus::Unrecognized => Err(AppError::session(
                        path.to_string(),
                        "page content container not found",
                    )),
                    FetchStatus::Ok => extract(&page.dom).ok_or_else(|| {
                        AppError::session(path.to_string(), "expected section not found on page")
                    }),
                }
            },
            deliver,
        )
        .await
    }
}
