// src/crawler/source.rs

//! Where the crawler's pages come from. The trait exists so crawl
//! scheduling can be tested against scripted page sequences.

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{ClassRef, ClassRoster, Person};
use crate::scrape::{FetchStatus, roster};
use crate::session::Session;

const CLASS_PICKER_PAGE: &str = "FindSkema.aspx";
const MEMBERS_PAGE: &str = "subnav/members.aspx";
const PEOPLE_CACHE_PAGE: &str = "cache/people.aspx";

/// Pages the directory crawl needs, as parsed records.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Every class, in portal order. The crawl's stage list.
    async fn class_list(&self) -> Result<Vec<ClassRef>>;

    /// One class roster. `Ok(None)` when the class page no longer
    /// carries a member table.
    async fn roster(&self, class: &ClassRef) -> Result<Option<ClassRoster>>;

    /// The portal's bulk people cache, used to seed a fresh crawl.
    async fn seed(&self) -> Result<Vec<Person>>;
}

/// Live source over an authenticated [`Session`].
pub struct PortalRosterSource {
    session: Session,
}

impl PortalRosterSource {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl RosterSource for PortalRosterSource {
    async fn class_list(&self) -> Result<Vec<ClassRef>> {
        let page = self
            .session
            .fetch_page(CLASS_PICKER_PAGE, &[("type", "stamklasse".to_string())])
            .await?;
        if page.status == FetchStatus::RateLimited {
            return Err(AppError::RateLimited);
        }
        roster::extract_class_links(&page.dom)
            .ok_or_else(|| AppError::session("class_list", "class picker not found on page"))
    }

    async fn roster(&self, class: &ClassRef) -> Result<Option<ClassRoster>> {
        let page = self
            .session
            .fetch_page(MEMBERS_PAGE, &[("klasseid", class.id.clone())])
            .await?;
        if page.status == FetchStatus::RateLimited {
            return Err(AppError::RateLimited);
        }
        Ok(roster::extract(&page.dom))
    }

    async fn seed(&self) -> Result<Vec<Person>> {
        let page = self.session.fetch_page(PEOPLE_CACHE_PAGE, &[]).await?;
        if page.status == FetchStatus::RateLimited {
            return Err(AppError::RateLimited);
        }
        // A school without the cache page just starts empty.
        Ok(roster::extract_people_cache(&page.dom).unwrap_or_default())
    }
}
