// src/session/mod.rs

//! Stateful session against the portal's web-forms protocol.
//!
//! Every portal mutation is a "postback": a urlencoded POST that must
//! echo hidden state fields harvested from the previous response, plus
//! an `__EVENTTARGET` naming the control that "clicked". [`Session::step`]
//! performs one such round trip; the flows in [`flows`] chain steps into
//! the multi-request protocols (login, term selection, message compose).

mod credentials;
mod flows;
mod payload;

pub use credentials::{CredentialStore, Credentials, MemoryCredentialStore};
pub use payload::{SessionPayload, extract_hidden_fields};

use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::config::Config;
use crate::dom::{Dom, normalize};
use crate::error::{AppError, Result};
use crate::scrape::{FetchStatus, classify};

use indexmap::IndexMap;
use std::time::Duration;

/// HTTP method of a single postback step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMethod {
    Get,
    Post,
}

/// Result of one round trip: the parsed tree, the raw body, and the
/// hidden fields to carry into the next step.
pub struct StepOutcome {
    pub dom: Dom,
    pub body: String,
    pub hidden: IndexMap<String, String>,
    pub final_url: Url,
    pub status: FetchStatus,
}

/// An authenticated (or to-be-authenticated) portal session.
///
/// Cookies live in the underlying client; cloning the session shares
/// them. Steps within one flow must run strictly in sequence; separate
/// flows on separate `Session` clones may run concurrently.
#[derive(Clone)]
pub struct Session {
    client: reqwest::Client,
    base: Url,
    school_id: u32,
}

impl Session {
    /// Build a session from configuration. The client keeps a cookie
    /// store and presents a desktop browser User-Agent; the portal
    /// degrades markup for anything else.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.http.user_agent)
            .cookie_store(true)
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base: Url::parse(&config.portal.base_url)?,
            school_id: config.portal.school_id,
        })
    }

    /// Absolute URL for a school-scoped portal page.
    pub fn page_url(&self, path: &str) -> Result<Url> {
        Ok(self
            .base
            .join(&format!("/lectio/{}/", self.school_id))?
            .join(path)?)
    }

    /// Execute one protocol step: issue the request, normalize and parse
    /// the body, classify it, and harvest the next step's hidden fields.
    pub async fn step(
        &self,
        path: &str,
        payload: &SessionPayload,
        method: StepMethod,
    ) -> Result<StepOutcome> {
        let url = self.page_url(path)?;
        self.step_at(url, payload, method).await
    }

    /// Plain GET of a domain page with query parameters.
    pub async fn fetch_page(&self, path: &str, query: &[(&str, String)]) -> Result<StepOutcome> {
        let mut url = self.page_url(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        self.step_at(url, &SessionPayload::new(), StepMethod::Get).await
    }

    async fn step_at(
        &self,
        url: Url,
        payload: &SessionPayload,
        method: StepMethod,
    ) -> Result<StepOutcome> {
        let request = match method {
            StepMethod::Get => self.client.get(url),
            StepMethod::Post => self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(payload.encode()),
        };

        let response = request.send().await?;
        let final_url = response.url().clone();
        let body = normalize(&response.text().await?);
        let dom = Dom::parse(&body);
        let status = classify(&dom);

        let hidden = if status == FetchStatus::RateLimited {
            IndexMap::new()
        } else {
            extract_hidden_fields(&dom)
        };

        Ok(StepOutcome {
            dom,
            body,
            hidden,
            final_url,
            status,
        })
    }

    /// Fail a flow step that hit the block page.
    pub(crate) fn ensure_not_blocked(outcome: &StepOutcome) -> Result<()> {
        if outcome.status == FetchStatus::RateLimited {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let mut config = Config::default();
        config.portal.school_id = 681;
        Session::new(&config).unwrap()
    }

    #[test]
    fn page_url_is_school_scoped() {
        let url = session().page_url("SkemaNy.aspx").unwrap();
        assert_eq!(url.as_str(), "https://www.lectio.dk/lectio/681/SkemaNy.aspx");
    }

    #[test]
    fn page_url_handles_subpaths() {
        let url = session().page_url("subnav/fravaerelev.aspx").unwrap();
        assert!(url.path().ends_with("/lectio/681/subnav/fravaerelev.aspx"));
    }
}
