// src/scrape/sentinel.rs

//! Rate-limit block-page detection.
//!
//! The portal does not use HTTP status codes for throttling: a blocked
//! client receives a normal 200 page whose content area contains a
//! literal block notice. Every parsed response passes through
//! [`classify`] before extraction or hidden-field harvesting.

use crate::dom::Dom;

/// Id of the master-page content container every portal page renders.
const CONTENT_CONTAINER_ID: &str = "m_Content";

/// Literal marker inside the block page's content area.
const BLOCK_PAGE_MARKER: &str = "midlertidigt blokeret";

/// Outcome of inspecting a parsed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Normal page; hand it to an extractor.
    Ok,
    /// The portal's block page. The fetch is treated as failed and the
    /// cache must not be overwritten.
    RateLimited,
    /// The content container itself is missing. Extractors will report
    /// their own structural miss; surfaced separately so a third page
    /// layout is never silently mis-parsed.
    Unrecognized,
}

/// Classify a parsed response.
pub fn classify(dom: &Dom) -> FetchStatus {
    let Some(container) = dom.get_element_by_id(CONTENT_CONTAINER_ID) else {
        return FetchStatus::Unrecognized;
    };

    if container.text().contains(BLOCK_PAGE_MARKER) {
        FetchStatus::RateLimited
    } else {
        FetchStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_page_is_ok() {
        let dom = Dom::parse(r#"<div id="m_Content"><table>data</table></div>"#);
        assert_eq!(classify(&dom), FetchStatus::Ok);
    }

    #[test]
    fn block_page_is_rate_limited() {
        let dom = Dom::parse(
            r#"<div id="m_Content"><p>Din adgang er midlertidigt blokeret
               på grund af for mange forespørgsler.</p></div>"#,
        );
        assert_eq!(classify(&dom), FetchStatus::RateLimited);
    }

    #[test]
    fn missing_container_is_unrecognized() {
        let dom = Dom::parse("<html><body><p>totally different site</p></body></html>");
        assert_eq!(classify(&dom), FetchStatus::Unrecognized);
    }
}
