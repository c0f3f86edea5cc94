// src/scrape/messages.rs

//! Message thread listing and thread view extraction.

use crate::dom::{Dom, Node};
use crate::models::{Message, MessageThread, ThreadSummary};
use crate::utils::text;

const THREAD_TABLE_ID: &str = "s_m_Content_Content_threadGV_ctl00";
const THREAD_VIEW_ID: &str = "s_m_Content_Content_MessageThreadCtrl";

const UNREAD_ROW_CLASS: &str = "unread";
const FLAG_CLASS: &str = "s2flagged";

const HEADER_ROWS: usize = 1;

/// Extract the thread listing. `None` when the listing table is absent.
pub fn extract_threads(dom: &Dom) -> Option<Vec<ThreadSummary>> {
    let table = dom.get_element_by_id(THREAD_TABLE_ID)?;

    let threads = table
        .get_elements_by_tag_name("tr")
        .iter()
        .skip(HEADER_ROWS)
        .filter_map(parse_thread_row)
        .collect();

    Some(threads)
}

fn parse_thread_row(row: &Node<'_>) -> Option<ThreadSummary> {
    let cells = row.get_elements_by_tag_name("td");
    // [flag, subject link, sender, date]
    if cells.len() < 4 {
        return None;
    }

    let link = cells[1].get_elements_by_tag_name("a").into_iter().next()?;
    let id = link.attr("href").and_then(|href| query_param(href, "id"))?;

    Some(ThreadSummary {
        id,
        subject: text::clean(&link.text()),
        sender: text::clean(&cells[2].text()),
        date: text::clean(&cells[3].text()),
        unread: row.has_class(UNREAD_ROW_CLASS),
        flagged: !cells[0].get_elements_by_class_name(FLAG_CLASS).is_empty(),
    })
}

/// Extract a single opened thread. `None` when the view is absent.
pub fn extract_thread(dom: &Dom) -> Option<MessageThread> {
    let view = dom.get_element_by_id(THREAD_VIEW_ID)?;

    let subject = view
        .get_elements_by_class_name("message-subject")
        .first()
        .map(|n| text::clean(&n.text()))
        .unwrap_or_default();

    let id = view.attr("data-threadid").unwrap_or_default().to_string();

    let messages = view
        .get_elements_by_class_name("message")
        .iter()
        .filter_map(parse_message)
        .collect();

    Some(MessageThread {
        id,
        subject,
        messages,
    })
}

fn parse_message(node: &Node<'_>) -> Option<Message> {
    let sender = node
        .get_elements_by_class_name("message-sender")
        .first()
        .map(|n| text::clean(&n.text()))?;

    let body = node
        .get_elements_by_class_name("message-body")
        .first()
        .map(|n| text::clean(&n.text()))
        .unwrap_or_default();

    Some(Message {
        sender,
        date: node
            .get_elements_by_class_name("message-date")
            .first()
            .map(|n| text::clean(&n.text()))
            .unwrap_or_default(),
        body,
    })
}

/// Pull a single query parameter value out of an href.
pub(crate) fn query_param(href: &str, key: &str) -> Option<String> {
    let (_, query) = href.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key && !v.is_empty()).then(|| v.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
      <table id="s_m_Content_Content_threadGV_ctl00">
        <tr><td></td><td>Emne</td><td>Afsender</td><td>Dato</td></tr>
        <tr class="unread">
          <td><span class="s2flagged"></span></td>
          <td><a href="beskeder2.aspx?id=9001">Studietur</a></td>
          <td>KT</td><td>12/9</td>
        </tr>
        <tr>
          <td></td>
          <td><a href="beskeder2.aspx?id=9002">Sk&#230;rmtid</a></td>
          <td>AB</td><td>11/9</td>
        </tr>
        <tr><td colspan="4">ingen flere beskeder</td></tr>
      </table>"#;

    const THREAD: &str = r#"
      <div id="s_m_Content_Content_MessageThreadCtrl" data-threadid="9001">
        <h2 class="message-subject">Studietur</h2>
        <div class="message">
          <span class="message-sender">KT</span>
          <span class="message-date">12/9-2026 10:02</span>
          <div class="message-body">Husk pas og  Europ&#230;isk sygesikring.</div>
        </div>
        <div class="message">
          <span class="message-date">12/9-2026 10:15</span>
          <div class="message-body">orphan without sender</div>
        </div>
      </div>"#;

    #[test]
    fn missing_anchor_yields_none() {
        assert!(extract_threads(&Dom::parse("<p>x</p>")).is_none());
        assert!(extract_thread(&Dom::parse("<p>x</p>")).is_none());
    }

    #[test]
    fn listing_rows_are_parsed() {
        let threads = extract_threads(&Dom::parse(LISTING)).unwrap();
        assert_eq!(threads.len(), 2);

        assert_eq!(threads[0].id, "9001");
        assert!(threads[0].unread);
        assert!(threads[0].flagged);
        assert_eq!(threads[1].subject, "Skærmtid");
        assert!(!threads[1].unread);
    }

    #[test]
    fn thread_view_drops_senderless_fragments() {
        let thread = extract_thread(&Dom::parse(THREAD)).unwrap();
        assert_eq!(thread.id, "9001");
        assert_eq!(thread.subject, "Studietur");
        assert_eq!(thread.messages.len(), 1);
        assert!(thread.messages[0].body.contains("Europæisk"));
    }

    #[test]
    fn query_param_lookup() {
        assert_eq!(query_param("a.aspx?id=12&x=1", "id").as_deref(), Some("12"));
        assert_eq!(query_param("a.aspx?id=", "id"), None);
        assert_eq!(query_param("a.aspx", "id"), None);
    }
}
