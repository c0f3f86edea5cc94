// src/scrape/roster.rs

//! Class roster and people extraction, feeding the directory crawler.

use crate::dom::{Dom, Node};
use crate::models::{ClassRef, ClassRoster, Person, PersonKind};
use crate::scrape::messages::query_param;
use crate::utils::text;

const MEMBERS_TABLE_ID: &str = "s_m_Content_Content_MembersGV";
const CLASS_LIST_ID: &str = "s_m_Content_Content_ClassPickerUL";
const PEOPLE_CACHE_TABLE_ID: &str = "s_m_Content_Content_CachePeopleGV";

const HEADER_ROWS: usize = 1;

/// Extract the roster of a single class page. `None` when the member
/// table is absent.
pub fn extract(dom: &Dom) -> Option<ClassRoster> {
    let table = dom.get_element_by_id(MEMBERS_TABLE_ID)?;

    let class = ClassRef {
        id: table.attr("data-klasseid").unwrap_or_default().to_string(),
        label: table.attr("data-klassenavn").unwrap_or_default().to_string(),
    };

    let members = table
        .get_elements_by_tag_name("tr")
        .iter()
        .skip(HEADER_ROWS)
        .filter_map(parse_member_row)
        .collect();

    Some(ClassRoster { class, members })
}

fn parse_member_row(row: &Node<'_>) -> Option<Person> {
    let cells = row.get_elements_by_tag_name("td");
    // [photo, name link, label]
    if cells.len() < 2 {
        return None;
    }

    let link = cells[1].get_elements_by_tag_name("a").into_iter().next()?;
    person_from_link(&link, cells.get(2))
}

fn person_from_link(link: &Node<'_>, label_cell: Option<&Node<'_>>) -> Option<Person> {
    let href = link.attr("href")?;

    let (id, kind) = if let Some(id) = query_param(href, "elevid") {
        (id, PersonKind::Student)
    } else if let Some(id) = query_param(href, "laererid") {
        (id, PersonKind::Teacher)
    } else {
        return None;
    };

    let name = text::clean(&link.text());
    if name.is_empty() {
        return None;
    }

    Some(Person {
        id,
        name,
        kind,
        label: label_cell
            .map(|c| text::clean(&c.text()))
            .filter(|l| !l.is_empty()),
    })
}

/// Enumerate every class on the class-picker page, in portal order.
/// `None` when the picker is absent.
pub fn extract_class_links(dom: &Dom) -> Option<Vec<ClassRef>> {
    let picker = dom.get_element_by_id(CLASS_LIST_ID)?;

    let classes = picker
        .get_elements_by_tag_name("a")
        .iter()
        .filter_map(|link| {
            let id = link.attr("href").and_then(|h| query_param(h, "klasseid"))?;
            let label = text::clean(&link.text());
            (!label.is_empty()).then_some(ClassRef { id, label })
        })
        .collect();

    Some(classes)
}

/// Extract the portal's bulk people cache used to seed a first crawl.
/// `None` when the cache table is absent.
pub fn extract_people_cache(dom: &Dom) -> Option<Vec<Person>> {
    let table = dom.get_element_by_id(PEOPLE_CACHE_TABLE_ID)?;

    let people = table
        .get_elements_by_tag_name("tr")
        .iter()
        .skip(HEADER_ROWS)
        .filter_map(parse_member_row)
        .collect();

    Some(people)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER_PAGE: &str = r#"
      <table id="s_m_Content_Content_MembersGV" data-klasseid="301" data-klassenavn="2a">
        <tr><td></td><td>Navn</td><td>Rolle</td></tr>
        <tr><td></td><td><a href="SkemaNy.aspx?type=elev&elevid=1001">Anna M&#248;ller</a></td><td>2a</td></tr>
        <tr><td></td><td><a href="SkemaNy.aspx?type=laerer&laererid=77">KT</a></td><td>L&#230;rer</td></tr>
        <tr><td></td><td>udmeldt elev</td><td></td></tr>
      </table>"#;

    const PICKER_PAGE: &str = r#"
      <ul id="s_m_Content_Content_ClassPickerUL">
        <li><a href="SkemaNy.aspx?type=stamklasse&klasseid=301">2a</a></li>
        <li><a href="SkemaNy.aspx?type=stamklasse&klasseid=302">2b</a></li>
        <li><a href="andet.aspx">ikke en klasse</a></li>
      </ul>"#;

    #[test]
    fn missing_anchors_yield_none() {
        let dom = Dom::parse("<p>x</p>");
        assert!(extract(&dom).is_none());
        assert!(extract_class_links(&dom).is_none());
        assert!(extract_people_cache(&dom).is_none());
    }

    #[test]
    fn roster_rows_are_parsed() {
        let roster = extract(&Dom::parse(ROSTER_PAGE)).unwrap();
        assert_eq!(roster.class.id, "301");
        assert_eq!(roster.class.label, "2a");
        assert_eq!(roster.members.len(), 2);

        assert_eq!(roster.members[0].id, "1001");
        assert_eq!(roster.members[0].kind, PersonKind::Student);
        assert_eq!(roster.members[0].name, "Anna Møller");
        assert_eq!(roster.members[1].kind, PersonKind::Teacher);
    }

    #[test]
    fn linkless_member_row_is_dropped() {
        let roster = extract(&Dom::parse(ROSTER_PAGE)).unwrap();
        assert!(roster.members.iter().all(|p| p.name != "udmeldt elev"));
    }

    #[test]
    fn class_picker_keeps_portal_order() {
        let classes = extract_class_links(&Dom::parse(PICKER_PAGE)).unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].label, "2a");
        assert_eq!(classes[1].id, "302");
    }
}
