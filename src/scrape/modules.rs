// src/scrape/modules.rs

//! Per-subject module accounting extraction.

use crate::dom::{Dom, Node};
use crate::models::ModuleTally;
use crate::utils::text;

const MODULE_TABLE_ID: &str = "s_m_Content_Content_ModuleCountGV";

const HEADER_ROWS: usize = 1;

/// Extract held/planned module counts per subject. `None` when the
/// accounting table is absent.
pub fn extract(dom: &Dom) -> Option<Vec<ModuleTally>> {
    let table = dom.get_element_by_id(MODULE_TABLE_ID)?;

    let tallies = table
        .get_elements_by_tag_name("tr")
        .iter()
        .skip(HEADER_ROWS)
        .filter_map(parse_row)
        .collect();

    Some(tallies)
}

fn parse_row(row: &Node<'_>) -> Option<ModuleTally> {
    let cells = row.get_elements_by_tag_name("td");
    // [subject, held, planned]
    if cells.len() < 3 {
        return None;
    }

    let subject = text::clean(&cells[0].text());
    if subject.is_empty() {
        return None;
    }

    Some(ModuleTally {
        subject,
        held: text::parse_decimal(&cells[1].text())?,
        planned: text::parse_decimal(&cells[2].text())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
      <table id="s_m_Content_Content_ModuleCountGV">
        <tr><td>Hold</td><td>Afholdt</td><td>Planlagt</td></tr>
        <tr><td>2a MA</td><td>58,5</td><td>130</td></tr>
        <tr><td>2a DA</td><td>60</td><td>133</td></tr>
        <tr><td>2a ID</td><td>?</td><td>?</td></tr>
      </table>"#;

    #[test]
    fn missing_anchor_yields_none() {
        assert!(extract(&Dom::parse("<p>x</p>")).is_none());
    }

    #[test]
    fn parses_decimal_comma_counts() {
        let tallies = extract(&Dom::parse(PAGE)).unwrap();
        assert_eq!(tallies.len(), 2);
        assert_eq!(tallies[0].held, 58.5);
        assert_eq!(tallies[1].planned, 133.0);
    }
}
