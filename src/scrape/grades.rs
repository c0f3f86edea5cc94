// src/scrape/grades.rs

//! Grade report extraction.

use crate::dom::{Dom, Node};
use crate::models::{Grade, GradeSheet};
use crate::utils::text;

const GRADES_TABLE_ID: &str = "s_m_Content_Content_karakterView_KarakterGV";
const AVERAGE_LABEL_ID: &str = "s_m_Content_Content_karakterView_AverageLabel";

const HEADER_ROWS: usize = 1;

/// Extract the grade sheet. `None` when the grade table is absent.
pub fn extract(dom: &Dom) -> Option<GradeSheet> {
    let table = dom.get_element_by_id(GRADES_TABLE_ID)?;

    let grades = table
        .get_elements_by_tag_name("tr")
        .iter()
        .skip(HEADER_ROWS)
        .filter_map(|row| parse_row(&row.get_elements_by_tag_name("td")))
        .collect();

    let weighted_average = dom
        .get_element_by_id(AVERAGE_LABEL_ID)
        .and_then(|label| text::parse_decimal(&label.text()));

    Some(GradeSheet {
        grades,
        weighted_average,
    })
}

fn parse_row(cells: &[Node<'_>]) -> Option<Grade> {
    // [subject, kind, grade, weight, note]; the last two are optional
    // columns the portal omits on some report variants.
    if cells.len() < 3 {
        return None;
    }

    let subject = text::clean(&cells[0].text());
    let value = text::clean(&cells[2].text());
    if subject.is_empty() || value.is_empty() {
        return None;
    }

    Some(Grade {
        subject,
        kind: text::clean(&cells[1].text()),
        value,
        weight: cells.get(3).and_then(|c| text::parse_decimal(&c.text())),
        note: cells
            .get(4)
            .map(|c| text::clean(&c.text()))
            .filter(|n| !n.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
      <span id="s_m_Content_Content_karakterView_AverageLabel">7,4</span>
      <table id="s_m_Content_Content_karakterView_KarakterGV">
        <tr><td>Hold</td><td>Karaktertype</td><td>Karakter</td><td>Vægt</td><td>Note</td></tr>
        <tr><td>2a MA</td><td>1. standpunkt</td><td>10</td><td>1,5</td><td>Flot fremgang</td></tr>
        <tr><td>2a DA</td><td>1. standpunkt</td><td>7</td><td>1</td><td></td></tr>
        <tr><td></td><td></td><td></td><td></td><td></td></tr>
      </table>"#;

    #[test]
    fn missing_anchor_yields_none() {
        assert!(extract(&Dom::parse("<p>other page</p>")).is_none());
    }

    #[test]
    fn parses_grades_and_average() {
        let sheet = extract(&Dom::parse(PAGE)).unwrap();
        assert_eq!(sheet.grades.len(), 2);
        assert_eq!(sheet.weighted_average, Some(7.4));

        let ma = &sheet.grades[0];
        assert_eq!(ma.subject, "2a MA");
        assert_eq!(ma.value, "10");
        assert_eq!(ma.weight, Some(1.5));
        assert_eq!(ma.note.as_deref(), Some("Flot fremgang"));
    }

    #[test]
    fn empty_row_is_dropped() {
        let sheet = extract(&Dom::parse(PAGE)).unwrap();
        assert!(sheet.grades.iter().all(|g| !g.subject.is_empty()));
    }

    #[test]
    fn empty_note_becomes_none() {
        let sheet = extract(&Dom::parse(PAGE)).unwrap();
        assert!(sheet.grades[1].note.is_none());
    }
}
