// src/scrape/absence.rs

//! Absence report extraction.
//!
//! The absence table exists in two shapes: the pre-redesign layout with
//! five cells per row, and the post-redesign layout that appends four
//! written-work cells. There is no version flag anywhere on the page, so
//! the variant is chosen per row by counting cells. Rows with any other
//! cell count are dropped rather than guessed at.

use crate::dom::{Dom, Node};
use crate::models::{AbsenceFigure, AbsenceReport, SubjectAbsence};
use crate::utils::text;

const ABSENCE_TABLE_ID: &str = "s_m_Content_Content_SFTabStudentAbsenceDataTable";

/// Header rows before the first data row.
const HEADER_ROWS: usize = 2;

/// Subject label of the portal's totals row.
const TOTAL_ROW_LABEL: &str = "Samlet";

/// Cell counts of the two known layouts.
const LEGACY_CELLS: usize = 5;
const REDESIGN_CELLS: usize = 9;

/// Extract the absence report. `None` when the table is absent.
pub fn extract(dom: &Dom) -> Option<AbsenceReport> {
    let table = dom.get_element_by_id(ABSENCE_TABLE_ID)?;

    let mut subjects = Vec::new();
    let mut total = None;

    for row in table.get_elements_by_tag_name("tr").iter().skip(HEADER_ROWS) {
        let cells = row.get_elements_by_tag_name("td");
        let Some(parsed) = parse_row(&cells) else {
            continue;
        };

        if parsed.subject == TOTAL_ROW_LABEL {
            total = Some(parsed);
        } else {
            subjects.push(parsed);
        }
    }

    Some(AbsenceReport { subjects, total })
}

fn parse_row(cells: &[Node<'_>]) -> Option<SubjectAbsence> {
    let writing = match cells.len() {
        LEGACY_CELLS => false,
        REDESIGN_CELLS => true,
        _ => return None,
    };

    let subject = text::clean(&cells[0].text());
    if subject.is_empty() {
        return None;
    }

    let settled = figure(&cells[1], &cells[2])?;
    let year = figure(&cells[3], &cells[4])?;

    let (writing_settled, writing_year) = if writing {
        (figure(&cells[5], &cells[6]), figure(&cells[7], &cells[8]))
    } else {
        (None, None)
    };

    Some(SubjectAbsence {
        subject,
        settled,
        year,
        writing_settled,
        writing_year,
    })
}

/// Combine a percent cell ("3,33%") and a fraction cell ("2/60").
fn figure(percent_cell: &Node<'_>, fraction_cell: &Node<'_>) -> Option<AbsenceFigure> {
    let percent = text::parse_decimal(&percent_cell.text())?;
    let (absent, total) = text::parse_fraction(&fraction_cell.text())?;
    Some(AbsenceFigure {
        percent,
        absent,
        total,
    })
}
