// src/scrape/books.rs

//! Book loan extraction.

use crate::dom::{Dom, Node};
use crate::models::Book;
use crate::utils::text;

const BOOK_TABLE_ID: &str = "s_m_Content_Content_BookReservationGV";

const HEADER_ROWS: usize = 1;

/// Extract the list of borrowed books. `None` when the table is absent.
pub fn extract(dom: &Dom) -> Option<Vec<Book>> {
    let table = dom.get_element_by_id(BOOK_TABLE_ID)?;

    let books = table
        .get_elements_by_tag_name("tr")
        .iter()
        .skip(HEADER_ROWS)
        .filter_map(parse_row)
        .collect();

    Some(books)
}

fn parse_row(row: &Node<'_>) -> Option<Book> {
    let cells = row.get_elements_by_tag_name("td");
    // [title, team, loaned, due]
    let title = text::clean(&cells.first()?.text());
    if title.is_empty() {
        return None;
    }

    let cell_text = |index: usize| {
        cells
            .get(index)
            .map(|c| text::clean(&c.text()))
            .filter(|t| !t.is_empty())
    };

    Some(Book {
        title,
        team: cell_text(1),
        loaned: cell_text(2),
        due: cell_text(3),
    })
}
