// src/scrape/documents.rs

//! Document and folder listing extraction.

use crate::dom::{Dom, Node};
use crate::models::{Document, Folder};
use crate::scrape::messages::query_param;
use crate::utils::text;

const DOCUMENT_TABLE_ID: &str = "s_m_Content_Content_DocumentGridView_ctl00";
const FOLDER_HEADER_ID: &str = "s_m_Content_Content_FolderHeaderLabel";
const SUBFOLDER_LINK_CLASS: &str = "s2folderlink";

const HEADER_ROWS: usize = 1;

/// Extract the currently open folder with its documents and direct
/// subfolders. `None` when the document grid is absent.
pub fn extract(dom: &Dom) -> Option<Folder> {
    let table = dom.get_element_by_id(DOCUMENT_TABLE_ID)?;

    let (id, name) = match dom.get_element_by_id(FOLDER_HEADER_ID) {
        Some(header) => (
            header.attr("data-folderid").unwrap_or_default().to_string(),
            text::clean(&header.text()),
        ),
        None => (String::new(), String::new()),
    };

    let documents = table
        .get_elements_by_tag_name("tr")
        .iter()
        .skip(HEADER_ROWS)
        .filter_map(parse_document_row)
        .collect();

    let subfolders = dom
        .get_elements_by_class_name(SUBFOLDER_LINK_CLASS)
        .iter()
        .filter_map(|link| {
            let id = link.attr("href").and_then(|h| query_param(h, "folderid"))?;
            Some(Folder {
                id,
                name: text::clean(&link.text()),
                subfolders: Vec::new(),
                documents: Vec::new(),
            })
        })
        .collect();

    Some(Folder {
        id,
        name,
        subfolders,
        documents,
    })
}

fn parse_document_row(row: &Node<'_>) -> Option<Document> {
    let cells = row.get_elements_by_tag_name("td");
    // [icon, name link, size, modified, author]
    if cells.len() < 2 {
        return None;
    }

    let link = cells[1].get_elements_by_tag_name("a").into_iter().next()?;
    let id = link
        .attr("href")
        .and_then(|href| query_param(href, "documentid"))?;

    let cell_text = |index: usize| {
        cells
            .get(index)
            .map(|c| text::clean(&c.text()))
            .filter(|t| !t.is_empty())
    };

    Some(Document {
        id,
        name: text::clean(&link.text()),
        size: cell_text(2),
        modified: cell_text(3),
        author: cell_text(4),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
      <span id="s_m_Content_Content_FolderHeaderLabel" data-folderid="77">Fysik</span>
      <ul>
        <li><a class="s2folderlink" href="DokumentOversigt.aspx?folderid=78">Rapporter</a></li>
        <li><a class="s2folderlink" href="DokumentOversigt.aspx?folderid=79">Noter</a></li>
      </ul>
      <table id="s_m_Content_Content_DocumentGridView_ctl00">
        <tr><td></td><td>Navn</td><td>St&#248;rrelse</td><td>&#198;ndret</td><td>Af</td></tr>
        <tr>
          <td></td>
          <td><a href="dokumenthent.aspx?documentid=501">Rapport%201.docx</a></td>
          <td>120 KB</td><td>10/9-2026</td><td>KT</td>
        </tr>
        <tr><td></td><td>no link here</td><td></td><td></td><td></td></tr>
      </table>"#;

    #[test]
    fn missing_anchor_yields_none() {
        assert!(extract(&Dom::parse("<p>other</p>")).is_none());
    }

    #[test]
    fn folder_and_documents_are_parsed() {
        let folder = extract(&Dom::parse(PAGE)).unwrap();
        assert_eq!(folder.id, "77");
        assert_eq!(folder.name, "Fysik");
        assert_eq!(folder.subfolders.len(), 2);
        assert_eq!(folder.subfolders[0].name, "Rapporter");

        assert_eq!(folder.documents.len(), 1);
        let doc = &folder.documents[0];
        assert_eq!(doc.id, "501");
        // Percent-decoded display name
        assert_eq!(doc.name, "Rapport 1.docx");
        assert_eq!(doc.size.as_deref(), Some("120 KB"));
    }

    #[test]
    fn linkless_row_is_dropped() {
        let folder = extract(&Dom::parse(PAGE)).unwrap();
        assert!(folder.documents.iter().all(|d| !d.name.contains("no link")));
    }
}
