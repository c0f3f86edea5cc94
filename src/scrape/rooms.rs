// src/scrape/rooms.rs

//! Room occupancy extraction.

use crate::dom::{Dom, Node};
use crate::models::RoomStatus;
use crate::utils::text;

const ROOM_TABLE_ID: &str = "s_m_Content_Content_RoomOverviewGV";

const HEADER_ROWS: usize = 1;

/// Text the portal shows for an unoccupied room.
const FREE_LABEL: &str = "Ledigt";

/// Extract current room occupancy. `None` when the overview is absent.
pub fn extract(dom: &Dom) -> Option<Vec<RoomStatus>> {
    let table = dom.get_element_by_id(ROOM_TABLE_ID)?;

    let rooms = table
        .get_elements_by_tag_name("tr")
        .iter()
        .skip(HEADER_ROWS)
        .filter_map(parse_row)
        .collect();

    Some(rooms)
}

fn parse_row(row: &Node<'_>) -> Option<RoomStatus> {
    let cells = row.get_elements_by_tag_name("td");
    if cells.len() < 2 {
        return None;
    }

    let room = text::clean(&cells[0].text());
    if room.is_empty() {
        return None;
    }

    let activity = text::clean(&cells[1].text());
    let occupied = !activity.is_empty() && activity != FREE_LABEL;

    Some(RoomStatus {
        room,
        occupied,
        activity: occupied.then_some(activity),
    })
}
