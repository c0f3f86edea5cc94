// src/models/room.rs

//! Room occupancy records.

use serde::{Deserialize, Serialize};

/// Occupancy of a single room right now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomStatus {
    pub room: String,
    pub occupied: bool,
    /// The activity occupying the room, when listed
    pub activity: Option<String>,
}
