// src/models/schedule.rs

//! Weekly schedule records.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One ISO week of lessons for a person or class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleWeek {
    pub week: u32,
    pub year: i32,
    pub lessons: Vec<Lesson>,
    /// Ordered module time slots, used as fallback when a lesson block
    /// carries no explicit time range.
    pub module_slots: Vec<ModuleSlot>,
}

/// A single lesson block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Portal activity id, when the block links to one
    pub id: Option<String>,
    pub title: Option<String>,
    pub team: Option<String>,
    pub teacher: Option<String>,
    pub room: Option<String>,
    pub status: LessonStatus,
    pub span: Option<LessonSpan>,
    /// On-screen rectangle in percent-of-week coordinates
    pub rect: BlockRect,
    pub homework: Option<String>,
    pub note: Option<String>,
}

/// Lesson state as flagged by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LessonStatus {
    #[default]
    Normal,
    Changed,
    Cancelled,
}

/// Concrete date and time span of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSpan {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl LessonSpan {
    /// Build a span, swapping inverted endpoints so `start <= end`.
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        if end < start {
            Self {
                date,
                start: end,
                end: start,
            }
        } else {
            Self { date, start, end }
        }
    }
}

/// Lesson block geometry, normalized to percent of the week grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BlockRect {
    pub left_pct: f64,
    pub top_pct: f64,
    pub width_pct: f64,
    pub height_pct: f64,
}

/// A numbered module time slot, e.g. "1. modul 08:10 - 09:50".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSlot {
    pub number: u32,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Per-subject module accounting (held vs. planned).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleTally {
    pub subject: String,
    pub held: f64,
    pub planned: f64,
}
