// src/scrape/schedule.rs

//! Weekly schedule extraction.
//!
//! The schedule page lays lesson blocks out absolutely, in em units, on
//! a grid of one time rail plus five day columns. The portal ships the
//! grid in one of three fixed column widths depending on the requested
//! layout; geometry is normalized here to percent-of-week coordinates so
//! consumers never see em values.

use std::sync::OnceLock;

use chrono::{Days, NaiveDate, NaiveTime, Weekday};
use regex::Regex;

use crate::dom::{Dom, Node};
use crate::models::{BlockRect, Lesson, LessonSpan, LessonStatus, ModuleSlot, ScheduleWeek};
use crate::utils::text;

const SCHEDULE_TABLE_CLASS: &str = "s2skema";
const LESSON_BLOCK_CLASS: &str = "s2skemabrik";
const CANCELLED_CLASS: &str = "s2cancelled";
const CHANGED_CLASS: &str = "s2changed";
const MODULE_INFO_CLASS: &str = "s2module-info";

const NARROW_TABLE_CLASS: &str = "s2skema-narrow";
const WIDE_TABLE_CLASS: &str = "s2skema-wide";

/// Width of the time rail left of the Monday column.
const TIME_RAIL_EM: f64 = 5.0;
/// The three fixed day-column widths the portal renders.
const NARROW_DAY_EM: f64 = 12.5;
const STANDARD_DAY_EM: f64 = 17.5;
const WIDE_DAY_EM: f64 = 22.5;
const DAY_COUNT: usize = 5;

/// Height of the weekday header band above the first module row.
const HEADER_BAND_EM: f64 = 2.0;
/// Vertical em per module row.
const MODULE_ROW_EM: f64 = 8.0;
const MODULE_ROWS: f64 = 4.0;

static DATE_TIME_RE: OnceLock<Regex> = OnceLock::new();
static DATE_ONLY_RE: OnceLock<Regex> = OnceLock::new();
static MODULE_SLOT_RE: OnceLock<Regex> = OnceLock::new();

fn date_time_re() -> &'static Regex {
    // "15/9-2026 09:55 til 10:40"
    DATE_TIME_RE.get_or_init(|| {
        Regex::new(r"(\d{1,2})/(\d{1,2})-(\d{4})\s+(\d{1,2}):(\d{2})\s*(?:til|-)\s*(\d{1,2}):(\d{2})")
            .unwrap()
    })
}

fn date_only_re() -> &'static Regex {
    DATE_ONLY_RE.get_or_init(|| Regex::new(r"^(\d{1,2})/(\d{1,2})-(\d{4})$").unwrap())
}

fn module_slot_re() -> &'static Regex {
    // "2. modul 09:55 - 10:40"
    MODULE_SLOT_RE.get_or_init(|| {
        Regex::new(r"(\d+)\.\s*modul\s*(\d{1,2}):(\d{2})\s*-\s*(\d{1,2}):(\d{2})").unwrap()
    })
}

/// Extract the schedule for the requested ISO week.
///
/// Returns `None` when the schedule table is absent (not logged in, or
/// the page shape changed).
pub fn extract(dom: &Dom, week: u32, year: i32) -> Option<ScheduleWeek> {
    let tables = dom.get_elements_by_class_name(SCHEDULE_TABLE_CLASS);
    let table = tables.first()?;

    let day_em = if table.has_class(NARROW_TABLE_CLASS) {
        NARROW_DAY_EM
    } else if table.has_class(WIDE_TABLE_CLASS) {
        WIDE_DAY_EM
    } else {
        STANDARD_DAY_EM
    };

    let module_slots = extract_module_slots(dom);

    let lessons = table
        .get_elements_by_class_name(LESSON_BLOCK_CLASS)
        .iter()
        .filter_map(|block| parse_block(block, day_em, &module_slots, week, year))
        .collect();

    Some(ScheduleWeek {
        week,
        year,
        lessons,
        module_slots,
    })
}

/// Parse the ordered module time slot table shown on the time rail.
fn extract_module_slots(dom: &Dom) -> Vec<ModuleSlot> {
    let mut slots: Vec<ModuleSlot> = dom
        .get_elements_by_class_name(MODULE_INFO_CLASS)
        .iter()
        .filter_map(|node| parse_module_slot(&node.text()))
        .collect();
    slots.sort_by_key(|s| s.number);
    slots.dedup_by_key(|s| s.number);
    slots
}

fn parse_module_slot(raw: &str) -> Option<ModuleSlot> {
    let squashed = text::squash_whitespace(raw);
    let caps = module_slot_re().captures(&squashed)?;
    Some(ModuleSlot {
        number: caps[1].parse().ok()?,
        start: hm(&caps[2], &caps[3])?,
        end: hm(&caps[4], &caps[5])?,
    })
}

fn parse_block(
    block: &Node<'_>,
    day_em: f64,
    module_slots: &[ModuleSlot],
    week: u32,
    year: i32,
) -> Option<Lesson> {
    let info = block
        .attr("data-additionalinfo")
        .map(text::decode)
        .unwrap_or_default();

    // Blocks with neither tooltip nor content are rendering artifacts.
    if info.trim().is_empty() && block.text().trim().is_empty() {
        return None;
    }

    let (left_em, top_em, width_em, height_em) = block_geometry(block);
    let rect = normalize_rect(left_em, top_em, width_em, height_em, day_em);
    let day_index = day_index(left_em, day_em);

    let mut status = if block.has_class(CANCELLED_CLASS) {
        LessonStatus::Cancelled
    } else if block.has_class(CHANGED_CLASS) {
        LessonStatus::Changed
    } else {
        LessonStatus::Normal
    };

    let mut title = None;
    let mut team = None;
    let mut teacher = None;
    let mut room = None;
    let mut note = None;
    let mut homework: Option<String> = None;
    let mut explicit_date = None;
    let mut explicit_times = None;

    for raw_line in info.lines() {
        let line = text::squash_whitespace(raw_line);
        if line.is_empty() {
            continue;
        }

        // Everything after the homework header belongs to the homework.
        if let Some(hw) = &mut homework {
            if !hw.is_empty() {
                hw.push(' ');
            }
            hw.push_str(&line);
            continue;
        }

        match line.as_str() {
            "Aflyst!" => {
                status = LessonStatus::Cancelled;
                continue;
            }
            "Ændret!" => {
                status = LessonStatus::Changed;
                continue;
            }
            _ => {}
        }

        if let Some(caps) = date_time_re().captures(&line) {
            explicit_date = dmy(&caps[1], &caps[2], &caps[3]);
            explicit_times = Some((hm(&caps[4], &caps[5]), hm(&caps[6], &caps[7])));
            continue;
        }
        if let Some(caps) = date_only_re().captures(&line) {
            explicit_date = dmy(&caps[1], &caps[2], &caps[3]);
            continue;
        }

        if let Some(rest) = line.strip_prefix("Hold: ") {
            team = Some(rest.to_string());
        } else if let Some(rest) = line
            .strip_prefix("Lærere: ")
            .or_else(|| line.strip_prefix("Lærer: "))
        {
            teacher = Some(rest.to_string());
        } else if let Some(rest) = line
            .strip_prefix("Lokaler: ")
            .or_else(|| line.strip_prefix("Lokale: "))
        {
            room = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("Note: ") {
            note = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("Lektier:") {
            homework = Some(rest.trim().to_string());
        } else if title.is_none() {
            title = Some(line);
        }
    }

    let date = explicit_date.or_else(|| week_day_date(year, week, day_index));
    let span = build_span(date, explicit_times, top_em, module_slots);

    Some(Lesson {
        id: block.attr("href").and_then(query_param_absid),
        title,
        team,
        teacher,
        room,
        status,
        span,
        rect,
        homework: homework.filter(|h| !h.is_empty()),
        note,
    })
}

/// Resolve the lesson span: explicit range first, module-slot fallback
/// second. Inverted ranges are normalized by [`LessonSpan::new`].
fn build_span(
    date: Option<NaiveDate>,
    explicit: Option<(Option<NaiveTime>, Option<NaiveTime>)>,
    top_em: f64,
    module_slots: &[ModuleSlot],
) -> Option<LessonSpan> {
    let date = date?;

    if let Some((Some(start), Some(end))) = explicit {
        return Some(LessonSpan::new(date, start, end));
    }

    let row = ((top_em - HEADER_BAND_EM) / MODULE_ROW_EM).round();
    if row < 0.0 {
        return None;
    }
    let slot = module_slots.get(row as usize)?;
    Some(LessonSpan::new(date, slot.start, slot.end))
}

/// Parse the `left/top/width/height` em values off the inline style.
fn block_geometry(block: &Node<'_>) -> (f64, f64, f64, f64) {
    let style = block.attr("style").unwrap_or("");
    (
        style_em(style, "left").unwrap_or(TIME_RAIL_EM),
        style_em(style, "top").unwrap_or(HEADER_BAND_EM),
        style_em(style, "width").unwrap_or(0.0),
        style_em(style, "height").unwrap_or(0.0),
    )
}

fn style_em(style: &str, prop: &str) -> Option<f64> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        if name.trim() != prop {
            return None;
        }
        value.trim().strip_suffix("em")?.trim().parse().ok()
    })
}

/// Map em geometry onto percent-of-week coordinates.
fn normalize_rect(left: f64, top: f64, width: f64, height: f64, day_em: f64) -> BlockRect {
    let body_width = day_em * DAY_COUNT as f64;
    let body_height = MODULE_ROW_EM * MODULE_ROWS;
    BlockRect {
        left_pct: pct((left - TIME_RAIL_EM) / body_width),
        top_pct: pct((top - HEADER_BAND_EM) / body_height),
        width_pct: pct(width / body_width),
        height_pct: pct(height / body_height),
    }
}

fn pct(fraction: f64) -> f64 {
    (fraction * 100.0).clamp(0.0, 100.0)
}

fn day_index(left_em: f64, day_em: f64) -> usize {
    let index = ((left_em - TIME_RAIL_EM) / day_em).floor();
    (index.max(0.0) as usize).min(DAY_COUNT - 1)
}

fn week_day_date(year: i32, week: u32, day_index: usize) -> Option<NaiveDate> {
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .and_then(|monday| monday.checked_add_days(Days::new(day_index as u64)))
}

fn dmy(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn hm(hour: &str, minute: &str) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

fn query_param_absid(href: &str) -> Option<String> {
    let (_, tail) = href.split_once("absid=")?;
    let id: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
      <div id="m_Content">
        <div class="s2module-info">1. modul 08:10 - 09:50</div>
        <div class="s2module-info">2. modul 09:55 - 10:40</div>
        <table class="s2skema">
          <tr><td>
            <a class="s2skemabrik" href="SkemaNy.aspx?absid=4711&type=aktivitet"
               style="left: 5.0em; top: 2.0em; width: 17.5em; height: 7.5em;"
               data-additionalinfo="Matematik A&#10;15/9-2026 10:40 til 09:55&#10;Hold: 2a MA&#10;L&#230;rer: KT&#10;Lokale: 204&#10;Lektier:&#10;side 50-60">
            </a>
            <a class="s2skemabrik s2cancelled"
               style="left: 22.5em; top: 10.0em; width: 17.5em; height: 7.5em;"
               data-additionalinfo="Aflyst!&#10;Fysik B&#10;Hold: 2a FY">
            </a>
            <a class="s2skemabrik" style="left: 40em; top: 2em;"></a>
          </td></tr>
        </table>
      </div>"#;

    fn schedule() -> ScheduleWeek {
        extract(&Dom::parse(PAGE), 38, 2026).unwrap()
    }

    #[test]
    fn missing_anchor_yields_none() {
        let dom = Dom::parse(r#"<div id="m_Content"><p>log ind</p></div>"#);
        assert!(extract(&dom, 38, 2026).is_none());
    }

    #[test]
    fn parses_module_slots_in_order() {
        let week = schedule();
        assert_eq!(week.module_slots.len(), 2);
        assert_eq!(week.module_slots[0].number, 1);
        assert_eq!(week.module_slots[1].start, hm("09", "55").unwrap());
    }

    #[test]
    fn module_slot_survives_ragged_whitespace() {
        let slot = parse_module_slot("2. modul\n\t 09:55\u{a0}-  10:40").unwrap();
        assert_eq!(slot.number, 2);
        assert_eq!(slot.start, hm("09", "55").unwrap());
        assert_eq!(slot.end, hm("10", "40").unwrap());
    }

    #[test]
    fn empty_artifact_blocks_are_dropped() {
        assert_eq!(schedule().lessons.len(), 2);
    }

    #[test]
    fn inverted_time_range_is_swapped() {
        let week = schedule();
        let lesson = &week.lessons[0];
        let span = lesson.span.unwrap();
        assert!(span.start <= span.end);
        assert_eq!(span.start, hm("09", "55").unwrap());
        assert_eq!(span.date, NaiveDate::from_ymd_opt(2026, 9, 15).unwrap());
    }

    #[test]
    fn tooltip_fields_are_parsed() {
        let week = schedule();
        let lesson = &week.lessons[0];
        assert_eq!(lesson.id.as_deref(), Some("4711"));
        assert_eq!(lesson.title.as_deref(), Some("Matematik A"));
        assert_eq!(lesson.team.as_deref(), Some("2a MA"));
        assert_eq!(lesson.teacher.as_deref(), Some("KT"));
        assert_eq!(lesson.room.as_deref(), Some("204"));
        assert_eq!(lesson.homework.as_deref(), Some("side 50-60"));
    }

    #[test]
    fn geometry_is_normalized_to_percent() {
        let week = schedule();
        let rect = week.lessons[1].rect;
        // Day column 1 at standard width: (22.5 - 5) / 87.5
        assert!((rect.left_pct - 20.0).abs() < 1e-9);
        assert!((rect.width_pct - 20.0).abs() < 1e-9);
        assert!((rect.top_pct - 25.0).abs() < 1e-9);
    }

    #[test]
    fn cancelled_block_uses_module_fallback_and_week_date() {
        let week = schedule();
        let lesson = &week.lessons[1];
        assert_eq!(lesson.status, LessonStatus::Cancelled);

        let span = lesson.span.unwrap();
        // Second module row, Tuesday of ISO week 38.
        assert_eq!(span.start, hm("09", "55").unwrap());
        assert_eq!(span.date, NaiveDate::from_ymd_opt(2026, 9, 15).unwrap());
    }
}
