// src/models/mod.rs

//! Domain records produced by the extractors.
//!
//! All records are plain values: immutable once returned, serializable
//! so the cache layer can persist them unchanged.

mod absence;
mod book;
mod document;
mod grades;
mod message;
mod person;
mod room;
mod schedule;

pub use absence::{AbsenceFigure, AbsenceReport, SubjectAbsence};
pub use book::Book;
pub use document::{Document, Folder};
pub use grades::{Grade, GradeSheet};
pub use message::{Message, MessageThread, OutgoingMessage, ThreadSummary};
pub use person::{ClassRef, ClassRoster, Person, PersonDirectory, PersonKind};
pub use room::RoomStatus;
pub use schedule::{BlockRect, Lesson, LessonSpan, LessonStatus, ModuleSlot, ModuleTally, ScheduleWeek};
