// src/models/absence.rs

//! Absence/registration records.

use serde::{Deserialize, Serialize};

/// Absence report for one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceReport {
    pub subjects: Vec<SubjectAbsence>,
    /// The portal's own totals row, when present
    pub total: Option<SubjectAbsence>,
}

/// Absence figures for a single subject (or the totals row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectAbsence {
    pub subject: String,
    /// Settled period ("opgjort")
    pub settled: AbsenceFigure,
    /// Whole school year ("for året")
    pub year: AbsenceFigure,
    /// Written-work columns, only present in the post-redesign layout
    pub writing_settled: Option<AbsenceFigure>,
    pub writing_year: Option<AbsenceFigure>,
}

/// One percentage-plus-fraction absence cell pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct AbsenceFigure {
    pub percent: f64,
    pub absent: f64,
    pub total: f64,
}
