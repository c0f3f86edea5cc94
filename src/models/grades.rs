// src/models/grades.rs

//! Grade records.

use serde::{Deserialize, Serialize};

/// All grades visible on the grade report page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeSheet {
    pub grades: Vec<Grade>,
    /// Weighted average as shown by the portal, when present
    pub weighted_average: Option<f64>,
}

/// A single grade entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub subject: String,
    /// Grade kind, e.g. first/second standpoint, yearly, exam
    pub kind: String,
    pub value: String,
    pub weight: Option<f64>,
    pub note: Option<String>,
}
