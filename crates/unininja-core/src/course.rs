//! Course records
//!
//! Course lists come straight from Unistats. Course details are reduced to
//! the client-facing [`Course`] shape here: indicator fields become booleans
//! and the course length becomes an optional whole number of years.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lenient::{flag, indicator, string_or_number, whole_years};
use crate::types::{CourseId, StudyMode};

/// Entry of the Unistats `Institution/{id}/Courses` listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseSummaryRecord {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,

    #[serde(rename = "KisCourseId", default, deserialize_with = "string_or_number")]
    pub kis_course_id: Option<String>,

    #[serde(rename = "KisMode", default, deserialize_with = "string_or_number")]
    pub kis_mode: Option<String>,
}

/// Unistats `Institution/{id}/Course/{course}/{mode}` detail record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseDetailRecord {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,

    #[serde(rename = "KisAimLabel", default)]
    pub kis_aim_label: Option<String>,

    #[serde(rename = "CoursePageUrl", default)]
    pub course_page_url: Option<String>,

    #[serde(rename = "LengthInYears", default)]
    pub length_in_years: Option<Value>,

    #[serde(rename = "SandwichAvailable", default)]
    pub sandwich_available: Option<Value>,

    #[serde(
        rename = "YearAbroadAvaliable",
        alias = "YearAbroadAvailable",
        alias = "YearAbroad",
        default
    )]
    pub year_abroad_available: Option<Value>,

    #[serde(rename = "Honours", default)]
    pub honours: Option<Value>,
}

/// Course list entry, passed through from Unistats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kiscourseid: Option<String>,

    #[serde(rename = "isFullTime", skip_serializing_if = "Option::is_none")]
    pub is_full_time: Option<String>,
}

impl From<CourseSummaryRecord> for CourseSummary {
    fn from(record: CourseSummaryRecord) -> Self {
        Self {
            title: record.title,
            kiscourseid: record.kis_course_id,
            is_full_time: record.kis_mode,
        }
    }
}

/// A course as served to clients
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "kiscourseid", skip_serializing_if = "Option::is_none")]
    pub kiscourseid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_full_time: Option<String>,

    #[serde(rename = "courseURL", skip_serializing_if = "Option::is_none")]
    pub course_url: Option<String>,

    /// Absent when Unistats has no usable length, never zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_year_avaliable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_abroad_avaliable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree_label: Option<String>,

    /// Upstream `Honours` read as a yes/no flag. Booleans, numbers and
    /// `"true"`/`"false"`/`"1"`/`"0"`/`"yes"`/`"no"` are understood; any other
    /// value becomes `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_hons: Option<bool>,
}

impl Course {
    /// Derive the client-facing course from a Unistats detail record.
    ///
    /// The identifier and mode echo the request, the title is the upstream
    /// title followed by the degree label.
    pub fn from_detail(kiscourseid: &CourseId, mode: &StudyMode, detail: CourseDetailRecord) -> Self {
        let title = match (&detail.title, &detail.kis_aim_label) {
            (Some(title), Some(label)) if !label.is_empty() => Some(format!("{} {}", title, label)),
            (Some(title), _) => Some(title.clone()),
            (None, _) => None,
        };

        Self {
            title,
            kiscourseid: Some(kiscourseid.to_string()),
            is_full_time: Some(mode.to_string()),
            course_url: detail.course_page_url,
            years: whole_years(detail.length_in_years.as_ref()),
            placement_year_avaliable: Some(indicator(detail.sandwich_available.as_ref())),
            year_abroad_avaliable: Some(indicator(detail.year_abroad_available.as_ref())),
            degree_label: detail.kis_aim_label,
            is_hons: flag(detail.honours.as_ref()),
        }
    }
}

impl From<CourseSummary> for Course {
    fn from(summary: CourseSummary) -> Self {
        Self {
            title: summary.title,
            kiscourseid: summary.kiscourseid,
            is_full_time: summary.is_full_time,
            ..Default::default()
        }
    }
}
