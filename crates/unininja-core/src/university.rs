//! University records
//!
//! A [`University`] is assembled from two sources: the Unistats institution
//! record (identifier, name, student union URL) and an optional
//! [`UniversitySupplement`] document held in the gateway's own store.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::lenient::string_or_number;
use crate::types::Pubukprn;

/// Institution as returned by the Unistats `Institutions` and `Institution/{id}` endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstitutionRecord {
    #[serde(rename = "UKPRN", default, deserialize_with = "string_or_number")]
    pub ukprn: Option<String>,

    #[serde(rename = "Name", default)]
    pub name: Option<String>,

    #[serde(rename = "StudentUnionUrl", default)]
    pub student_union_url: Option<String>,
}

/// Supplementary per-university fields kept in the document store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversitySupplement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rent: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uni_location_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uni_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearest_train_station: Option<String>,
}

/// A university as served to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct University {
    pub pubukprn: Pubukprn,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "unionURL", skip_serializing_if = "Option::is_none")]
    pub union_url: Option<String>,

    #[serde(flatten)]
    pub supplement: Option<UniversitySupplement>,
}

impl University {
    /// Create a bare university with no supplementary fields
    pub fn new(pubukprn: Pubukprn, name: Option<String>) -> Self {
        Self {
            pubukprn,
            name,
            union_url: None,
            supplement: None,
        }
    }

    /// Build from an upstream institution record.
    ///
    /// The identifier is the one Unistats returned. `requested` is only used
    /// when the record omits `UKPRN` altogether.
    pub fn from_institution(
        record: InstitutionRecord,
        requested: Option<&Pubukprn>,
    ) -> Result<Self> {
        let pubukprn = match record.ukprn {
            Some(ukprn) => Pubukprn::new(ukprn)?,
            None => requested.cloned().ok_or(DomainError::MissingField {
                record: "Institution",
                field: "UKPRN",
            })?,
        };

        Ok(Self {
            pubukprn,
            name: record.name,
            union_url: record.student_union_url,
            supplement: None,
        })
    }

    /// Attach the store supplement, if one was found
    pub fn with_supplement(mut self, supplement: Option<UniversitySupplement>) -> Self {
        self.supplement = supplement;
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.supplement.as_ref()?.url.as_deref()
    }

    pub fn color(&self) -> Option<&str> {
        self.supplement.as_ref()?.color.as_deref()
    }

    pub fn lat(&self) -> Option<f64> {
        self.supplement.as_ref()?.lat
    }

    pub fn lon(&self) -> Option<f64> {
        self.supplement.as_ref()?.lon
    }

    pub fn average_rent(&self) -> Option<f64> {
        self.supplement.as_ref()?.average_rent
    }

    pub fn uni_location_type(&self) -> Option<&str> {
        self.supplement.as_ref()?.uni_location_type.as_deref()
    }

    pub fn uni_type(&self) -> Option<&str> {
        self.supplement.as_ref()?.uni_type.as_deref()
    }

    pub fn nearest_train_station(&self) -> Option<&str> {
        self.supplement.as_ref()?.nearest_train_station.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sussex() -> University {
        let record: InstitutionRecord = serde_json::from_value(json!({
            "UKPRN": "X",
            "Name": "N",
            "StudentUnionUrl": "U"
        }))
        .unwrap();
        University::from_institution(record, None).unwrap()
    }

    #[test]
    fn test_without_supplement_has_only_upstream_fields() {
        let university = sussex().with_supplement(None);
        let value = serde_json::to_value(&university).unwrap();

        assert_eq!(value, json!({"pubukprn": "X", "name": "N", "unionURL": "U"}));
    }

    #[test]
    fn test_supplement_fields_are_merged() {
        let supplement: UniversitySupplement = serde_json::from_value(json!({
            "pubukprn": "X",
            "color": "#fff",
            "lat": 1.0
        }))
        .unwrap();

        let university = sussex().with_supplement(Some(supplement));
        let value = serde_json::to_value(&university).unwrap();

        assert_eq!(value["color"], "#fff");
        assert_eq!(value["lat"], 1.0);
        assert!(value.get("lon").is_none());
        assert_eq!(university.color(), Some("#fff"));
        assert_eq!(university.lon(), None);
    }

    #[test]
    fn test_numeric_ukprn_is_normalised() {
        let record: InstitutionRecord =
            serde_json::from_value(json!({"UKPRN": 10007806, "Name": "University of Sussex"}))
                .unwrap();
        let university = University::from_institution(record, None).unwrap();
        assert_eq!(university.pubukprn.as_str(), "10007806");
        assert_eq!(university.union_url, None);
    }

    #[test]
    fn test_missing_ukprn_falls_back_to_requested() {
        let requested = Pubukprn::new("10007806").unwrap();
        let record = InstitutionRecord {
            name: Some("University of Sussex".to_string()),
            ..Default::default()
        };

        let university = University::from_institution(record.clone(), Some(&requested)).unwrap();
        assert_eq!(university.pubukprn, requested);

        let err = University::from_institution(record, None).unwrap_err();
        assert!(matches!(err, DomainError::MissingField { field: "UKPRN", .. }));
    }
}
