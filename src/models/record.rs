//! Raw source rows and inclusion entries

use super::period::Period;

/// One row of a source extract, decoded from its positional columns
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    pub entity_id: String,
    pub category_code: String,
    pub location: String,
    pub location_name: Option<String>,
    pub start_marker: Option<String>,
    pub end_marker: Option<String>,
}

impl RawRecord {
    pub fn new(
        entity_id: impl Into<String>,
        category_code: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            category_code: category_code.into(),
            location: location.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_markers(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.start_marker = start.map(str::to_string);
        self.end_marker = end.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_location_name(mut self, name: &str) -> Self {
        self.location_name = Some(name.to_string());
        self
    }

    /// A row without an entity or a location cannot contribute to any cell
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.entity_id.is_empty() || self.location.is_empty()
    }
}

/// Eligible entity with the period markers taken from the inclusion source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InclusionEntry {
    pub start: Option<Period>,
    pub end: Option<Period>,
}

/// Normalize a location code read from a delimited source
///
/// Codes exported as floats (`3550308.0`) become integers; surrounding
/// whitespace is removed.
#[must_use]
pub fn normalize_location_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(integral) = trimmed.strip_suffix(".0") {
        if !integral.is_empty() && integral.bytes().all(|b| b.is_ascii_digit()) {
            return integral.to_string();
        }
    }
    trimmed.to_string()
}

/// Normalize an entity identifier
///
/// Numeric identifiers lose their zero padding so that `00012` in one
/// extract matches `12` in another.
#[must_use]
pub fn normalize_entity_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let unpadded = trimmed.trim_start_matches('0');
        return if unpadded.is_empty() {
            "0".to_string()
        } else {
            unpadded.to_string()
        };
    }
    trimmed.to_string()
}
