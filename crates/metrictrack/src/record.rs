//! The metric record, the only entity metrictrack stores.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::period::Period;

/// One tracked indicator entry.
///
/// `value` is kept as text so that leading zeros and units survive. Optional
/// fields are omitted from the serialized form when absent, so payloads
/// written before sections existed round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Display name of the indicator.
    pub name: String,

    /// Recorded value, never blank.
    pub value: String,

    /// Reporting month.
    pub period: Period,

    /// Grouping category; `None` belongs to the fallback bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Alternate report template file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl MetricRecord {
    /// Create a record from form input.
    ///
    /// Name and value are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] if the name or value is blank.
    pub fn new(name: &str, value: &str, period: Period) -> Result<Self> {
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            return Err(Error::invalid_record("name must not be blank"));
        }
        if value.is_empty() {
            return Err(Error::invalid_record("value must not be blank"));
        }
        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
            period,
            section: None,
            template: None,
        })
    }

    /// Set the section tag. Blank tags leave the record in the fallback bucket.
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        let section = section.into();
        let section = section.trim();
        self.section = (!section.is_empty()).then(|| section.to_string());
        self
    }

    /// Set the alternate template reference.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        let template = template.into();
        let template = template.trim();
        self.template = (!template.is_empty()).then(|| template.to_string());
        self
    }

    /// The section tag, if any.
    #[must_use]
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }
}
