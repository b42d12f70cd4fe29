//! REDCap API request and response types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Kind of export requested from the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Content {
    /// The data dictionary
    Metadata,
    /// Survey records
    Record,
}

/// Form-encoded body of an export request
///
/// Holds the API token, so it deliberately has no `Debug` impl.
#[derive(Clone, Serialize)]
pub struct ExportRequest<'a> {
    pub token: &'a str,
    pub format: &'static str,
    pub content: Content,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "exportSurveyFields", skip_serializing_if = "Option::is_none")]
    pub export_survey_fields: Option<&'static str>,
}

impl<'a> ExportRequest<'a> {
    /// Request for the project's data dictionary
    pub fn metadata(token: &'a str) -> Self {
        Self {
            token,
            format: "json",
            content: Content::Metadata,
            kind: "flat",
            export_survey_fields: None,
        }
    }

    /// Request for all records, including survey identifier and timestamp fields
    pub fn records(token: &'a str) -> Self {
        Self {
            token,
            format: "json",
            content: Content::Record,
            kind: "flat",
            export_survey_fields: Some("true"),
        }
    }
}

/// One field definition from the REDCap data dictionary
///
/// `field_name`, `field_type` and `identifier` are required. A dictionary
/// with any row missing one fails to decode as a whole, so an unreadable
/// identifier flag never lets a field through.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetadataEntry {
    /// Variable name, unique within the project
    pub field_name: String,

    /// Instrument the field belongs to
    #[serde(default)]
    pub form_name: String,

    /// Field type ("text", "notes", "radio", ...)
    pub field_type: String,

    #[serde(default)]
    pub field_label: String,

    /// "y" when the field is flagged as identifying; empty otherwise
    pub identifier: String,
}

/// One exported record: field name to value, in export order
///
/// Records exported with survey fields carry keys such as
/// `redcap_survey_identifier` and `<instrument>_timestamp` that have no
/// data-dictionary entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Field names in export order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Value of `field` as CSV cell text; `None` when the record lacks it
    pub fn text(&self, field: &str) -> Option<Cow<'_, str>> {
        self.0.get(field).map(|value| match value {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            Value::Null => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
