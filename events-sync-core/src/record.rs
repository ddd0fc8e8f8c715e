//! Loosely-typed upstream records and the coercion rules applied to them.
//!
//! The events API is inconsistent about field shapes: the same key may carry a
//! string on one record and a list of strings on the next, numbers show up
//! where text is expected, and empty strings stand in for missing values. Every
//! field is therefore kept as raw JSON here and coerced explicitly by
//! [`crate::normalize`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of the upstream `records` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPage {
    /// Number of records matching the query across all pages.
    pub total_count: u64,
    pub results: Vec<ExternalEventRecord>,
}

/// An event as delivered by the upstream API. No field is guaranteed present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalEventRecord {
    pub subject: Option<Value>,
    pub web_link: Option<Value>,
    pub location: Option<Value>,
    pub start_datetime: Option<Value>,
    pub end_datetime: Option<Value>,
    pub formatteddatetime: Option<Value>,
    pub description: Option<Value>,
    pub event_template: Option<Value>,
    pub event_type: Option<Value>,
    pub parentevent: Option<Value>,
    pub primaryeventtype: Option<Value>,
    pub cost: Option<Value>,
    pub eventimage: Option<Value>,
    pub age: Option<Value>,
    pub bookings: Option<Value>,
    pub bookingsrequired: Option<Value>,
    #[serde(alias = "age_range")]
    pub agerange: Option<Value>,
    pub venue: Option<Value>,
    pub venueaddress: Option<Value>,
    pub venuetype: Option<Value>,
    pub maximumparticipantcapacity: Option<Value>,
    #[serde(alias = "activity_type")]
    pub activitytype: Option<Value>,
    pub requirements: Option<Value>,
    pub meetingpoint: Option<Value>,
    pub suburb: Option<Value>,
    pub ward: Option<Value>,
    pub waterwayaccessfacilities: Option<Value>,
    pub waterwayaccessinformation: Option<Value>,
    pub status: Option<Value>,
    #[serde(alias = "library_event_types")]
    pub libraryeventtypes: Option<Value>,
    pub eventtype: Option<Value>,
    pub communityhall: Option<Value>,
    pub locationifvenueunavailable: Option<Value>,
    pub image: Option<Value>,
    pub externaleventid: Option<Value>,
}

/// A field that may arrive as a single value or as an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Absent,
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => FieldValue::Absent,
            Some(Value::Array(items)) => FieldValue::List(items.iter().map(render_element).collect()),
            Some(other) => FieldValue::Scalar(render(other)),
        }
    }

    /// Flattens to the stored form: lists are joined with `", "`, scalars are
    /// kept verbatim (an empty string stays empty), absence is `None`.
    pub fn flatten(self) -> Option<String> {
        match self {
            FieldValue::Absent => None,
            FieldValue::Scalar(s) => Some(s),
            FieldValue::List(items) => Some(items.join(", ")),
        }
    }
}

/// JSON truthiness: `null`, `""`, `false` and zero are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text for a scalar column: the value when truthy, otherwise `None`.
pub fn truthy_text(value: Option<&Value>) -> Option<String> {
    value.filter(|v| is_truthy(v)).map(render)
}

/// Renders any JSON value as column text. Strings are taken without quotes.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_element(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => render(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lists_flatten_with_comma_space() {
        let v = json!(["A", "B", "C"]);
        assert_eq!(FieldValue::from_json(Some(&v)).flatten().as_deref(), Some("A, B, C"));
    }

    #[test]
    fn scalars_are_coerced_not_collapsed() {
        let empty = json!("");
        assert_eq!(FieldValue::from_json(Some(&empty)).flatten().as_deref(), Some(""));
        let number = json!(7);
        assert_eq!(FieldValue::from_json(Some(&number)).flatten().as_deref(), Some("7"));
        assert_eq!(FieldValue::from_json(None).flatten(), None);
        assert_eq!(FieldValue::from_json(Some(&Value::Null)).flatten(), None);
    }

    #[test]
    fn mixed_list_elements_render_as_text() {
        let v = json!(["Kids", 3, null, true]);
        assert_eq!(
            FieldValue::from_json(Some(&v)),
            FieldValue::List(vec!["Kids".into(), "3".into(), "".into(), "true".into()])
        );
    }

    #[test]
    fn falsy_scalars_become_none() {
        for v in [json!(""), json!(false), json!(0), json!(0.0), Value::Null] {
            assert_eq!(truthy_text(Some(&v)), None, "{v:?} should be falsy");
        }
        assert_eq!(truthy_text(None), None);
        assert_eq!(truthy_text(Some(&json!("Free"))).as_deref(), Some("Free"));
        assert_eq!(truthy_text(Some(&json!(25))).as_deref(), Some("25"));
        assert_eq!(truthy_text(Some(&json!("0"))).as_deref(), Some("0"));
    }

    #[test]
    fn record_accepts_underscore_aliases() {
        let record: ExternalEventRecord = serde_json::from_value(json!({
            "subject": "Story time",
            "age_range": ["0-5"],
            "activity_type": "Reading",
            "library_event_types": ["Children"],
            "unknown_field": 1
        }))
        .unwrap();
        assert_eq!(record.agerange, Some(json!(["0-5"])));
        assert_eq!(record.activitytype, Some(json!("Reading")));
        assert_eq!(record.libraryeventtypes, Some(json!(["Children"])));
    }

    #[test]
    fn page_requires_results() {
        assert!(serde_json::from_value::<EventPage>(json!({ "total_count": 12 })).is_err());

        let page: EventPage =
            serde_json::from_value(json!({ "total_count": 12, "results": [] })).unwrap();
        assert_eq!(page.total_count, 12);
        assert!(page.results.is_empty());
    }
}
