//! Maps an [`ExternalEventRecord`] onto the strictly-typed [`StoredEvent`] row.
//!
//! Normalisation never fails: anything malformed degrades to `None`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use crate::record::{truthy_text, ExternalEventRecord, FieldValue};
use crate::slug::create_slug;

/// The best-effort identity of an event: `(subject, location, start_datetime)`.
///
/// Any component may be `None`; whether two `None`s match is decided by the
/// store's [`crate::config::KeyMatching`] mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaturalKey {
    pub subject: Option<String>,
    pub location: Option<String>,
    pub start_datetime: Option<String>,
}

/// An event row as persisted in the `events` table (minus the surrogate `event_id`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub subject: Option<String>,
    pub web_link: Option<String>,
    pub location: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub formatteddatetime: Option<String>,
    pub description: Option<String>,
    pub event_template: Option<String>,
    pub event_type: Option<String>,
    pub parentevent: Option<String>,
    pub primaryeventtype: Option<String>,
    pub cost: Option<String>,
    pub eventimage: Option<String>,
    pub age: Option<String>,
    pub bookings: Option<String>,
    pub bookingsrequired: Option<i64>,
    pub agerange: Option<String>,
    pub venue: Option<String>,
    pub venueaddress: Option<String>,
    pub venuetype: Option<String>,
    pub maximumparticipantcapacity: Option<String>,
    pub activitytype: Option<String>,
    pub requirements: Option<String>,
    pub meetingpoint: Option<String>,
    pub suburb: Option<String>,
    pub ward: Option<String>,
    pub waterwayaccessfacilities: Option<String>,
    pub waterwayaccessinformation: Option<String>,
    pub status: Option<String>,
    pub libraryeventtypes: Option<String>,
    pub eventtype: Option<String>,
    pub communityhall: Option<String>,
    pub locationifvenueunavailable: Option<String>,
    pub image: Option<String>,
    pub externaleventid: Option<String>,
    pub slug: String,
}

impl StoredEvent {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            subject: self.subject.clone(),
            location: self.location.clone(),
            start_datetime: self.start_datetime.clone(),
        }
    }
}

fn event_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"eventid%3d(\d+)").expect("static event id regex"))
}

/// Pulls the booking-system event id out of an encoded booking link,
/// e.g. `.../book?eventid%3d12345&x=1` yields `12345`. Only the lowercase
/// `%3d` escape is recognised.
pub fn extract_external_event_id(web_link: &str) -> Option<String> {
    event_id_pattern()
        .captures(web_link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Only a native JSON boolean counts; the string `"true"` does not.
fn bookings_flag(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Bool(true)) => Some(1),
        Some(Value::Bool(false)) => Some(0),
        _ => None,
    }
}

fn multi(value: Option<&Value>) -> Option<String> {
    FieldValue::from_json(value).flatten()
}

/// Produces the row to insert for one upstream record.
pub fn normalize(record: &ExternalEventRecord) -> StoredEvent {
    let text = |v: &Option<Value>| truthy_text(v.as_ref());

    let subject = text(&record.subject);
    let location = text(&record.location);
    let web_link = text(&record.web_link);

    let externaleventid = web_link
        .as_deref()
        .and_then(extract_external_event_id)
        .or_else(|| text(&record.externaleventid));

    let slug = create_slug(subject.as_deref(), location.as_deref());

    StoredEvent {
        start_datetime: text(&record.start_datetime),
        end_datetime: text(&record.end_datetime),
        formatteddatetime: text(&record.formatteddatetime),
        description: text(&record.description),
        event_template: text(&record.event_template),
        event_type: multi(record.event_type.as_ref()),
        parentevent: text(&record.parentevent),
        primaryeventtype: text(&record.primaryeventtype),
        cost: text(&record.cost),
        eventimage: text(&record.eventimage),
        age: text(&record.age),
        bookings: text(&record.bookings),
        bookingsrequired: bookings_flag(record.bookingsrequired.as_ref()),
        agerange: multi(record.agerange.as_ref()),
        venue: text(&record.venue),
        venueaddress: text(&record.venueaddress),
        venuetype: text(&record.venuetype),
        maximumparticipantcapacity: text(&record.maximumparticipantcapacity),
        activitytype: multi(record.activitytype.as_ref()),
        requirements: text(&record.requirements),
        meetingpoint: text(&record.meetingpoint),
        suburb: text(&record.suburb),
        ward: text(&record.ward),
        waterwayaccessfacilities: text(&record.waterwayaccessfacilities),
        waterwayaccessinformation: text(&record.waterwayaccessinformation),
        status: text(&record.status),
        libraryeventtypes: multi(record.libraryeventtypes.as_ref()),
        eventtype: text(&record.eventtype),
        communityhall: text(&record.communityhall),
        locationifvenueunavailable: text(&record.locationifvenueunavailable),
        image: text(&record.image),
        externaleventid,
        slug,
        subject,
        web_link,
        location,
    }
}
