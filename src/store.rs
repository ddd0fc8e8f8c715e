//! SQLite-backed [`EventStore`].
//!
//! The `events` table is created if missing; there is no migration support.
//! All rusqlite calls run on the blocking pool.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};

use events_sync_core::config::KeyMatching;
use events_sync_core::contract::EventStore;
use events_sync_core::error::StoreError;
use events_sync_core::normalize::{NaturalKey, StoredEvent};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS events (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject TEXT,
    web_link TEXT,
    location TEXT,
    start_datetime TEXT,
    end_datetime TEXT,
    formatteddatetime TEXT,
    description TEXT,
    event_template TEXT,
    event_type TEXT,
    parentevent TEXT,
    primaryeventtype TEXT,
    cost TEXT,
    eventimage TEXT,
    age TEXT,
    bookings TEXT,
    bookingsrequired INTEGER,
    agerange TEXT,
    venue TEXT,
    venueaddress TEXT,
    venuetype TEXT,
    maximumparticipantcapacity TEXT,
    activitytype TEXT,
    requirements TEXT,
    meetingpoint TEXT,
    suburb TEXT,
    ward TEXT,
    waterwayaccessfacilities TEXT,
    waterwayaccessinformation TEXT,
    status TEXT,
    libraryeventtypes TEXT,
    eventtype TEXT,
    communityhall TEXT,
    locationifvenueunavailable TEXT,
    image TEXT,
    externaleventid TEXT,
    slug TEXT
);
CREATE INDEX IF NOT EXISTS idx_events_natural_key
    ON events (subject, location, start_datetime);
";

const INSERT_SQL: &str = "
INSERT INTO events (
    subject, web_link, location, start_datetime, end_datetime, formatteddatetime,
    description, event_template, event_type, parentevent, primaryeventtype,
    cost, eventimage, age, bookings, bookingsrequired, agerange,
    venue, venueaddress, venuetype, maximumparticipantcapacity, activitytype,
    requirements, meetingpoint, suburb, ward, waterwayaccessfacilities,
    waterwayaccessinformation, status, libraryeventtypes, eventtype,
    communityhall, locationifvenueunavailable, image, externaleventid, slug
) VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
    ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34, ?35, ?36
)";

const COUNT_NULL_SAFE_SQL: &str =
    "SELECT COUNT(*) FROM events WHERE subject IS ?1 AND location IS ?2 AND start_datetime IS ?3";
const COUNT_STRICT_SQL: &str =
    "SELECT COUNT(*) FROM events WHERE subject = ?1 AND location = ?2 AND start_datetime = ?3";

/// A stored row together with its surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRow {
    pub event_id: i64,
    #[serde(flatten)]
    pub event: StoredEvent,
}

#[derive(Clone)]
pub struct SqliteEventStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEventStore {
    /// Opens (or creates) the database file and ensures the `events` table exists.
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database with the schema applied.
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wraps an existing connection without touching its schema.
    pub fn from_existing(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn from_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self::from_existing(conn))
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
            let guard = conn
                .lock()
                .map_err(|e| format!("sqlite connection mutex poisoned: {e}"))?;
            Ok(f(&guard)?)
        })
        .await?
    }

    pub async fn table_exists(&self) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='events')",
                [],
                |row| row.get(0),
            )
        })
        .await
    }

    pub async fn count_events(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get::<_, i64>(0))
        })
        .await
        .map(|n| n.max(0) as u64)
    }

    /// The first row of the table, if any.
    pub async fn sample_event(&self) -> Result<Option<EventRow>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM events LIMIT 1", [], event_from_row)
                .optional()
        })
        .await
    }

    /// All rows in insertion order.
    pub async fn all_events(&self) -> Result<Vec<EventRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM events ORDER BY event_id")?;
            let rows = stmt.query_map([], event_from_row)?;
            rows.collect()
        })
        .await
    }
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        event_id: row.get("event_id")?,
        event: StoredEvent {
            subject: row.get("subject")?,
            web_link: row.get("web_link")?,
            location: row.get("location")?,
            start_datetime: row.get("start_datetime")?,
            end_datetime: row.get("end_datetime")?,
            formatteddatetime: row.get("formatteddatetime")?,
            description: row.get("description")?,
            event_template: row.get("event_template")?,
            event_type: row.get("event_type")?,
            parentevent: row.get("parentevent")?,
            primaryeventtype: row.get("primaryeventtype")?,
            cost: row.get("cost")?,
            eventimage: row.get("eventimage")?,
            age: row.get("age")?,
            bookings: row.get("bookings")?,
            bookingsrequired: row.get("bookingsrequired")?,
            agerange: row.get("agerange")?,
            venue: row.get("venue")?,
            venueaddress: row.get("venueaddress")?,
            venuetype: row.get("venuetype")?,
            maximumparticipantcapacity: row.get("maximumparticipantcapacity")?,
            activitytype: row.get("activitytype")?,
            requirements: row.get("requirements")?,
            meetingpoint: row.get("meetingpoint")?,
            suburb: row.get("suburb")?,
            ward: row.get("ward")?,
            waterwayaccessfacilities: row.get("waterwayaccessfacilities")?,
            waterwayaccessinformation: row.get("waterwayaccessinformation")?,
            status: row.get("status")?,
            libraryeventtypes: row.get("libraryeventtypes")?,
            eventtype: row.get("eventtype")?,
            communityhall: row.get("communityhall")?,
            locationifvenueunavailable: row.get("locationifvenueunavailable")?,
            image: row.get("image")?,
            externaleventid: row.get("externaleventid")?,
            slug: row.get::<_, Option<String>>("slug")?.unwrap_or_default(),
        },
    })
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn latest_start_datetime(&self) -> Result<Option<String>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT start_datetime FROM events ORDER BY event_id DESC LIMIT 1",
                [],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .map(Option::flatten)
        })
        .await
    }

    async fn count_by_natural_key(
        &self,
        key: &NaturalKey,
        matching: KeyMatching,
    ) -> Result<u64, StoreError> {
        let sql = match matching {
            KeyMatching::NullSafe => COUNT_NULL_SAFE_SQL,
            KeyMatching::Strict => COUNT_STRICT_SQL,
        };
        let key = key.clone();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(sql)?;
            stmt.query_row(
                params![key.subject, key.location, key.start_datetime],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|n| n.max(0) as u64)
    }

    async fn insert_event(&self, event: &StoredEvent) -> Result<(), StoreError> {
        let e = event.clone();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(INSERT_SQL)?;
            stmt.execute(params![
                e.subject,
                e.web_link,
                e.location,
                e.start_datetime,
                e.end_datetime,
                e.formatteddatetime,
                e.description,
                e.event_template,
                e.event_type,
                e.parentevent,
                e.primaryeventtype,
                e.cost,
                e.eventimage,
                e.age,
                e.bookings,
                e.bookingsrequired,
                e.agerange,
                e.venue,
                e.venueaddress,
                e.venuetype,
                e.maximumparticipantcapacity,
                e.activitytype,
                e.requirements,
                e.meetingpoint,
                e.suburb,
                e.ward,
                e.waterwayaccessfacilities,
                e.waterwayaccessinformation,
                e.status,
                e.libraryeventtypes,
                e.eventtype,
                e.communityhall,
                e.locationifvenueunavailable,
                e.image,
                e.externaleventid,
                e.slug,
            ])?;
            Ok(())
        })
        .await
    }
}
