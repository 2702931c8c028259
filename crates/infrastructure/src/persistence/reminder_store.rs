//! SQLite-based reminder persistence
//!
//! Implements the reminder store port. Rows keep the wire encoding
//! (contacts/alerts as JSON text, booleans as 0/1, instants as RFC 3339
//! UTC strings with a trailing `Z`); the row transformation below is the
//! only place those strings become typed values.

use std::sync::Arc;

use application::ApplicationError;
use application::ports::ReminderStorePort;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use domain::entities::{NewReminder, Reminder, ReminderPatch};
use domain::value_objects::{Alert, Contact, ReminderId};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use tokio::task;
use tracing::{debug, instrument};

use super::connection::ConnectionPool;

const REMINDER_COLUMNS: &str = "id, title, description, date, location, contacts, alerts,
    is_recurring, recurrence, start_date, end_date, last_alert_time, is_active";

/// SQLite-based reminder store
#[derive(Debug, Clone)]
pub struct SqliteReminderStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteReminderStore {
    /// Create a new SQLite reminder store
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Quick connectivity probe for readiness checks
    pub async fn ping(&self) -> Result<(), ApplicationError> {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get().map_err(ApplicationError::storage)?;
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(ApplicationError::storage)
        })
        .await
        .map_err(ApplicationError::storage)?
    }
}

#[async_trait]
impl ReminderStorePort for SqliteReminderStore {
    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Reminder>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get().map_err(ApplicationError::storage)?;
            query_reminders(&conn, &format!("SELECT {REMINDER_COLUMNS} FROM reminders ORDER BY id"))
        })
        .await
        .map_err(ApplicationError::storage)?
    }

    #[instrument(skip(self))]
    async fn find_active(&self) -> Result<Vec<Reminder>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get().map_err(ApplicationError::storage)?;
            let reminders = query_reminders(
                &conn,
                &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE is_active = 1 ORDER BY id"),
            )?;
            debug!(count = reminders.len(), "Fetched active reminders");
            Ok(reminders)
        })
        .await
        .map_err(ApplicationError::storage)?
    }

    #[instrument(skip(self), fields(reminder_id = %id))]
    async fn find_by_id(&self, id: ReminderId) -> Result<Option<Reminder>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get().map_err(ApplicationError::storage)?;
            let result = conn
                .query_row(
                    &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?1"),
                    [id.value()],
                    row_to_reminder,
                )
                .optional()
                .map_err(ApplicationError::storage)?;
            Ok(result)
        })
        .await
        .map_err(ApplicationError::storage)?
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    async fn create(&self, input: NewReminder) -> Result<ReminderId, ApplicationError> {
        input.validate()?;

        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get().map_err(ApplicationError::storage)?;
            conn.execute(
                "INSERT INTO reminders (
                    title, description, date, location, contacts, alerts,
                    is_recurring, recurrence, start_date, end_date,
                    last_alert_time, is_active
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, 1)",
                params![
                    input.title,
                    input.description,
                    encode_instant(input.date),
                    input.location,
                    encode_contacts(&input.contacts)?,
                    encode_alerts(&input.alerts)?,
                    i64::from(input.is_recurring),
                    input.recurrence,
                    input.start_date.map(encode_instant),
                    input.end_date.map(encode_instant),
                ],
            )
            .map_err(ApplicationError::storage)?;

            let id = ReminderId::new(conn.last_insert_rowid());
            debug!(reminder_id = %id, "Created reminder");
            Ok(id)
        })
        .await
        .map_err(ApplicationError::storage)?
    }

    #[instrument(skip(self, patch), fields(reminder_id = %id))]
    async fn update(
        &self,
        id: ReminderId,
        patch: ReminderPatch,
    ) -> Result<bool, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get().map_err(ApplicationError::storage)?;

            let existing = conn
                .query_row(
                    &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?1"),
                    [id.value()],
                    row_to_reminder,
                )
                .optional()
                .map_err(ApplicationError::storage)?;

            let Some(mut reminder) = existing else {
                return Ok(false);
            };

            patch.apply(&mut reminder);
            reminder.validate()?;
            write_reminder(&conn, &reminder)?;

            debug!("Updated reminder");
            Ok(true)
        })
        .await
        .map_err(ApplicationError::storage)?
    }

    #[instrument(skip(self), fields(reminder_id = %id))]
    async fn delete(&self, id: ReminderId) -> Result<bool, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get().map_err(ApplicationError::storage)?;
            let deleted = conn
                .execute("DELETE FROM reminders WHERE id = ?1", [id.value()])
                .map_err(ApplicationError::storage)?;
            debug!(deleted, "Deleted reminder");
            Ok(deleted > 0)
        })
        .await
        .map_err(ApplicationError::storage)?
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_bulk(&self, ids: &[ReminderId]) -> Result<u64, ApplicationError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get().map_err(ApplicationError::storage)?;
            let placeholders = (1..=ids.len())
                .map(|n| format!("?{n}"))
                .collect::<Vec<_>>()
                .join(", ");
            let params_refs: Vec<&dyn rusqlite::types::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();

            let deleted = conn
                .execute(
                    &format!("DELETE FROM reminders WHERE id IN ({placeholders})"),
                    params_refs.as_slice(),
                )
                .map_err(ApplicationError::storage)?;

            debug!(deleted, "Bulk deleted reminders");
            Ok(deleted as u64)
        })
        .await
        .map_err(ApplicationError::storage)?
    }

    #[instrument(skip(self), fields(reminder_id = %id))]
    async fn deactivate(&self, id: ReminderId) -> Result<(), ApplicationError> {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get().map_err(ApplicationError::storage)?;
            conn.execute(
                "UPDATE reminders SET is_active = 0 WHERE id = ?1",
                [id.value()],
            )
            .map_err(ApplicationError::storage)?;
            debug!("Deactivated reminder");
            Ok(())
        })
        .await
        .map_err(ApplicationError::storage)?
    }

    #[instrument(skip(self), fields(reminder_id = %id))]
    async fn set_last_alert_time(
        &self,
        id: ReminderId,
        instant: DateTime<Utc>,
    ) -> Result<(), ApplicationError> {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get().map_err(ApplicationError::storage)?;
            conn.execute(
                "UPDATE reminders SET last_alert_time = ?1 WHERE id = ?2",
                params![encode_instant(instant), id.value()],
            )
            .map_err(ApplicationError::storage)?;
            debug!("Recorded last alert time");
            Ok(())
        })
        .await
        .map_err(ApplicationError::storage)?
    }
}

/// Write every mutable column of a reminder back to its row
fn write_reminder(conn: &Connection, reminder: &Reminder) -> Result<(), ApplicationError> {
    conn.execute(
        "UPDATE reminders SET
            title = ?1, description = ?2, date = ?3, location = ?4,
            contacts = ?5, alerts = ?6, is_recurring = ?7, recurrence = ?8,
            start_date = ?9, end_date = ?10, last_alert_time = ?11,
            is_active = ?12
         WHERE id = ?13",
        params![
            reminder.title,
            reminder.description,
            encode_instant(reminder.date),
            reminder.location,
            encode_contacts(&reminder.contacts)?,
            encode_alerts(&reminder.alerts)?,
            i64::from(reminder.is_recurring),
            reminder.recurrence,
            reminder.start_date.map(encode_instant),
            reminder.end_date.map(encode_instant),
            reminder.last_alert_time.map(encode_instant),
            i64::from(reminder.is_active),
            reminder.id.value(),
        ],
    )
    .map_err(ApplicationError::storage)?;
    Ok(())
}

fn query_reminders(conn: &Connection, sql: &str) -> Result<Vec<Reminder>, ApplicationError> {
    let mut stmt = conn.prepare(sql).map_err(ApplicationError::storage)?;
    let reminders = stmt
        .query_map([], row_to_reminder)
        .map_err(ApplicationError::storage)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApplicationError::storage)?;
    Ok(reminders)
}

/// Convert a database row into the in-memory reminder representation
fn row_to_reminder(row: &Row<'_>) -> rusqlite::Result<Reminder> {
    let id: i64 = row.get(0)?;
    let title: String = row.get(1)?;
    let description: String = row.get(2)?;
    let date_str: String = row.get(3)?;
    let location: Option<String> = row.get(4)?;
    let contacts_json: String = row.get(5)?;
    let alerts_json: String = row.get(6)?;
    let is_recurring: i64 = row.get(7)?;
    let recurrence: Option<String> = row.get(8)?;
    let start_date_str: Option<String> = row.get(9)?;
    let end_date_str: Option<String> = row.get(10)?;
    let last_alert_time_str: Option<String> = row.get(11)?;
    let is_active: i64 = row.get(12)?;

    let contacts: Vec<Contact> = decode_json(5, &contacts_json)?;
    let alerts: Vec<Alert> = decode_json(6, &alerts_json)?;

    Ok(Reminder {
        id: ReminderId::new(id),
        title,
        description,
        date: decode_instant(3, &date_str)?,
        location,
        contacts,
        alerts,
        is_recurring: is_recurring != 0,
        recurrence,
        start_date: decode_optional_instant(9, start_date_str)?,
        end_date: decode_optional_instant(10, end_date_str)?,
        last_alert_time: decode_optional_instant(11, last_alert_time_str)?,
        is_active: is_active != 0,
    })
}

fn encode_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_instant(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn decode_optional_instant(
    column: usize,
    value: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|s| decode_instant(column, &s)).transpose()
}

fn decode_json<T: serde::de::DeserializeOwned>(column: usize, json: &str) -> rusqlite::Result<T> {
    serde_json::from_str(json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn encode_contacts(contacts: &[Contact]) -> Result<String, ApplicationError> {
    serde_json::to_string(contacts).map_err(ApplicationError::storage)
}

fn encode_alerts(alerts: &[Alert]) -> Result<String, ApplicationError> {
    serde_json::to_string(alerts).map_err(ApplicationError::storage)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
