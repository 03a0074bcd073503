//! SQLite-based habit and check-in storage.
//!
//! Provides persistent storage for:
//! - Habit definitions, per user
//! - Daily check-ins, one per habit and date
//!
//! Each `Database` owns a single connection. Open one per thread; writers
//! on other connections are serialized by SQLite's write lock, which
//! [`CheckinRepository::atomically`] takes up front.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use super::data_dir;
use super::migrations;
use super::repository::CheckinRepository;
use crate::error::{CoreError, DatabaseError, Result};
use crate::habit::{Cadence, Channel, Checkin, Difficulty, Habit, NewCheckin, NewHabit, DATE_FORMAT};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const HABIT_COLUMNS: &str = "id, user_id, title, cadence, difficulty, anchor, micro_habit,
     is_active, sort_order, created_at, updated_at";

const CHECKIN_COLUMNS: &str =
    "id, habit_id, date, completed, used_insurance, note, channel, created_at";

// === Helper Functions ===

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date_column(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Build a Habit from a database row
fn row_to_habit(row: &rusqlite::Row) -> rusqlite::Result<Habit> {
    let cadence: String = row.get(3)?;
    let difficulty: i64 = row.get(4)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Habit {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        cadence: Cadence::parse(&cadence).unwrap_or_default(),
        difficulty: Difficulty::new(difficulty).unwrap_or_default(),
        anchor: row.get(5)?,
        micro_habit: row.get(6)?,
        is_active: row.get(7)?,
        order: row.get(8)?,
        created_at: parse_datetime_fallback(&created_at),
        updated_at: parse_datetime_fallback(&updated_at),
    })
}

/// Build a Checkin from a database row
fn row_to_checkin(row: &rusqlite::Row) -> rusqlite::Result<Checkin> {
    let date: String = row.get(2)?;
    let channel: String = row.get(6)?;
    let created_at: String = row.get(7)?;

    Ok(Checkin {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        date: parse_date_column(2, &date)?,
        completed: row.get(3)?,
        used_insurance: row.get(4)?,
        note: row.get(5)?,
        channel: Channel::parse(&channel).unwrap_or_default(),
        created_at: parse_datetime_fallback(&created_at),
    })
}

/// SQLite database for habits and check-ins.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/quanta.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(data_dir()?.join("quanta.db"))
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self::init(conn)?;
        debug!(path = %path.display(), "habit database opened");
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // === Habits ===

    /// Create a habit after validating its input.
    pub fn create_habit(&self, new: &NewHabit) -> Result<Habit> {
        new.validate()?;

        let now = Utc::now();
        let habit = Habit {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id.trim().to_string(),
            title: new.title.trim().to_string(),
            cadence: new.cadence,
            difficulty: new.difficulty,
            anchor: new.anchor.clone(),
            micro_habit: new.micro_habit.clone(),
            is_active: true,
            order: new.order,
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO habits (id, user_id, title, cadence, difficulty, anchor, micro_habit,
                                 is_active, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                habit.id,
                habit.user_id,
                habit.title,
                habit.cadence.as_str(),
                i64::from(habit.difficulty),
                habit.anchor,
                habit.micro_habit,
                habit.is_active,
                habit.order,
                habit.created_at.to_rfc3339(),
                habit.updated_at.to_rfc3339(),
            ],
        )?;

        debug!(habit_id = %habit.id, user_id = %habit.user_id, "habit created");
        Ok(habit)
    }

    /// Distinct owners of active habits.
    pub fn list_user_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT user_id FROM habits WHERE is_active = 1 ORDER BY user_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    /// Activate or deactivate a habit. Deactivated habits keep their history.
    pub fn set_habit_active(&self, habit_id: &str, active: bool) -> Result<Habit> {
        let changed = self.conn.execute(
            "UPDATE habits SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            params![habit_id, active, Utc::now().to_rfc3339()],
        )?;
        if changed == 0 {
            return Err(CoreError::habit_not_found(habit_id));
        }
        self.get_habit(habit_id)
    }

    /// Delete a habit and, by cascade, its check-ins.
    pub fn delete_habit(&self, habit_id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1", params![habit_id])?;
        if changed == 0 {
            return Err(CoreError::habit_not_found(habit_id));
        }
        debug!(habit_id, "habit deleted");
        Ok(())
    }

    fn get_checkin(&self, checkin_id: &str) -> Result<Checkin> {
        let sql = format!("SELECT {CHECKIN_COLUMNS} FROM checkins WHERE id = ?1");
        self.conn
            .query_row(&sql, params![checkin_id], row_to_checkin)
            .optional()?
            .ok_or_else(|| CoreError::checkin_not_found(checkin_id))
    }
}

impl CheckinRepository for Database {
    fn get_habit(&self, habit_id: &str) -> Result<Habit> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1");
        self.conn
            .query_row(&sql, params![habit_id], row_to_habit)
            .optional()?
            .ok_or_else(|| CoreError::habit_not_found(habit_id))
    }

    fn list_habits(&self, user_id: &str, include_inactive: bool) -> Result<Vec<Habit>> {
        let sql = format!(
            "SELECT {HABIT_COLUMNS} FROM habits
             WHERE user_id = ?1 AND (?2 OR is_active = 1)
             ORDER BY sort_order, created_at"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let habits = stmt
            .query_map(params![user_id, include_inactive], row_to_habit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(habits)
    }

    fn list_checkins(&self, habit_id: &str) -> Result<Vec<Checkin>> {
        self.get_habit(habit_id)?;

        let sql = format!(
            "SELECT {CHECKIN_COLUMNS} FROM checkins WHERE habit_id = ?1 ORDER BY date DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let checkins = stmt
            .query_map(params![habit_id], row_to_checkin)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(checkins)
    }

    fn find_checkin(&self, habit_id: &str, date: NaiveDate) -> Result<Option<Checkin>> {
        let sql = format!("SELECT {CHECKIN_COLUMNS} FROM checkins WHERE habit_id = ?1 AND date = ?2");
        let checkin = self
            .conn
            .query_row(&sql, params![habit_id, format_date(date)], row_to_checkin)
            .optional()?;
        Ok(checkin)
    }

    fn create_checkin(&self, habit_id: &str, new: &NewCheckin) -> Result<Checkin> {
        self.get_habit(habit_id)?;

        let new = new.clone().normalized();
        let checkin = Checkin {
            id: Uuid::new_v4().to_string(),
            habit_id: habit_id.to_string(),
            date: new.date,
            completed: new.completed,
            used_insurance: new.used_insurance,
            note: new.note,
            channel: new.channel,
            created_at: Utc::now(),
        };

        self.conn
            .execute(
                "INSERT INTO checkins (id, habit_id, date, completed, used_insurance, note, channel, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    checkin.id,
                    checkin.habit_id,
                    format_date(checkin.date),
                    checkin.completed,
                    checkin.used_insurance,
                    checkin.note,
                    checkin.channel.as_str(),
                    checkin.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::Conflict(_) => DatabaseError::Conflict(format!(
                    "habit {habit_id} already has a check-in on {}",
                    format_date(checkin.date)
                )),
                other => other,
            })?;

        debug!(habit_id, date = %checkin.date, completed = checkin.completed, "check-in stored");
        Ok(checkin)
    }

    fn update_checkin_insurance_flag(&self, checkin_id: &str) -> Result<Checkin> {
        let changed = self.conn.execute(
            "UPDATE checkins SET used_insurance = 1 WHERE id = ?1",
            params![checkin_id],
        )?;
        if changed == 0 {
            return Err(CoreError::checkin_not_found(checkin_id));
        }
        self.get_checkin(checkin_id)
    }

    fn atomically<T, F>(&self, habit_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        // IMMEDIATE takes the write lock before the first read, so a
        // concurrent writer cannot slip between check and write.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        match f(self) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                debug!(habit_id, error = %e, "rolling back habit transaction");
                tx.rollback()?;
                Err(e)
            }
        }
    }
}
