//! SQLite-based storage for learning units.
//!
//! Besides plain CRUD the store answers the scheduler's per-day questions
//! (how many units are due on a day, how hard they are on average), so it
//! doubles as the [`GlobalDataProvider`] for its own units.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use super::migrations;
use crate::error::{DatabaseError, ProviderError, Result};
use crate::provider::GlobalDataProvider;
use crate::scheduler::{load_coeffs, ReviewRequest, ScheduleOutcome, SsrfScheduler};
use crate::status::{schedule_with_status, LuStatus};
use crate::types::{Grade, LuState, Priority};

/// Collection used when none is given.
pub const DEFAULT_COLLECTION: &str = "default";

const UNIT_COLUMNS: &str = "id, collection, priority, num_reviews, avg_grade, difficulty, \
                            last_review, next_review, status, created_at";

/// A stored learning unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningUnit {
    pub id: String,
    pub collection: String,
    pub priority: Priority,
    #[serde(default)]
    pub status: LuStatus,
    #[serde(flatten)]
    pub state: LuState,
    pub created_at: DateTime<Utc>,
}

impl LearningUnit {
    /// A never-reviewed unit in the default collection.
    pub fn new(id: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: id.into(),
            collection: DEFAULT_COLLECTION.to_string(),
            priority,
            status: LuStatus::default(),
            state: LuState::new(),
            created_at: Utc::now().trunc_subsecs(0),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_state(mut self, state: LuState) -> Self {
        self.state = state;
        self
    }
}

/// Aggregates of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayLoad {
    pub date: NaiveDate,
    pub workload: i64,
    pub avg_difficulty: f64,
    pub load_coeff: f64,
}

// === Helper Functions ===

/// Format a timestamp for storage; whole seconds keep text comparison ordered
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_datetime(column: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| corrupt(column, value))
}

fn corrupt(column: &str, value: impl ToString) -> DatabaseError {
    DatabaseError::CorruptValue {
        column: column.to_string(),
        value: value.to_string(),
    }
}

/// Raw `learning_units` row before decoding.
struct UnitRow {
    id: String,
    collection: String,
    priority: String,
    num_reviews: i64,
    avg_grade: f64,
    difficulty: f64,
    last_review: Option<String>,
    next_review: Option<String>,
    status: String,
    created_at: String,
}

impl UnitRow {
    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            collection: row.get(1)?,
            priority: row.get(2)?,
            num_reviews: row.get(3)?,
            avg_grade: row.get(4)?,
            difficulty: row.get(5)?,
            last_review: row.get(6)?,
            next_review: row.get(7)?,
            status: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_unit(self) -> Result<LearningUnit, DatabaseError> {
        let priority = self
            .priority
            .parse::<Priority>()
            .map_err(|_| corrupt("priority", &self.priority))?;
        let status = self
            .status
            .parse::<LuStatus>()
            .map_err(|_| corrupt("status", &self.status))?;
        let num_reviews =
            u32::try_from(self.num_reviews).map_err(|_| corrupt("num_reviews", self.num_reviews))?;
        let last_review = self
            .last_review
            .as_deref()
            .map(|v| parse_datetime("last_review", v))
            .transpose()?;
        let next_review = self
            .next_review
            .as_deref()
            .map(|v| parse_datetime("next_review", v))
            .transpose()?;

        Ok(LearningUnit {
            id: self.id,
            collection: self.collection,
            priority,
            status,
            state: LuState {
                num_reviews,
                avg_grade: self.avg_grade,
                difficulty: self.difficulty,
                last_review,
                next_review,
            },
            created_at: parse_datetime("created_at", &self.created_at)?,
        })
    }
}

/// SQLite database of learning units.
pub struct ReviewDb {
    conn: Connection,
}

impl ReviewDb {
    /// Open the database at `path`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened review database");
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    fn unit_exists(&self, id: &str) -> Result<bool, rusqlite::Error> {
        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM learning_units WHERE id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    fn query_units(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<LearningUnit>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(args, UnitRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let units = rows
            .into_iter()
            .map(UnitRow::into_unit)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(units)
    }

    pub fn insert_unit(&self, unit: &LearningUnit) -> Result<()> {
        unit.state.validate()?;
        if self.unit_exists(&unit.id)? {
            return Err(DatabaseError::UnitExists(unit.id.clone()).into());
        }
        self.conn.execute(
            "INSERT INTO learning_units (id, collection, priority, num_reviews, avg_grade,
                                         difficulty, last_review, next_review, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                unit.id,
                unit.collection,
                unit.priority.as_str(),
                unit.state.num_reviews,
                unit.state.avg_grade,
                unit.state.difficulty,
                unit.state.last_review.map(format_datetime),
                unit.state.next_review.map(format_datetime),
                unit.status.as_str(),
                format_datetime(unit.created_at),
            ],
        )?;
        debug!(id = %unit.id, collection = %unit.collection, "inserted learning unit");
        Ok(())
    }

    pub fn get_unit(&self, id: &str) -> Result<LearningUnit> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {UNIT_COLUMNS} FROM learning_units WHERE id = ?1"),
                params![id],
                UnitRow::from_row,
            )
            .optional()?
            .ok_or_else(|| DatabaseError::UnitNotFound(id.to_string()))?;
        Ok(row.into_unit()?)
    }

    /// Units of one collection, or of all collections, oldest first.
    pub fn list_units(&self, collection: Option<&str>) -> Result<Vec<LearningUnit>> {
        self.query_units(
            &format!(
                "SELECT {UNIT_COLUMNS} FROM learning_units
                 WHERE (?1 IS NULL OR collection = ?1)
                 ORDER BY created_at, id"
            ),
            &[&collection],
        )
    }

    /// Units whose next review is at or before `at`, plus never-scheduled ones.
    pub fn list_due(&self, collection: Option<&str>, at: DateTime<Utc>) -> Result<Vec<LearningUnit>> {
        self.query_units(
            &format!(
                "SELECT {UNIT_COLUMNS} FROM learning_units
                 WHERE (?1 IS NULL OR collection = ?1)
                   AND (next_review IS NULL OR next_review <= ?2)
                 ORDER BY next_review, id"
            ),
            &[&collection, &format_datetime(at)],
        )
    }

    /// Replace the scheduling state of a unit.
    pub fn save_state(&self, id: &str, state: &LuState) -> Result<()> {
        state.validate()?;
        let updated = self.conn.execute(
            "UPDATE learning_units
             SET num_reviews = ?2, avg_grade = ?3, difficulty = ?4, last_review = ?5, next_review = ?6
             WHERE id = ?1",
            params![
                id,
                state.num_reviews,
                state.avg_grade,
                state.difficulty,
                state.last_review.map(format_datetime),
                state.next_review.map(format_datetime),
            ],
        )?;
        if updated == 0 {
            return Err(DatabaseError::UnitNotFound(id.to_string()).into());
        }
        Ok(())
    }

    pub fn set_status(&self, id: &str, status: LuStatus) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE learning_units SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        if updated == 0 {
            return Err(DatabaseError::UnitNotFound(id.to_string()).into());
        }
        Ok(())
    }

    pub fn delete_unit(&self, id: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM learning_units WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(DatabaseError::UnitNotFound(id.to_string()).into());
        }
        Ok(())
    }

    /// Grade a stored unit and persist its new state.
    ///
    /// Loading, scheduling and saving happen in one transaction; nothing is
    /// written if scheduling fails. The unit's own pending review is left out
    /// of the workload it is balanced against.
    pub fn review_unit(
        &self,
        scheduler: &SsrfScheduler,
        id: &str,
        grade: Grade,
        now: DateTime<Utc>,
        estimated: bool,
    ) -> Result<ScheduleOutcome> {
        let tx = self.conn.unchecked_transaction()?;

        let unit = self.get_unit(id)?;
        let mut request = ReviewRequest::new(grade)
            .with_state(unit.state.clone())
            .with_priority(unit.priority)
            .at(now);
        if estimated {
            request = request.estimated();
        }

        let others = OtherUnits { db: self, exclude: id };
        let outcome = schedule_with_status(
            scheduler,
            unit.status,
            &others,
            &request,
            Some(unit.collection.as_str()),
        )?;
        self.save_state(id, &outcome.state)?;
        tx.commit()?;

        info!(id, %grade, next_review = %outcome.next_review, "reviewed learning unit");
        Ok(outcome)
    }

    /// Workload, average difficulty and load coefficient of every day in
    /// `[from, to]`.
    pub fn daily_load(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        collection: Option<&str>,
    ) -> Result<Vec<DayLoad>> {
        let (workloads, avg_difficulties): (Vec<i64>, Vec<f64>) =
            self.day_aggregates(from, to, collection, None)?.into_iter().unzip();
        let coeffs = load_coeffs(&workloads, &avg_difficulties)?;

        Ok(from
            .iter_days()
            .zip(workloads.into_iter().zip(avg_difficulties))
            .zip(coeffs)
            .map(|((date, (workload, avg_difficulty)), load_coeff)| DayLoad {
                date,
                workload,
                avg_difficulty,
                load_coeff,
            })
            .collect())
    }

    /// `(workload, avg. difficulty)` per day, zero-filled, optionally without
    /// one unit.
    fn day_aggregates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        collection: Option<&str>,
        exclude: Option<&str>,
    ) -> Result<Vec<(i64, f64)>, DatabaseError> {
        if to < from {
            return Err(DatabaseError::QueryFailed(format!(
                "date range {from}..={to} is empty"
            )));
        }
        let end = to
            .succ_opt()
            .ok_or_else(|| DatabaseError::QueryFailed(format!("no day after {to}")))?;
        let mut series = vec![(0_i64, 0.0_f64); (to - from).num_days() as usize + 1];

        let mut stmt = self.conn.prepare(
            "SELECT substr(next_review, 1, 10) AS day, COUNT(*), AVG(difficulty)
             FROM learning_units
             WHERE next_review >= ?1 AND next_review < ?2
               AND (?3 IS NULL OR collection = ?3)
               AND (?4 IS NULL OR id <> ?4)
             GROUP BY day",
        )?;
        let rows = stmt.query_map(
            params![from.to_string(), end.to_string(), collection, exclude],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            },
        )?;

        for row in rows {
            let (day, workload, avg_difficulty) = row?;
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|_| corrupt("next_review", &day))?;
            if let Some(slot) = usize::try_from((date - from).num_days())
                .ok()
                .and_then(|index| series.get_mut(index))
            {
                *slot = (workload, avg_difficulty);
            }
        }
        Ok(series)
    }
}

impl GlobalDataProvider for ReviewDb {
    /// Collection name; `None` aggregates every collection
    type UserContext = str;

    fn get_workloads(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_context: Option<&str>,
    ) -> Result<Vec<i64>, ProviderError> {
        Ok(self
            .day_aggregates(from, to, user_context, None)?
            .into_iter()
            .map(|(workload, _)| workload)
            .collect())
    }

    fn get_avg_difficulties(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_context: Option<&str>,
    ) -> Result<Vec<f64>, ProviderError> {
        Ok(self
            .day_aggregates(from, to, user_context, None)?
            .into_iter()
            .map(|(_, avg_difficulty)| avg_difficulty)
            .collect())
    }
}

/// The store seen from one unit under review: every unit but that one.
struct OtherUnits<'a> {
    db: &'a ReviewDb,
    exclude: &'a str,
}

impl GlobalDataProvider for OtherUnits<'_> {
    type UserContext = str;

    fn get_workloads(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_context: Option<&str>,
    ) -> Result<Vec<i64>, ProviderError> {
        Ok(self
            .db
            .day_aggregates(from, to, user_context, Some(self.exclude))?
            .into_iter()
            .map(|(workload, _)| workload)
            .collect())
    }

    fn get_avg_difficulties(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_context: Option<&str>,
    ) -> Result<Vec<f64>, ProviderError> {
        Ok(self
            .db
            .day_aggregates(from, to, user_context, Some(self.exclude))?
            .into_iter()
            .map(|(_, avg_difficulty)| avg_difficulty)
            .collect())
    }
}
