//! Ordered-collection engine shared by project and task persistence.
//!
//! # Responsibility
//! - Assign, shift, and renumber integer `position` values within one scope
//!   (a user's projects, a project's tasks).
//! - Keep every multi-row position change atomic behind one transaction.
//!
//! # Invariants
//! - No two rows of one scope share a position at any instant visible outside
//!   an open transaction; the unique index on `(scope, position)` is checked
//!   eagerly by SQLite.
//! - Bulk shifts stage affected rows through a disjoint negative range before
//!   landing them, so per-row constraint checks cannot collide.
//! - Deletes never renumber; position gaps are legal and `list` only depends
//!   on relative order.

use crate::db::DbError;
use log::error;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use uuid::Uuid;

/// Result type used by ordering and repository operations.
pub type OrderResult<T> = Result<T, OrderError>;

/// Errors from ordered-collection and repository operations.
#[derive(Debug)]
pub enum OrderError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Referenced member does not exist in the addressed scope.
    NotFound(Uuid),
    /// Reorder id list does not exactly match current scope membership.
    ReorderMismatch {
        scope: Uuid,
    },
    /// Duplicate position surfaced by the unique index. Not reachable through
    /// correctly staged shifts; indicates an internal consistency bug.
    InvariantViolation(String),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for OrderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "ordered member not found: {id}"),
            Self::ReorderMismatch { scope } => {
                write!(f, "reorder id list does not match members of scope {scope}")
            }
            Self::InvariantViolation(message) => {
                write!(f, "duplicate position in ordered scope: {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for OrderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for OrderError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for OrderError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, Some(message)) = &value {
            if code.code == rusqlite::ErrorCode::ConstraintViolation
                && message.contains(".position")
            {
                error!("event=position_conflict module=repo status=error error={message}");
                return Self::InvariantViolation(message.clone());
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Row mapping contract for a table managed by [`OrderedCollection`].
///
/// The table must expose a `uuid TEXT PRIMARY KEY`, an `INTEGER NOT NULL`
/// `position` column, an epoch-ms `updated_at` column, and a scope column
/// named by `SCOPE_COLUMN` with an eager unique index on
/// `(SCOPE_COLUMN, position)`.
pub trait OrderedRecord: Sized {
    /// Creation payload; scope, position, and timestamps are supplied by the
    /// engine and the schema.
    type Draft;

    /// Table holding the ordered rows.
    const TABLE: &'static str;
    /// Column partitioning rows into independent ordered scopes.
    const SCOPE_COLUMN: &'static str;
    /// Payload columns bound from [`OrderedRecord::draft_values`], in order.
    const PAYLOAD_COLUMNS: &'static [&'static str];
    /// Select list shared by engine reads; must include every parsed column.
    const SELECT_COLUMNS: &'static str;

    /// Stable id of the row a draft will create.
    fn draft_id(draft: &Self::Draft) -> Uuid;
    /// Values for `PAYLOAD_COLUMNS`, in the same order.
    fn draft_values(draft: &Self::Draft) -> Vec<Value>;
    /// Converts one selected row into the read model.
    fn parse_row(row: &Row<'_>) -> OrderResult<Self>;
}

/// Where a new member should land relative to existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    /// Append after the current last member; no existing row shifts.
    End,
    /// Occupy this position and push members at or after it one slot later.
    At(i64),
}

/// Position management over one ordered table.
///
/// Holds no state besides the connection; instantiate per operation or reuse
/// freely.
pub struct OrderedCollection<'conn, R: OrderedRecord> {
    conn: &'conn Connection,
    _record: PhantomData<R>,
}

impl<'conn, R: OrderedRecord> OrderedCollection<'conn, R> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }

    /// Lists scope members by ascending position.
    ///
    /// Ties cannot occur under the uniqueness invariant; the secondary `uuid`
    /// key keeps output deterministic even over corrupt data instead of
    /// failing the read.
    pub fn list(&self, scope: Uuid) -> OrderResult<Vec<R>> {
        let sql = format!(
            "SELECT {columns} FROM {table}
             WHERE {scope_column} = ?1
             ORDER BY position ASC, uuid ASC;",
            columns = R::SELECT_COLUMNS,
            table = R::TABLE,
            scope_column = R::SCOPE_COLUMN,
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([scope.to_string()])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(R::parse_row(row)?);
        }
        Ok(members)
    }

    /// Loads one member by id regardless of scope.
    pub fn get(&self, member_id: Uuid) -> OrderResult<Option<R>> {
        let sql = format!(
            "SELECT {columns} FROM {table} WHERE uuid = ?1;",
            columns = R::SELECT_COLUMNS,
            table = R::TABLE,
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([member_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(R::parse_row(row)?));
        }
        Ok(None)
    }

    /// Inserts a new member after the current last one.
    ///
    /// The max-position read and the insert share one immediate transaction,
    /// so two concurrent appends cannot compute the same next position.
    pub fn append(&self, scope: Uuid, draft: &R::Draft) -> OrderResult<R> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let position = next_position::<R>(&tx, scope)?;
        insert_row::<R>(&tx, scope, draft, position)?;
        let member = load_required::<R>(&tx, R::draft_id(draft))?;
        tx.commit()?;
        Ok(member)
    }

    /// Inserts a new member at `target_position`, pushing members at or after
    /// it one slot later while preserving their relative order.
    ///
    /// A single-pass `position = position + 1` update can collide with a
    /// not-yet-updated sibling under the eager unique index, so affected rows
    /// are staged through a negative range first:
    /// 1. `position = -position - offset` for rows at or after the target,
    ///    with `offset` strictly above every live position, making the staged
    ///    range disjoint from all untouched rows;
    /// 2. `position = -position - (offset - 1)` for staged rows, landing each
    ///    at its original position plus one;
    /// 3. insert the new row at the now-free target.
    /// Any failure rolls the whole operation back.
    pub fn insert_at(&self, scope: Uuid, draft: &R::Draft, target_position: i64) -> OrderResult<R> {
        let target = target_position.max(0);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let offset = next_position::<R>(&tx, scope)? + 1;

        tx.execute(
            &format!(
                "UPDATE {table} SET position = -position - ?2
                 WHERE {scope_column} = ?1 AND position >= ?3;",
                table = R::TABLE,
                scope_column = R::SCOPE_COLUMN,
            ),
            params![scope.to_string(), offset, target],
        )?;
        tx.execute(
            &format!(
                "UPDATE {table} SET position = -position - ?2
                 WHERE {scope_column} = ?1 AND position < 0;",
                table = R::TABLE,
                scope_column = R::SCOPE_COLUMN,
            ),
            params![scope.to_string(), offset - 1],
        )?;

        insert_row::<R>(&tx, scope, draft, target)?;
        let member = load_required::<R>(&tx, R::draft_id(draft))?;
        tx.commit()?;
        Ok(member)
    }

    /// Rewrites the scope's positions to match `ordered_ids` (0-based).
    ///
    /// The id list must be the complete current membership, each id exactly
    /// once; otherwise the call fails with [`OrderError::ReorderMismatch`]
    /// before any write. Rows are staged negative before the final
    /// assignments for the same collision reason as `insert_at`.
    pub fn reorder(&self, scope: Uuid, ordered_ids: &[Uuid]) -> OrderResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = member_ids::<R>(&tx, scope)?;
        ensure_exact_membership(scope, &current, ordered_ids)?;

        let offset = next_position::<R>(&tx, scope)? + 1;
        tx.execute(
            &format!(
                "UPDATE {table} SET position = -position - ?2
                 WHERE {scope_column} = ?1;",
                table = R::TABLE,
                scope_column = R::SCOPE_COLUMN,
            ),
            params![scope.to_string(), offset],
        )?;

        for (index, id) in ordered_ids.iter().enumerate() {
            tx.execute(
                &format!(
                    "UPDATE {table}
                     SET position = ?2,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;",
                    table = R::TABLE,
                ),
                params![id.to_string(), index as i64],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Deletes one member without renumbering the survivors.
    pub fn delete(&self, member_id: Uuid) -> OrderResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {table} WHERE uuid = ?1;", table = R::TABLE),
            [member_id.to_string()],
        )?;
        if changed == 0 {
            return Err(OrderError::NotFound(member_id));
        }
        Ok(())
    }

    /// Resolves an "insert after member X" request to an insertion point.
    ///
    /// - `after = None`: append at the end.
    /// - `after` is the scope's last member: append-like, nothing shifts.
    /// - otherwise: the successor's current position, so `insert_at` lands
    ///   the new member between the two.
    pub fn insertion_position(
        &self,
        scope: Uuid,
        after: Option<Uuid>,
    ) -> OrderResult<InsertionPoint> {
        let Some(after_id) = after else {
            return Ok(InsertionPoint::End);
        };

        let anchor: Option<i64> = self
            .conn
            .query_row(
                &format!(
                    "SELECT position FROM {table}
                     WHERE uuid = ?1 AND {scope_column} = ?2;",
                    table = R::TABLE,
                    scope_column = R::SCOPE_COLUMN,
                ),
                params![after_id.to_string(), scope.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(anchor) = anchor else {
            return Err(OrderError::NotFound(after_id));
        };

        let successor: Option<i64> = self.conn.query_row(
            &format!(
                "SELECT MIN(position) FROM {table}
                 WHERE {scope_column} = ?1 AND position > ?2;",
                table = R::TABLE,
                scope_column = R::SCOPE_COLUMN,
            ),
            params![scope.to_string(), anchor],
            |row| row.get(0),
        )?;

        match successor {
            Some(position) => Ok(InsertionPoint::At(position)),
            None => Ok(InsertionPoint::End),
        }
    }
}

fn next_position<R: OrderedRecord>(conn: &Connection, scope: Uuid) -> OrderResult<i64> {
    let next = conn.query_row(
        &format!(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM {table}
             WHERE {scope_column} = ?1;",
            table = R::TABLE,
            scope_column = R::SCOPE_COLUMN,
        ),
        [scope.to_string()],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn insert_row<R: OrderedRecord>(
    conn: &Connection,
    scope: Uuid,
    draft: &R::Draft,
    position: i64,
) -> OrderResult<()> {
    let mut columns = vec!["uuid", R::SCOPE_COLUMN];
    columns.extend_from_slice(R::PAYLOAD_COLUMNS);
    columns.push("position");
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {table} ({columns}) VALUES ({placeholders});",
        table = R::TABLE,
        columns = columns.join(", "),
    );

    let mut values: Vec<Value> = Vec::with_capacity(columns.len());
    values.push(Value::Text(R::draft_id(draft).to_string()));
    values.push(Value::Text(scope.to_string()));
    values.extend(R::draft_values(draft));
    values.push(Value::Integer(position));

    conn.execute(&sql, params_from_iter(values))?;
    Ok(())
}

fn load_required<R: OrderedRecord>(conn: &Connection, member_id: Uuid) -> OrderResult<R> {
    let sql = format!(
        "SELECT {columns} FROM {table} WHERE uuid = ?1;",
        columns = R::SELECT_COLUMNS,
        table = R::TABLE,
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([member_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return R::parse_row(row);
    }
    Err(OrderError::NotFound(member_id))
}

fn member_ids<R: OrderedRecord>(conn: &Connection, scope: Uuid) -> OrderResult<Vec<Uuid>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT uuid FROM {table}
         WHERE {scope_column} = ?1
         ORDER BY position ASC, uuid ASC;",
        table = R::TABLE,
        scope_column = R::SCOPE_COLUMN,
    ))?;
    let mut rows = stmt.query([scope.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "uuid")?);
    }
    Ok(ids)
}

fn ensure_exact_membership(scope: Uuid, current: &[Uuid], supplied: &[Uuid]) -> OrderResult<()> {
    if supplied.len() != current.len() {
        return Err(OrderError::ReorderMismatch { scope });
    }
    let mut seen = HashSet::with_capacity(supplied.len());
    for id in supplied {
        if !seen.insert(*id) {
            return Err(OrderError::ReorderMismatch { scope });
        }
    }
    for id in current {
        if !seen.contains(id) {
            return Err(OrderError::ReorderMismatch { scope });
        }
    }
    Ok(())
}

/// Parses a stored uuid column, naming the column in the error.
pub(crate) fn parse_uuid(value: &str, column: &'static str) -> OrderResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| OrderError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

/// Parses a stored 0/1 flag column.
pub(crate) fn parse_bool(value: i64, column: &'static str) -> OrderResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(OrderError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::ensure_exact_membership;
    use uuid::Uuid;

    #[test]
    fn membership_check_accepts_permutations() {
        let scope = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        ensure_exact_membership(scope, &[a, b], &[b, a]).unwrap();
    }

    #[test]
    fn membership_check_rejects_duplicates_and_foreign_ids() {
        let scope = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(ensure_exact_membership(scope, &[a, b], &[a, a]).is_err());
        assert!(ensure_exact_membership(scope, &[a, b], &[a, Uuid::new_v4()]).is_err());
        assert!(ensure_exact_membership(scope, &[a, b], &[a]).is_err());
    }
}
