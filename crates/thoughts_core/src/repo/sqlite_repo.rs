//! SQLite-backed thought storage.
//!
//! # Responsibility
//! - Map repository operations onto parameterized SQL over `thoughts` and
//!   `thought_tags`.
//! - Run every mutation inside one IMMEDIATE transaction.
//!
//! # Invariants
//! - `AUTOINCREMENT` keeps ids monotonic even after the newest row is deleted.
//! - Tags keep caller order through `thought_tags.position`.
//! - Filter/sort semantics match `ThoughtQuery::apply`; substring filters fold
//!   case through `rust_lower`, the same Unicode lowering the in-memory filter uses.

use crate::db::register_functions;
use crate::model::thought::{NewThought, Thought, ThoughtChanges, ThoughtId};
use crate::query::{SortField, ThoughtFilter, ThoughtPage, ThoughtQuery};
use crate::repo::{
    RepoError, RepoResult, StoreHealth, TagCount, ThoughtRepository, ThoughtStats,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};

const THOUGHT_SELECT_SQL: &str = "SELECT
    id,
    text,
    author,
    created_at,
    updated_at
FROM thoughts";

/// Relational repository over a migrated connection.
pub struct SqliteThoughtRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteThoughtRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        register_functions(conn)?;
        Ok(Self { conn })
    }
}

impl ThoughtRepository for SqliteThoughtRepository<'_> {
    fn create(&mut self, draft: &NewThought, now: i64) -> RepoResult<Thought> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = insert_thought(&tx, draft, now)?;
        tx.commit()?;
        Ok(created)
    }

    fn create_bulk(&mut self, drafts: &[NewThought], now: i64) -> RepoResult<Vec<Thought>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(insert_thought(&tx, draft, now)?);
        }
        tx.commit()?;
        Ok(created)
    }

    fn get_by_id(&self, id: ThoughtId) -> RepoResult<Option<Thought>> {
        load_thought(&*self.conn, id)
    }

    fn list(&self, query: &ThoughtQuery) -> RepoResult<ThoughtPage> {
        let (where_sql, mut bind_values) = filter_clause(&query.filter);
        let total = count_where(&*self.conn, &where_sql, bind_values.clone())?;

        let mut sql = format!("{THOUGHT_SELECT_SQL}{where_sql}");
        let direction = query.order.as_sql();
        match query.sort {
            SortField::Id => sql.push_str(&format!(" ORDER BY id {direction}")),
            other => sql.push_str(&format!(
                " ORDER BY {} {direction}, id ASC",
                other.as_str()
            )),
        }

        match query.limit {
            Some(limit) => {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(to_sql_int(limit)));
            }
            None => sql.push_str(" LIMIT -1"),
        }
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(to_sql_int(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_thought_row(&*self.conn, row)?);
        }

        Ok(ThoughtPage { items, total })
    }

    fn update(
        &mut self,
        id: ThoughtId,
        changes: &ThoughtChanges,
        now: i64,
    ) -> RepoResult<Thought> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut thought = load_thought(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        thought.apply(changes, now);

        tx.execute(
            "UPDATE thoughts
             SET
                text = ?2,
                author = ?3,
                updated_at = ?4
             WHERE id = ?1;",
            params![id, thought.text, thought.author, thought.updated_at],
        )?;
        if changes.tags.is_some() {
            replace_tags(&tx, id, &thought.tags)?;
        }

        tx.commit()?;
        Ok(thought)
    }

    fn delete(&mut self, id: ThoughtId) -> RepoResult<Thought> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let thought = load_thought(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        delete_row(&tx, id)?;
        tx.commit()?;
        Ok(thought)
    }

    fn count(&self, filter: &ThoughtFilter) -> RepoResult<usize> {
        let (where_sql, bind_values) = filter_clause(filter);
        count_where(&*self.conn, &where_sql, bind_values)
    }

    fn delete_by_tag(&mut self, tag: &str) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let ids = {
            let mut stmt = tx.prepare(
                "SELECT DISTINCT thought_id
                 FROM thought_tags
                 WHERE tag = ?1
                 ORDER BY thought_id ASC;",
            )?;
            let mut rows = stmt.query([tag])?;
            let mut ids = Vec::new();
            while let Some(row) = rows.next()? {
                ids.push(row.get::<_, ThoughtId>(0)?);
            }
            ids
        };

        for id in &ids {
            delete_row(&tx, *id)?;
        }
        tx.commit()?;
        Ok(ids.len())
    }

    fn stats(&self) -> RepoResult<ThoughtStats> {
        let (total, unique_authors, latest): (i64, i64, Option<i64>) = self.conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT author), MAX(created_at) FROM thoughts;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT tag, COUNT(DISTINCT thought_id)
             FROM thought_tags
             GROUP BY tag;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tag_counts = Vec::new();
        while let Some(row) = rows.next()? {
            tag_counts.push(TagCount {
                tag: row.get(0)?,
                count: to_count(row.get(1)?)?,
            });
        }

        Ok(ThoughtStats::new(
            to_count(total)?,
            to_count(unique_authors)?,
            tag_counts,
            latest,
        ))
    }

    fn health(&self) -> RepoResult<StoreHealth> {
        let version: String = self
            .conn
            .query_row("SELECT sqlite_version();", [], |row| row.get(0))
            .map_err(|err| RepoError::Connection(err.to_string()))?;
        Ok(StoreHealth {
            backend: "sqlite",
            version,
        })
    }
}

fn insert_thought(conn: &Connection, draft: &NewThought, now: i64) -> RepoResult<Thought> {
    conn.execute(
        "INSERT INTO thoughts (text, author, created_at, updated_at)
         VALUES (?1, ?2, ?3, NULL);",
        params![draft.text, draft.author, now],
    )?;
    let id = conn.last_insert_rowid();
    replace_tags(conn, id, &draft.tags)?;

    Ok(Thought {
        id,
        text: draft.text.clone(),
        tags: draft.tags.clone(),
        author: draft.author.clone(),
        created_at: now,
        updated_at: None,
    })
}

fn replace_tags(conn: &Connection, id: ThoughtId, tags: &[String]) -> RepoResult<()> {
    conn.execute("DELETE FROM thought_tags WHERE thought_id = ?1;", [id])?;
    for (position, tag) in tags.iter().enumerate() {
        conn.execute(
            "INSERT INTO thought_tags (thought_id, position, tag) VALUES (?1, ?2, ?3);",
            params![id, to_sql_int(position), tag],
        )?;
    }
    Ok(())
}

fn delete_row(conn: &Connection, id: ThoughtId) -> RepoResult<()> {
    // Explicit so the delete holds even on connections opened without foreign keys.
    conn.execute("DELETE FROM thought_tags WHERE thought_id = ?1;", [id])?;
    let changed = conn.execute("DELETE FROM thoughts WHERE id = ?1;", [id])?;
    if changed == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}

fn load_thought(conn: &Connection, id: ThoughtId) -> RepoResult<Option<Thought>> {
    let mut stmt = conn.prepare(&format!("{THOUGHT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_thought_row(conn, row)?));
    }
    Ok(None)
}

fn parse_thought_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Thought> {
    let id: ThoughtId = row.get("id")?;
    Ok(Thought {
        id,
        text: row.get("text")?,
        tags: load_tags(conn, id)?,
        author: row.get("author")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_tags(conn: &Connection, id: ThoughtId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tag
         FROM thought_tags
         WHERE thought_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

/// Translates a filter into a ` WHERE ...` suffix plus bind values.
fn filter_clause(filter: &ThoughtFilter) -> (String, Vec<Value>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut bind_values = Vec::new();

    if let Some(tag) = filter.tag.as_ref() {
        conditions.push(
            "EXISTS (
                SELECT 1
                FROM thought_tags tt
                WHERE tt.thought_id = thoughts.id
                  AND tt.tag = ?
            )",
        );
        bind_values.push(Value::Text(tag.clone()));
    }
    if let Some(author) = filter.author.as_ref() {
        conditions.push("instr(rust_lower(author), rust_lower(?)) > 0");
        bind_values.push(Value::Text(author.clone()));
    }
    if let Some(min_tags) = filter.min_tags {
        conditions.push(
            "(SELECT COUNT(*) FROM thought_tags tt WHERE tt.thought_id = thoughts.id) >= ?",
        );
        bind_values.push(Value::Integer(to_sql_int(min_tags)));
    }
    if let Some(text) = filter.text.as_ref() {
        conditions.push("instr(rust_lower(text), rust_lower(?)) > 0");
        bind_values.push(Value::Text(text.clone()));
    }

    if conditions.is_empty() {
        (String::new(), bind_values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), bind_values)
    }
}

fn count_where(conn: &Connection, where_sql: &str, bind_values: Vec<Value>) -> RepoResult<usize> {
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM thoughts{where_sql};"),
        params_from_iter(bind_values),
        |row| row.get(0),
    )?;
    to_count(total)
}

fn to_count(value: i64) -> RepoResult<usize> {
    usize::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative count `{value}` from storage")))
}

fn to_sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in ["thoughts", "thought_tags"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
