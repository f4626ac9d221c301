//! SQLite-backed doublet substrate.
//!
//! # Responsibility
//! - Store relations in the `links` table with content-addressed lookup.
//! - Store the substrate format stamp in `substrate_meta`.
//!
//! # Invariants
//! - `(source, target)` is unique for every non-empty link.
//! - Identifiers are stored bit-preserving in SQLite's signed INTEGER.
//! - The connection must be migrated to the latest schema before use.

use super::{Flow, Link, LinkId, Links, LinksError, LinksResult, ANY, NULL};
use crate::db::migrations::latest_version;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const FORMAT_TAG_KEY: &str = "format";

/// Doublet substrate over one migrated SQLite connection.
pub struct SqliteLinks<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLinks<'conn> {
    /// Creates a substrate view over a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> LinksResult<Self> {
        ensure_links_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl Links for SqliteLinks<'_> {
    fn create(&self) -> LinksResult<LinkId> {
        self.conn
            .execute("INSERT INTO links (source, target) VALUES (0, 0);", [])?;
        Ok(from_sql_id(self.conn.last_insert_rowid()))
    }

    fn update(&self, index: LinkId, source: LinkId, target: LinkId) -> LinksResult<()> {
        ensure_storable(source)?;
        ensure_storable(target)?;
        let changed = self.conn.execute(
            "UPDATE links SET source = ?2, target = ?3 WHERE id = ?1;",
            params![to_sql_id(index), to_sql_id(source), to_sql_id(target)],
        )?;
        if changed == 0 {
            return Err(LinksError::NotFound(index));
        }
        Ok(())
    }

    fn get_or_create(&self, source: LinkId, target: LinkId) -> LinksResult<LinkId> {
        ensure_addressable_pair(source, target)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO links (source, target) VALUES (?1, ?2);",
            params![to_sql_id(source), to_sql_id(target)],
        )?;
        self.find(source, target)?.ok_or_else(|| {
            LinksError::InvalidData(format!(
                "link ({source}, {target}) missing right after insert"
            ))
        })
    }

    fn find(&self, source: LinkId, target: LinkId) -> LinksResult<Option<LinkId>> {
        ensure_addressable_pair(source, target)?;
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id
                 FROM links
                 WHERE source = ?1
                   AND target = ?2
                   AND (source <> 0 OR target <> 0);",
                params![to_sql_id(source), to_sql_id(target)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(from_sql_id))
    }

    fn try_get(&self, index: LinkId) -> LinksResult<Option<Link>> {
        if index == NULL || index == ANY {
            return Ok(None);
        }
        let link = self
            .conn
            .query_row(
                "SELECT id, source, target FROM links WHERE id = ?1;",
                [to_sql_id(index)],
                parse_link_row,
            )
            .optional()?;
        Ok(link)
    }

    fn each(
        &self,
        source: LinkId,
        target: LinkId,
        visitor: &mut dyn FnMut(Link) -> Flow,
    ) -> LinksResult<Flow> {
        let (sql, bound): (&str, Vec<i64>) = match (source == ANY, target == ANY) {
            (true, true) => ("SELECT id, source, target FROM links ORDER BY id ASC;", vec![]),
            (false, true) => (
                "SELECT id, source, target FROM links WHERE source = ?1 ORDER BY id ASC;",
                vec![to_sql_id(source)],
            ),
            (true, false) => (
                "SELECT id, source, target FROM links WHERE target = ?1 ORDER BY id ASC;",
                vec![to_sql_id(target)],
            ),
            (false, false) => (
                "SELECT id, source, target
                 FROM links
                 WHERE source = ?1 AND target = ?2
                 ORDER BY id ASC;",
                vec![to_sql_id(source), to_sql_id(target)],
            ),
        };

        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(bound))?;
        while let Some(row) = rows.next()? {
            if visitor(parse_link_row(row)?) == Flow::Break {
                return Ok(Flow::Break);
            }
        }
        Ok(Flow::Continue)
    }

    fn count(&self) -> LinksResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| LinksError::InvalidData(format!("negative link count `{count}`")))
    }

    fn format_tag(&self) -> LinksResult<Option<String>> {
        let tag = self
            .conn
            .query_row(
                "SELECT value FROM substrate_meta WHERE key = ?1;",
                [FORMAT_TAG_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(tag)
    }

    fn set_format_tag(&self, tag: &str) -> LinksResult<()> {
        self.conn.execute(
            "INSERT INTO substrate_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![FORMAT_TAG_KEY, tag],
        )?;
        Ok(())
    }

    fn exclusive<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<LinksError>,
    {
        // IMMEDIATE takes the database write lock up front, so a concurrent
        // writer blocks (up to the busy timeout) before its first read.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(LinksError::from)?;
        let value = op()?;
        tx.commit().map_err(LinksError::from)?;
        Ok(value)
    }
}

fn parse_link_row(row: &Row<'_>) -> rusqlite::Result<Link> {
    Ok(Link::new(
        from_sql_id(row.get(0)?),
        from_sql_id(row.get(1)?),
        from_sql_id(row.get(2)?),
    ))
}

fn to_sql_id(id: LinkId) -> i64 {
    id as i64
}

fn from_sql_id(value: i64) -> LinkId {
    value as LinkId
}

fn ensure_storable(id: LinkId) -> LinksResult<()> {
    if id == ANY {
        return Err(LinksError::InvalidArgument(
            "`ANY` cannot be stored as an endpoint".to_string(),
        ));
    }
    Ok(())
}

fn ensure_addressable_pair(source: LinkId, target: LinkId) -> LinksResult<()> {
    ensure_storable(source)?;
    ensure_storable(target)?;
    if source == NULL && target == NULL {
        return Err(LinksError::InvalidArgument(
            "the empty pair (0, 0) is not content-addressable".to_string(),
        ));
    }
    Ok(())
}

fn ensure_links_connection_ready(conn: &Connection) -> LinksResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(LinksError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
