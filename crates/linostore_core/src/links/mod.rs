//! Doublet substrate contract and shared identifier helpers.
//!
//! # Responsibility
//! - Define the `Links` primitive contract consumed by the notation layer.
//! - Define identifier constants (`NULL`, `ANY`) and raw-number encoding.
//! - Provide the SQLite-backed substrate and the balanced sequence codec.
//!
//! # Invariants
//! - `get_or_create(a, b)` is idempotent for every non-empty pair.
//! - Identifiers issued by the substrate never carry the external bit.
//! - `ANY` is only meaningful as a pattern value in `each`.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod sequence;
mod sqlite;

pub use sequence::{find_packed, pack, SequenceWalker};
pub use sqlite::SqliteLinks;

/// Opaque relation identifier issued by the substrate.
pub type LinkId = u64;

/// Reserved identifier meaning "no link".
pub const NULL: LinkId = 0;

/// Wildcard used in `Links::each` patterns.
pub const ANY: LinkId = u64::MAX;

const EXTERNAL_FLAG: u64 = 1 << 63;

/// Encodes a plain number as an external identifier.
///
/// External identifiers can be used as relation endpoints but never name a
/// stored relation, so they cannot be confused with substrate-issued ids.
pub const fn raw_number(value: u32) -> LinkId {
    EXTERNAL_FLAG | value as u64
}

/// Decodes an identifier produced by [`raw_number`].
pub fn as_raw_number(id: LinkId) -> Option<u32> {
    if id == ANY || id & EXTERNAL_FLAG == 0 {
        return None;
    }
    u32::try_from(id & !EXTERNAL_FLAG).ok()
}

/// Returns whether `id` lies in the external number space.
pub fn is_external(id: LinkId) -> bool {
    id != ANY && id & EXTERNAL_FLAG != 0
}

/// One stored relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub index: LinkId,
    pub source: LinkId,
    pub target: LinkId,
}

impl Link {
    pub fn new(index: LinkId, source: LinkId, target: LinkId) -> Self {
        Self {
            index,
            source,
            target,
        }
    }

    /// A link that refers to itself through at least one endpoint.
    ///
    /// Sequence walkers treat such links as atomic.
    pub fn is_partial_point(&self) -> bool {
        self.index == self.source || self.index == self.target
    }

    /// A link that refers to itself through both endpoints.
    pub fn is_full_point(&self) -> bool {
        self.index == self.source && self.index == self.target
    }

    /// A placeholder link produced by `Links::create`.
    pub fn is_empty(&self) -> bool {
        self.source == NULL && self.target == NULL
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}: {} {})", self.index, self.source, self.target)
    }
}

/// Visitor decision for `Links::each`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Break,
}

pub type LinksResult<T> = Result<T, LinksError>;

/// Errors raised by substrate primitives.
#[derive(Debug)]
pub enum LinksError {
    /// Underlying storage failure.
    Db(DbError),
    /// No relation is stored under this identifier.
    NotFound(LinkId),
    /// Caller passed a value the primitive cannot accept.
    InvalidArgument(String),
    /// Storage content violates substrate invariants.
    InvalidData(String),
    /// Storage schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for LinksError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "link not found: {id}"),
            Self::InvalidArgument(message) => write!(f, "invalid link argument: {message}"),
            Self::InvalidData(message) => write!(f, "invalid links data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "links storage requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for LinksError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for LinksError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LinksError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Primitive operations of a doublet substrate.
///
/// Every operation is synchronous. Implementations own their concurrency
/// discipline; callers needing check-then-act atomicity wrap the sequence in
/// [`Links::exclusive`].
pub trait Links {
    /// Creates an empty `(NULL, NULL)` link and returns its identifier.
    fn create(&self) -> LinksResult<LinkId>;
    /// Overwrites both endpoints of an existing link.
    fn update(&self, index: LinkId, source: LinkId, target: LinkId) -> LinksResult<()>;
    /// Returns the link `(source, target)`, creating it when absent.
    fn get_or_create(&self, source: LinkId, target: LinkId) -> LinksResult<LinkId>;
    /// Returns the link `(source, target)` without creating anything.
    fn find(&self, source: LinkId, target: LinkId) -> LinksResult<Option<LinkId>>;
    /// Loads one link, or `None` when `index` names no stored relation.
    fn try_get(&self, index: LinkId) -> LinksResult<Option<Link>>;
    /// Visits links matching `(source, target)` in index order; either side
    /// may be `ANY`. Returns `Flow::Break` when the visitor stopped early.
    fn each(
        &self,
        source: LinkId,
        target: LinkId,
        visitor: &mut dyn FnMut(Link) -> Flow,
    ) -> LinksResult<Flow>;
    /// Number of stored links.
    fn count(&self) -> LinksResult<u64>;
    /// Reads the format stamp of this substrate.
    fn format_tag(&self) -> LinksResult<Option<String>>;
    /// Writes the format stamp of this substrate.
    fn set_format_tag(&self, tag: &str) -> LinksResult<()>;
    /// Runs `op` as one atomic unit holding the substrate write lock.
    ///
    /// Writes made by `op` are discarded when it returns `Err`.
    fn exclusive<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<LinksError>;

    fn get(&self, index: LinkId) -> LinksResult<Link> {
        self.try_get(index)?.ok_or(LinksError::NotFound(index))
    }

    fn get_source(&self, index: LinkId) -> LinksResult<LinkId> {
        Ok(self.get(index)?.source)
    }

    fn get_target(&self, index: LinkId) -> LinksResult<LinkId> {
        Ok(self.get(index)?.target)
    }

    /// Whether `index` names a link that should be treated as atomic when
    /// walking sequences. Unknown identifiers are not partial points.
    fn is_partial_point(&self, index: LinkId) -> LinksResult<bool> {
        Ok(self
            .try_get(index)?
            .is_some_and(|link| link.is_partial_point()))
    }

    /// Collects every link matching the pattern.
    fn all(&self, source: LinkId, target: LinkId) -> LinksResult<Vec<Link>> {
        let mut links = Vec::new();
        self.each(source, target, &mut |link| {
            links.push(link);
            Flow::Continue
        })?;
        Ok(links)
    }
}
