//! Transactional writes of enriched people and the SQLite-backed sink.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use log::debug;
use rusqlite::{Connection, Error as SqliteError, Row, Transaction, params};
use swapi_core::{Person, PersonId, PersonSink};
use thiserror::Error;

use super::schema::{SchemaError, reset_schema};

/// Errors raised when persisting people to SQLite.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Failed to create the parent directory for the database file.
    #[error("failed to create parent directory {path:?}")]
    CreateDirectory {
        /// Path of the directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Resetting the people table failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Beginning the transaction failed.
    #[error("failed to begin people persistence transaction")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Preparing the insert statement failed.
    #[error("failed to prepare people insert statement")]
    PrepareInsert {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Writing a person row failed, for example on a duplicate id.
    #[error("failed to persist person {id}")]
    PersistRow {
        /// Identifier of the person being persisted.
        id: PersonId,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing the transaction failed.
    #[error("failed to commit people persistence transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Reading rows back failed.
    #[error("failed to {operation}")]
    Query {
        /// Read that failed.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A stored row carried an identifier that is not a valid person id.
    #[error("stored person id {value} is not a positive 32-bit integer")]
    InvalidStoredId {
        /// Value found in the `id` column.
        value: i64,
    },
    /// `COUNT(*)` returned a value that does not fit a `usize`.
    #[error("row count {value} is out of range")]
    InvalidCount {
        /// Value returned by the query.
        value: i64,
    },
}

/// Insert `people` into the people table inside a single transaction.
///
/// Rows are inserted with a plain `INSERT`: an identifier that already exists
/// is a constraint violation and rolls back the whole batch. An empty slice
/// commits nothing and returns `Ok(0)`.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use swapi_data::store::{persist_people, reset_schema};
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// reset_schema(&mut conn).expect("create people table");
/// assert_eq!(persist_people(&mut conn, &[]).expect("nothing to write"), 0);
/// ```
pub fn persist_people(connection: &mut Connection, people: &[Person]) -> Result<usize, PersistError> {
    if people.is_empty() {
        return Ok(0);
    }

    let transaction = connection
        .transaction()
        .map_err(|source| PersistError::BeginTransaction { source })?;
    insert_rows(&transaction, people)?;
    transaction
        .commit()
        .map_err(|source| PersistError::Commit { source })?;

    debug!("persisted {} people", people.len());
    Ok(people.len())
}

fn insert_rows(transaction: &Transaction<'_>, people: &[Person]) -> Result<(), PersistError> {
    let mut statement = transaction
        .prepare_cached(
            "INSERT INTO swapi_people (
                id, birth_year, eye_color, films, gender, hair_color, height,
                homeworld, mass, name, skin_color, species, starships, vehicles
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .map_err(|source| PersistError::PrepareInsert { source })?;

    for person in people {
        statement
            .execute(params![
                person.id.get(),
                person.birth_year,
                person.eye_color,
                person.films,
                person.gender,
                person.hair_color,
                person.height,
                person.homeworld,
                person.mass,
                person.name,
                person.skin_color,
                person.species,
                person.starships,
                person.vehicles,
            ])
            .map_err(|source| PersistError::PersistRow {
                id: person.id,
                source,
            })?;
    }
    Ok(())
}

/// SQLite database file used as the loader's [`PersonSink`].
///
/// The store only remembers its path. Every call to
/// [`PersonSink::insert_people`] opens its own connection, so concurrent
/// dispatch tasks never share a session.
#[derive(Debug, Clone)]
pub struct SqlitePersonStore {
    path: Utf8PathBuf,
}

impl SqlitePersonStore {
    /// Prepare the database at `path` for a fresh load.
    ///
    /// Missing parent directories are created and the people table is
    /// dropped and recreated.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8PathBuf;
    /// use swapi_data::store::SqlitePersonStore;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let dir = tempfile::tempdir()?;
    /// let path = Utf8PathBuf::from_path_buf(dir.path().join("nested/swapi.db"))
    ///     .map_err(|_| "temporary path is not UTF-8")?;
    /// let store = SqlitePersonStore::open(&path)?;
    /// assert_eq!(store.count_people()?, 0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Utf8Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        let mut connection = open_connection(path)?;
        reset_schema(&mut connection)?;
        debug!("reset people table in {path}");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Number of rows currently stored.
    pub fn count_people(&self) -> Result<usize, PersistError> {
        let connection = open_connection(&self.path)?;
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM swapi_people", [], |row| row.get(0))
            .map_err(|source| PersistError::Query {
                operation: "count people",
                source,
            })?;
        checked_count(count)
    }

    /// Read every stored person, ordered by identifier.
    pub fn load_people(&self) -> Result<Vec<Person>, PersistError> {
        let connection = open_connection(&self.path)?;
        let mut statement = connection
            .prepare(
                "SELECT id, birth_year, eye_color, films, gender, hair_color, height,
                    homeworld, mass, name, skin_color, species, starships, vehicles
                FROM swapi_people ORDER BY id",
            )
            .map_err(|source| PersistError::Query {
                operation: "prepare people query",
                source,
            })?;
        let rows = statement
            .query_map([], read_row)
            .map_err(|source| PersistError::Query {
                operation: "query people",
                source,
            })?;

        let mut people = Vec::new();
        for row in rows {
            let person = row.map_err(|source| match source {
                SqliteError::IntegralValueOutOfRange(0, value) => {
                    PersistError::InvalidStoredId { value }
                }
                source => PersistError::Query {
                    operation: "read person row",
                    source,
                },
            })?;
            people.push(person);
        }
        Ok(people)
    }
}

impl PersonSink for SqlitePersonStore {
    type Error = PersistError;

    fn insert_people(&self, people: &[Person]) -> Result<usize, Self::Error> {
        let mut connection = open_connection(&self.path)?;
        persist_people(&mut connection, people)
    }
}

pub(super) fn checked_count(count: i64) -> Result<usize, PersistError> {
    usize::try_from(count).map_err(|_| PersistError::InvalidCount { value: count })
}

/// Decode a row; an id outside `1..=u32::MAX` fails on column 0.
fn read_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    let raw_id: i64 = row.get(0)?;
    let id = u32::try_from(raw_id)
        .ok()
        .and_then(|value| PersonId::new(value).ok())
        .ok_or(SqliteError::IntegralValueOutOfRange(0, raw_id))?;
    Ok(Person {
        id,
        birth_year: row.get(1)?,
        eye_color: row.get(2)?,
        films: row.get(3)?,
        gender: row.get(4)?,
        hair_color: row.get(5)?,
        height: row.get(6)?,
        homeworld: row.get(7)?,
        mass: row.get(8)?,
        name: row.get(9)?,
        skin_color: row.get(10)?,
        species: row.get(11)?,
        starships: row.get(12)?,
        vehicles: row.get(13)?,
    })
}

fn open_connection(path: &Utf8Path) -> Result<Connection, PersistError> {
    Connection::open(path.as_std_path()).map_err(|source| PersistError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent_dir(path: &Utf8Path) -> Result<(), PersistError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base, relative) = if parent.is_absolute() {
        ("/", parent.strip_prefix("/").unwrap_or(parent))
    } else {
        (".", parent)
    };
    let create = |source| PersistError::CreateDirectory {
        path: parent.to_path_buf(),
        source,
    };
    let dir = fs_utf8::Dir::open_ambient_dir(base, ambient_authority()).map_err(create)?;
    dir.create_dir_all(relative).map_err(create)
}
