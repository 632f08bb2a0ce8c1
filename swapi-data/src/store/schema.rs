use rusqlite::{Connection, Error as SqliteError, Transaction};
use thiserror::Error;

/// Table holding one row per enriched person.
pub const PEOPLE_TABLE: &str = "swapi_people";

/// Columns of [`PEOPLE_TABLE`] in insertion order, `id` first.
pub const PEOPLE_COLUMNS: [&str; 14] = [
    "id",
    "birth_year",
    "eye_color",
    "films",
    "gender",
    "hair_color",
    "height",
    "homeworld",
    "mass",
    "name",
    "skin_color",
    "species",
    "starships",
    "vehicles",
];

/// Drop any existing people table and create an empty one.
///
/// Both statements run in a single transaction, so a failed reset leaves the
/// previous table untouched. Loads always start from an empty table; rows
/// from earlier runs are discarded.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use swapi_data::store::reset_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// reset_schema(&mut conn).expect("create people table");
///
/// let rows: i64 = conn
///     .query_row("SELECT COUNT(*) FROM swapi_people", [], |row| row.get(0))
///     .expect("count rows");
/// assert_eq!(rows, 0);
/// ```
pub fn reset_schema(connection: &mut Connection) -> Result<(), SchemaError> {
    let transaction = connection.transaction().map_err(|source| SchemaError {
        step: "begin schema transaction",
        source,
    })?;

    run_step(
        &transaction,
        "drop swapi_people",
        "DROP TABLE IF EXISTS swapi_people",
    )?;
    run_step(
        &transaction,
        "create swapi_people",
        "CREATE TABLE swapi_people (
            id INTEGER PRIMARY KEY,
            birth_year TEXT NOT NULL,
            eye_color TEXT NOT NULL,
            films TEXT NOT NULL,
            gender TEXT NOT NULL,
            hair_color TEXT NOT NULL,
            height TEXT NOT NULL,
            homeworld TEXT NOT NULL,
            mass TEXT NOT NULL,
            name TEXT NOT NULL,
            skin_color TEXT NOT NULL,
            species TEXT NOT NULL,
            starships TEXT NOT NULL,
            vehicles TEXT NOT NULL
        )",
    )?;

    transaction.commit().map_err(|source| SchemaError {
        step: "commit schema transaction",
        source,
    })
}

fn run_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SchemaError { step, source })
}

/// Error raised when resetting the people schema.
#[derive(Debug, Error)]
#[error("failed to execute schema step '{step}'")]
pub struct SchemaError {
    /// Step that failed.
    pub step: &'static str,
    /// Source error returned by `rusqlite`.
    #[source]
    pub source: SqliteError,
}
