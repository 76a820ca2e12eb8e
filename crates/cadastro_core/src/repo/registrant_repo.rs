//! Registrant repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the legacy `CADASTRO` table.
//! - Hydrate registrants with their `REGIAO`/`TERMO` lookups.
//! - Classify storage failures into caller-actionable kinds.
//!
//! # Invariants
//! - Every operation acquires one connection and releases it before returning.
//! - All values are bound parameters; table names are compile-time constants.
//! - Write paths store draft fields verbatim; only schema constraints reject them.
//! - Failures are logged once at the operation boundary, then propagated.

use crate::db::migrations::{current_version, latest_version};
use crate::db::{ConnectionProvider, DbError};
use crate::model::lookup::{Region, RegionId, Term, TermId};
use crate::model::registrant::{Registrant, RegistrantDraft, RegistrantId};
use log::{error, warn};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Registrant table name.
pub const TB_NAME: &str = "CADASTRO";
/// Region lookup table name.
pub const REGION_TB_NAME: &str = "REGIAO";
/// Term lookup table name.
pub const TERM_TB_NAME: &str = "TERMO";

const REGISTRANT_COLUMNS: &[&str] = &[
    "ID",
    "NOME",
    "TELEFONE",
    "EMAIL",
    "SENHA",
    "EMPRESA",
    "IDIOMA",
    "REGIAO_ID",
    "TERMO_ID",
];
const REGION_COLUMNS: &[&str] = &["ID", "PAIS_NOME"];
const TERM_COLUMNS: &[&str] = &["ID", "ACEITAR_TERMO"];

const REGISTRANT_SELECT_SQL: &str = "SELECT
    ID,
    NOME,
    TELEFONE,
    EMAIL,
    SENHA,
    EMPRESA,
    IDIOMA,
    REGIAO_ID,
    TERMO_ID
FROM CADASTRO";

pub type RepoResult<T> = Result<T, RepoError>;

/// Coarse failure category callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No row matched the requested identifier.
    NotFound,
    /// A constraint (foreign key, not-null, check, unique) rejected the write.
    Conflict,
    /// Connectivity or contention failure; the same call may succeed later.
    Transient,
    /// Any other storage failure, including unreadable persisted data.
    Storage,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Transient => "transient",
            Self::Storage => "storage",
        }
    }
}

/// Repository error for registrant persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    NotFound(RegistrantId),
    Conflict(DbError),
    Transient(DbError),
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Conflict(_) => FailureKind::Conflict,
            Self::Transient(_) => FailureKind::Transient,
            Self::Db(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => FailureKind::Storage,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "registrant not found: {id}"),
            Self::Conflict(err) => write!(f, "constraint violation: {err}"),
            Self::Transient(err) => write!(f, "storage temporarily unavailable: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted registrant data: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Conflict(err) | Self::Transient(err) | Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        let code = match &value {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _)) => Some(failure.code),
            _ => None,
        };
        match code {
            Some(ErrorCode::ConstraintViolation) => Self::Conflict(value),
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::FileLockingProtocolFailed
                | ErrorCode::OperationInterrupted,
            ) => Self::Transient(value),
            _ => Self::Db(value),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}

/// Repository interface for registrant CRUD and lookup hydration.
pub trait RegistrantRepository {
    /// Lists every registrant ordered by ascending identifier.
    fn list_all(&self) -> RepoResult<Vec<Registrant>>;
    /// Gets one registrant, `None` when no row matches.
    fn get(&self, id: RegistrantId) -> RepoResult<Option<Registrant>>;
    /// Inserts scalar fields and returns the database-assigned identifier.
    fn create(&self, draft: &RegistrantDraft) -> RepoResult<RegistrantId>;
    /// Replaces scalar fields of an existing row; associations are untouched.
    fn update(&self, id: RegistrantId, draft: &RegistrantDraft) -> RepoResult<()>;
    /// Removes one row.
    fn delete(&self, id: RegistrantId) -> RepoResult<()>;
    /// Associates (or clears, with `None`) the region of a registrant.
    fn set_region(&self, id: RegistrantId, region_id: Option<RegionId>) -> RepoResult<()>;
    /// Associates (or clears, with `None`) the term of a registrant.
    fn set_term(&self, id: RegistrantId, term_id: Option<TermId>) -> RepoResult<()>;
    fn lookup_region(&self, id: RegionId) -> RepoResult<Option<Region>>;
    fn lookup_term(&self, id: TermId) -> RepoResult<Option<Term>>;
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed registrant repository.
///
/// Holds no connection between calls; each operation acquires one from `P`.
pub struct SqliteRegistrantRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> SqliteRegistrantRepository<P> {
    /// Constructs a repository after verifying the provider yields a migrated
    /// connection with the registrant schema.
    pub fn try_new(provider: P) -> RepoResult<Self> {
        {
            let conn = provider.acquire()?;
            ensure_connection_ready(&conn)?;
        }
        Ok(Self { provider })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    fn with_conn<T>(&self, op: impl FnOnce(&Connection) -> RepoResult<T>) -> RepoResult<T> {
        let conn = self.provider.acquire()?;
        op(&conn)
    }
}

impl<P: ConnectionProvider> RegistrantRepository for SqliteRegistrantRepository<P> {
    fn list_all(&self) -> RepoResult<Vec<Registrant>> {
        let result = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{REGISTRANT_SELECT_SQL} ORDER BY ID ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut scanned = Vec::new();
            while let Some(row) = rows.next()? {
                scanned.push(parse_registrant_row(row)?);
            }
            drop(rows);

            scanned
                .into_iter()
                .map(|row| hydrate(conn, row))
                .collect::<RepoResult<Vec<_>>>()
        });
        log_outcome("registrant_list", None, result)
    }

    fn get(&self, id: RegistrantId) -> RepoResult<Option<Registrant>> {
        let result = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{REGISTRANT_SELECT_SQL} WHERE ID = ?1;"))?;
            let mut rows = stmt.query([id])?;
            let scanned = match rows.next()? {
                Some(row) => parse_registrant_row(row)?,
                None => return Ok(None),
            };
            drop(rows);

            hydrate(conn, scanned).map(Some)
        });
        log_outcome("registrant_get", Some(("registrant_id", id)), result)
    }

    fn create(&self, draft: &RegistrantDraft) -> RepoResult<RegistrantId> {
        let result = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO CADASTRO (
                    NOME,
                    TELEFONE,
                    EMAIL,
                    SENHA,
                    EMPRESA,
                    IDIOMA
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    draft.name.as_str(),
                    draft.phone.as_str(),
                    draft.email.as_str(),
                    draft.password.as_str(),
                    draft.company.as_str(),
                    draft.language.as_str(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        });
        log_outcome("registrant_create", None, result)
    }

    fn update(&self, id: RegistrantId, draft: &RegistrantDraft) -> RepoResult<()> {
        let result = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE CADASTRO
                 SET
                    NOME = ?1,
                    TELEFONE = ?2,
                    EMAIL = ?3,
                    SENHA = ?4,
                    EMPRESA = ?5,
                    IDIOMA = ?6
                 WHERE ID = ?7;",
                params![
                    draft.name.as_str(),
                    draft.phone.as_str(),
                    draft.email.as_str(),
                    draft.password.as_str(),
                    draft.company.as_str(),
                    draft.language.as_str(),
                    id,
                ],
            )?;
            require_changed(changed, id)
        });
        log_outcome("registrant_update", Some(("registrant_id", id)), result)
    }

    fn delete(&self, id: RegistrantId) -> RepoResult<()> {
        let result = self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM CADASTRO WHERE ID = ?1;", [id])?;
            require_changed(changed, id)
        });
        log_outcome("registrant_delete", Some(("registrant_id", id)), result)
    }

    fn set_region(&self, id: RegistrantId, region_id: Option<RegionId>) -> RepoResult<()> {
        let result = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE CADASTRO SET REGIAO_ID = ?1 WHERE ID = ?2;",
                params![region_id, id],
            )?;
            require_changed(changed, id)
        });
        log_outcome("registrant_set_region", Some(("registrant_id", id)), result)
    }

    fn set_term(&self, id: RegistrantId, term_id: Option<TermId>) -> RepoResult<()> {
        let result = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE CADASTRO SET TERMO_ID = ?1 WHERE ID = ?2;",
                params![term_id, id],
            )?;
            require_changed(changed, id)
        });
        log_outcome("registrant_set_term", Some(("registrant_id", id)), result)
    }

    fn lookup_region(&self, id: RegionId) -> RepoResult<Option<Region>> {
        let result = self.with_conn(|conn| query_region(conn, id));
        log_outcome("region_lookup", Some(("region_id", id)), result)
    }

    fn lookup_term(&self, id: TermId) -> RepoResult<Option<Term>> {
        let result = self.with_conn(|conn| query_term(conn, id));
        log_outcome("term_lookup", Some(("term_id", id)), result)
    }

    fn count(&self) -> RepoResult<u64> {
        let result = self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM CADASTRO;", [], |row| {
                row.get(0)
            })?;
            u64::try_from(count)
                .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
        });
        log_outcome("registrant_count", None, result)
    }
}

/// `CADASTRO` row before lookup hydration.
struct RegistrantRow {
    registrant: Registrant,
    region_id: Option<RegionId>,
    term_id: Option<TermId>,
}

fn parse_registrant_row(row: &Row<'_>) -> RepoResult<RegistrantRow> {
    Ok(RegistrantRow {
        registrant: Registrant {
            id: row.get("ID")?,
            name: row.get("NOME")?,
            phone: row.get("TELEFONE")?,
            email: row.get("EMAIL")?,
            password: row.get("SENHA")?,
            company: row.get("EMPRESA")?,
            language: row.get("IDIOMA")?,
            region: None,
            term: None,
        },
        region_id: row.get("REGIAO_ID")?,
        term_id: row.get("TERMO_ID")?,
    })
}

fn hydrate(conn: &Connection, row: RegistrantRow) -> RepoResult<Registrant> {
    let RegistrantRow {
        mut registrant,
        region_id,
        term_id,
    } = row;

    if let Some(region_id) = region_id {
        registrant.region = query_region(conn, region_id)?;
        if registrant.region.is_none() {
            warn!(
                "event=registrant_hydrate module=repo status=missing_reference table={} registrant_id={} reference_id={}",
                REGION_TB_NAME, registrant.id, region_id
            );
        }
    }

    if let Some(term_id) = term_id {
        registrant.term = query_term(conn, term_id)?;
        if registrant.term.is_none() {
            warn!(
                "event=registrant_hydrate module=repo status=missing_reference table={} registrant_id={} reference_id={}",
                TERM_TB_NAME, registrant.id, term_id
            );
        }
    }

    Ok(registrant)
}

fn query_region(conn: &Connection, id: RegionId) -> RepoResult<Option<Region>> {
    let region = conn
        .query_row(
            "SELECT ID, PAIS_NOME FROM REGIAO WHERE ID = ?1;",
            [id],
            |row| {
                Ok(Region {
                    id: row.get("ID")?,
                    country_name: row.get("PAIS_NOME")?,
                })
            },
        )
        .optional()?;
    Ok(region)
}

fn query_term(conn: &Connection, id: TermId) -> RepoResult<Option<Term>> {
    let raw = conn
        .query_row(
            "SELECT ID, ACEITAR_TERMO FROM TERMO WHERE ID = ?1;",
            [id],
            |row| Ok((row.get::<_, TermId>("ID")?, row.get::<_, i64>("ACEITAR_TERMO")?)),
        )
        .optional()?;

    // Any non-zero flag counts as accepted.
    Ok(raw.map(|(id, accepted)| Term {
        id,
        accepted: accepted != 0,
    }))
}

fn require_changed(changed: usize, id: RegistrantId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}

fn log_outcome<T>(
    event: &str,
    subject: Option<(&str, i64)>,
    result: RepoResult<T>,
) -> RepoResult<T> {
    if let Err(err) = &result {
        let subject = subject
            .map(|(key, value)| format!(" {key}={value}"))
            .unwrap_or_default();
        match err.kind() {
            FailureKind::NotFound => warn!(
                "event={event} module=repo status=not_found{subject} error_kind={}",
                FailureKind::NotFound.as_str()
            ),
            kind => error!(
                "event={event} module=repo status=error{subject} error_kind={} error={}",
                kind.as_str(),
                err
            ),
        }
    }
    result
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in [
        (TB_NAME, REGISTRANT_COLUMNS),
        (REGION_TB_NAME, REGION_COLUMNS),
        (TERM_TB_NAME, TERM_COLUMNS),
    ] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current.eq_ignore_ascii_case(column) {
            return Ok(true);
        }
    }
    Ok(false)
}
