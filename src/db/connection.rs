//! Database connection management.

use crate::core::DbConfig;
use crate::error::{Error, Result};
use log::{debug, error};
use rusqlite::{Connection as SqliteConnection, OptionalExtension, ToSql};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a connection URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    /// Private in-memory database, empty on every acquisition.
    Memory,
    /// Database file on disk.
    File(PathBuf),
    /// SQLite `file:` URI, passed through untouched.
    Uri(String),
}

impl DbTarget {
    /// Resolve a connection URL.
    ///
    /// Accepts `sqlite://<path>`, `sqlite:<path>`, `file:<uri>`,
    /// `sqlite::memory:`, `:memory:` and bare paths.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url == ":memory:" || url == "sqlite::memory:" {
            return Ok(DbTarget::Memory);
        }
        if url.starts_with("file:") {
            return Ok(DbTarget::Uri(url.to_string()));
        }
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        // Any other `scheme:` prefix names another backend.
        if path.is_empty() || path.contains("://") || url_scheme(path).is_some() {
            return Err(Error::Configuration(format!(
                "unsupported database url `{url}`; expected a SQLite path or sqlite:// url"
            )));
        }
        Ok(DbTarget::File(PathBuf::from(path)))
    }
}

/// The `scheme` of `scheme:rest`, if `s` starts with one.
///
/// A single letter is a Windows drive (`C:\data\plan.db`), not a scheme.
fn url_scheme(s: &str) -> Option<&str> {
    let (scheme, _) = s.split_once(':')?;
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (starts_alpha && rest_valid && scheme.len() > 1).then_some(scheme)
}

impl std::fmt::Display for DbTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbTarget::Memory => write!(f, ":memory:"),
            DbTarget::File(path) => write!(f, "{}", path.display()),
            DbTarget::Uri(uri) => write!(f, "{uri}"),
        }
    }
}

/// Hands out one fresh connection per call.
///
/// No pooling and no retry: a failed open is returned as is.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    config: DbConfig,
}

impl ConnectionProvider {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Open a connection.
    ///
    /// Credentials are checked before anything touches the filesystem. The
    /// connection is closed when the returned value is dropped.
    pub fn acquire(&self) -> Result<Connection> {
        let creds = self.config.credentials()?;
        let target = DbTarget::parse(creds.url)?;

        let started_at = Instant::now();
        debug!(
            "event=db_acquire module=db status=start target={} user={}",
            target, creds.user
        );

        let opened = match &target {
            DbTarget::Memory => Connection::open_in_memory(),
            DbTarget::File(path) => Connection::open(path),
            DbTarget::Uri(uri) => Connection::open(uri),
        };

        match opened {
            Ok(conn) => {
                debug!(
                    "event=db_acquire module=db status=ok target={} duration_ms={}",
                    target,
                    started_at.elapsed().as_millis()
                );
                Ok(conn)
            }
            Err(err) => {
                error!(
                    "event=db_acquire module=db status=error target={} duration_ms={} error={}",
                    target,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Database connection wrapper.
pub struct Connection {
    conn: SqliteConnection,
}

impl Connection {
    /// Open a connection to the database at the given path or `file:` URI.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = SqliteConnection::open(path)?;
        Self::configure(conn)
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = SqliteConnection::open_in_memory()?;
        Self::configure(conn)
    }

    fn configure(conn: SqliteConnection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying SqliteConnection.
    pub fn as_conn(&self) -> &SqliteConnection {
        &self.conn
    }

    /// Execute a statement and return the number of rows affected.
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize> {
        self.conn.execute(sql, params).map_err(Error::from)
    }

    /// Execute several statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).map_err(Error::from)
    }

    /// Query at most one row; `None` when nothing matched.
    pub fn query_row_optional<T, F>(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        f: F,
    ) -> Result<Option<T>>
    where
        F: FnOnce(&rusqlite::Row) -> rusqlite::Result<T>,
    {
        self.conn
            .query_row(sql, params, f)
            .optional()
            .map_err(Error::from)
    }

    /// Query multiple rows.
    pub fn query<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> Result<Vec<T>>
    where
        F: FnMut(&rusqlite::Row) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, f)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Check if a table exists.
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let found = self.query_row_optional(
            "SELECT name FROM sqlite_master WHERE type='table' AND name=?",
            &[&table_name],
            |_| Ok(()),
        )?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(url: &str) -> DbConfig {
        DbConfig::new(url, "planner", "secret")
    }

    #[test]
    fn test_target_parse_forms() {
        assert_eq!(DbTarget::parse(":memory:").unwrap(), DbTarget::Memory);
        assert_eq!(DbTarget::parse("sqlite::memory:").unwrap(), DbTarget::Memory);
        assert_eq!(
            DbTarget::parse("sqlite://data/mpp_pro.db").unwrap(),
            DbTarget::File(PathBuf::from("data/mpp_pro.db"))
        );
        assert_eq!(
            DbTarget::parse("sqlite:mpp_pro.db").unwrap(),
            DbTarget::File(PathBuf::from("mpp_pro.db"))
        );
        assert_eq!(
            DbTarget::parse("/tmp/mpp_pro.db").unwrap(),
            DbTarget::File(PathBuf::from("/tmp/mpp_pro.db"))
        );
        assert_eq!(
            DbTarget::parse("file:mpp_pro.db?mode=ro").unwrap(),
            DbTarget::Uri("file:mpp_pro.db?mode=ro".to_string())
        );
    }

    #[test]
    fn test_target_parse_allows_drive_letters_and_plain_colons() {
        assert_eq!(
            DbTarget::parse(r"C:\data\mpp_pro.db").unwrap(),
            DbTarget::File(PathBuf::from(r"C:\data\mpp_pro.db"))
        );
        assert_eq!(
            DbTarget::parse("sqlite://D:/data/mpp_pro.db").unwrap(),
            DbTarget::File(PathBuf::from("D:/data/mpp_pro.db"))
        );
        assert_eq!(
            DbTarget::parse("./backups/10:30.db").unwrap(),
            DbTarget::File(PathBuf::from("./backups/10:30.db"))
        );
    }

    #[test]
    fn test_target_parse_rejects_other_backends() {
        for url in [
            "jdbc:sqlserver://localhost:1433;databaseName=mpp_pro",
            "postgres://localhost/mpp_pro",
            "mysql:host/db",
            "postgresql:mpp_pro",
            "sqlite:mysql:host/db",
            "sqlite://",
            "",
        ] {
            assert!(
                matches!(DbTarget::parse(url), Err(Error::Configuration(_))),
                "{url}"
            );
        }
    }

    #[test]
    fn test_acquire_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.db");
        let provider = ConnectionProvider::new(config_for(&format!(
            "sqlite://{}",
            path.display()
        )));

        let conn = provider.acquire().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        drop(conn);

        assert!(path.exists());
        let again = provider.acquire().unwrap();
        assert!(again.table_exists("t").unwrap());
    }

    #[test]
    fn test_acquire_enables_foreign_keys() {
        let provider = ConnectionProvider::new(config_for(":memory:"));
        let conn = provider.acquire().unwrap();
        let fk: i64 = conn
            .as_conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_acquire_without_credentials_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.db");
        let provider = ConnectionProvider::new(DbConfig {
            url: Some(path.display().to_string()),
            user: Some("planner".to_string()),
            password: None,
        });

        assert!(matches!(
            provider.acquire(),
            Err(Error::Configuration(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_acquire_unopenable_path_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("plan.db");
        let provider = ConnectionProvider::new(config_for(&path.display().to_string()));

        assert!(matches!(provider.acquire(), Err(Error::Connection(_))));
    }

    #[test]
    fn test_query_row_optional() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")
            .unwrap();

        let hit: Option<i64> = conn
            .query_row_optional("SELECT x FROM t WHERE x = ?", &[&1i64], |r| r.get(0))
            .unwrap();
        let miss: Option<i64> = conn
            .query_row_optional("SELECT x FROM t WHERE x = ?", &[&2i64], |r| r.get(0))
            .unwrap();
        assert_eq!(hit, Some(1));
        assert_eq!(miss, None);
    }

    #[test]
    fn test_table_exists() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!conn.table_exists("projects").unwrap());
        conn.execute_batch("CREATE TABLE projects (project_id INTEGER PRIMARY KEY)")
            .unwrap();
        assert!(conn.table_exists("projects").unwrap());
    }
}
