// db_utils.rs
use crate::errors::DbError;
use crate::table_utils::CellValue;
use async_sqlite::rusqlite::{self, OpenFlags};
use async_sqlite::ClientBuilder;
use log::{debug, info};

/// Represents a database connection manager for handling read-only database operations
pub struct DbConnect;

/// Implementation block for DbConnect, providing methods for database interactions
impl DbConnect {
    /// Executes an SQL query against a local SQLite database file and returns the column
    /// names alongside the typed rows, or an error. The database is opened read-only, so
    /// the query can never mutate the source.
    ///
    /// ```
    /// use dbsheets::db_utils::DbConnect;
    /// use tokio::runtime::Runtime;
    ///
    /// let rt = Runtime::new().unwrap();
    /// let result = rt.block_on(async {
    ///     DbConnect::execute_sqlite_query(
    ///         "../data/network_database.db",
    ///         "SELECT * FROM curr_enrollment",
    ///     )
    ///     .await
    /// });
    ///
    /// match result {
    ///     Ok((headers, rows)) => {
    ///         println!("{} columns, {} rows", headers.len(), rows.len());
    ///     }
    ///     Err(e) => eprintln!("{}", e),
    /// }
    /// ```
    pub async fn execute_sqlite_query(
        db_path: &str,
        sql_query: &str,
    ) -> Result<(Vec<String>, Vec<Vec<CellValue>>), DbError> {
        let client = ClientBuilder::new()
            .path(db_path)
            .flags(OpenFlags::SQLITE_OPEN_READ_ONLY)
            .open()
            .await
            .map_err(|e| DbError::Connection {
                path: db_path.to_string(),
                source: e,
            })?;

        debug!("running sqlite query against '{}': {}", db_path, sql_query);

        let sql = sql_query.to_string();
        let (headers, rows) = client
            .conn(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let headers: Vec<String> = stmt
                    .column_names()
                    .into_iter()
                    .map(String::from)
                    .collect();
                let num_cols = stmt.column_count();

                let rows = stmt
                    .query([])?
                    .mapped(|r| {
                        (0..num_cols)
                            .map(|idx| {
                                let v = r.get_ref(idx)?;
                                Ok(CellValue::from(rusqlite::types::Value::from(v)))
                            })
                            .collect::<Result<Vec<_>, rusqlite::Error>>()
                    })
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;

                Ok((headers, rows))
            })
            .await
            .map_err(|e| Self::classify_query_error(db_path, e))?;

        info!(
            "sqlite query returned {} rows x {} columns from '{}'",
            rows.len(),
            headers.len(),
            db_path
        );

        Ok((headers, rows))
    }

    /// Lists the names of the tables present in the database, read from `sqlite_schema`.
    pub async fn list_sqlite_tables(db_path: &str) -> Result<Vec<String>, DbError> {
        let table_query =
            "SELECT name FROM sqlite_schema WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";
        let (_, rows) = Self::execute_sqlite_query(db_path, table_query).await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .map(|cell| cell.to_string())
            .collect())
    }

    /// Retrieves column descriptions for the specified table, in `PRAGMA table_info` shape.
    pub async fn describe_sqlite_table(
        db_path: &str,
        table_name: &str,
    ) -> Result<(Vec<String>, Vec<Vec<CellValue>>), DbError> {
        let column_query = format!("PRAGMA table_info({})", quote_identifier(table_name));
        Self::execute_sqlite_query(db_path, &column_query).await
    }

    /// Retrieves and lists the tables present in the database.
    pub async fn print_sqlite_tables(db_path: &str) -> Result<(), DbError> {
        let tables = Self::list_sqlite_tables(db_path).await?;

        println!();
        for table in &tables {
            println!("{}", table);
        }
        println!();
        println!("Table count: {}", tables.len());

        Ok(())
    }

    fn classify_query_error(db_path: &str, e: async_sqlite::Error) -> DbError {
        // A file that exists but is not a database only reveals itself at the
        // first statement, not at open time.
        let not_a_database = matches!(
            &e,
            async_sqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))
                if f.code == rusqlite::ErrorCode::NotADatabase
        );

        if not_a_database {
            DbError::Connection {
                path: db_path.to_string(),
                source: e,
            }
        } else {
            DbError::Query { source: e }
        }
    }
}

/// Quotes an identifier for interpolation into SQLite statements.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
