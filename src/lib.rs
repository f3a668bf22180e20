// lib.rs
//! # DBSHEETS
//!
//! Share the contents of a local SQLite database with people who don't speak
//! SQL, by publishing whole tables (or any read-only query) straight into a
//! Google Sheets worksheet. A database that only analysts could read becomes a
//! spreadsheet the whole organization can open.
//!
//! The pipeline is deliberately linear: read a point-in-time table snapshot,
//! load a service account credential, publish the snapshot into a worksheet.
//! Nothing is cached, pooled, or retried behind your back, so a run that is
//! scheduled via cron or Task Scheduler either fully replaces the worksheet or
//! fails with an error naming the stage that broke.
//!
//! ```
//! use dbsheets::sheet_utils::SheetConnectConfig;
//! use dbsheets::table_utils::TableBuilder;
//! use tokio::runtime::Runtime;
//!
//! let rt = Runtime::new().unwrap();
//! let result = rt.block_on(async {
//!     let snapshot =
//!         TableBuilder::from_sqlite_table("../data/network_database.db", "curr_enrollment")
//!             .await?;
//!
//!     let config = SheetConnectConfig::new(
//!         "1LcB3bqPJ-CPUNPeR-Ohdd5bI6jjV6enh5Gd338Dqqcs",
//!         "Current Enrollment",
//!     );
//!
//!     snapshot
//!         .publish_to_google_sheet("db-to-gsheets-demo.json", &config)
//!         .await
//! });
//! ```
//!
//! ## `table_utils`
//!
//! - **Purpose**: Build and shape the in-memory table snapshot that gets published.
//! - **Features**:
//!   - **TableBuilder**: A chainable builder holding a header row plus typed data rows:
//!   - **Easy Initialization**: Start empty, from raw rows, from a CSV file, or straight from a SQLite query or table.
//!   - **Typed Cells**: Values keep their SQLite storage class (text, integer, float, null) until the spreadsheet boundary.
//!   - **Column Manipulation**: Reorder, retain, or drop columns, and normalize headers.
//!   - **Data Analysis Aids**: Print columns, row counts, rows, or a bordered table preview.
//!   - **Flexible Output**: Save the snapshot to CSV, or publish it to a Google Sheets worksheet.
//! - **TableConverter**: Convert a JSON array of objects into a snapshot for the same pipeline.
//!
//! ## `db_utils`
//!
//! - **Purpose**: Read tabular data out of local SQLite database files with simple elegant syntax.
//! - **Features**:
//!   - Read-only by construction; a query can never mutate the source.
//!   - Whole result sets are materialized at once as typed rows.
//!   - List tables and describe their columns before deciding what to export.
//!
//! ## `auth_utils`
//!
//! - **Purpose**: Load the Google Cloud service account key that authorizes the publisher.
//! - **Features**:
//!   - Reads and validates the downloaded JSON key file.
//!   - Builds the token authenticator consumed by the Sheets client.
//!
//! ## `sheet_utils`
//!
//! - **Purpose**: Publish a table snapshot into a Google Sheets worksheet.
//! - **Features**:
//!   - Replace mode clears the tab and rewrites it; append mode adds rows below the existing data.
//!   - Worksheets are looked up by title before anything is written, so typos fail cleanly.
//!   - A1-notation helpers compute and quote the exact target range.
//!   - A `PublishSummary` reports what was written and when.
//!
//! ## `errors`
//!
//! - **Purpose**: One typed error per pipeline stage, so operators can tell a
//!   bad table name from a revoked key from a rate limit at a glance.
//!
//! ## License
//!
//! This project is licensed under the MIT License.

pub mod auth_utils;
pub mod db_utils;
pub mod errors;
pub mod sheet_utils;
pub mod table_utils;
