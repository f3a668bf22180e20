// table_utils.rs
use crate::auth_utils;
use crate::db_utils::{quote_identifier, DbConnect};
use crate::sheet_utils::{PublishSummary, SheetConnect, SheetConnectConfig};
use anyhow::Result as AnyhowResult;
use async_sqlite::rusqlite;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;
use std::fs::File;

/// A typed spreadsheet cell. Values coming out of SQLite keep their storage
/// class; everything is reduced to text only at the CSV or Sheets boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

impl CellValue {
    /// Returns the JSON value sent to the Sheets API for this cell.
    ///
    /// `Null` becomes an empty string rather than a JSON null, because the
    /// API skips null cells instead of overwriting them, which would break
    /// the full-replace contract. Non-finite floats cannot be carried as
    /// JSON numbers and are sent stringified.
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Integer(i) => Value::from(*i),
            CellValue::Float(f) if f.is_finite() => Value::from(*f),
            CellValue::Float(f) => Value::String(f.to_string()),
            CellValue::Null => Value::String(String::new()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Null => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<rusqlite::types::Value> for CellValue {
    fn from(v: rusqlite::types::Value) -> Self {
        match v {
            rusqlite::types::Value::Null => CellValue::Null,
            rusqlite::types::Value::Integer(i) => CellValue::Integer(i),
            rusqlite::types::Value::Real(f) => CellValue::Float(f),
            rusqlite::types::Value::Text(s) => CellValue::Text(s),
            rusqlite::types::Value::Blob(b) => {
                CellValue::Text(String::from_utf8_lossy(&b).into_owned())
            }
        }
    }
}

/// A utility struct for converting JSON data into a table snapshot.
pub struct TableConverter;

impl TableConverter {
    /// Builds a `TableBuilder` from a JSON array of objects, taking the column
    /// order from the first object's keys.
    ///
    /// ```
    /// use dbsheets::table_utils::TableConverter;
    ///
    /// let json_data = r#"[
    ///     {"name": "Alice", "age": 30},
    ///     {"name": "Bob", "age": 25}
    /// ]"#;
    ///
    /// let builder = TableConverter::from_json(json_data).unwrap();
    /// assert_eq!(builder.get_headers().unwrap().len(), 2);
    /// assert_eq!(builder.get_data().unwrap().len(), 2);
    /// ```
    pub fn from_json(json_data: &str) -> AnyhowResult<TableBuilder> {
        let data: Value = serde_json::from_str(json_data)?;

        let items = match data {
            Value::Array(items) => items,
            _ => anyhow::bail!("expected a JSON array of objects"),
        };

        let keys: Vec<String> = items
            .first()
            .and_then(|item| match item {
                Value::Object(map) => Some(map.keys().cloned().collect()),
                _ => None,
            })
            .unwrap_or_default();

        let mut rows = Vec::with_capacity(items.len());
        for item in &items {
            if let Value::Object(map) = item {
                let row: Vec<CellValue> = keys
                    .iter()
                    .map(|key| match map.get(key) {
                        Some(Value::String(s)) => CellValue::Text(s.clone()),
                        Some(Value::Number(n)) => {
                            if let Some(i) = n.as_i64() {
                                CellValue::Integer(i)
                            } else {
                                CellValue::Float(n.as_f64().unwrap_or(f64::NAN))
                            }
                        }
                        Some(Value::Bool(b)) => CellValue::Text(b.to_string()),
                        Some(Value::Null) | None => CellValue::Null,
                        Some(other) => CellValue::Text(other.to_string()),
                    })
                    .collect();
                rows.push(row);
            }
        }

        Ok(TableBuilder::from_raw_data(keys, rows))
    }
}

/// Represents a TableBuilder object. This struct holds a point-in-time copy of
/// tabular data as a header row plus typed data rows, a limit on how much data
/// to consider for display, as well as an internal error handler.
#[derive(Debug)]
pub struct TableBuilder {
    headers: Vec<String>,
    data: Vec<Vec<CellValue>>,
    limit: Option<usize>,
    error: Option<Box<dyn Error>>,
}

impl TableBuilder {
    /// Creates a new, empty `TableBuilder`.
    ///
    /// ```
    /// use dbsheets::table_utils::TableBuilder;
    ///
    /// let builder = TableBuilder::new();
    ///
    /// // Initially, there are no headers or data
    /// assert!(builder.get_headers().is_none());
    /// assert!(builder.get_data().is_none());
    /// ```
    pub fn new() -> Self {
        TableBuilder {
            headers: Vec::new(),
            data: Vec::new(),
            limit: None,
            error: None,
        }
    }

    /// Creates a `TableBuilder` from headers and typed rows.
    ///
    /// ```
    /// use dbsheets::table_utils::{CellValue, TableBuilder};
    ///
    /// let headers = vec!["id".to_string(), "name".to_string()];
    /// let data = vec![
    ///     vec![CellValue::Integer(1), CellValue::from("Alice")],
    ///     vec![CellValue::Integer(2), CellValue::from("Bob")],
    /// ];
    ///
    /// let builder = TableBuilder::from_raw_data(headers.clone(), data.clone());
    /// assert_eq!(builder.get_headers().unwrap(), &headers);
    /// assert_eq!(builder.get_data().unwrap(), &data);
    /// ```
    pub fn from_raw_data(headers: Vec<String>, data: Vec<Vec<CellValue>>) -> Self {
        TableBuilder {
            headers,
            data,
            limit: None,
            error: None,
        }
    }

    /// Creates a copy of the `TableBuilder`, without carrying over any error.
    pub fn from_copy(&self) -> Self {
        TableBuilder {
            headers: self.headers.clone(),
            data: self.data.clone(),
            limit: self.limit,
            error: None,
        }
    }

    /// Reads data from a CSV file at the specified `file_path` and returns a
    /// `TableBuilder` with every cell typed as text. If the file is missing or
    /// malformed, the builder comes back empty with its error slot set.
    ///
    /// ```
    /// use dbsheets::table_utils::TableBuilder;
    ///
    /// let builder = TableBuilder::from_csv("nonexistent_file.csv");
    ///
    /// assert!(builder.get_headers().is_none());
    /// assert!(builder.get_error().is_some());
    /// ```
    pub fn from_csv(file_path: &str) -> Self {
        let mut builder = TableBuilder::new();

        match File::open(file_path) {
            Ok(file) => {
                let mut rdr = csv::Reader::from_reader(file);

                if let Ok(hdrs) = rdr.headers() {
                    builder.headers = hdrs.iter().map(String::from).collect();
                }

                for result in rdr.records() {
                    match result {
                        Ok(record) => builder
                            .data
                            .push(record.iter().map(CellValue::from).collect()),
                        Err(e) => {
                            builder.error = Some(Box::new(e));
                            break;
                        }
                    }
                }
            }
            Err(e) => builder.error = Some(Box::new(e)),
        }

        builder
    }

    /// Creates a `TableBuilder` instance directly from a read-only SQLite query.
    ///
    /// ```
    /// use dbsheets::table_utils::TableBuilder;
    /// use tokio::runtime::Runtime;
    ///
    /// let rt = Runtime::new().unwrap();
    /// let result = rt.block_on(async {
    ///     TableBuilder::from_sqlite_query(
    ///         "../data/network_database.db",
    ///         "SELECT * FROM curr_enrollment",
    ///     )
    ///     .await
    /// });
    /// ```
    pub async fn from_sqlite_query(
        db_path: &str,
        sql_query: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let result = DbConnect::execute_sqlite_query(db_path, sql_query).await?;

        Ok(TableBuilder::from_raw_data(result.0, result.1))
    }

    /// Creates a `TableBuilder` holding the full contents of the named table.
    pub async fn from_sqlite_table(
        db_path: &str,
        table_name: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let sql_query = format!("SELECT * FROM {}", quote_identifier(table_name));
        TableBuilder::from_sqlite_query(db_path, &sql_query).await
    }

    /// Retrieves column descriptions for the specified table within a SQLite database.
    pub async fn get_sqlite_table_description(
        db_path: &str,
        table_name: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let result = DbConnect::describe_sqlite_table(db_path, table_name).await?;

        let mut builder = TableBuilder::from_raw_data(result.0, result.1);
        builder.retain_columns(vec!["name", "type", "notnull", "dflt_value", "pk"]);
        Ok(builder)
    }

    /// Sets the header using an array of strings.
    pub fn set_header(&mut self, header: Vec<&str>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        self.headers = header
            .into_iter()
            .map(|s| s.to_string())
            .collect::<Vec<String>>();

        self
    }

    /// Replaces whitespaces in all headers with underscores.
    pub fn replace_header_whitespaces_with_underscores(&mut self) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        self.headers = self
            .headers
            .iter()
            .map(|s| s.replace(' ', "_"))
            .collect::<Vec<String>>();

        self
    }

    /// Adds a data row to the table.
    ///
    /// ```
    /// use dbsheets::table_utils::{CellValue, TableBuilder};
    ///
    /// let mut builder = TableBuilder::new();
    /// builder
    ///     .set_header(vec!["id", "name"])
    ///     .add_row(vec![CellValue::Integer(1), CellValue::from("Alice")]);
    ///
    /// assert_eq!(builder.get_data().unwrap().len(), 1);
    /// ```
    pub fn add_row(&mut self, row: Vec<CellValue>) -> &mut Self {
        if self.error.is_none() {
            self.data.push(row);
        }
        self
    }

    /// Adds multiple data rows to the table.
    pub fn add_rows(&mut self, rows: Vec<Vec<CellValue>>) -> &mut Self {
        if self.error.is_none() {
            for row in rows {
                self.data.push(row);
            }
        }
        self
    }

    /// Reorders columns, with `"..."` standing for all unspecified columns.
    /// Columns named before the placeholder are moved to the front, columns
    /// named after it to the back.
    ///
    /// ```
    /// use dbsheets::table_utils::{CellValue, TableBuilder};
    ///
    /// let mut builder = TableBuilder::from_raw_data(
    ///     vec!["b".to_string(), "id".to_string(), "a".to_string()],
    ///     vec![vec![
    ///         CellValue::from("x"),
    ///         CellValue::Integer(1),
    ///         CellValue::from("y"),
    ///     ]],
    /// );
    ///
    /// builder.order_columns(vec!["id", "..."]);
    /// assert_eq!(builder.get_headers().unwrap()[0], "id");
    /// ```
    pub fn order_columns(&mut self, order: Vec<&str>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        let headers_for_map = self.headers.clone();
        let column_map: HashMap<&str, usize> = headers_for_map
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut start_columns = Vec::new();
        let mut end_columns = Vec::new();
        let mut middle_columns = self.headers.clone();
        let mut specified_columns = HashSet::new();

        let mut at_start = true;
        for &item in &order {
            if item == "..." {
                at_start = false;
                continue;
            }

            if let Some(&index) = column_map.get(item) {
                if at_start {
                    start_columns.push(self.headers[index].clone());
                } else {
                    end_columns.push(self.headers[index].clone());
                }
                specified_columns.insert(item);
            }
        }

        middle_columns.retain(|col| !specified_columns.contains(col.as_str()));

        let reordered_header = [start_columns, middle_columns, end_columns].concat();

        self.headers = reordered_header.clone();

        self.data = self
            .data
            .iter()
            .map(|row| {
                reordered_header
                    .iter()
                    .map(|col_name| row[column_map[col_name.as_str()]].clone())
                    .collect::<Vec<CellValue>>()
            })
            .collect::<Vec<Vec<CellValue>>>();

        self
    }

    /// Retains only the columns specified and orders them.
    pub fn retain_columns(&mut self, columns_to_retain: Vec<&str>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        let header_map: HashMap<&str, usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.as_str(), i))
            .collect();

        let retained_headers: Vec<String> = columns_to_retain
            .iter()
            .filter_map(|&col| {
                if header_map.contains_key(col) {
                    Some(col.to_string())
                } else {
                    None
                }
            })
            .collect();

        self.data = self
            .data
            .iter()
            .map(|row| {
                columns_to_retain
                    .iter()
                    .filter_map(|&col| header_map.get(col).and_then(|&idx| row.get(idx).cloned()))
                    .collect()
            })
            .collect();

        self.headers = retained_headers;

        self
    }

    /// Drops the named columns, keeping everything else in place.
    pub fn drop_columns(&mut self, columns: Vec<&str>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        let columns_set: HashSet<&str> = columns.into_iter().collect();

        let remaining_headers = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !columns_set.contains(h.as_str()))
            .map(|(i, h)| (i, h.clone()))
            .collect::<Vec<(usize, String)>>();

        self.data = self
            .data
            .iter()
            .map(|row| {
                remaining_headers
                    .iter()
                    .map(|(i, _)| row[*i].clone())
                    .collect()
            })
            .collect();

        self.headers = remaining_headers.into_iter().map(|(_, h)| h).collect();

        self
    }

    /// Sets a limit on the number of rows to be included and truncates the data
    /// if it exceeds the limit.
    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);

        if self.data.len() > limit {
            self.data.truncate(limit);
        }

        self
    }

    /// Checks if the builder contains headers or data.
    pub fn has_data(&self) -> bool {
        !self.headers.is_empty() || !self.data.is_empty()
    }

    /// Checks if the builder contains headers.
    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    /// Retrieves a reference to the headers, if any headers exist.
    pub fn get_headers(&self) -> Option<&[String]> {
        if self.has_headers() {
            Some(&self.headers)
        } else {
            None
        }
    }

    /// Retrieves a reference to the data rows, if any data exists.
    pub fn get_data(&self) -> Option<&Vec<Vec<CellValue>>> {
        if !self.data.is_empty() {
            Some(&self.data)
        } else {
            None
        }
    }

    /// Retrieves the error recorded by a failed builder step, if any.
    pub fn get_error(&self) -> Option<&dyn Error> {
        self.error.as_deref()
    }

    /// Prints the column names of the table, and returns self.
    pub fn print_columns(&mut self) -> &mut Self {
        println!();
        for header in &self.headers {
            println!("{}", header);
        }
        self
    }

    /// Prints the number of data rows in the table.
    pub fn print_row_count(&mut self) -> &mut Self {
        let row_count = self.data.len();
        println!();
        println!("Row count: {}", row_count);
        self
    }

    /// Prints all data rows as plain comma-joined lines.
    pub fn print_rows(&mut self) -> &mut Self {
        println!();
        for row in &self.data {
            let line = row
                .iter()
                .map(|cell| cell.to_string())
                .collect::<Vec<String>>()
                .join(", ");
            println!("{}", line);
        }
        self
    }

    /// Prints the table with lines and consistent spacing for cells, showing at
    /// most five rows from the start and end.
    pub fn print_table(&mut self) -> &mut Self {
        let show_rows = 5;
        let total_rows = self.data.len();
        let max_cell_width: usize = 45;

        let text_rows: Vec<Vec<String>> = self
            .data
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        // Column widths from the visible rows only
        let mut max_lengths = self
            .headers
            .iter()
            .map(|h| h.len() + 1)
            .collect::<Vec<usize>>();
        for row in text_rows
            .iter()
            .take(show_rows)
            .chain(text_rows.iter().skip(total_rows.saturating_sub(show_rows)))
        {
            for (i, cell) in row.iter().enumerate() {
                if i < max_lengths.len() {
                    let current_max = std::cmp::max(max_lengths[i], cell.len());
                    max_lengths[i] = std::cmp::min(current_max, max_cell_width);
                }
            }
        }

        let format_cell = |s: &String, max_length: usize| -> String {
            format!("{:width$.width$}", s, width = max_length)
        };

        let table_width = max_lengths.iter().map(|&len| len + 1).sum::<usize>() + 1;

        println!(
            "\n|{}|",
            self.headers
                .iter()
                .zip(max_lengths.iter())
                .map(|(header, &max_length)| format_cell(header, max_length))
                .collect::<Vec<String>>()
                .join("|")
        );
        println!("{}", "-".repeat(table_width));

        let print_row = |row: &Vec<String>| {
            println!(
                "|{}|",
                row.iter()
                    .zip(max_lengths.iter())
                    .map(|(cell, &max_length)| format_cell(cell, max_length))
                    .collect::<Vec<String>>()
                    .join("|")
            );
        };

        for row in text_rows.iter().take(show_rows) {
            print_row(row);
        }

        if total_rows > 2 * show_rows {
            let omitted_row_count = total_rows - 2 * show_rows;
            let row_word = if omitted_row_count == 1 {
                "row"
            } else {
                "rows"
            };

            println!("<<+{} {}>>", omitted_row_count, row_word);
            for row in text_rows.iter().skip(total_rows - show_rows) {
                print_row(row);
            }
        } else if total_rows > show_rows {
            for row in text_rows.iter().skip(show_rows) {
                print_row(row);
            }
        }

        println!("Total rows: {}", total_rows);

        self
    }

    /// Saves the table to a CSV file at `new_file_path`, header row first,
    /// with every cell stringified and short rows padded to the header width.
    pub fn save_as(&mut self, new_file_path: &str) -> Result<&mut Self, Box<dyn Error>> {
        let file = File::create(new_file_path)?;
        let mut wtr = csv::Writer::from_writer(file);

        if !self.headers.is_empty() {
            wtr.write_record(&self.headers)?;
        }

        let headers_len = self.headers.len();
        for record in &self.data {
            let mut text_record: Vec<String> =
                record.iter().map(|cell| cell.to_string()).collect();
            while text_record.len() < headers_len {
                text_record.push(String::new());
            }
            wtr.write_record(&text_record)?;
        }

        wtr.flush()?;

        Ok(self)
    }

    /// Publishes the table snapshot to a Google Sheets worksheet using the
    /// service account key at `service_key_path`. The header row is written
    /// first, then the data rows in order. In replace mode the worksheet's
    /// prior contents are cleared first; there is no undo.
    ///
    /// ```
    /// use dbsheets::sheet_utils::SheetConnectConfig;
    /// use dbsheets::table_utils::TableBuilder;
    /// use tokio::runtime::Runtime;
    ///
    /// let rt = Runtime::new().unwrap();
    /// let result = rt.block_on(async {
    ///     let builder = TableBuilder::from_sqlite_table(
    ///         "../data/network_database.db",
    ///         "curr_enrollment",
    ///     )
    ///     .await?;
    ///
    ///     let config = SheetConnectConfig::new(
    ///         "1LcB3bqPJ-CPUNPeR-Ohdd5bI6jjV6enh5Gd338Dqqcs",
    ///         "Current Enrollment",
    ///     );
    ///
    ///     builder
    ///         .publish_to_google_sheet("db-to-gsheets-demo.json", &config)
    ///         .await
    /// });
    /// ```
    pub async fn publish_to_google_sheet(
        &self,
        service_key_path: &str,
        config: &SheetConnectConfig,
    ) -> Result<PublishSummary, Box<dyn Error>> {
        if let Some(e) = &self.error {
            return Err(format!("cannot publish a snapshot that failed to build: {}", e).into());
        }

        let key = auth_utils::load_service_account_key(service_key_path)?;
        let auth = auth_utils::build_service_account_auth(key).await?;
        let summary = SheetConnect::publish(auth, config, &self.headers, &self.data).await?;

        Ok(summary)
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
