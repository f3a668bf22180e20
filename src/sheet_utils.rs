// sheet_utils.rs
use crate::auth_utils::SheetsAuthenticator;
use crate::errors::SheetError;
use crate::table_utils::CellValue;
use chrono::{DateTime, Utc};
use google_sheets4::api::{ClearValuesRequest, ValueRange};
use google_sheets4::hyper::client::HttpConnector;
use google_sheets4::hyper_rustls::HttpsConnector;
use google_sheets4::{hyper, hyper_rustls, Sheets};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fs;
use std::time::Instant;
use url::Url;

/// How the publisher treats whatever is already in the target worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishMode {
    /// Clear the worksheet, then write the header row followed by the data rows.
    #[default]
    Replace,
    /// Keep existing contents and append the data rows below them. The header
    /// row is only written when the worksheet is still empty.
    Append,
}

/// Identifies the remote workbook and the worksheet tab written to. One
/// workbook can hold multiple worksheets; the tab is matched by its title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConnectConfig {
    pub spreadsheet_id: String,
    pub worksheet: String,
    #[serde(default)]
    pub mode: PublishMode,
}

impl SheetConnectConfig {
    /// Creates a replace-mode config for the given workbook ID and worksheet title.
    pub fn new(spreadsheet_id: &str, worksheet: &str) -> Self {
        SheetConnectConfig {
            spreadsheet_id: spreadsheet_id.to_string(),
            worksheet: worksheet.to_string(),
            mode: PublishMode::Replace,
        }
    }

    /// Loads a config from a local JSON file, e.g.
    /// `{"spreadsheet_id": "...", "worksheet": "Current Enrollment", "mode": "APPEND"}`.
    /// The `mode` field may be omitted and defaults to replace.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn Error>> {
        let json = fs::read_to_string(path)?;
        let config: SheetConnectConfig = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Derives a config from a full Google Sheets URL, taking the workbook ID
    /// from the `/d/<id>/` path segment.
    ///
    /// ```
    /// use dbsheets::sheet_utils::SheetConnectConfig;
    ///
    /// let config = SheetConnectConfig::from_url(
    ///     "https://docs.google.com/spreadsheets/d/1LcB3bqPJ-CPUNPeR-Ohdd5bI6jjV6enh5Gd338Dqqcs/edit#gid=0",
    ///     "Current Enrollment",
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(config.spreadsheet_id, "1LcB3bqPJ-CPUNPeR-Ohdd5bI6jjV6enh5Gd338Dqqcs");
    /// ```
    pub fn from_url(url: &str, worksheet: &str) -> Result<Self, SheetError> {
        let invalid = || SheetError::InvalidReference {
            reference: url.to_string(),
        };

        let parsed = Url::parse(url).map_err(|_| invalid())?;
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.collect())
            .unwrap_or_default();

        let spreadsheet_id = segments
            .iter()
            .position(|&segment| segment == "d")
            .and_then(|i| segments.get(i + 1))
            .filter(|id| !id.is_empty())
            .ok_or_else(invalid)?;

        Ok(SheetConnectConfig::new(spreadsheet_id, worksheet))
    }
}

/// What a publish run wrote, reported back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct PublishSummary {
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub range: String,
    pub rows_written: usize,
    pub columns_written: usize,
    pub cells_written: usize,
    pub published_at: DateTime<Utc>,
}

/// Represents a Google Sheets connection manager for publishing table snapshots
pub struct SheetConnect;

impl SheetConnect {
    /// Publishes a table snapshot into the configured worksheet.
    ///
    /// The header row is written first, then the data rows in row-major order,
    /// left-to-right in the snapshot's column order, with `RAW` value input so
    /// the spreadsheet does not reinterpret cell contents. Replace mode clears
    /// the worksheet first and irreversibly overwrites it.
    ///
    /// The snapshot must be rectangular; a ragged row fails the publish before
    /// any network call is made. Rate limiting surfaces as an error without
    /// any internal retry, so the caller decides whether to re-run.
    pub async fn publish(
        auth: SheetsAuthenticator,
        config: &SheetConnectConfig,
        headers: &[String],
        data: &[Vec<CellValue>],
    ) -> Result<PublishSummary, SheetError> {
        validate_snapshot(headers, data)?;

        let start = Instant::now();
        let hub = sheets_hub(auth);

        Self::ensure_worksheet_exists(&hub, config).await?;

        let summary = match config.mode {
            PublishMode::Replace => Self::replace(&hub, config, headers, data).await?,
            PublishMode::Append => Self::append(&hub, config, headers, data).await?,
        };

        info!(
            "published {} rows x {} columns to worksheet '{}' of '{}' in {:.3}s",
            summary.rows_written,
            summary.columns_written,
            config.worksheet,
            config.spreadsheet_id,
            start.elapsed().as_secs_f64()
        );

        Ok(summary)
    }

    /// Confirms both the workbook and the worksheet tab exist before writing,
    /// so a typo fails cleanly instead of surfacing as a range-parse error.
    async fn ensure_worksheet_exists(
        hub: &Sheets<HttpsConnector<HttpConnector>>,
        config: &SheetConnectConfig,
    ) -> Result<(), SheetError> {
        let (_, spreadsheet) = hub
            .spreadsheets()
            .get(&config.spreadsheet_id)
            .doit()
            .await
            .map_err(|e| {
                map_api_error(
                    &config.spreadsheet_id,
                    &format!("spreadsheet '{}'", config.spreadsheet_id),
                    e,
                )
            })?;

        let tab_exists = spreadsheet
            .sheets
            .unwrap_or_default()
            .iter()
            .any(|sheet| {
                sheet
                    .properties
                    .as_ref()
                    .and_then(|p| p.title.as_ref())
                    .map(|title| title == &config.worksheet)
                    .unwrap_or(false)
            });

        if !tab_exists {
            return Err(SheetError::NotFound {
                target: format!(
                    "worksheet '{}' in spreadsheet '{}'",
                    config.worksheet, config.spreadsheet_id
                ),
            });
        }

        Ok(())
    }

    async fn replace(
        hub: &Sheets<HttpsConnector<HttpConnector>>,
        config: &SheetConnectConfig,
        headers: &[String],
        data: &[Vec<CellValue>],
    ) -> Result<PublishSummary, SheetError> {
        let sheet_ref = quote_worksheet(&config.worksheet);

        debug!("clearing worksheet '{}'", config.worksheet);
        hub.spreadsheets()
            .values_clear(
                ClearValuesRequest::default(),
                &config.spreadsheet_id,
                &sheet_ref,
            )
            .doit()
            .await
            .map_err(|e| map_api_error(&config.spreadsheet_id, &sheet_ref, e))?;

        let values = to_grid(headers, data, true);
        let range = data_range(&config.worksheet, values.len(), headers.len());

        debug!("writing {} grid rows to range {}", values.len(), range);
        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: Some(range.clone()),
            values: Some(values),
        };

        let (_, response) = hub
            .spreadsheets()
            .values_update(value_range, &config.spreadsheet_id, &range)
            .value_input_option("RAW")
            .doit()
            .await
            .map_err(|e| map_api_error(&config.spreadsheet_id, &range, e))?;

        Ok(PublishSummary {
            spreadsheet_id: config.spreadsheet_id.clone(),
            worksheet: config.worksheet.clone(),
            range,
            rows_written: response
                .updated_rows
                .map(|n| n as usize)
                .unwrap_or(data.len() + 1),
            columns_written: response
                .updated_columns
                .map(|n| n as usize)
                .unwrap_or(headers.len()),
            cells_written: response
                .updated_cells
                .map(|n| n as usize)
                .unwrap_or((data.len() + 1) * headers.len()),
            published_at: Utc::now(),
        })
    }

    async fn append(
        hub: &Sheets<HttpsConnector<HttpConnector>>,
        config: &SheetConnectConfig,
        headers: &[String],
        data: &[Vec<CellValue>],
    ) -> Result<PublishSummary, SheetError> {
        let sheet_ref = quote_worksheet(&config.worksheet);
        let probe_range = format!("{}!A1:A1", sheet_ref);

        let (_, probe) = hub
            .spreadsheets()
            .values_get(&config.spreadsheet_id, &probe_range)
            .doit()
            .await
            .map_err(|e| map_api_error(&config.spreadsheet_id, &probe_range, e))?;

        let worksheet_is_empty = probe.values.as_ref().map_or(true, |v| v.is_empty());
        let values = to_grid(headers, data, worksheet_is_empty);

        if values.is_empty() {
            return Ok(PublishSummary {
                spreadsheet_id: config.spreadsheet_id.clone(),
                worksheet: config.worksheet.clone(),
                range: sheet_ref,
                rows_written: 0,
                columns_written: 0,
                cells_written: 0,
                published_at: Utc::now(),
            });
        }

        debug!(
            "appending {} grid rows below worksheet '{}'",
            values.len(),
            config.worksheet
        );
        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: Some(sheet_ref.clone()),
            values: Some(values.clone()),
        };

        let (_, response) = hub
            .spreadsheets()
            .values_append(value_range, &config.spreadsheet_id, &sheet_ref)
            .value_input_option("RAW")
            .insert_data_option("INSERT_ROWS")
            .doit()
            .await
            .map_err(|e| map_api_error(&config.spreadsheet_id, &sheet_ref, e))?;

        let updates = response.updates.unwrap_or_default();

        Ok(PublishSummary {
            spreadsheet_id: config.spreadsheet_id.clone(),
            worksheet: config.worksheet.clone(),
            range: updates.updated_range.unwrap_or(sheet_ref),
            rows_written: updates
                .updated_rows
                .map(|n| n as usize)
                .unwrap_or(values.len()),
            columns_written: updates
                .updated_columns
                .map(|n| n as usize)
                .unwrap_or(headers.len()),
            cells_written: updates
                .updated_cells
                .map(|n| n as usize)
                .unwrap_or(values.len() * headers.len()),
            published_at: Utc::now(),
        })
    }
}

/// Rejects snapshots whose rows do not all match the header width. The shape
/// sent to the publisher is exactly the shape written; there are no
/// partial-row writes.
fn validate_snapshot(headers: &[String], data: &[Vec<CellValue>]) -> Result<(), SheetError> {
    if headers.is_empty() {
        return Err(SheetError::EmptySnapshot);
    }

    for (i, row) in data.iter().enumerate() {
        if row.len() != headers.len() {
            return Err(SheetError::Shape {
                row: i + 1,
                expected: headers.len(),
                found: row.len(),
            });
        }
    }

    Ok(())
}

fn sheets_hub(auth: SheetsAuthenticator) -> Sheets<HttpsConnector<HttpConnector>> {
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .https_or_http()
        .enable_http1()
        .build();

    Sheets::new(hyper::Client::builder().build(connector), auth)
}

/// Converts a snapshot into the cell grid sent to the API, header row first
/// when `with_header` is set, data rows after it in order.
fn to_grid(headers: &[String], data: &[Vec<CellValue>], with_header: bool) -> Vec<Vec<Value>> {
    let mut values = Vec::with_capacity(data.len() + 1);

    if with_header {
        values.push(
            headers
                .iter()
                .map(|h| Value::String(h.clone()))
                .collect::<Vec<Value>>(),
        );
    }

    for row in data {
        values.push(row.iter().map(CellValue::to_json).collect::<Vec<Value>>());
    }

    values
}

/// Maps a Sheets API failure onto the pipeline's error taxonomy. Anything
/// without a recognized HTTP status passes through untranslated.
fn map_api_error(spreadsheet_id: &str, target: &str, e: google_sheets4::Error) -> SheetError {
    if matches!(e, google_sheets4::Error::MissingToken(_)) {
        return SheetError::Authorization {
            spreadsheet_id: spreadsheet_id.to_string(),
            message: e.to_string(),
        };
    }

    let (code, message) = match &e {
        google_sheets4::Error::BadRequest(value) => (
            value
                .pointer("/error/code")
                .and_then(Value::as_i64)
                .unwrap_or(0) as u16,
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        ),
        google_sheets4::Error::Failure(response) => {
            (response.status().as_u16(), response.status().to_string())
        }
        _ => (0, String::new()),
    };

    match code {
        401 | 403 => SheetError::Authorization {
            spreadsheet_id: spreadsheet_id.to_string(),
            message,
        },
        404 => SheetError::NotFound {
            target: target.to_string(),
        },
        429 => SheetError::RateLimit { message },
        _ => SheetError::Api(e),
    }
}

/// Converts a 1-based column number into its A1-notation letters.
///
/// ```
/// use dbsheets::sheet_utils::column_label;
///
/// assert_eq!(column_label(1), "A");
/// assert_eq!(column_label(26), "Z");
/// assert_eq!(column_label(27), "AA");
/// ```
pub fn column_label(mut n: usize) -> String {
    let mut label = String::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    label
}

/// Computes the A1 range covering a grid of `rows` x `cols` cells starting at
/// A1, e.g. `Sheet1!A1:B4` for a 3-row, 2-column snapshot plus its header.
pub fn data_range(worksheet: &str, rows: usize, cols: usize) -> String {
    format!(
        "{}!A1:{}{}",
        quote_worksheet(worksheet),
        column_label(cols),
        rows.max(1)
    )
}

/// Wraps a worksheet title in single quotes when A1 notation needs it.
pub fn quote_worksheet(title: &str) -> String {
    let plain = !title.is_empty()
        && title
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if plain {
        title.to_string()
    } else {
        format!("'{}'", title.replace('\'', "''"))
    }
}
