// errors.rs

// Every error surfaces immediately to the caller; nothing is recovered or
// retried internally. The operator fixes the cause (expired key, wrong table
// name, revoked share) and re-runs.

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Cannot open database at '{path}': {source}")]
    Connection {
        path: String,
        #[source]
        source: async_sqlite::Error,
    },

    #[error("Query failed: {source}")]
    Query {
        #[source]
        source: async_sqlite::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Service account key not found at '{path}': {source}")]
    Missing {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Service account key at '{path}' is malformed: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Service account key was rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Service account has no access to spreadsheet '{spreadsheet_id}': {message}")]
    Authorization {
        spreadsheet_id: String,
        message: String,
    },

    #[error("Not found: {target}")]
    NotFound { target: String },

    #[error("Rate limited by the Sheets API: {message}")]
    RateLimit { message: String },

    #[error("Nothing to publish: the snapshot has no header row")]
    EmptySnapshot,

    #[error("Snapshot row {row} has {found} cells, expected {expected}")]
    Shape {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid spreadsheet reference '{reference}'")]
    InvalidReference { reference: String },

    #[error(transparent)]
    Api(#[from] google_sheets4::Error),
}

/// Umbrella error for callers that drive the whole pipeline in one go.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

pub type Result<T, E = ShareError> = std::result::Result<T, E>;
