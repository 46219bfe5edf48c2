use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Analysis for {requested} superseded by a newer request for {current}")]
    Superseded {
        requested: NaiveDate,
        current: NaiveDate,
    },
}

impl AnalyticsError {
    /// True when the error only means a newer analysis replaced this one.
    pub fn is_superseded(&self) -> bool {
        matches!(self, AnalyticsError::Superseded { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
