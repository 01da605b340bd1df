use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request failed with status {0}")]
    RequestFailed(u16),
    #[error("Unexpected response format: {0}")]
    UnexpectedFormat(String),
    #[error("Network error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ApiError::RequestFailed(status.as_u16()),
            None if e.is_decode() => ApiError::UnexpectedFormat(e.to_string()),
            None => ApiError::Transport(e.to_string()),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditError {
    #[error("No row at position {0}")]
    NoSuchRow(usize),
    #[error("Unknown food {0}")]
    UnknownFood(i64),
    #[error("Invalid value for {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },
    #[error("{0} is required")]
    Blank(&'static str),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("local store: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
