use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("prediction service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("prediction service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed prediction response: {0}")]
    Malformed(String),
}
