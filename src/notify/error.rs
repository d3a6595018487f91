use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address {address:?}: {message}")]
    Address { address: String, message: String },
    #[error("failed to build message: {0}")]
    Message(String),
    #[error("SMTP delivery failed: {0}")]
    Transport(String),
    #[error("mail configuration error: {0}")]
    Config(String),
}
