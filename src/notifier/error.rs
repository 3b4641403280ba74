use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notifications are disabled")]
    Disabled,

    #[error("Notifier token or channel is not configured")]
    MissingCredentials,

    #[error("Photo to send does not exist: {0}")]
    PhotoMissing(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat service error: {0}")]
    Api(String),
}
