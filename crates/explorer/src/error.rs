#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("explorer request timed out")]
    Timeout,
    #[error("explorer transport error: {0}")]
    Transport(String),
    #[error("explorer returned malformed data: {0}")]
    Malformed(String),
    #[error("broadcast rejected: {0}")]
    BroadcastRejected(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Transport(e.to_string())
        }
    }
}
