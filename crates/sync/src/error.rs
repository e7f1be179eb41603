#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Explorer(#[from] dw_explorer::Error),
    #[error(transparent)]
    Account(#[from] dw_account::Error),
    #[error("malformed explorer data: {0}")]
    Malformed(String),
}
