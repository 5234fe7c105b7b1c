use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    Invalid(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("storage error: {0}")]
    Storage(&'static str),
}

impl CoreError {
    pub fn not_found(what: &str, id: &str) -> Self {
        CoreError::NotFound(format!("{what} {id}"))
    }
}
