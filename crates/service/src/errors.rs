use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("user {0} not found")]
    NotFound(i64),
}

impl ServiceError {
    pub fn not_found(id: i64) -> Self { Self::NotFound(id) }
}
