use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user with email {email} already exists")]
    DuplicateUser { email: String },

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("hashing worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
