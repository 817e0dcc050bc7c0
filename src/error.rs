use thiserror::Error;

/// Reasons a single input file is skipped.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid value in row {row}: {message}")]
    InvalidFormat { row: usize, message: String },
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Could not read credential file: {0}")]
    CredentialFile(String),
}
