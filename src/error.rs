use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

/// Public Errors (does not include dispatch faults, see `server::Fault`)
#[derive(ThisError, Debug)]
pub enum Error {
    // this is error on body
    #[error("Error converting body: {0}")]
    BodyConversion(std::io::Error),
    #[error("Invalid status code for error page: {0}")]
    InvalidStatus(u16),
    #[error("Invalid context path: {0:?}")]
    InvalidContextPath(String),
}
