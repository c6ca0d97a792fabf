//! Faults raised while running an endpoint or dispatching to an error page.
//!
//! Every fault falls into one of three categories, see `Severity`. The error page dispatcher
//! checks the category at its boundary: recoverable faults are logged and swallowed, fatal ones
//! are handed back to the caller untouched, and stack exhaustion is dropped so that a broken
//! error page can't recurse into itself.

use thiserror::Error as ThisError;

use crate::failure::Failure;

/// Convenience type for `Result<T, Fault>`
pub type Result<T> = std::result::Result<T, Fault>;

#[derive(ThisError, Debug)]
pub enum Fault {
    /// An endpoint failed with an application failure.
    #[error("{0}")]
    Failed(Failure),

    /// Error writing to the response
    #[error("Failure writing response: {0}")]
    Io(#[from] std::io::Error),

    /// A dispatch primitive was used in a state that doesn't allow it, e.g. forward after commit.
    #[error("Illegal state: {0}")]
    IllegalState(&'static str),

    /// The task running the request was told to terminate.
    #[error("Terminated")]
    Terminated,

    /// Runaway recursion, usually an error page which fails into itself.
    #[error("Stack exhausted")]
    StackExhausted,

    /// The platform is in a state the server can't recover from (allocation failure, internal
    /// invariant broken).
    #[error("Platform fault: {0}")]
    Platform(String),
}

/// How a fault is treated at the error page boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Log and carry on with a normal return.
    Recoverable,
    /// Must reach the caller unchanged.
    Fatal,
    /// Discard. Retrying or logging would only feed the recursion.
    SelfLimiting,
}

impl Fault {
    pub fn severity(&self) -> Severity {
        use Fault::*;
        match self {
            Failed(_) | Io(_) | IllegalState(_) => Severity::Recoverable,
            Terminated | Platform(_) => Severity::Fatal,
            StackExhausted => Severity::SelfLimiting,
        }
    }

    /// The application failure, if this fault carries one.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Fault::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<Failure> for Fault {
    fn from(failure: Failure) -> Self {
        Fault::Failed(failure)
    }
}
