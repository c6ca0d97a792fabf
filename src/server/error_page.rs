use http::StatusCode;
use std::fmt;

use crate::error::{Error, Result};
use crate::failure::FailureType;

/// What an error page is registered for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorPageKey {
    Status(StatusCode),
    /// Type identifier of a failure, see `FailureType::name`
    Failure(String),
}

/// Mapping from a status code or a failure type to the path of the endpoint that renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    key: ErrorPageKey,
    path: String,
}

impl ErrorPage {
    pub fn new(key: ErrorPageKey, path: impl Into<String>) -> Self {
        Self {
            key,
            path: path.into(),
        }
    }

    /// Page for a status code. Codes outside of 100..=999 are rejected.
    pub fn status(code: u16, path: impl Into<String>) -> Result<Self> {
        let status = StatusCode::from_u16(code).map_err(|_| Error::InvalidStatus(code))?;
        Ok(Self::for_status(status, path))
    }

    pub fn for_status(status: StatusCode, path: impl Into<String>) -> Self {
        Self::new(ErrorPageKey::Status(status), path)
    }

    /// Page for a failure type and, unless they have their own page, all of its subtypes.
    pub fn failure(type_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(ErrorPageKey::Failure(type_name.into()), path)
    }

    pub fn for_type(kind: &FailureType, path: impl Into<String>) -> Self {
        Self::failure(kind.name(), path)
    }

    pub fn key(&self) -> &ErrorPageKey {
        &self.key
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        match self.key {
            ErrorPageKey::Status(status) => Some(status),
            ErrorPageKey::Failure(_) => None,
        }
    }

    pub fn failure_type(&self) -> Option<&str> {
        match &self.key {
            ErrorPageKey::Failure(name) => Some(name),
            ErrorPageKey::Status(_) => None,
        }
    }

    /// Target path, as configured.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ErrorPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            ErrorPageKey::Status(status) => write!(f, "{} -> {}", status.as_u16(), self.path),
            ErrorPageKey::Failure(name) => write!(f, "{} -> {}", name, self.path),
        }
    }
}

/// Full path of an error page: leading `/` ensured, context path prepended.
///
/// `None` if the page has no path.
pub fn error_page_path(context_path: &str, page: &ErrorPage) -> Option<String> {
    let path = page.path();
    if path.is_empty() {
        return None;
    }

    let mut full = String::with_capacity(context_path.len() + path.len() + 1);
    full.push_str(context_path);
    if !path.starts_with('/') {
        full.push('/');
    }
    full.push_str(path);
    Some(full)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_page_path() {
        let page = ErrorPage::status(500, "/error/500").unwrap();
        assert_eq!(error_page_path("", &page).as_deref(), Some("/error/500"));
        assert_eq!(error_page_path("/app", &page).as_deref(), Some("/app/error/500"));

        let page = ErrorPage::status(404, "error/missing").unwrap();
        assert_eq!(error_page_path("", &page).as_deref(), Some("/error/missing"));
        assert_eq!(error_page_path("/app", &page).as_deref(), Some("/app/error/missing"));

        let page = ErrorPage::status(404, "").unwrap();
        assert_eq!(error_page_path("/app", &page), None);
    }

    #[test]
    fn test_invalid_status() {
        assert!(matches!(ErrorPage::status(42, "/x"), Err(Error::InvalidStatus(42))));
    }

    #[test]
    fn test_key_accessors() {
        let page = ErrorPage::failure("RuntimeException", "/error/rt");
        assert_eq!(page.failure_type(), Some("RuntimeException"));
        assert_eq!(page.status_code(), None);
        assert_eq!(page.to_string(), "RuntimeException -> /error/rt");
    }
}
