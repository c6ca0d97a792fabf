use http::StatusCode;
use std::sync::Arc;

use super::error_page::ErrorPage;
use super::registry::ErrorPageRegistry;
use crate::failure::Failure;

impl ErrorPageRegistry {
    /// Page for a failure: its own type's page, or else the page of its nearest registered
    /// ancestor.
    pub fn find_by_failure(&self, failure: Option<&Failure>) -> Option<Arc<ErrorPage>> {
        let failure = failure?;
        failure.kind().lineage().find_map(|name| self.find_by_failure_type(name))
    }

    /// Failure page if there is one, otherwise the page for `status`.
    pub fn resolve(&self, status: StatusCode, failure: Option<&Failure>) -> Option<Arc<ErrorPage>> {
        self.find_by_failure(failure).or_else(|| self.find_by_status(status))
    }
}
