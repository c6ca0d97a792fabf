#![deny(unsafe_code)]

//! # errorpage server
//!
//! ## Handling a request
//! `Server::respond` routes a decoded request to its endpoint, then looks at the outcome:
//! - the endpoint failed with a recoverable fault: the status becomes 500 (unless already sent),
//! and the error page is looked up by failure type first, then by status.
//! - the endpoint set an error status (4xx, 5xx): the error page is looked up by status.
//! - a fatal fault is returned to the caller, nothing else is done with the response.
//!
//! The response is then finished into a `Response` for the transport to encode.
//!
//! ## Error pages
//! Pages live in an `ErrorPageRegistry`, owned by the server behind an `Arc`. Hold on to
//! `Server::registry()` to add or remove pages while the server is running.

mod dispatch;
mod error;
mod error_page;
mod registry;
mod resolve;
pub mod router;

use http::StatusCode;
use std::sync::Arc;

use crate::error::Error;
use crate::request::{DispatchRequest, Request};
use crate::response::{BufferedResponse, Response, DEFAULT_BUFFER_SIZE};

pub use self::dispatch::handle_error_page;
pub use self::error::{Fault, Result, Severity};
pub use self::error_page::{error_page_path, ErrorPage, ErrorPageKey};
pub use self::registry::ErrorPageRegistry;
pub use self::router::{Params, RequestDispatcher, Router};

#[derive(Clone)]
pub struct Server {
    router: Router,
    registry: Arc<ErrorPageRegistry>,
    context_path: String,
    response_buffer_size: usize,
}

impl Server {
    pub fn new(router: Router, opts: ServerOpts) -> std::result::Result<Self, Error> {
        let context_path = normalize_context_path(&opts.context_path)?;
        let registry = Arc::new(ErrorPageRegistry::from_pages(opts.error_pages));

        Ok(Self {
            router,
            registry,
            context_path,
            response_buffer_size: opts.response_buffer_size,
        })
    }

    pub fn registry(&self) -> &Arc<ErrorPageRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// Run a request through its endpoint and, if it failed, its error page.
    ///
    /// `Err` only for fatal faults.
    pub fn respond(&self, req: Request) -> Result<Response> {
        let mut req = DispatchRequest::new(req, self.context_path.clone(), self.router.clone());
        let mut resp = BufferedResponse::with_buffer_size(self.response_buffer_size);

        let dispatcher = req.path_in_context().and_then(|path| self.router.dispatcher(path));
        let outcome = match dispatcher {
            Some(dispatcher) => dispatcher.serve(&mut req, &mut resp),
            None => {
                tracing::debug!(uri = req.request_uri(), "not found");
                resp.set_status(StatusCode::NOT_FOUND);
                Ok(())
            },
        };

        match outcome {
            Ok(()) => {
                let status = resp.status();
                if status.is_client_error() || status.is_server_error() {
                    let page = self.registry.find_by_status(status);
                    handle_error_page(page.as_deref(), None, &mut req, &mut resp)?;
                }
            },
            Err(fault) => match fault.severity() {
                Severity::Fatal => return Err(fault),
                Severity::SelfLimiting => {
                    resp.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                },
                Severity::Recoverable => {
                    if fault.failure().is_none() {
                        tracing::error!(error = %fault, "endpoint failed");
                    }
                    resp.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                    let failure = fault.failure();
                    let page = self.registry.resolve(resp.status(), failure);
                    handle_error_page(page.as_deref(), failure, &mut req, &mut resp)?;
                },
            },
        }

        resp.flush_buffer();
        Ok(resp.into_response())
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("context_path", &self.context_path)
            .field("error_pages", &self.registry.len())
            .finish()
    }
}

pub struct ServerOpts {
    /// Empty, or a path starting with `/`. A trailing `/` is dropped.
    pub context_path: String,
    /// Output beyond this many bytes commits the response.
    pub response_buffer_size: usize,
    pub error_pages: Vec<ErrorPage>,
}

impl Default for ServerOpts {
    fn default() -> Self {
        Self {
            context_path: String::new(),
            response_buffer_size: DEFAULT_BUFFER_SIZE,
            error_pages: Vec::new(),
        }
    }
}

fn normalize_context_path(path: &str) -> std::result::Result<String, Error> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if !trimmed.starts_with('/') {
        return Err(Error::InvalidContextPath(path.to_owned()));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize_context_path() {
        assert_eq!(normalize_context_path("").unwrap(), "");
        assert_eq!(normalize_context_path("/").unwrap(), "");
        assert_eq!(normalize_context_path("/app/").unwrap(), "/app");
        assert_eq!(normalize_context_path("/app").unwrap(), "/app");
        assert!(matches!(normalize_context_path("app"), Err(Error::InvalidContextPath(_))));
    }
}
