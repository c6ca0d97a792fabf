//! Hand-off of a failed request to its error page.
//!
//! ## Flow
//! - no page: log the failure if there is one, leave the response alone.
//! - page path is empty: nothing to do.
//! - no endpoint at the page path: body `not found <path>`, status 404.
//! - response committed: include the error page after what was already sent.
//! - otherwise: reset the buffer and forward, the error page replaces the response.
//!
//! Faults from the last three steps don't escape unless they are fatal, see `Severity`.

use http::StatusCode;
use tracing::{error, warn};

use super::error::{Fault, Result, Severity};
use super::error_page::{error_page_path, ErrorPage};
use crate::failure::Failure;
use crate::request::{attr, DispatchKind, DispatchRequest};
use crate::response::BufferedResponse;

/// Render the error page for a failed request.
///
/// Returns `Err` only for fatal faults, which are returned unchanged.
pub fn handle_error_page(
    page: Option<&ErrorPage>,
    failure: Option<&Failure>,
    req: &mut DispatchRequest,
    resp: &mut BufferedResponse,
) -> Result<()> {
    let page = match page {
        Some(page) => page,
        None => {
            if let Some(failure) = failure {
                error!(error = %failure, "unknown error, no error page handler");
            }
            return Ok(());
        }
    };

    let path = match error_page_path(req.context_path(), page) {
        Some(path) => path,
        None => return Ok(()),
    };

    match dispatch(&path, failure, req, resp) {
        Ok(()) => Ok(()),
        Err(fault) => contain(fault, req),
    }
}

fn dispatch(
    path: &str,
    failure: Option<&Failure>,
    req: &mut DispatchRequest,
    resp: &mut BufferedResponse,
) -> Result<()> {
    let mut dispatcher = match req.dispatcher(path) {
        Some(dispatcher) => dispatcher,
        None => {
            warn!(path, "no endpoint for error page");
            resp.reset_buffer();
            resp.set_content_length(None);
            resp.write_str(&format!("not found {}", path))?;
            return resp.send_error(StatusCode::NOT_FOUND);
        }
    };
    dispatcher.clear_filter();

    if let Some(failure) = failure {
        req.set_attribute(attr::FAILURE_TYPE, failure.type_name().to_owned());
    }
    req.set_attribute(attr::HANDLER_NAME, dispatcher.name().to_owned());
    let uri = req.request_uri().to_owned();
    req.set_attribute(attr::REQUEST_URI, uri);
    req.set_attribute(attr::STATUS_CODE, resp.status());
    match resp.message() {
        Some(message) => req.set_attribute(attr::MESSAGE, message.to_owned()),
        None => {
            req.remove_attribute(attr::MESSAGE);
        }
    }
    req.set_dispatch_kind(DispatchKind::Error);

    if resp.is_committed() {
        dispatcher.include(req, resp)
    } else {
        resp.reset_buffer_and_streams();
        resp.set_content_length(None);
        dispatcher.forward(req, resp)?;

        resp.output_stream_mut().set_suspended(false);
        Ok(())
    }
}

fn contain(fault: Fault, req: &DispatchRequest) -> Result<()> {
    match fault.severity() {
        // an error page that overflows would likely overflow again while logging
        Severity::SelfLimiting => Ok(()),
        Severity::Recoverable => {
            error!(url = %req.request_url(), error = %fault, "on handle_error_page error");
            Ok(())
        },
        Severity::Fatal => {
            error!(url = %req.request_url(), error = %fault, "on handle_error_page error");
            Err(fault)
        },
    }
}
