#![deny(unsafe_code)]

//! # errorpage
//!
//! Error pages for a small embedded http server.
//!
//! When a request fails, either because its endpoint set an error status or because it returned
//! a failure, the server looks up the error page registered for it and dispatches the request
//! there:
//!
//! - by status code: `ErrorPage::status(404, "/error/404")`
//! - by failure type: `ErrorPage::for_type(&kind, "/error/rt")`. A page for a type also covers
//! its subtypes; the nearest registered type wins.
//!
//! Error pages are ordinary endpoints on the `Router`. See `server::handle_error_page` for how
//! the hand-off works, and `server::Server` for the full request flow.

mod body;
mod error;
pub mod failure;
pub mod request;
pub mod response;
pub mod server;

pub use body::Body;
pub use error::{Error, Result};
pub use failure::{Failure, FailureType};
pub use request::{Attribute, DispatchKind, DispatchRequest, Request};
pub use response::{BufferedResponse, OutputStream, Response};
pub use http;
