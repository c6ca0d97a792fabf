use http::{header, StatusCode};
use std::borrow::Cow;
use std::collections::HashMap;

use crate::body::Body;
use crate::server::router::{Params, RequestDispatcher, Router};

/// Currently, Request is not generic over Body type
pub type Request = http::Request<Body>;

/// Names of the attributes set on a request before it is dispatched to an error page.
pub mod attr {
    /// Type identifier of the failure, when there is one
    pub const FAILURE_TYPE: &str = "errorpage.failure_type";
    /// Name of the endpoint rendering the error page
    pub const HANDLER_NAME: &str = "errorpage.handler_name";
    /// Uri path of the request that failed
    pub const REQUEST_URI: &str = "errorpage.request_uri";
    /// Status of the response when the error page took over
    pub const STATUS_CODE: &str = "errorpage.status_code";
    /// Status message of the response when the error page took over
    pub const MESSAGE: &str = "errorpage.message";
}

/// What the request is currently being used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    Request,
    Forward,
    Include,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Text(String),
    Status(StatusCode),
}

impl Attribute {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Attribute::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_status(&self) -> Option<StatusCode> {
        match self {
            Attribute::Status(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<String> for Attribute {
    fn from(s: String) -> Self {
        Attribute::Text(s)
    }
}

impl<'a> From<&'a str> for Attribute {
    fn from(s: &'a str) -> Self {
        Attribute::Text(s.to_owned())
    }
}

impl From<StatusCode> for Attribute {
    fn from(status: StatusCode) -> Self {
        Attribute::Status(status)
    }
}

/// A request as seen by endpoints and the error page dispatcher.
///
/// Wraps the decoded `http::Request`, and adds the deployment's context path, named attributes,
/// and access to the router for dispatching to other paths.
pub struct DispatchRequest {
    inner: Request,
    context_path: String,
    router: Router,
    attributes: HashMap<Cow<'static, str>, Attribute>,
    dispatch_kind: DispatchKind,
}

impl DispatchRequest {
    /// `context_path` is either empty, or starts with `/` and has no trailing `/`.
    pub fn new(inner: Request, context_path: impl Into<String>, router: Router) -> Self {
        Self {
            inner,
            context_path: context_path.into(),
            router,
            attributes: HashMap::new(),
            dispatch_kind: DispatchKind::Request,
        }
    }

    pub fn inner(&self) -> &Request {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut Request {
        &mut self.inner
    }

    pub fn into_inner(self) -> Request {
        self.inner
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// Uri path, including the context path.
    pub fn request_uri(&self) -> &str {
        self.inner.uri().path()
    }

    /// Reconstructed url: scheme, host and path, without the query.
    pub fn request_url(&self) -> String {
        let uri = self.inner.uri();
        let scheme = uri.scheme_str().unwrap_or("http");
        let host = uri
            .authority()
            .map(|a| a.as_str())
            .or_else(|| self.inner.headers().get(header::HOST).and_then(|h| h.to_str().ok()))
            .unwrap_or("localhost");

        format!("{}://{}{}", scheme, host, uri.path())
    }

    /// Path of the request relative to the context path. `None` if the request is outside of
    /// this context.
    pub fn path_in_context(&self) -> Option<&str> {
        strip_context(&self.context_path, self.request_uri())
    }

    /// Dispatch handle for a path, which includes the context path.
    pub fn dispatcher(&self, path: &str) -> Option<RequestDispatcher> {
        let path = strip_context(&self.context_path, path)?;
        self.router.dispatcher(path)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Attribute>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.remove(name)
    }

    pub fn dispatch_kind(&self) -> DispatchKind {
        self.dispatch_kind
    }

    pub fn set_dispatch_kind(&mut self, kind: DispatchKind) {
        self.dispatch_kind = kind;
    }

    /// Path params captured by the router for the current dispatch
    pub fn params(&self) -> Option<&Params> {
        self.inner.extensions().get::<Params>()
    }
}

impl std::fmt::Debug for DispatchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchRequest")
            .field("uri", self.inner.uri())
            .field("context_path", &self.context_path)
            .field("attributes", &self.attributes)
            .field("dispatch_kind", &self.dispatch_kind)
            .finish()
    }
}

pub(crate) fn strip_context<'a>(context_path: &str, path: &'a str) -> Option<&'a str> {
    if context_path.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(context_path)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
