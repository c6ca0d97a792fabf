//! Very Basic router
//!
//! Maps paths to named endpoints, and hands out `RequestDispatcher`s for them. A dispatcher runs
//! the router's filters, then the endpoint. Error pages are reached through the same router as
//! regular requests, but with the filters cleared.

use path_tree::PathTree;
use std::fmt;
use std::sync::Arc;

use crate::request::{DispatchKind, DispatchRequest};
use crate::response::BufferedResponse;
use crate::server::error::{Fault, Result};

pub type Params = Vec<(String, String)>;

#[derive(Clone)]
pub struct Router {
    tree: Arc<PathTree<Route>>,
    filters: Arc<Vec<Arc<dyn Filter>>>,
}

struct Route {
    name: Arc<str>,
    endpoint: Arc<dyn Endpoint>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Dispatch handle for a path relative to the context path.
    pub fn dispatcher(&self, path: &str) -> Option<RequestDispatcher> {
        match self.tree.find(path) {
            Some((route, params)) => {
                let params: Params = params.into_iter().map(|(a, b)| (a.to_owned(), b.to_owned())).collect();

                Some(RequestDispatcher {
                    name: route.name.clone(),
                    endpoint: route.endpoint.clone(),
                    filters: self.filters.to_vec(),
                    params,
                })
            },
            None => {
                tracing::debug!(path, "no route");
                None
            },
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("filters", &self.filters.len()).finish()
    }
}

pub struct RouterBuilder {
    tree: PathTree<Route>,
    filters: Vec<Arc<dyn Filter>>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            tree: PathTree::new(),
            filters: Vec::new(),
        }
    }

    /// Add an endpoint, named after its path.
    pub fn at<F>(self, path: &str, endpoint: F) -> Self
    where
        F: Fn(&mut DispatchRequest, &mut BufferedResponse) -> Result<()> + Send + Sync + 'static,
    {
        self.named_endpoint(path, path, endpoint)
    }

    pub fn named<F>(self, name: &str, path: &str, endpoint: F) -> Self
    where
        F: Fn(&mut DispatchRequest, &mut BufferedResponse) -> Result<()> + Send + Sync + 'static,
    {
        self.named_endpoint(name, path, endpoint)
    }

    /// Add any `Endpoint` implementor.
    pub fn named_endpoint(mut self, name: &str, path: &str, endpoint: impl Endpoint) -> Self {
        let route = Route {
            name: name.into(),
            endpoint: Arc::new(endpoint),
        };
        self.tree.insert(path, route);
        self
    }

    /// Filters run in the order added, before the endpoint, for regular dispatches only.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&mut DispatchRequest, &mut BufferedResponse) -> Result<()> + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn build(self) -> Router {
        Router {
            tree: Arc::new(self.tree),
            filters: Arc::new(self.filters),
        }
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Endpoint: Send + Sync + 'static {
    fn call(&self, req: &mut DispatchRequest, resp: &mut BufferedResponse) -> Result<()>;
}

impl<F> Endpoint for F
where
    F: Fn(&mut DispatchRequest, &mut BufferedResponse) -> Result<()> + Send + Sync + 'static,
{
    fn call(&self, req: &mut DispatchRequest, resp: &mut BufferedResponse) -> Result<()> {
        (self)(req, resp)
    }
}

/// Runs before an endpoint. Returning an error stops the chain.
pub trait Filter: Send + Sync + 'static {
    fn before(&self, req: &mut DispatchRequest, resp: &mut BufferedResponse) -> Result<()>;
}

impl<F> Filter for F
where
    F: Fn(&mut DispatchRequest, &mut BufferedResponse) -> Result<()> + Send + Sync + 'static,
{
    fn before(&self, req: &mut DispatchRequest, resp: &mut BufferedResponse) -> Result<()> {
        (self)(req, resp)
    }
}

/// Handle for dispatching a request to one endpoint.
pub struct RequestDispatcher {
    name: Arc<str>,
    endpoint: Arc<dyn Endpoint>,
    filters: Vec<Arc<dyn Filter>>,
    params: Params,
}

impl RequestDispatcher {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Skip the router's filters on this dispatch.
    pub fn clear_filter(&mut self) {
        self.filters.clear();
    }

    /// The endpoint's output replaces the response's. Commits the response when done.
    pub fn forward(&self, req: &mut DispatchRequest, resp: &mut BufferedResponse) -> Result<()> {
        if resp.is_committed() {
            return Err(Fault::IllegalState("cannot forward after response has been committed"));
        }
        resp.reset_buffer();
        self.mark(req, DispatchKind::Forward);
        self.run(req, resp)?;
        resp.flush_buffer();
        Ok(())
    }

    /// The endpoint's output is appended, status and headers are left alone.
    pub fn include(&self, req: &mut DispatchRequest, resp: &mut BufferedResponse) -> Result<()> {
        self.mark(req, DispatchKind::Include);
        resp.set_including(true);
        let res = self.run(req, resp);
        resp.set_including(false);
        res
    }

    /// Original dispatch of an incoming request.
    pub(crate) fn serve(&self, req: &mut DispatchRequest, resp: &mut BufferedResponse) -> Result<()> {
        req.set_dispatch_kind(DispatchKind::Request);
        self.run(req, resp)
    }

    // an error dispatch stays marked as one
    fn mark(&self, req: &mut DispatchRequest, kind: DispatchKind) {
        if req.dispatch_kind() != DispatchKind::Error {
            req.set_dispatch_kind(kind);
        }
    }

    fn run(&self, req: &mut DispatchRequest, resp: &mut BufferedResponse) -> Result<()> {
        req.inner_mut().extensions_mut().insert(self.params.clone());

        for filter in &self.filters {
            filter.before(req, resp)?;
        }
        self.endpoint.call(req, resp)
    }
}

impl fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("name", &self.name)
            .field("filters", &self.filters.len())
            .field("params", &self.params)
            .finish()
    }
}
