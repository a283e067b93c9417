//! Requests, responses and the views that turn one into the other.

use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tera::Context as TeraContext;

use super::RoutingData;
use crate::template::{TemplateId, TemplateRenderer};

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        })
    }
}

/// An incoming request, reduced to what dispatch needs.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

/// An outgoing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A 200 response with an HTML content type.
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(200, body).with_header("Content-Type", "text/html; charset=utf-8")
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(404, format!("Not Found: {path}"))
    }

    pub fn method_not_allowed(method: Method) -> Self {
        Self::new(405, format!("Method Not Allowed: {method}"))
    }

    /// Browser redirect: 301 or 302 with a `Location` header, or, when
    /// `as_script` is set, a 200 page that redirects with JavaScript.
    pub fn redirect(to: &str, permanent: bool, as_script: bool) -> Self {
        if as_script {
            return Self::html(format!(r#"<script>window.location.href="{to}";</script>"#));
        }
        let status = if permanent { 301 } else { 302 };
        Self::new(status, "").with_header("Location", to)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }
}

/// What a view produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    Rendered(Response),
    /// Send the browser elsewhere
    Redirect {
        to: String,
        permanent: bool,
        as_script: bool,
    },
    /// Run another view for the same request. `module` is `app/module`, or a
    /// bare module in the current app.
    InternalRedirect {
        module: String,
        function: String,
    },
}

impl DispatchResult {
    pub fn redirect(to: impl Into<String>) -> Self {
        Self::Redirect {
            to: to.into(),
            permanent: false,
            as_script: false,
        }
    }

    pub fn internal(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self::InternalRedirect {
            module: module.into(),
            function: function.into(),
        }
    }
}

/// Everything a view gets to see.
pub struct ViewRequest<'a> {
    pub request: &'a Request,
    pub routing: &'a RoutingData,
    pub renderer: &'a TemplateRenderer,
}

impl ViewRequest<'_> {
    /// Positional URL parameter `index`, if present.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.routing.urlparams.get(index).map(String::as_str)
    }

    /// Renders `path` from the current app into an HTML response.
    ///
    /// `request` (method, path, query) and `routing` are added to `context`.
    ///
    /// # Errors
    ///
    /// Any render error
    pub fn render(&self, path: &str, context: &TeraContext) -> Result<DispatchResult> {
        self.render_template(&TemplateId::new(&self.routing.app, path), context)
    }

    /// Renders any template into an HTML response.
    ///
    /// # Errors
    ///
    /// Any render error
    pub fn render_template(&self, id: &TemplateId, context: &TeraContext) -> Result<DispatchResult> {
        let mut context = context.clone();
        context.insert("routing", self.routing);
        context.insert("method", &self.request.method.to_string());
        context.insert("query", &self.request.query);
        let html = self.renderer.render(id, &context)?;
        Ok(DispatchResult::Rendered(Response::html(html)))
    }
}

/// A function view.
pub type ViewFn = Arc<dyn Fn(&ViewRequest<'_>) -> Result<DispatchResult> + Send + Sync>;

/// A class view: one method per HTTP verb. Verbs left unimplemented answer 405.
pub trait ClassView: Send + Sync {
    fn get(&self, req: &ViewRequest<'_>) -> Result<DispatchResult> {
        Ok(not_allowed(req))
    }

    fn post(&self, req: &ViewRequest<'_>) -> Result<DispatchResult> {
        Ok(not_allowed(req))
    }

    fn put(&self, req: &ViewRequest<'_>) -> Result<DispatchResult> {
        Ok(not_allowed(req))
    }

    fn patch(&self, req: &ViewRequest<'_>) -> Result<DispatchResult> {
        Ok(not_allowed(req))
    }

    fn delete(&self, req: &ViewRequest<'_>) -> Result<DispatchResult> {
        Ok(not_allowed(req))
    }

    fn options(&self, req: &ViewRequest<'_>) -> Result<DispatchResult> {
        Ok(not_allowed(req))
    }

    /// Calls the method for the request's verb; HEAD uses `get`.
    fn dispatch(&self, req: &ViewRequest<'_>) -> Result<DispatchResult> {
        match req.request.method {
            Method::Get | Method::Head => self.get(req),
            Method::Post => self.post(req),
            Method::Put => self.put(req),
            Method::Patch => self.patch(req),
            Method::Delete => self.delete(req),
            Method::Options => self.options(req),
        }
    }
}

fn not_allowed(req: &ViewRequest<'_>) -> DispatchResult {
    DispatchResult::Rendered(Response::method_not_allowed(req.request.method))
}

/// A resolved view.
#[derive(Clone)]
pub enum ViewTarget {
    Function(ViewFn),
    Class(Arc<dyn ClassView>),
    /// No code: render the template with the request in context
    Template(TemplateId),
}

impl fmt::Debug for ViewTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Class(_) => f.write_str("Class(..)"),
            Self::Template(id) => f.debug_tuple("Template").field(id).finish(),
        }
    }
}

impl ViewTarget {
    pub fn function(view: impl Fn(&ViewRequest<'_>) -> Result<DispatchResult> + Send + Sync + 'static) -> Self {
        Self::Function(Arc::new(view))
    }

    pub fn class(view: impl ClassView + 'static) -> Self {
        Self::Class(Arc::new(view))
    }

    /// Runs the view.
    ///
    /// # Errors
    ///
    /// Whatever the view returns
    pub fn invoke(&self, req: &ViewRequest<'_>) -> Result<DispatchResult> {
        match self {
            Self::Function(view) => view(req),
            Self::Class(view) => view.dispatch(req),
            Self::Template(id) => req.render_template(id, &TeraContext::new()),
        }
    }
}
