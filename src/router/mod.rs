//! Request routing and view dispatch
//!
//! Paths follow the convention `/app/module.function/param1/param2`:
//!
//! | path                        | app        | module  | function          | params   |
//! |-----------------------------|------------|---------|-------------------|----------|
//! | `/`                         | default    | default | `process_request` | -        |
//! | `/account/login`            | `account`  | `login` | `process_request` | -        |
//! | `/account/login.check/42`   | `account`  | `login` | `check`           | `42`     |
//! | `/about/team` (not an app)  | default    | `about` | `process_request` | `team`   |
//!
//! Three kinds of views can answer:
//!
//! - function views, registered with [`Router::register_function`]
//! - class views ([`ClassView`]) with one method per HTTP verb
//! - template-only views: a module with no registered views whose app has a
//!   `{module}.html` template
//!
//! Views return a [`DispatchResult`]. Redirects are values, not errors: the
//! [`Controller`] turns a browser redirect into a 301/302 response and follows
//! an internal redirect by resolving the named view and running it in place,
//! up to `max_redirects` times.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pagewright::router::{Controller, DispatchResult, Request, RouteCache, Router};
//! use pagewright::template::TemplateRenderer;
//! use std::sync::Arc;
//! use tera::Context;
//!
//! # fn example(renderer: Arc<TemplateRenderer>) -> anyhow::Result<()> {
//! let mut router = Router::new(renderer, Arc::new(RouteCache::new()));
//! router.register_function("account", "login", "process_request", |req| {
//!     let mut context = Context::new();
//!     context.insert("next", &req.param(0));
//!     req.render("login.html", &context)
//! });
//! router.register_function("account", "logout", "process_request", |_| {
//!     Ok(DispatchResult::redirect("/"))
//! });
//!
//! let controller = Controller::new(router);
//! let response = controller.handle(&Request::get("/account/login"))?;
//! println!("{} {}", response.status, response.body);
//! # Ok(())
//! # }
//! ```

mod cache;
mod dispatch;
mod routing;
mod view;

pub use cache::{ResolvedRoute, RouteCache};
pub use dispatch::{Controller, Router};
pub use routing::{DEFAULT_FUNCTION, RoutingData, ViewKey};
pub use view::{
    ClassView, DispatchResult, Method, Request, Response, ViewFn, ViewRequest, ViewTarget,
};
