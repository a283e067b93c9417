//! View registration, resolution and the request loop.

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{
    ClassView, DispatchResult, Request, ResolvedRoute, Response, RouteCache, RoutingData, ViewKey,
    ViewRequest, ViewTarget,
};
use crate::config::Settings;
use crate::core::PagewrightError;
use crate::template::{TemplateId, TemplateRenderer};

/// Maps request paths to views.
///
/// Views are registered under `(app, module, function)`; class views use
/// their class name as the function. A module with no registered views
/// falls back to the template `{module}.html` in its app, if that exists.
pub struct Router {
    views: HashMap<ViewKey, ViewTarget>,
    modules: HashSet<(String, String)>,
    cache: Arc<RouteCache>,
    renderer: Arc<TemplateRenderer>,
}

impl Router {
    pub fn new(renderer: Arc<TemplateRenderer>, cache: Arc<RouteCache>) -> Self {
        Self {
            views: HashMap::new(),
            modules: HashSet::new(),
            cache,
            renderer,
        }
    }

    pub fn settings(&self) -> &Settings {
        self.renderer.settings()
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    /// Registers `target` for `app/module.function`, replacing any earlier view.
    pub fn register(&mut self, app: &str, module: &str, function: &str, target: ViewTarget) -> &mut Self {
        tracing::trace!(target: "router", "Registered view {}/{}.{}", app, module, function);
        self.modules.insert((app.to_string(), module.to_string()));
        self.views.insert(ViewKey::new(app, module, function), target);
        self
    }

    pub fn register_function(
        &mut self,
        app: &str,
        module: &str,
        function: &str,
        view: impl Fn(&ViewRequest<'_>) -> Result<DispatchResult> + Send + Sync + 'static,
    ) -> &mut Self {
        self.register(app, module, function, ViewTarget::function(view))
    }

    pub fn register_class(
        &mut self,
        app: &str,
        module: &str,
        class_name: &str,
        view: impl ClassView + 'static,
    ) -> &mut Self {
        self.register(app, module, class_name, ViewTarget::class(view))
    }

    /// Resolves a request path, through the cache outside debug mode.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::ViewNotFound`] when nothing handles the path
    pub fn resolve(&self, path: &str) -> Result<Arc<ResolvedRoute>> {
        let use_cache = !self.settings().debug;
        if use_cache {
            if let Some(route) = self.cache.get(path) {
                tracing::trace!(target: "router", "Route cache hit for {}", path);
                return Ok(route);
            }
        }

        let routing = RoutingData::parse(path, self.settings());
        let target = self.resolve_target(&routing).map_err(|e| match e.downcast::<PagewrightError>() {
            Ok(PagewrightError::ViewNotFound {
                reason, ..
            }) => PagewrightError::ViewNotFound {
                path: path.to_string(),
                reason,
            }
            .into(),
            Ok(other) => other.into(),
            Err(e) => e,
        })?;
        tracing::debug!(target: "router", "Resolved {} to {} ({:?})", path, routing, target);

        let route = Arc::new(ResolvedRoute {
            routing,
            target,
        });
        if use_cache {
            self.cache.insert(path, Arc::clone(&route));
        }
        Ok(route)
    }

    /// Finds the view for already-parsed routing data. Never cached.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::ViewNotFound`] when nothing handles it
    pub fn resolve_target(&self, routing: &RoutingData) -> Result<ViewTarget> {
        let not_found = |reason: String| PagewrightError::ViewNotFound {
            path: routing.to_string(),
            reason,
        };

        if !self.settings().is_app(&routing.app) {
            return Err(not_found(format!("app '{}' is not registered", routing.app)).into());
        }
        if let Some(target) = self.views.get(&routing.key()) {
            return Ok(target.clone());
        }
        if self.modules.contains(&(routing.app.clone(), routing.module.clone())) {
            return Err(not_found(format!(
                "module '{}' has no view named '{}'",
                routing.module, routing.function
            ))
            .into());
        }

        let template = TemplateId::new(&routing.app, format!("{}.html", routing.module));
        if self.renderer.library().contains(&template) {
            return Ok(ViewTarget::Template(template));
        }
        Err(not_found(format!("no view registered and no template {template}")).into())
    }
}

/// Runs requests through the router, following internal redirects.
pub struct Controller {
    router: Arc<Router>,
}

impl Controller {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Handles one request.
    ///
    /// A path no view handles becomes a 404 response. Internal redirects are
    /// resolved fresh and run in place, up to `max_redirects` times.
    ///
    /// # Errors
    ///
    /// - [`PagewrightError::RedirectLoop`] past the redirect limit
    /// - [`PagewrightError::ViewNotFound`] for an internal redirect to nowhere
    /// - any error a view returns
    pub fn handle(&self, request: &Request) -> Result<Response> {
        let route = match self.router.resolve(&request.path) {
            Ok(route) => route,
            Err(e) => match e.downcast_ref::<PagewrightError>() {
                Some(PagewrightError::ViewNotFound {
                    reason, ..
                }) => {
                    tracing::info!(target: "router", "{} {} -> 404 ({})", request.method, request.path, reason);
                    return Ok(Response::not_found(&request.path));
                }
                _ => return Err(e),
            },
        };

        let limit = self.router.settings().max_redirects;
        let mut routing = route.routing.clone();
        let mut target = route.target.clone();
        let mut chain = vec![routing.to_string()];

        loop {
            let view_request = ViewRequest {
                request,
                routing: &routing,
                renderer: self.router.renderer(),
            };

            match target.invoke(&view_request)? {
                DispatchResult::Rendered(response) => {
                    tracing::debug!(
                        target: "router",
                        "{} {} -> {} via {}",
                        request.method,
                        request.path,
                        response.status,
                        chain.join(" -> ")
                    );
                    return Ok(response);
                }
                DispatchResult::Redirect {
                    to,
                    permanent,
                    as_script,
                } => {
                    tracing::debug!(target: "router", "{} {} -> redirect to {}", request.method, request.path, to);
                    return Ok(Response::redirect(&to, permanent, as_script));
                }
                DispatchResult::InternalRedirect {
                    module,
                    function,
                } => {
                    let (app, module) = match module.split_once('/') {
                        Some((app, module)) => (app.to_string(), module.to_string()),
                        None => (routing.app.clone(), module),
                    };
                    let next = RoutingData {
                        app,
                        module,
                        function,
                        urlparams: routing.urlparams.clone(),
                    };
                    chain.push(next.to_string());

                    if chain.len() - 1 > limit {
                        return Err(PagewrightError::RedirectLoop {
                            limit,
                            chain: chain.join(" -> "),
                        }
                        .into());
                    }

                    tracing::debug!(target: "router", "Internal redirect {} -> {}", routing, next);
                    target = self.router.resolve_target(&next)?;
                    routing = next;
                }
            }
        }
    }
}
