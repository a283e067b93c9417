//! Router and controller against templates on disk.

use pagewright::core::PagewrightError;
use pagewright::provider::ProviderRegistry;
use pagewright::router::{ClassView, Controller, DispatchResult, Request, RouteCache, Router, ViewRequest};
use pagewright::template::TemplateRenderer;
use pagewright::test_utils::{ProjectBuilder, TestProject};
use std::sync::Arc;
use tera::Context;

fn site() -> TestProject {
    ProjectBuilder::new()
        .unwrap()
        .with_app("homepage")
        .with_app("account")
        .with_provider("template", "css_link")
        .with_template("homepage", "base.html", "{{ links.styles | safe }}|{% block body %}{% endblock %}")
        .with_template(
            "homepage",
            "index.html",
            r#"{% extends "homepage/base.html" %}{% block body %}home {{ routing.module }}{% endblock %}"#,
        )
        .with_template(
            "account",
            "login.html",
            r#"{% extends "homepage/base.html" %}{% block body %}login {{ next | default(value="none") }} {{ method }}{% endblock %}"#,
        )
        .with_template(
            "homepage",
            "search.html",
            r#"{% extends "homepage/base.html" %}{% block body %}results for {{ query.q }}{% endblock %}"#,
        )
        .with_style("homepage", "base")
        .with_style("account", "login")
        .build()
        .unwrap()
}

struct Login;

impl ClassView for Login {
    fn get(&self, req: &ViewRequest<'_>) -> anyhow::Result<DispatchResult> {
        let mut context = Context::new();
        if let Some(next) = req.param(0) {
            context.insert("next", next);
        }
        req.render("login.html", &context)
    }

    fn post(&self, _req: &ViewRequest<'_>) -> anyhow::Result<DispatchResult> {
        Ok(DispatchResult::redirect("/"))
    }
}

fn controller(project: &TestProject) -> Controller {
    let settings = Arc::new(project.settings().unwrap());
    let renderer = Arc::new(TemplateRenderer::from_settings(settings, &ProviderRegistry::with_builtins()).unwrap());

    let mut router = Router::new(renderer, Arc::new(RouteCache::new()));
    router
        .register_class("account", "login", "process_request", Login)
        .register_function("account", "logout", "process_request", |_| {
            Ok(DispatchResult::internal("login", "process_request"))
        })
        .register_function("account", "old", "process_request", |_| {
            Ok(DispatchResult::Redirect {
                to: "/account/login".to_string(),
                permanent: true,
                as_script: false,
            })
        });
    Controller::new(router)
}

#[test]
fn test_template_only_view_renders_with_links() {
    let project = site();
    let response = controller(&project).handle(&Request::get("/")).unwrap();

    assert_eq!(response.status, 200);
    assert!(response.body.contains("/static/homepage/styles/base.css?"));
    assert!(response.body.ends_with("|home index"));
}

#[test]
fn test_query_string_reaches_template() {
    let project = site();
    let request = Request::get("/search").with_query("q", "rust");
    let response = controller(&project).handle(&request).unwrap();

    assert_eq!(response.status, 200);
    assert!(response.body.ends_with("|results for rust"));
}

#[test]
fn test_class_view_with_params_and_ancestor_links() {
    let project = site();
    let response = controller(&project).handle(&Request::get("/account/login/dashboard")).unwrap();

    assert_eq!(response.status, 200);
    let base = response.body.find("homepage/styles/base.css").unwrap();
    let login = response.body.find("account/styles/login.css").unwrap();
    assert!(base < login);
    assert!(response.body.ends_with("|login dashboard GET"));
}

#[test]
fn test_internal_redirect_runs_target_view() {
    let project = site();
    let response = controller(&project).handle(&Request::get("/account/logout")).unwrap();

    assert_eq!(response.status, 200);
    assert!(response.body.ends_with("|login none GET"));
}

#[test]
fn test_browser_redirects() {
    let project = site();
    let controller = controller(&project);

    let posted = controller.handle(&Request::post("/account/login")).unwrap();
    assert_eq!(posted.status, 302);
    assert_eq!(posted.header("Location"), Some("/"));

    let moved = controller.handle(&Request::get("/account/old")).unwrap();
    assert_eq!(moved.status, 301);
    assert_eq!(moved.header("Location"), Some("/account/login"));
}

#[test]
fn test_unknown_pages_are_not_found() {
    let project = site();
    let controller = controller(&project);

    assert_eq!(controller.handle(&Request::get("/account/nowhere")).unwrap().status, 404);
    assert_eq!(controller.handle(&Request::get("/account/login.missing")).unwrap().status, 404);
    assert_eq!(controller.handle(&Request::get("/contact")).unwrap().status, 404);
}

#[test]
fn test_render_errors_propagate() {
    let project = site();
    let settings = Arc::new(project.settings().unwrap());
    let renderer = Arc::new(TemplateRenderer::from_settings(settings, &ProviderRegistry::with_builtins()).unwrap());
    let mut router = Router::new(renderer, Arc::new(RouteCache::new()));
    router.register_function("homepage", "broken", "process_request", |req| {
        req.render("missing.html", &Context::new())
    });

    let err = Controller::new(router).handle(&Request::get("/broken")).unwrap_err();
    assert!(matches!(err.downcast_ref::<PagewrightError>(), Some(PagewrightError::TemplateNotFound { .. })));
}
