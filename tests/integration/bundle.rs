//! Integration tests for the `pagewright bundle` command.

use pagewright::test_utils::{ProjectBuilder, TestProject};
use predicates::prelude::*;

use super::pagewright;

fn site() -> TestProject {
    ProjectBuilder::new()
        .unwrap()
        .with_app("homepage")
        .with_app("account")
        .with_provider("webpack", "js_link")
        .with_template("homepage", "base.html", "{% block body %}{% endblock %}")
        .with_template("homepage", "index.html", r#"{% extends "homepage/base.html" %}"#)
        .with_template("homepage", "__private/draft.html", r#"{% extends "homepage/base.html" %}"#)
        .with_template("account", "login.html", r#"{% extends "homepage/base.html" %}"#)
        .with_template("account", "settings/profile.html", "")
        .with_template("account", "plain.html", "")
        .with_script("homepage", "base")
        .with_script("homepage", "index")
        .with_script("account", "login")
        .with_script("account", "settings/profile")
        .build()
        .unwrap()
}

#[test]
fn test_bundle_writes_one_file_per_app() {
    let project = site();

    pagewright(&project)
        .arg("bundle")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created homepage/scripts/__entry__.js"))
        .stdout(predicate::str::contains("Created account/scripts/__entry__.js"));

    let homepage = project.read("homepage/scripts/__entry__.js").unwrap();
    assert!(homepage.contains("// Contains links for app: homepage\n"));
    assert!(homepage.contains("\"homepage/index\", () => {\n    require(\"./base.js\");\n    require(\"./index.js\");"));
    assert!(!homepage.contains("draft"));

    let account = project.read("account/scripts/__entry__.js").unwrap();
    assert!(account.contains("\"account/login\", () => {\n    require(\"./login.js\");\n  })"));
    assert!(account.contains("\"account/settings/profile\", () => {\n    require(\"./settings/profile.js\");"));
    assert!(!account.contains("homepage/scripts/base.js"));
    assert!(!account.contains("account/plain"));
}

#[test]
fn test_bundle_single_file_and_overwrite_refusal() {
    let project = site();

    pagewright(&project).args(["bundle", "--single", "combined.js"]).assert().success();

    let content = project.read("combined.js").unwrap();
    assert!(content.starts_with("// Generated on "));
    assert!(content.contains("// Contains links for apps: account, homepage\n"));
    for name in ["homepage/base", "homepage/index", "account/login", "account/settings/profile"] {
        assert!(content.contains(&format!("setTemplateFunction(\"{name}\"")), "missing {name}");
    }
    assert!(!content.contains("account/plain"));
    assert!(content.contains("require(\"./homepage/scripts/base.js\");\n    require(\"./account/scripts/login.js\");"));

    pagewright(&project)
        .args(["bundle", "--single", "combined.js"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to destroy existing file"))
        .stderr(predicate::str::contains("--overwrite"));
    assert_eq!(project.read("combined.js").unwrap(), content);

    pagewright(&project).args(["bundle", "--overwrite", "--single", "combined.js"]).assert().success();
    assert!(project.exists("combined.js"));
}

#[test]
fn test_bundle_selected_app_only() {
    let project = site();

    pagewright(&project).args(["bundle", "--single", "out/account.js", "account"]).assert().success();

    let content = project.read("out/account.js").unwrap();
    assert!(content.contains("// Contains links for app: account\n"));
    assert!(content.contains("require(\"./../account/scripts/login.js\");"));
    assert!(!content.contains("homepage"));
    assert!(!project.exists("homepage/scripts/__entry__.js"));
}

#[test]
fn test_bundle_unknown_app() {
    let project = site();

    pagewright(&project)
        .args(["bundle", "shop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("App 'shop' is not registered"));
}

#[test]
fn test_bundle_missing_base_dir() {
    let project = site();
    project.write("pagewright.toml", "[[apps]]\nname = \"homepage\"\n").unwrap();

    pagewright(&project)
        .arg("bundle")
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_dir"));
    assert!(!project.exists("homepage/scripts/__entry__.js"));
}

#[test]
fn test_bundle_invalid_base_dir() {
    let project = site();
    project.write("pagewright.toml", "base_dir = \"missing\"\n").unwrap();

    pagewright(&project)
        .arg("bundle")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid directory"));
}

#[test]
fn test_bundle_without_scripts_writes_nothing() {
    let project = ProjectBuilder::new()
        .unwrap()
        .with_app("homepage")
        .with_provider("webpack", "js_link")
        .with_template("homepage", "index.html", "")
        .build()
        .unwrap();

    pagewright(&project)
        .args(["bundle", "--single", "bundle.js"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no entry file written"));
    assert!(!project.exists("bundle.js"));
}

#[test]
fn test_bundle_app_at_custom_path() {
    let project = ProjectBuilder::new()
        .unwrap()
        .with_app("homepage")
        .with_app_at("account", "apps/account")
        .with_provider("webpack", "js_link")
        .with_template("homepage", "base.html", "{% block body %}{% endblock %}")
        .with_template("account", "login.html", r#"{% extends "homepage/base.html" %}"#)
        .with_script("homepage", "base")
        .with_script("account", "login")
        .build()
        .unwrap();

    pagewright(&project)
        .args(["bundle", "account"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created apps/account/scripts/__entry__.js (1 templates)"));

    let content = project.read("apps/account/scripts/__entry__.js").unwrap();
    assert!(content.contains("\"account/login\", () => {\n    require(\"./login.js\");\n  })"));
    assert!(!content.contains("base.js"));
}

#[test]
fn test_bundle_rejects_duplicate_app_names() {
    let project = site();
    project
        .write("pagewright.toml", "base_dir = \".\"\n[[apps]]\nname = \"account\"\n[[apps]]\nname = \"account\"\n")
        .unwrap();

    pagewright(&project)
        .arg("bundle")
        .assert()
        .failure()
        .stderr(predicate::str::contains("App 'account' is registered more than once"));
    assert!(!project.exists("account/scripts/__entry__.js"));
}

#[test]
fn test_bundle_existing_entry_file_writes_nothing() {
    let project = site();
    project.write("homepage/scripts/__entry__.js", "// previous run\n").unwrap();

    pagewright(&project)
        .arg("bundle")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to destroy existing file"));
    assert!(!project.exists("account/scripts/__entry__.js"));
    assert_eq!(project.read("homepage/scripts/__entry__.js").unwrap(), "// previous run\n");
}
