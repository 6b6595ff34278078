//! Integration tests for `sitegen build`

use predicates::prelude::*;
use sitegen::test_utils::TestSite;

use super::sitegen;

const SITE: &str = r#"
public_url = "https://example.org"
site_name = "Example"

[defaults]
posts = [
    { title = "First", slug = "first" },
    { title = "Second", slug = "second" },
]

[[pages]]
template = "index"
output = "index.html"
[pages.vars]
title = "Home"

[[pages]]
template = "post"
output = "posts/first/index.html"
data = "data/first.json"
"#;

fn example_site() -> TestSite {
    let site = TestSite::new().unwrap();
    site.write_config(SITE).unwrap();
    site.add_template("header.html", "<title>{{$title}} | {{$site_name}}</title>").unwrap();
    site.add_template(
        "index.html",
        "<head>{{#include header#}}</head>\n\
         <ul>\n\
         {{%for post in posts:\n\
         <li><a href=\"{{$rootdir}}posts/{{$post.slug}}/\">{{$post.title}}</a></li>\n\
         %}}\n\
         </ul>",
    )
    .unwrap();
    site.add_template(
        "post.html",
        "{{#include header#}}\n\
         <link rel=\"stylesheet\" href=\"{{$static_root}}/site.css\">\n\
         <link rel=\"canonical\" href=\"{{$canonical_url}}\">\n\
         {{%if draft:\n<p>Draft</p>\n%}}",
    )
    .unwrap();
    site.add_file("data/first.json", r#"{"title": "First", "draft": true}"#).unwrap();
    site
}

#[test]
fn test_build_site() {
    let site = example_site();

    sitegen(&site)
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Built 2 pages"));

    assert_eq!(
        site.read_output("index.html").unwrap(),
        "<!DOCTYPE html>\n\
         <head><title>Home | Example</title></head>\n\
         <ul>\n\
         <li><a href=\"posts/first/\">First</a></li>\n\
         <li><a href=\"posts/second/\">Second</a></li>\n\
         </ul>\n"
    );
    assert_eq!(
        site.read_output("posts/first/index.html").unwrap(),
        "<!DOCTYPE html>\n\
         <title>First | Example</title>\n\
         <link rel=\"stylesheet\" href=\"../../static/site.css\">\n\
         <link rel=\"canonical\" href=\"https://example.org/posts/first\">\n\
         <p>Draft</p>\n"
    );
}

#[test]
fn test_build_is_deterministic() {
    let site = example_site();

    sitegen(&site).args(["build", "--jobs", "1"]).assert().success();
    let first = site.read_output("index.html").unwrap();
    sitegen(&site).args(["build", "--jobs", "4"]).assert().success();

    assert_eq!(site.read_output("index.html").unwrap(), first);
}

#[test]
fn test_build_failure_keeps_published_page() {
    let site = example_site();
    sitegen(&site).arg("build").assert().success();
    let published = site.read_output("posts/first/index.html").unwrap();

    site.add_template("post.html", "{{%if draft:\n<p>Draft</p>").unwrap();

    sitegen(&site)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 2 pages failed to build"))
        .stderr(predicate::str::contains("template 'post'"))
        .stderr(predicate::str::contains("Unclosed"));

    assert_eq!(site.read_output("posts/first/index.html").unwrap(), published);
}

#[test]
fn test_build_strict_flag() {
    let site = example_site();
    site.add_file("data/first.json", r#"{"title": "First"}"#).unwrap();

    sitegen(&site).arg("build").assert().success();
    sitegen(&site)
        .args(["build", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("draft"));
}

#[test]
fn test_build_missing_config() {
    let site = TestSite::new().unwrap();

    sitegen(&site)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Site configuration not found"))
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn test_build_invalid_config() {
    let site = TestSite::new().unwrap();
    site.write_config("[[pages]]\ntemplate = \"index\"\noutput = \"../escape.html\"\n").unwrap();

    sitegen(&site)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a relative path"));
}
