//! Scenario: edit-rebuild loop
//!
//! A developer builds once, touches nothing and rebuilds (nothing happens),
//! then edits a deeply included partial and expects exactly the pages that
//! pull it in to be rebuilt.

use crate::common::*;

#[test]
fn rebuilding_an_unchanged_project_is_a_noop() {
    let mut project = MemoryProject::new();
    project.add("index.md", "# Home", 1);
    project.add("site.css", "body{}", 1);
    project.add("data/site.yml", "name: lathe", 1);

    let first = project.builder.run_batch(false);
    assert!(first.is_success(), "{:?}", first.failures);
    assert_eq!(first.compiled.len(), 3);
    assert_eq!(project.output("data/site.json").as_deref(), Some("{\n  \"name\": \"lathe\"\n}\n"));

    let mtimes: Vec<_> = ["index.html", "site.css", "data/site.json"]
        .iter()
        .map(|p| project.fs.mtime(out(p)))
        .collect();
    let writes = project.fs.writes().len();

    let second = project.builder.run_batch(false);
    assert!(second.is_noop());
    assert_eq!(second.hops, 0);
    assert_eq!(project.fs.writes().len(), writes);

    let after: Vec<_> = ["index.html", "site.css", "data/site.json"]
        .iter()
        .map(|p| project.fs.mtime(out(p)))
        .collect();
    assert_eq!(mtimes, after);
}

#[test]
fn editing_a_nested_partial_rebuilds_only_its_includers() {
    let mut project = MemoryProject::new();
    project.add("_links.html", LINKS, 1);
    project.add("_nav.html", NAV, 1);
    project.add("index.html", INDEX_WITH_NAV, 1);
    project.add("about.html", "<p>no nav here</p>", 1);

    let first = project.builder.run_batch(false);
    assert!(first.is_success(), "{:?}", first.failures);
    assert_eq!(
        project.output("index.html").as_deref(),
        Some("<main><nav><a href=\"/\">home</a></nav></main>")
    );
    assert!(project.output("_nav.html").is_none(), "partials are never written");

    let index = project.builder.cache().get_path(&src("index.html")).unwrap();
    assert!(index.depends_on(&src("_nav.html")));
    assert!(index.depends_on(&src("_links.html")));

    project.edit("_links.html", "<a href=\"/blog\">blog</a>", 50);
    let second = project.builder.run_batch(false);

    assert!(second.is_success(), "{:?}", second.failures);
    assert!(second.hops >= 1);
    assert_eq!(second.compiled, vec![src("index.html")]);
    assert_eq!(
        project.output("index.html").as_deref(),
        Some("<main><nav><a href=\"/blog\">blog</a></nav></main>")
    );

    assert!(project.builder.run_batch(false).is_noop());
}

#[test]
fn failed_compile_is_retried_after_the_fix() {
    let mut project = MemoryProject::new();
    project.add("post.md", BROKEN_FRONTMATTER, 1);

    let first = project.builder.run_batch(false);
    assert_eq!(first.failures.len(), 1);
    assert_eq!(first.failures[0].file, Some(src("post.md")));
    assert!(project.output("post.html").is_none());

    project.edit("post.md", "---\ntitle: Fixed\n---\nbody\n", 10);
    let second = project.builder.run_batch(false);
    assert!(second.is_success(), "{:?}", second.failures);
    assert_eq!(second.compiled, vec![src("post.md")]);
    assert!(project.output("post.html").unwrap().contains("body"));
}

#[test]
fn deleting_a_source_removes_its_output() {
    let mut project = MemoryProject::new();
    project.add("a.md", "# A", 1);
    project.add("b.md", "# B", 1);
    assert!(project.builder.run_batch(false).is_success());

    project.remove("b.md");
    let report = project.builder.run_batch(false);

    assert_eq!(report.removed, vec![out("b.html")]);
    assert!(project.output("b.html").is_none());
    assert!(project.output("a.html").is_some());
    assert!(!project.builder.cache().contains(&src("b.md").to_string_lossy()));
}

#[test]
fn force_rebuilds_everything() {
    let mut project = MemoryProject::new();
    project.add("a.md", "# A", 1);
    project.add("b.css", "b{}", 1);
    assert!(project.builder.run_batch(false).is_success());

    let forced = project.builder.run_batch(true);
    assert_eq!(forced.compiled.len(), 2);
}
