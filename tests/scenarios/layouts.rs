//! Scenario: pages rendered into layouts
//!
//! A markdown page names a layout in its front matter. The layout becomes
//! a dependency: editing it rebuilds the page, editing the page leaves
//! the layout alone.

use crate::common::*;

fn project() -> MemoryProject {
    let mut project = MemoryProject::new();
    project.add("_layout.html", LAYOUT, 1);
    project.add("about.md", PAGE_WITH_LAYOUT, 1);
    project
}

#[test]
fn page_is_composed_into_its_layout() {
    let mut project = project();
    let report = project.builder.run_batch(false);
    assert!(report.is_success(), "{:?}", report.failures);

    let html = project.output("about.html").unwrap();
    assert!(html.starts_with("<html><title>About</title><body>"), "{html}");
    assert!(html.contains("<h1>About us</h1>"));
    assert!(html.ends_with("</body></html>"));

    let entry = project.builder.cache().get_path(&src("about.md")).unwrap();
    assert_eq!(entry.deps(), &[src("_layout.html")]);
}

#[test]
fn editing_the_layout_rebuilds_the_page() {
    let mut project = project();
    assert!(project.builder.run_batch(false).is_success());

    project.edit(
        "_layout.html",
        "<html><body class=\"wide\">{{ yield }}</body></html>",
        40,
    );
    let report = project.builder.run_batch(false);

    assert_eq!(report.compiled, vec![src("about.md")]);
    assert!(project.output("about.html").unwrap().contains("class=\"wide\""));
}

#[test]
fn layout_cycle_fails_the_page_only() {
    let mut project = MemoryProject::new();
    project.add("_a.html", "---\n$render: _b.html\n---\n{{ yield }}", 1);
    project.add("_b.html", "---\n$render: _a.html\n---\n{{ yield }}", 1);
    project.add("loop.md", "---\n$render: _a.html\n---\ntext", 1);
    project.add("fine.md", "# Fine", 1);

    let report = project.builder.run_batch(false);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, Some(src("loop.md")));
    assert!(report.failures[0].message.contains("cycle"), "{}", report.failures[0].message);
    assert!(project.output("fine.html").is_some());
}
