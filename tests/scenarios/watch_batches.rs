//! Scenario: a watch session
//!
//! Editors save in bursts (write a temp file, rename it over the original,
//! touch it again). The scheduler must fold each burst into one batch,
//! run batches one after another, and leave the output tree consistent.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lathe::application::watch::{ChangeKind, Phase, WatchScheduler};
use lathe::infrastructure::MemoryFs;

use crate::common::*;

const DEBOUNCE: Duration = Duration::from_millis(100);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn started() -> (Arc<MemoryFs>, WatchScheduler) {
    let mut project = MemoryProject::new();
    project.add("_layout.html", LAYOUT, 1);
    project.add("about.md", PAGE_WITH_LAYOUT, 1);
    project.add("contact.md", "---\ntitle: Contact\n$render: _layout.html\n---\nmail us\n", 1);
    project.add("site.css", "body{}", 1);

    let (fs, builder) = project.into_parts();
    let mut scheduler = WatchScheduler::new(builder, DEBOUNCE);
    let first = scheduler.prime();
    assert!(first.report.is_success(), "{:?}", first.report.failures);
    assert_eq!(first.report.compiled.len(), 3);
    (fs, scheduler)
}

#[test]
fn atomic_save_burst_becomes_one_change() {
    let (fs, mut scheduler) = started();
    let path = src("about.md");
    let t0 = Instant::now();

    fs.delete(&path);
    scheduler.notify_at(path.clone(), ChangeKind::Removed, t0);
    fs.put(&path, "---\ntitle: About\n$render: _layout.html\n---\nnew text\n", 60);
    scheduler.notify_at(path.clone(), ChangeKind::Changed, t0 + ms(5));
    scheduler.notify_at(path.clone(), ChangeKind::Changed, t0 + ms(20));

    assert!(scheduler.poll_at(t0 + ms(110)).is_none(), "window restarts on every event");
    let settled = scheduler.poll_at(t0 + ms(120)).unwrap();

    assert_eq!(settled.changes, vec![(path.clone(), ChangeKind::Changed)]);
    assert!(settled.report.is_success(), "{:?}", settled.report.failures);
    assert_eq!(settled.report.compiled, vec![path]);
    assert!(output_of(&fs, "about.html").unwrap().contains("new text"));
}

#[test]
fn layout_edit_rebuilds_every_page_in_one_batch() {
    let (fs, mut scheduler) = started();
    let t0 = Instant::now();

    fs.put(src("_layout.html"), "<article>{{ yield }}</article>", 70);
    scheduler.notify_at(src("_layout.html"), ChangeKind::Changed, t0);
    assert_eq!(scheduler.phase(), Phase::Collecting);

    let settled = scheduler.poll_at(t0 + DEBOUNCE).unwrap();
    let mut compiled = settled.report.compiled.clone();
    compiled.sort();
    assert_eq!(compiled, vec![src("about.md"), src("contact.md")]);
    assert_eq!(settled.report.hops, 1);
    assert!(output_of(&fs, "contact.html").unwrap().starts_with("<article>"));
    assert!(settled.announce.is_empty(), "only the first batch announces");
}

#[test]
fn events_for_outputs_and_hidden_files_never_schedule_work() {
    let (_fs, mut scheduler) = started();

    assert!(!scheduler.notify(out("about.html"), ChangeKind::Changed));
    assert!(!scheduler.notify(src(".about.md.swp"), ChangeKind::Changed));
    assert!(!scheduler.notify(PathBuf::from("/p/.lathe-cache.json"), ChangeKind::Changed));
    assert!(!scheduler.has_pending());
}

#[test]
fn new_file_during_watch_is_built() {
    let (fs, mut scheduler) = started();
    let t0 = Instant::now();

    fs.put(src("js/app.js"), "boot()", 80);
    assert!(scheduler.notify_at(src("js/app.js"), ChangeKind::Changed, t0));

    let settled = scheduler.poll_at(t0 + DEBOUNCE).unwrap();
    assert_eq!(settled.report.compiled, vec![src("js/app.js")]);
    assert_eq!(output_of(&fs, "js/app.js").as_deref(), Some("boot()"));
}
