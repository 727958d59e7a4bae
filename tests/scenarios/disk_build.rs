//! Scenario: one-shot builds against a real project directory
//!
//! The dependency cache is persisted between runs, so a second build in a
//! fresh process finds nothing to do until something on disk changes.

use std::sync::Arc;

use lathe::application::{registry_for, BuildOptions, BuildUseCase};
use lathe::infrastructure::{JsonCacheRepository, LocalFs};
use lathe::Config;

use crate::common::*;

fn build(project: &TestProject, config: &Config, options: BuildOptions) -> lathe::BuildReport {
    let plugins = registry_for(config, &[]).unwrap();
    BuildUseCase::new(JsonCacheRepository::new(), Arc::new(LocalFs::new()))
        .execute(config.clone(), plugins, options)
        .unwrap()
}

fn site() -> (TestProject, Config) {
    let project = TestProject::new();
    project
        .write("src/_layout.html", LAYOUT)
        .write("src/about.md", PAGE_WITH_LAYOUT)
        .write("src/css/site.css", "body { margin: 0 }")
        .write("src/.draft.md", "# hidden");
    let config = Config::default().resolve_paths(project.root());
    (project, config)
}

#[test]
fn second_run_reuses_the_persisted_cache() {
    let (project, config) = site();

    let first = build(&project, &config, BuildOptions::new());
    assert!(first.is_success(), "{:?}", first.failures);
    assert_eq!(first.compiled.len(), 2);
    assert!(project.exists(".lathe-cache.json"));
    assert!(project.read("build/about.html").contains("<h1>About us</h1>"));
    assert!(!project.exists("build/.draft.html"));
    assert!(!project.exists("build/_layout.html"));

    let second = build(&project, &config, BuildOptions::new());
    assert!(second.is_noop(), "{:?}", second);

    let forced = build(&project, &config, BuildOptions::new().with_force(true));
    assert_eq!(forced.compiled.len(), 2);
}

#[test]
fn deleted_output_is_regenerated() {
    let (project, config) = site();
    assert!(build(&project, &config, BuildOptions::new()).is_success());

    std::fs::remove_file(project.path("build/css/site.css")).unwrap();
    let report = build(&project, &config, BuildOptions::new());

    assert_eq!(report.compiled, vec![project.path("src/css/site.css")]);
    assert!(project.exists("build/css/site.css"));
}

#[test]
fn dry_run_writes_nothing() {
    let (project, config) = site();
    let report = build(&project, &config, BuildOptions::new().with_dry_run(true));

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.compiled.len(), 2);
    assert!(report.written.is_empty());
    assert!(!project.exists("build"));
    assert!(!project.exists(".lathe-cache.json"));
}

#[test]
fn exclude_globs_keep_files_out_of_the_build() {
    let (project, mut config) = site();
    config.build.exclude = vec!["css/**".into()];

    let report = build(&project, &config, BuildOptions::new());
    assert_eq!(report.compiled, vec![project.path("src/about.md")]);
    assert!(!project.exists("build/css/site.css"));
}

#[test]
fn corrupt_cache_is_treated_as_empty() {
    let (project, config) = site();
    project.write(".lathe-cache.json", "{ not json");

    let report = build(&project, &config, BuildOptions::new());
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.compiled.len(), 2);
}
