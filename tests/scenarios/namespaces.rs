//! Scenario: a plugin-provided namespace
//!
//! An icon plugin claims `icons/*.svg` and produces one copy per icon plus
//! a shared index. The group is only valid while every output it produced
//! still exists.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use lathe::application::{PluginContext, PluginRegistry};
use lathe::domain::ports::{BatchError, BatchHandler, NamespaceOutput};
use lathe::{LatheResult, Plugin};

use crate::common::*;

#[derive(Default)]
struct IconSheet {
    calls: Mutex<Vec<Vec<PathBuf>>>,
}

impl IconSheet {
    fn calls(&self) -> Vec<Vec<PathBuf>> {
        self.calls.lock().unwrap().clone()
    }
}

impl BatchHandler for IconSheet {
    fn handle(&self, paths: &[PathBuf]) -> Result<Vec<NamespaceOutput>, BatchError> {
        self.calls.lock().unwrap().push(paths.to_vec());

        let mut outputs: Vec<NamespaceOutput> = paths
            .iter()
            .map(|p| {
                let name = p.file_name().unwrap().to_string_lossy().into_owned();
                NamespaceOutput::copy(out(&format!("icons/{name}")), p.clone())
            })
            .collect();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        outputs.push(NamespaceOutput::content(out("icons.txt"), names.join("\n")));
        Ok(outputs)
    }
}

struct IconPlugin(Arc<IconSheet>);

impl Plugin for IconPlugin {
    fn name(&self) -> &str {
        "icons"
    }

    fn install(&self, ctx: &mut PluginContext<'_>) -> LatheResult<()> {
        ctx.filter(r"/icons/[^/]+\.svg$", self.0.clone(), "icons")
    }
}

fn project() -> (MemoryProject, Arc<IconSheet>) {
    let sheet = Arc::new(IconSheet::default());
    let mut plugins = PluginRegistry::with_builtins();
    plugins.install(&IconPlugin(sheet.clone())).unwrap();

    let mut project = MemoryProject::with_plugins(plugins);
    project.add("icons/home.svg", "<svg id=\"home\"/>", 1);
    project.add("icons/user.svg", "<svg id=\"user\"/>", 1);
    project.add("logo.svg", "<svg id=\"logo\"/>", 1);
    (project, sheet)
}

#[test]
fn namespace_claims_its_files_and_leaves_the_rest() {
    let (mut project, sheet) = project();
    let report = project.builder.run_batch(false);

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(sheet.calls(), vec![vec![src("icons/home.svg"), src("icons/user.svg")]]);
    assert_eq!(report.compiled, vec![src("logo.svg")]);
    assert_eq!(project.output("icons.txt").as_deref(), Some("home\nuser"));
    assert!(project.output("icons/home.svg").is_some());

    let group = project.builder.cache().get("icons").unwrap();
    assert!(group.is_group());
    let member = project.builder.cache().get_path(&src("icons/home.svg")).unwrap();
    assert_eq!(member.group(), Some("icons"));
}

#[test]
fn losing_one_group_output_invalidates_every_member() {
    let (mut project, sheet) = project();
    assert!(project.builder.run_batch(false).is_success());

    // d1 (icons/home.svg) survives, d2 (icons.txt) is gone
    project.fs.delete(out("icons.txt"));
    let report = project.builder.run_batch(false);

    assert_eq!(sheet.calls().len(), 2);
    assert_eq!(sheet.calls()[1], vec![src("icons/home.svg"), src("icons/user.svg")]);
    assert!(report.compiled.is_empty(), "per-file work is unaffected");
    assert_eq!(project.output("icons.txt").as_deref(), Some("home\nuser"));
}

#[test]
fn one_member_edit_only_hands_that_member_over() {
    let (mut project, sheet) = project();
    assert!(project.builder.run_batch(false).is_success());

    project.touch("icons/user.svg", 30);
    project.builder.run_batch(false);

    assert_eq!(sheet.calls()[1], vec![src("icons/user.svg")]);
}

#[test]
fn removing_a_member_rebuilds_the_group_and_drops_stale_outputs() {
    let (mut project, sheet) = project();
    assert!(project.builder.run_batch(false).is_success());

    project.remove("icons/user.svg");
    let report = project.builder.run_batch(false);

    assert_eq!(sheet.calls()[1], vec![src("icons/home.svg")]);
    assert!(report.removed.contains(&out("icons/user.svg")));
    assert!(project.output("icons/user.svg").is_none());
    assert_eq!(project.output("icons.txt").as_deref(), Some("home"));
}

#[test]
fn failed_group_output_leaves_every_member_pending() {
    let (mut project, sheet) = project();
    project.fs.deny(out("icons.txt"));

    let report = project.builder.run_batch(false);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].namespace.as_deref(), Some("icons"));
    assert!(project.builder.cache().get_path(&src("icons/home.svg")).is_none());
    assert!(project.builder.cache().get_path(&src("icons/user.svg")).is_none());

    project.fs.allow(out("icons.txt"));
    let report = project.builder.run_batch(false);
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(sheet.calls()[1], vec![src("icons/home.svg"), src("icons/user.svg")]);
    assert_eq!(project.output("icons.txt").as_deref(), Some("home\nuser"));
}

fn copying_pngs() -> MemoryProject {
    let mut config = config();
    config.build.copy = vec![r"\.png$".into()];
    let plugins = lathe::application::registry_for(&config, &[]).unwrap();
    MemoryProject::with_config(config, plugins)
}

#[test]
fn failed_copy_is_retried_on_the_next_batch() {
    let mut project = copying_pngs();
    project.add("a.png", "A", 1);
    project.add("b.png", "B", 1);
    project.fs.deny(out("b.png"));

    let report = project.builder.run_batch(false);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, Some(out("b.png")));
    assert_eq!(report.written, vec![out("a.png")]);
    assert!(project.builder.cache().get_path(&src("a.png")).is_some());
    assert!(project.builder.cache().get_path(&src("b.png")).is_none());

    project.fs.allow(out("b.png"));
    let report = project.builder.run_batch(false);
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.written, vec![out("b.png")]);
    assert_eq!(project.output("b.png").as_deref(), Some("B"));
    assert_eq!(project.output("a.png").as_deref(), Some("A"));
}

#[test]
fn new_directories_are_not_sources() {
    let mut project = copying_pngs();
    project.add("posts/cover.png", "C", 1);
    assert!(project.builder.run_batch(false).is_success());

    assert!(!project.builder.file_changed(&src("posts")));
    let report = project.builder.run_batch(false);
    assert!(report.is_noop(), "{report:?}");
    assert!(report.misses.is_empty());
}
