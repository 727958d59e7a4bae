//! Scenario: suffix chains
//!
//! Stages run right to left over a file's suffixes. A plugin adds a
//! `coffee` stage, which turns `app.coffee.md` into literate source: the
//! markdown stage keeps only its code and hands the label to `coffee`.
//! Other tokens before `.md` leave the prose alone.

use std::sync::Arc;

use lathe::application::{PluginContext, PluginRegistry};
use lathe::domain::ports::{Stage, StageContext, StageError};
use lathe::{LatheResult, Plugin};

use crate::common::*;

/// Stands in for a compiler: upper-cases its input
struct Shout;

impl Stage for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn run(&self, ctx: &mut StageContext) -> Result<(), StageError> {
        ctx.text = ctx.text.to_uppercase();
        Ok(())
    }
}

struct CoffeePlugin;

impl Plugin for CoffeePlugin {
    fn name(&self) -> &str {
        "coffee"
    }

    fn install(&self, ctx: &mut PluginContext<'_>) -> LatheResult<()> {
        ctx.register(&["coffee"], Arc::new(Shout), Some("js"));
        Ok(())
    }
}

fn with_coffee() -> MemoryProject {
    let mut plugins = PluginRegistry::with_builtins();
    plugins.install(&CoffeePlugin).unwrap();
    MemoryProject::with_plugins(plugins)
}

#[test]
fn literate_source_compiles_through_both_stages() {
    let mut project = with_coffee();
    project.add("js/app.coffee.md", LITERATE_COFFEE, 1);

    let report = project.builder.run_batch(false);
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.written, vec![out("js/app.js")]);

    let js = project.output("js/app.js").unwrap();
    assert!(js.contains("SQUARE = (X) -> X * X"), "{js}");
    assert!(!js.contains("BOOT SEQUENCE"));
}

#[test]
fn unbound_literate_token_keeps_its_label() {
    let mut project = MemoryProject::new();
    project.add("notes.coffee.md", LITERATE_COFFEE, 1);

    let report = project.builder.run_batch(false);
    assert!(report.is_success(), "{:?}", report.failures);
    assert!(project.output("notes.coffee").unwrap().contains("square = (x) -> x * x"));
}

#[test]
fn language_token_before_markdown_keeps_the_prose() {
    let mut project = with_coffee();
    project.add("post.en.md", "# Hello\n\nSome prose here.", 1);

    let report = project.builder.run_batch(false);
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.written, vec![out("post.en.html")]);

    let html = project.output("post.en.html").unwrap();
    assert!(html.contains("<h1>Hello</h1>"), "{html}");
    assert!(html.contains("<p>Some prose here.</p>"), "{html}");
    assert!(project.output("post.en").is_none());
}

#[test]
fn markdown_feeding_a_template_stays_html() {
    let mut project = MemoryProject::new();
    project.add("index.html.md", "---\ntitle: Home\n---\n# {{ title }}\n", 1);

    let report = project.builder.run_batch(false);
    assert!(report.is_success(), "{:?}", report.failures);
    let html = project.output("index.html").unwrap();
    assert!(html.contains("<h1>Home</h1>"), "{html}");
}

#[test]
fn modifier_tokens_keep_the_full_suffix() {
    let mut project = MemoryProject::new();
    project.add("name.test.js", "test('ok')", 1);
    project.add("main.bundle.js", "run()", 1);

    let report = project.builder.run_batch(false);
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(project.output("name.test.js").as_deref(), Some("test('ok')"));
    assert_eq!(project.output("main.bundle.js").as_deref(), Some("run()"));
    assert!(project.output("name.js").is_none());
}

#[test]
fn preserved_token_stops_the_chain() {
    let mut config = config();
    config.build.preserve = vec!["md".into()];
    let mut project = MemoryProject::with_config(config, PluginRegistry::with_builtins());
    project.add("README.md", "# Raw", 1);

    assert!(project.builder.run_batch(false).is_success());
    assert_eq!(project.output("README.md").as_deref(), Some("# Raw"));
}
