use std::sync::Arc;

use anyhow::Result;

use lathe::application::{BuildOptions, BuildUseCase};
use lathe::infrastructure::{JsonCacheRepository, LocalFs};

use super::Project;
use crate::ui;

pub fn cmd_build(project: Project, force: bool, dry_run: bool, json: bool) -> Result<()> {
    if json {
        ui::json::emit(serde_json::json!({
            "event": "start",
            "command": "build",
            "root": project.root.display().to_string(),
            "force": force,
            "dry_run": dry_run
        }))?;
    }

    let use_case = BuildUseCase::new(JsonCacheRepository::new(), Arc::new(LocalFs::new()))
        .with_fetcher(super::fetcher());
    let options = BuildOptions::new().with_force(force).with_dry_run(dry_run);
    let report = use_case.execute(project.config, project.plugins, options)?;

    if json {
        ui::json::emit(serde_json::json!({
            "event": "complete",
            "command": "build",
            "data": serde_json::to_value(&report)?
        }))?;
    } else {
        print!("{}", ui::output::render_build_report(&report, &project.root, dry_run, ui::use_color()));
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
