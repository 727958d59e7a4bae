use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use lathe::application::watch::{WatchEvent, WatchOptions, WatchUseCase};
use lathe::infrastructure::JsonCacheRepository;

use super::Project;
use crate::ui;

pub fn cmd_watch(project: Project, dry_run: bool, exec: Option<String>, json: bool) -> Result<()> {
    let mut config = project.config;
    if exec.is_some() {
        config.watch.exec = exec;
    }

    let options = WatchOptions::new(project.root.clone())
        .with_config(config)
        .with_json(json)
        .with_dry_run(dry_run);

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")?;

    let color = ui::use_color();
    let root = project.root;
    let use_case = WatchUseCase::new(options, JsonCacheRepository::new(), project.plugins)
        .with_fetcher(super::fetcher());

    use_case.start(running, |event| {
        if json {
            println!("{}", event.to_json());
        } else {
            let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
            let rendered = ui::output::render_watch_event(&timestamp, &event, &root, color);

            match event {
                WatchEvent::Error { .. }
                | WatchEvent::Failure { .. }
                | WatchEvent::CommandFailed { .. } => eprint!("{rendered}"),
                _ => print!("{rendered}"),
            }
        }
    })?;

    Ok(())
}
