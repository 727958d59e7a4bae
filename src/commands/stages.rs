use std::collections::BTreeSet;

use anyhow::Result;

use super::Project;
use crate::ui;

pub fn cmd_stages(project: &Project, json: bool) -> Result<()> {
    let plugins = &project.plugins;

    if json {
        let stages: Vec<_> = plugins
            .extensions
            .bindings()
            .map(|(suffix, binding)| {
                serde_json::json!({
                    "suffix": suffix,
                    "stage": binding.stage.name(),
                    "label": binding.label_for(suffix),
                })
            })
            .collect();
        ui::json::emit(serde_json::json!({
            "event": "complete",
            "command": "stages",
            "data": {
                "stages": stages,
                "namespaces": plugins.namespaces.labels().collect::<BTreeSet<_>>(),
                "hooks": plugins.hooks.names().collect::<Vec<_>>(),
            }
        }))?;
    } else {
        print!("{}", ui::output::render_stages(plugins));
    }
    Ok(())
}
