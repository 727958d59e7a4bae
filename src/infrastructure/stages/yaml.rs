//! YAML data files compile to JSON

use crate::domain::ports::stage::{Stage, StageContext, StageError};

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlStage;

impl Stage for YamlStage {
    fn name(&self) -> &str {
        "yaml"
    }

    fn run(&self, ctx: &mut StageContext) -> Result<(), StageError> {
        let value: serde_json::Value = if ctx.text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_yaml_ng::from_str(&ctx.text).map_err(|e| StageError::new(e.to_string()))?
        };
        ctx.text = serde_json::to_string_pretty(&value).map_err(|e| StageError::new(e.to_string()))?;
        ctx.text.push('\n');
        Ok(())
    }
}
