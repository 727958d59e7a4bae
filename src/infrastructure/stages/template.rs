//! Template stage
//!
//! `{{ key }}` and `{{ a.b }}` interpolation from locals, then front-matter
//! data. Hook calls (`{{ @name args }}`) are left for the embedding pass.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::domain::ports::stage::{Stage, StageContext, StageError};

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_\-]*(?:\.[A-Za-z0-9_\-]+)*)\s*\}\}")
            .expect("valid regex")
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateStage;

impl Stage for TemplateStage {
    fn name(&self) -> &str {
        "template"
    }

    fn run(&self, ctx: &mut StageContext) -> Result<(), StageError> {
        let rendered = placeholder()
            .replace_all(&ctx.text, |caps: &Captures<'_>| {
                ctx.lookup(&caps[1]).map(render_value).unwrap_or_default()
            })
            .into_owned();
        ctx.text = rendered;
        Ok(())
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
