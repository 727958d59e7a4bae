//! `{{ @include path }}` hook
//!
//! Replaces the call with the rendered target. The target and everything it
//! depends on become dependencies of the including file.

use crate::domain::ports::hook::{Hook, HookCall, HookEnv, HookOutput};
use crate::domain::ports::stage::StageError;

#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeHook;

impl Hook for IncludeHook {
    fn expand(&self, call: &HookCall<'_>, env: &dyn HookEnv) -> Result<HookOutput, StageError> {
        let target = call.args.trim().trim_matches(|c| c == '"' || c == '\'');
        if target.is_empty() {
            return Err(StageError::new("@include needs a path"));
        }

        let path = env.resolve(call.file, target).ok_or_else(|| {
            StageError::new(format!(
                "cannot resolve '{}' from {}",
                target,
                call.file.display()
            ))
        })?;

        let (text, nested) = env.render_text(&path)?;
        let mut deps = vec![path];
        for dep in nested {
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        Ok(HookOutput { text, deps })
    }
}
