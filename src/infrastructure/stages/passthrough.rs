use crate::domain::ports::stage::{Stage, StageContext, StageError};

/// Leaves text untouched; the declared label becomes the output extension
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughStage;

impl Stage for PassthroughStage {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn run(&self, _ctx: &mut StageContext) -> Result<(), StageError> {
        Ok(())
    }
}
