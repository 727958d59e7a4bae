//! Built-in `copy` namespace
//!
//! Files matched by the configured `copy` patterns are mirrored into the
//! output tree unchanged, as one namespace group.

use std::path::PathBuf;

use crate::domain::ports::batch_handler::{BatchError, BatchHandler, NamespaceOutput};
use crate::domain::value_objects::OutputLayout;

pub const COPY_NAMESPACE: &str = "copy";

pub struct CopyHandler {
    layout: OutputLayout,
}

impl CopyHandler {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }
}

impl BatchHandler for CopyHandler {
    fn handle(&self, paths: &[PathBuf]) -> Result<Vec<NamespaceOutput>, BatchError> {
        paths
            .iter()
            .map(|path| {
                if self.layout.is_output(path) {
                    return Err(BatchError(format!(
                        "{} is inside the output directory",
                        path.display()
                    )));
                }
                Ok(NamespaceOutput::copy(self.layout.mirror(path), path.clone()))
            })
            .collect()
    }
}
