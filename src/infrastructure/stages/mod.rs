//! Built-in stages
//!
//! Seeded into the extension registry at startup; see
//! `ExtensionRegistry::with_builtins`.

mod command;
mod markdown;
mod passthrough;
mod template;
mod yaml;

pub use command::CommandStage;
pub use markdown::{extract_code, MarkdownStage};
pub use passthrough::PassthroughStage;
pub use template::TemplateStage;
pub use yaml::YamlStage;
