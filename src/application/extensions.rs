//! Extension Registry
//!
//! Suffix token -> (stage, declared output label). Seeded with the built-in
//! stages; plugins add more at startup. The last registration for a suffix
//! wins.
//!
//! Literate tokens name languages whose sources may be written as markdown
//! (`app.coffee.md`). Markdown only extracts code when the next token is one
//! of them; anything else (`post.en.md`, `index.html.md`) renders as prose.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::domain::ports::Stage;
use crate::domain::value_objects::{is_modifier, SuffixChain};
use crate::infrastructure::stages::{MarkdownStage, PassthroughStage, TemplateStage, YamlStage};

/// A stage bound to a suffix
#[derive(Clone)]
pub struct StageBinding {
    pub stage: Arc<dyn Stage>,
    /// Output label set before the stage runs; `None` keeps the token itself
    pub label: Option<String>,
}

impl StageBinding {
    pub fn label_for<'a>(&'a self, token: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(token)
    }
}

impl std::fmt::Debug for StageBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageBinding")
            .field("stage", &self.stage.name())
            .field("label", &self.label)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    bindings: BTreeMap<String, StageBinding>,
    literate: BTreeSet<String>,
}

/// Languages accepted as literate markdown out of the box
pub const LITERATE_TOKENS: &[&str] = &["coffee", "litcoffee"];

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in stages
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(&["md", "markdown"], Arc::new(MarkdownStage), Some("html"));
        registry.register(&["html", "htm"], Arc::new(TemplateStage), Some("html"));
        registry.register(&["yml", "yaml"], Arc::new(YamlStage), Some("json"));
        registry.register(
            &["js", "css", "json", "txt", "svg", "xml"],
            Arc::new(PassthroughStage),
            None,
        );
        registry.mark_literate(LITERATE_TOKENS);
        registry
    }

    /// Accept `tokens` as languages written in literate markdown
    pub fn mark_literate(&mut self, tokens: &[&str]) {
        self.literate
            .extend(tokens.iter().map(|t| t.trim_start_matches('.').to_string()));
    }

    pub fn is_literate(&self, token: &str) -> bool {
        self.literate.contains(token)
    }

    /// Whether `binding` runs in literate mode when `next` follows it
    pub fn literate_for(&self, binding: &StageBinding, next: Option<&str>) -> bool {
        binding.stage.reads_literate() && next.is_some_and(|n| self.is_literate(n))
    }

    pub fn register(&mut self, suffixes: &[&str], stage: Arc<dyn Stage>, label: Option<&str>) {
        for suffix in suffixes {
            let suffix = suffix.trim_start_matches('.').to_string();
            if self.bindings.contains_key(&suffix) {
                tracing::debug!(suffix = %suffix, stage = stage.name(), "replacing stage binding");
            }
            self.bindings.insert(
                suffix,
                StageBinding {
                    stage: Arc::clone(&stage),
                    label: label.map(String::from),
                },
            );
        }
    }

    pub fn get(&self, token: &str) -> Option<&StageBinding> {
        self.bindings.get(token)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.bindings.contains_key(token)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &StageBinding)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether the walk must stop at `token`
    pub fn stops_at(&self, token: &str, disabled: &[String]) -> bool {
        disabled.iter().any(|d| d == token) || is_modifier(token) || !self.contains(token)
    }

    /// Whether a file with this chain has a per-file stage at all
    pub fn handles(&self, chain: &SuffixChain, disabled: &[String]) -> bool {
        chain
            .last()
            .is_some_and(|token| !self.stops_at(token, disabled))
    }

    /// Output label the chain settles to, without running any stage
    pub fn predict_label(&self, chain: &SuffixChain, disabled: &[String], exempt: &[String]) -> String {
        let tokens = chain.tokens();
        let mut label: Option<String> = None;

        for index in (0..tokens.len()).rev() {
            let token = tokens[index].as_str();
            if self.stops_at(token, disabled) {
                return chain.preserved_label(index, carried(label.as_deref(), token));
            }
            if let Some(binding) = self.get(token) {
                let next = index.checked_sub(1).map(|i| tokens[i].as_str());
                label = match next {
                    Some(next) if self.literate_for(binding, Some(next)) => Some(next.to_string()),
                    _ => Some(binding.label_for(token).to_string()),
                };
            }
        }

        chain.settle(label.as_deref().unwrap_or_default(), exempt)
    }
}

/// Label carried into a preserved name: dropped when a literate stage
/// already handed the label to the token we stopped at
pub fn carried<'a>(label: Option<&'a str>, token: &str) -> Option<&'a str> {
    label.filter(|l| *l != token)
}
