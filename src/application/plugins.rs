//! Plugin/Namespace Registry
//!
//! Plugins are installed once at startup. Each receives a [`PluginContext`]
//! with three capabilities:
//!
//! - `register` binds suffixes to a stage in the extension registry
//! - `filter` binds a path regex to a namespace batch handler
//! - `setup` merges template hooks used by the embedding pass

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;

use crate::config::Config;
use crate::domain::ports::{BatchHandler, Hook, Stage};
use crate::error::{LatheError, LatheResult};
use crate::infrastructure::hooks::IncludeHook;
use crate::infrastructure::namespaces::{CopyHandler, COPY_NAMESPACE};
use crate::infrastructure::stages::CommandStage;

use super::extensions::ExtensionRegistry;

/// Named template hooks
#[derive(Clone, Default)]
pub struct HookTable {
    hooks: BTreeMap<String, Arc<dyn Hook>>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding `include`
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.insert("include", Arc::new(IncludeHook));
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, hook: Arc<dyn Hook>) {
        self.hooks.insert(name.into(), hook);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Hook>> {
        self.hooks.get(name)
    }

    /// Merge `other` in; its hooks replace ours on name clashes
    pub fn merge(&mut self, other: HookTable) {
        self.hooks.extend(other.hooks);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(|k| k.as_str())
    }
}

impl std::fmt::Debug for HookTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.hooks.keys()).finish()
    }
}

/// A regex bound to a batch handler under a namespace label
#[derive(Clone)]
pub struct NamespaceBinding {
    pub pattern: Regex,
    pub label: String,
    pub handler: Arc<dyn BatchHandler>,
}

impl std::fmt::Debug for NamespaceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceBinding")
            .field("pattern", &self.pattern.as_str())
            .field("label", &self.label)
            .finish()
    }
}

/// Ordered namespace matchers; the first match claims a path
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    bindings: Vec<NamespaceBinding>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, binding: NamespaceBinding) {
        self.bindings.push(binding);
    }

    pub fn matching(&self, path: &Path) -> Option<&NamespaceBinding> {
        let text = path.to_string_lossy();
        self.bindings.iter().find(|b| b.pattern.is_match(&text))
    }

    /// Handler registered under `label`
    pub fn handler(&self, label: &str) -> Option<&Arc<dyn BatchHandler>> {
        self.bindings
            .iter()
            .find(|b| b.label == label)
            .map(|b| &b.handler)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.label.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Everything plugins can extend
#[derive(Debug, Clone)]
pub struct PluginRegistry {
    pub extensions: ExtensionRegistry,
    pub namespaces: NamespaceRegistry,
    pub hooks: HookTable,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl PluginRegistry {
    /// Built-in stages and hooks, no namespaces
    pub fn with_builtins() -> Self {
        Self {
            extensions: ExtensionRegistry::with_builtins(),
            namespaces: NamespaceRegistry::new(),
            hooks: HookTable::with_builtins(),
        }
    }

    pub fn install(&mut self, plugin: &dyn Plugin) -> LatheResult<()> {
        tracing::debug!(plugin = plugin.name(), "installing plugin");
        let mut ctx = PluginContext { registry: self };
        plugin.install(&mut ctx)
    }
}

/// Registration context handed to [`Plugin::install`]
pub struct PluginContext<'a> {
    registry: &'a mut PluginRegistry,
}

impl PluginContext<'_> {
    pub fn register(&mut self, suffixes: &[&str], stage: Arc<dyn Stage>, label: Option<&str>) {
        self.registry.extensions.register(suffixes, stage, label);
    }

    pub fn filter(
        &mut self,
        pattern: &str,
        handler: Arc<dyn BatchHandler>,
        namespace: &str,
    ) -> LatheResult<()> {
        let pattern = Regex::new(pattern).map_err(|e| LatheError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.registry.namespaces.add(NamespaceBinding {
            pattern,
            label: namespace.to_string(),
            handler,
        });
        Ok(())
    }

    /// Accept `suffixes` as literate markdown languages
    pub fn literate(&mut self, suffixes: &[&str]) {
        self.registry.extensions.mark_literate(suffixes);
    }

    pub fn setup(&mut self, hooks: HookTable) {
        self.registry.hooks.merge(hooks);
    }
}

pub trait Plugin {
    fn name(&self) -> &str;

    fn install(&self, ctx: &mut PluginContext<'_>) -> LatheResult<()>;
}

/// Installs what `lathe.toml` declares: `[stages.*]` commands and the
/// `copy` namespace
pub struct ConfigPlugin<'a> {
    config: &'a Config,
}

impl<'a> ConfigPlugin<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }
}

impl Plugin for ConfigPlugin<'_> {
    fn name(&self) -> &str {
        "config"
    }

    fn install(&self, ctx: &mut PluginContext<'_>) -> LatheResult<()> {
        for (suffix, stage) in &self.config.stages {
            let mut command = CommandStage::new(suffix.clone(), stage.command.clone(), stage.args.clone());
            if let Some(cwd) = self.config.target_root() {
                command = command.with_cwd(cwd);
            }
            ctx.register(&[suffix.as_str()], Arc::new(command), stage.output.as_deref());
            if stage.literate {
                ctx.literate(&[suffix.as_str()]);
            }
        }

        if !self.config.build.copy.is_empty() {
            let handler: Arc<dyn BatchHandler> = Arc::new(CopyHandler::new(self.config.layout()));
            for pattern in &self.config.build.copy {
                ctx.filter(pattern, Arc::clone(&handler), COPY_NAMESPACE)?;
            }
        }

        Ok(())
    }
}

/// Registry for `config` with the config plugin installed
pub fn registry_for(config: &Config, plugins: &[&dyn Plugin]) -> LatheResult<PluginRegistry> {
    let mut registry = PluginRegistry::with_builtins();
    registry.install(&ConfigPlugin::new(config))?;
    for plugin in plugins {
        registry.install(*plugin)?;
    }
    Ok(registry)
}

/// Paths a namespace handler claimed, grouped by label
pub type NamespaceGroups = BTreeMap<String, Vec<PathBuf>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::domain::ports::{BatchError, HookCall, HookEnv, HookOutput, NamespaceOutput, StageError};

    struct Discard;

    impl BatchHandler for Discard {
        fn handle(&self, _paths: &[PathBuf]) -> Result<Vec<NamespaceOutput>, BatchError> {
            Ok(Vec::new())
        }
    }

    struct Year;

    impl Hook for Year {
        fn expand(&self, _call: &HookCall<'_>, _env: &dyn HookEnv) -> Result<HookOutput, StageError> {
            Ok(HookOutput {
                text: "2026".into(),
                deps: Vec::new(),
            })
        }
    }

    struct Sprites;

    impl Plugin for Sprites {
        fn name(&self) -> &str {
            "sprites"
        }

        fn install(&self, ctx: &mut PluginContext<'_>) -> LatheResult<()> {
            ctx.filter(r"/icons/.*\.svg$", Arc::new(Discard), "sprites")?;
            let mut hooks = HookTable::new();
            hooks.insert("year", Arc::new(Year));
            ctx.setup(hooks);
            Ok(())
        }
    }

    #[test]
    fn plugin_capabilities_land_in_registry() {
        let mut registry = PluginRegistry::with_builtins();
        registry.install(&Sprites).unwrap();

        let binding = registry
            .namespaces
            .matching(Path::new("/src/icons/home.svg"))
            .unwrap();
        assert_eq!(binding.label, "sprites");
        assert!(registry.namespaces.matching(Path::new("/src/logo.svg")).is_none());
        assert!(registry.hooks.get("year").is_some());
        assert!(registry.hooks.get("include").is_some());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        struct Broken;
        impl Plugin for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn install(&self, ctx: &mut PluginContext<'_>) -> LatheResult<()> {
                ctx.filter("(unclosed", Arc::new(Discard), "x")
            }
        }

        let err = PluginRegistry::with_builtins().install(&Broken).unwrap_err();
        assert!(matches!(err, LatheError::Pattern { .. }));
    }

    #[test]
    fn config_plugin_registers_stages_and_copy() {
        let mut config = Config::default();
        config.build.copy = vec![r"\.png$".into()];
        config.stages.insert(
            "coffee".into(),
            StageConfig {
                command: "coffee".into(),
                args: vec!["--stdio".into()],
                output: Some("js".into()),
                literate: false,
            },
        );
        config.stages.insert(
            "ts".into(),
            StageConfig {
                command: "tsc".into(),
                args: Vec::new(),
                output: Some("js".into()),
                literate: true,
            },
        );

        let registry = registry_for(&config, &[]).unwrap();
        let coffee = registry.extensions.get("coffee").unwrap();
        assert_eq!(coffee.label.as_deref(), Some("js"));
        assert!(registry.extensions.is_literate("ts"));
        assert_eq!(
            registry
                .namespaces
                .matching(Path::new("/src/a.png"))
                .map(|b| b.label.as_str()),
            Some(COPY_NAMESPACE)
        );
    }
}
