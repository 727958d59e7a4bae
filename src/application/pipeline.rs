//! Pipeline Engine
//!
//! Runs a file's suffix chain right to left through the extension registry,
//! settles the output label, then composes the result into its layout when
//! the front matter names one with `$render`.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value};

use crate::config::Config;
use crate::domain::ports::{FileSystem, StageContext};
use crate::domain::value_objects::{is_modifier, SuffixChain};
use crate::error::{LatheError, LatheResult};
use crate::parser::parse_source;

use super::extensions::{carried, ExtensionRegistry, StageBinding};

/// Front-matter key naming the layout a file renders into
pub const LAYOUT_KEY: &str = "$render";

/// Local holding the child's content inside its layout
pub const YIELD_KEY: &str = "yield";

/// Per-run pipeline settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOptions {
    /// Suffix tokens the chain must stop at
    pub disabled: Vec<String>,
    /// Labels that keep the full dotted suffix
    pub exempt: Vec<String>,
    /// Root for `/`-prefixed targets
    pub root: Option<PathBuf>,
    /// Global locals merged under every file's front matter
    pub locals: Map<String, Value>,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            disabled: config.build.preserve.clone(),
            exempt: config.build.exempt.clone(),
            root: config.target_root().map(Path::to_path_buf),
            locals: config.locals.clone(),
        }
    }

    /// Global locals overlaid with the fields of `data`
    pub fn locals_for(&self, data: &Value) -> Map<String, Value> {
        let mut locals = self.locals.clone();
        if let Value::Object(fields) = data {
            for (key, value) in fields {
                locals.insert(key.clone(), value.clone());
            }
        }
        locals
    }
}

/// Result of rendering one file (and its layouts)
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub label: String,
    pub deps: Vec<PathBuf>,
    /// Front matter of the rendered file, after the stages ran
    pub data: Value,
    /// Locals the stages saw; inherited by layouts
    pub locals: Map<String, Value>,
    pub install_time: Duration,
}

pub struct Pipeline<'a> {
    registry: &'a ExtensionRegistry,
    options: &'a PipelineOptions,
    fs: &'a dyn FileSystem,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        registry: &'a ExtensionRegistry,
        options: &'a PipelineOptions,
        fs: &'a dyn FileSystem,
    ) -> Self {
        Self {
            registry,
            options,
            fs,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        self.options
    }

    /// Render `body` as the content of `file`
    pub fn render(
        &self,
        file: &Path,
        body: String,
        data: Value,
        locals: Map<String, Value>,
    ) -> LatheResult<Rendered> {
        let mut visited = vec![file.to_path_buf()];
        self.render_visiting(file, body, data, locals, &mut visited)
    }

    /// Read, parse and render a file that is not in the source registry
    /// (partials, include and embed targets)
    pub fn render_path(&self, path: &Path) -> LatheResult<Rendered> {
        let source = self.fs.read(path)?;
        let parsed = parse_source(&source, path)?;
        let locals = self.options.locals_for(&parsed.data);
        self.render(path, parsed.body, parsed.data, locals)
    }

    /// Whether `path` has a stage for its last suffix
    pub fn handles(&self, path: &Path) -> bool {
        self.registry
            .handles(&SuffixChain::parse(path), &self.options.disabled)
    }

    /// Resolve a layout/include/embed target against `from`
    pub fn resolve(&self, from: &Path, target: &str) -> Option<PathBuf> {
        resolve_target(self.fs, from, target, self.options.root.as_deref())
    }

    fn render_visiting(
        &self,
        file: &Path,
        body: String,
        data: Value,
        locals: Map<String, Value>,
        visited: &mut Vec<PathBuf>,
    ) -> LatheResult<Rendered> {
        let rendered = self.run_chain(file, body, data, locals)?;
        self.compose(file, rendered, visited)
    }

    fn binding(&self, token: &str) -> Option<&'a StageBinding> {
        if self.options.disabled.iter().any(|d| d == token) || is_modifier(token) {
            return None;
        }
        self.registry.get(token)
    }

    fn run_chain(
        &self,
        file: &Path,
        body: String,
        data: Value,
        locals: Map<String, Value>,
    ) -> LatheResult<Rendered> {
        let chain = SuffixChain::parse(file);
        let tokens = chain.tokens();

        let mut ctx = StageContext::new(file, body);
        ctx.data = data;
        ctx.locals = locals;

        let mut ran = false;
        let mut preserved = None;

        for index in (0..tokens.len()).rev() {
            let token = tokens[index].as_str();
            let Some(binding) = self.binding(token) else {
                let current = if ran {
                    carried(Some(ctx.label.as_str()), token)
                } else {
                    None
                };
                preserved = Some(chain.preserved_label(index, current));
                break;
            };

            ctx.label = binding.label_for(token).to_string();
            ctx.next = index.checked_sub(1).map(|i| tokens[i].clone());
            ctx.literate = self.registry.literate_for(binding, ctx.next.as_deref());

            tracing::trace!(file = %file.display(), token, stage = binding.stage.name(), "running stage");
            binding.stage.run(&mut ctx).map_err(|e| LatheError::Stage {
                file: file.to_path_buf(),
                stage: binding.stage.name().to_string(),
                message: e.message().to_string(),
            })?;
            ran = true;
        }

        let label = match preserved {
            Some(label) => label,
            None => chain.settle(&ctx.label, &self.options.exempt),
        };

        Ok(Rendered {
            text: ctx.text,
            label,
            deps: ctx.deps,
            data: ctx.data,
            locals: ctx.locals,
            install_time: ctx.install_time,
        })
    }

    fn compose(
        &self,
        file: &Path,
        rendered: Rendered,
        visited: &mut Vec<PathBuf>,
    ) -> LatheResult<Rendered> {
        let Some(target) = rendered.data.get(LAYOUT_KEY).and_then(Value::as_str) else {
            return Ok(rendered);
        };

        let layout = self
            .resolve(file, target)
            .ok_or_else(|| LatheError::UnresolvedTarget {
                file: file.to_path_buf(),
                target: target.to_string(),
            })?;

        if visited.contains(&layout) {
            let mut chain = visited.clone();
            chain.push(layout);
            return Err(LatheError::LayoutCycle { chain });
        }
        visited.push(layout.clone());

        let source = self.fs.read(&layout)?;
        let parsed = parse_source(&source, &layout)?;

        let mut locals = self.options.locals_for(&parsed.data);
        for (key, value) in rendered.locals {
            if key != LAYOUT_KEY && key != YIELD_KEY {
                locals.insert(key, value);
            }
        }
        locals.insert(YIELD_KEY.to_string(), Value::String(rendered.text));

        let outer = self.render_visiting(&layout, parsed.body, parsed.data, locals, visited)?;

        let mut deps = rendered.deps;
        for dep in std::iter::once(layout).chain(outer.deps) {
            if dep != file && !deps.contains(&dep) {
                deps.push(dep);
            }
        }

        Ok(Rendered {
            text: outer.text,
            label: outer.label,
            deps,
            data: rendered.data,
            locals: outer.locals,
            install_time: rendered.install_time + outer.install_time,
        })
    }
}

/// Resolve `target` relative to the directory of `from`, or to `root` when it
/// starts with `/`. Only existing files resolve.
pub fn resolve_target(
    fs: &dyn FileSystem,
    from: &Path,
    target: &str,
    root: Option<&Path>,
) -> Option<PathBuf> {
    let target = target.split(['?', '#']).next().unwrap_or(target);
    if target.is_empty() {
        return None;
    }

    let candidate = match (target.strip_prefix('/'), root) {
        (Some(rest), Some(root)) => root.join(rest),
        (Some(_), None) => PathBuf::from(target),
        (None, _) => from.parent().unwrap_or_else(|| Path::new("")).join(target),
    };

    let candidate = normalize(&candidate);
    fs.exists(&candidate).then_some(candidate)
}

/// Lexically fold `.` and `..` components
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
