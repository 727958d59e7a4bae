//! Embedding pass for markup output
//!
//! Expands `{{ @hook args }}` calls, then inlines resources marked with an
//! `inline` attribute:
//!
//! ```text
//! <script src="app.js" inline></script>   -> <script>…</script>
//! <link href="site.css" inline>           -> <style>…</style>
//! <img src="logo.png" inline>             -> <img src="data:image/png;base64,…">
//! ```
//!
//! A target is looked up as a local source first, then as an artifact
//! already written to the output tree, then fetched when it is a URL.
//! Targets that cannot be read become `<!-- not found: … -->`.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::{Captures, Regex};

use crate::domain::ports::{Fetcher, FileSystem, HookCall, HookEnv, StageError};
use crate::error::{LatheError, LatheResult};
use crate::infrastructure::fetch::{is_remote, normalize_url};

use super::pipeline::{normalize, Pipeline};
use super::plugins::HookTable;

const MAX_HOOK_DEPTH: usize = 32;

fn hook_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*@([A-Za-z_][A-Za-z0-9_\-]*)\s*(.*?)\s*\}\}").expect("valid regex")
    })
}

fn script_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b([^>]*)>\s*</script>").expect("valid regex"))
}

fn link_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<link\b([^>]*?)/?>").expect("valid regex"))
}

fn img_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<img\b([^>]*?)/?>").expect("valid regex"))
}

fn attribute() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("valid regex")
    })
}

/// Markup after embedding, plus every file it pulled in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Embedded {
    pub text: String,
    pub deps: Vec<PathBuf>,
}

impl Embedded {
    fn add_dep(&mut self, path: PathBuf) {
        if !self.deps.contains(&path) {
            self.deps.push(path);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Script,
    Style,
    Image,
}

pub struct Embedder<'a> {
    pipeline: &'a Pipeline<'a>,
    fs: &'a dyn FileSystem,
    fetcher: &'a dyn Fetcher,
    hooks: &'a HookTable,
    /// Output root and destination -> source for artifacts written so far
    output: &'a Path,
    outputs: &'a BTreeMap<PathBuf, PathBuf>,
    depth: Cell<usize>,
}

impl<'a> Embedder<'a> {
    pub fn new(
        pipeline: &'a Pipeline<'a>,
        fs: &'a dyn FileSystem,
        fetcher: &'a dyn Fetcher,
        hooks: &'a HookTable,
        output: &'a Path,
        outputs: &'a BTreeMap<PathBuf, PathBuf>,
    ) -> Self {
        Self {
            pipeline,
            fs,
            fetcher,
            hooks,
            output,
            outputs,
            depth: Cell::new(0),
        }
    }

    /// Run the pass over `html`, the output of `file` bound for `destination`
    pub fn embed(&self, file: &Path, destination: &Path, html: &str) -> LatheResult<Embedded> {
        let mut embedded = Embedded::default();
        let expanded = self.expand_hooks(file, html, &mut embedded.deps)?;

        let text = self.inline(TagKind::Script, file, destination, &expanded, &mut embedded);
        let text = self.inline(TagKind::Style, file, destination, &text, &mut embedded);
        let text = self.inline(TagKind::Image, file, destination, &text, &mut embedded);
        embedded.text = text;
        Ok(embedded)
    }

    fn expand_hooks(&self, file: &Path, text: &str, deps: &mut Vec<PathBuf>) -> LatheResult<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in hook_call().captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();
            let args = caps.get(2).map_or("", |m| m.as_str());
            let hook_error = |message: String| LatheError::Stage {
                file: file.to_path_buf(),
                stage: format!("@{}", name),
                message,
            };

            let hook = self
                .hooks
                .get(name)
                .ok_or_else(|| hook_error("unknown hook".to_string()))?;
            let call = HookCall { name, args, file };
            let output = hook
                .expand(&call, self)
                .map_err(|e| hook_error(e.message().to_string()))?;

            out.push_str(&text[last..whole.start()]);
            out.push_str(&output.text);
            last = whole.end();
            for dep in output.deps {
                if dep != file && !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
        }

        out.push_str(&text[last..]);
        Ok(out)
    }

    fn inline(
        &self,
        kind: TagKind,
        file: &Path,
        destination: &Path,
        text: &str,
        embedded: &mut Embedded,
    ) -> String {
        let (re, src_attr) = match kind {
            TagKind::Script => (script_tag(), "src"),
            TagKind::Style => (link_tag(), "href"),
            TagKind::Image => (img_tag(), "src"),
        };

        re.replace_all(text, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let attrs = parse_attributes(&caps[1]);
            let is_inline = attrs.iter().any(|(k, _)| k.eq_ignore_ascii_case("inline"));
            let target = attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(src_attr))
                .and_then(|(_, v)| v.clone());

            let Some(target) = target.filter(|_| is_inline) else {
                return whole.to_string();
            };

            let Some(bytes) = self.load(kind, file, destination, &target, embedded) else {
                tracing::warn!(file = %file.display(), target = %target, "embed target not found");
                return format!("<!-- not found: {} -->", target);
            };

            let rest = render_attributes(&attrs, &[src_attr, "inline"]);
            match kind {
                TagKind::Script => format!("<script{}>{}</script>", rest, String::from_utf8_lossy(&bytes)),
                TagKind::Style => {
                    let rest = render_attributes(&attrs, &[src_attr, "inline", "rel", "type"]);
                    format!("<style{}>{}</style>", rest, String::from_utf8_lossy(&bytes))
                }
                TagKind::Image => format!(
                    "<img src=\"data:{};base64,{}\"{}>",
                    mime_for(&target),
                    STANDARD.encode(&bytes),
                    rest
                ),
            }
        })
        .into_owned()
    }

    /// Bytes for an embed target, recording where they came from
    fn load(
        &self,
        kind: TagKind,
        file: &Path,
        destination: &Path,
        target: &str,
        embedded: &mut Embedded,
    ) -> Option<Vec<u8>> {
        if is_remote(target) {
            let url = normalize_url(target);
            return match self.fetcher.fetch(&url) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            };
        }

        if let Some(path) = self.pipeline.resolve(file, target) {
            let bytes = self.load_source(kind, &path, embedded)?;
            embedded.add_dep(path);
            return Some(bytes);
        }

        let artifact = self.artifact_path(destination, target);
        let source = self.outputs.get(&artifact);
        let bytes = match self.fs.read_bytes(&artifact) {
            Ok(bytes) => bytes,
            Err(_) => self.load_source(kind, source?, embedded)?,
        };
        if let Some(source) = source {
            embedded.add_dep(source.clone());
        }
        Some(bytes)
    }

    fn load_source(&self, kind: TagKind, path: &Path, embedded: &mut Embedded) -> Option<Vec<u8>> {
        if kind != TagKind::Image && self.pipeline.handles(path) {
            return match self.pipeline.render_path(path) {
                Ok(rendered) => {
                    for dep in rendered.deps {
                        embedded.add_dep(dep);
                    }
                    Some(rendered.text.into_bytes())
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            };
        }
        self.fs.read_bytes(path).ok()
    }

    fn artifact_path(&self, destination: &Path, target: &str) -> PathBuf {
        let target = target.split(['?', '#']).next().unwrap_or(target);
        match target.strip_prefix('/') {
            Some(rest) => normalize(&self.output.join(rest)),
            None => normalize(
                &destination
                    .parent()
                    .unwrap_or_else(|| Path::new(""))
                    .join(target),
            ),
        }
    }
}

impl HookEnv for Embedder<'_> {
    fn resolve(&self, from: &Path, target: &str) -> Option<PathBuf> {
        self.pipeline.resolve(from, target)
    }

    fn render_text(&self, path: &Path) -> Result<(String, Vec<PathBuf>), StageError> {
        let depth = self.depth.get();
        if depth >= MAX_HOOK_DEPTH {
            return Err(StageError::new(format!(
                "hooks nested deeper than {} levels at {}",
                MAX_HOOK_DEPTH,
                path.display()
            )));
        }

        let rendered = self
            .pipeline
            .render_path(path)
            .map_err(|e| StageError::new(e.to_string()))?;

        self.depth.set(depth + 1);
        let mut deps = rendered.deps;
        let text = self.expand_hooks(path, &rendered.text, &mut deps);
        self.depth.set(depth);

        text.map(|text| (text, deps))
            .map_err(|e| StageError::new(e.to_string()))
    }
}

fn parse_attributes(raw: &str) -> Vec<(String, Option<String>)> {
    attribute()
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string());
            (caps[1].to_string(), value)
        })
        .collect()
}

fn render_attributes(attrs: &[(String, Option<String>)], skip: &[&str]) -> String {
    attrs
        .iter()
        .filter(|(k, _)| !skip.iter().any(|s| k.eq_ignore_ascii_case(s)))
        .map(|(k, v)| match v {
            Some(v) => format!(" {}=\"{}\"", k, v),
            None => format!(" {}", k),
        })
        .collect()
}

fn mime_for(target: &str) -> &'static str {
    let target = target.split(['?', '#']).next().unwrap_or(target);
    let ext = target.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}
