//! Source record compile lifecycle
//!
//! `Created -> Parsing -> Piped -> (Embedding) -> Written | Failed`
//!
//! Binary files skip the stage chain and are copied verbatim. Markup output
//! goes through the embedding pass before it is written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde_json::{Map, Value};

use crate::domain::entities::SourceRecord;
use crate::domain::ports::{Fetcher, FileSystem, OfflineFetcher};
use crate::domain::value_objects::{is_markup, Content, OutputLayout, SuffixChain};
use crate::error::LatheResult;
use crate::parser::parse_source;

use super::embed::Embedder;
use super::extensions::ExtensionRegistry;
use super::pipeline::{Pipeline, PipelineOptions};
use super::plugins::HookTable;

static OFFLINE: OfflineFetcher = OfflineFetcher;
static NO_OUTPUTS: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

/// What a successful compile produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub destination: PathBuf,
    /// False for partials and no-write runs
    pub written: bool,
}

/// Compiles one record at a time; shared by every worker of a wave
pub struct Compiler<'a> {
    registry: &'a ExtensionRegistry,
    options: &'a PipelineOptions,
    hooks: &'a HookTable,
    fs: &'a dyn FileSystem,
    layout: &'a OutputLayout,
    fetcher: &'a dyn Fetcher,
    outputs: &'a BTreeMap<PathBuf, PathBuf>,
    no_write: bool,
}

impl<'a> Compiler<'a> {
    pub fn new(
        registry: &'a ExtensionRegistry,
        options: &'a PipelineOptions,
        hooks: &'a HookTable,
        fs: &'a dyn FileSystem,
        layout: &'a OutputLayout,
    ) -> Self {
        Self {
            registry,
            options,
            hooks,
            fs,
            layout,
            fetcher: &OFFLINE,
            outputs: &NO_OUTPUTS,
            no_write: false,
        }
    }

    pub fn with_fetcher(mut self, fetcher: &'a dyn Fetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Destination -> source map of artifacts written earlier in the batch
    pub fn with_outputs(mut self, outputs: &'a BTreeMap<PathBuf, PathBuf>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_no_write(mut self, no_write: bool) -> Self {
        self.no_write = no_write;
        self
    }

    /// Run the full lifecycle for `record`. A failure is recorded on the
    /// record and returned.
    pub fn compile(&self, record: &mut SourceRecord) -> LatheResult<Compiled> {
        let started = Instant::now();
        record.begin();

        match self.run(record) {
            Ok(compiled) => {
                record.written(compiled.destination.clone(), started.elapsed());
                Ok(compiled)
            }
            Err(e) => {
                record.fail(e.to_string(), started.elapsed());
                Err(e)
            }
        }
    }

    fn run(&self, record: &mut SourceRecord) -> LatheResult<Compiled> {
        let path = record.path().to_path_buf();
        let raw = if record.is_literal() {
            record.raw().clone()
        } else {
            Content::from_bytes(self.fs.read_bytes(&path)?)
        };

        if raw.is_binary() {
            return self.copy_binary(record, raw);
        }

        let parsed = parse_source(raw.as_text().unwrap_or_default(), &path)?;
        let locals = self.options.locals_for(&parsed.data);
        record.loaded(raw, parsed.data.clone(), Content::Text(parsed.body.clone()));
        record.set_locals(locals.clone());

        let pipeline = Pipeline::new(self.registry, self.options, self.fs);
        let rendered = pipeline.render(&path, parsed.body, parsed.data, locals)?;
        record.piped(
            Content::Text(rendered.text),
            rendered.label,
            rendered.deps,
            rendered.install_time,
        );

        let destination = self
            .layout
            .destination(&path, record.chain().name(), record.label());

        if is_markup(record.label()) {
            record.begin_embedding();
            let embedder = Embedder::new(
                &pipeline,
                self.fs,
                self.fetcher,
                self.hooks,
                &self.layout.output,
                self.outputs,
            );
            let html = record.content().as_text().unwrap_or_default().to_string();
            let embedded = embedder.embed(&path, &destination, &html)?;
            record.embedded(Content::Text(embedded.text), embedded.deps);
        }

        let written = !self.no_write && !record.chain().is_partial();
        if written {
            self.fs.write(&destination, record.content().as_bytes())?;
        }

        Ok(Compiled {
            destination,
            written,
        })
    }

    fn copy_binary(&self, record: &mut SourceRecord, raw: Content) -> LatheResult<Compiled> {
        let path = record.path().to_path_buf();
        let destination = self.layout.mirror(&path);
        let label = record.label().to_string();

        let content = raw.clone();
        record.loaded(raw, Value::Object(Map::new()), Content::default());
        record.piped(content, label, Vec::new(), Duration::ZERO);

        let written = !self.no_write;
        if written {
            self.fs.copy(&path, &destination)?;
        }
        Ok(Compiled {
            destination,
            written,
        })
    }

    pub fn layout(&self) -> &OutputLayout {
        self.layout
    }

    /// Expected destination without compiling (used for removals)
    pub fn destination_of(&self, path: &Path) -> PathBuf {
        let chain = SuffixChain::parse(path);
        let label = self
            .registry
            .predict_label(&chain, &self.options.disabled, &self.options.exempt);
        self.layout.destination(path, chain.name(), &label)
    }
}
