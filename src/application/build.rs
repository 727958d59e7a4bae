//! Batch resolution and dispatch
//!
//! [`Builder`] owns the source registry and dependency cache for a project
//! and turns "some files changed" into a settled batch:
//!
//! 1. orphaned cache entries are cleaned up
//! 2. dirty paths are collected and dependency invalidation runs to a fixpoint
//! 3. dirty candidates are partitioned into namespace groups, a non-markup
//!    wave and a markup wave; unhandled files are reported as misses
//! 4. namespace handlers run, then both waves compile in parallel
//!
//! Every batch works on a fresh [`BatchState`]. One-shot builds run a single
//! batch; watch mode runs one per settled debounce window.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::Config;
use crate::domain::entities::{cache_key, to_millis, CacheEntry, DependencyCache, Destination};
use crate::domain::ports::{
    BatchHandler, CacheRepository, Fetcher, FileSystem, NamespaceBody, OfflineFetcher,
};
use crate::domain::services::{cascade_groups, check, is_dirty, propagate_to_fixpoint};
use crate::domain::value_objects::{is_markup, OutputLayout, SuffixChain};
use crate::error::{LatheError, LatheResult};
use crate::infrastructure::namespaces::{CopyHandler, COPY_NAMESPACE};
use crate::infrastructure::scan::{scan_sources, SourceFilter};

use super::compile::Compiler;
use super::pipeline::PipelineOptions;
use super::plugins::{NamespaceGroups, PluginRegistry};
use super::sources::SourceRegistry;

/// A record or namespace that failed during a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub message: String,
}

/// Outcome of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Sources compiled by the per-file pipeline
    pub compiled: Vec<PathBuf>,
    /// Destinations written (per-file and namespace)
    pub written: Vec<PathBuf>,
    pub failures: Vec<BuildFailure>,
    /// Files no stage or namespace claimed, first sighting only
    pub misses: Vec<PathBuf>,
    /// Destinations deleted because their source went away
    pub removed: Vec<PathBuf>,
    /// Dependency propagation hops needed to settle
    pub hops: usize,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Nothing was compiled, written or removed
    pub fn is_noop(&self) -> bool {
        self.compiled.is_empty() && self.written.is_empty() && self.removed.is_empty()
    }
}

/// Work resolved for one batch
#[derive(Debug, Default)]
struct BatchState {
    dirty: BTreeSet<String>,
    groups: NamespaceGroups,
    scripts: Vec<PathBuf>,
    markup: Vec<PathBuf>,
    partials: Vec<PathBuf>,
    misses: Vec<PathBuf>,
}

pub struct Builder {
    config: Config,
    fs: Arc<dyn FileSystem>,
    fetcher: Arc<dyn Fetcher>,
    plugins: PluginRegistry,
    options: PipelineOptions,
    layout: OutputLayout,
    filter: SourceFilter,
    copy: Arc<dyn BatchHandler>,
    sources: SourceRegistry,
    cache: DependencyCache,
    /// Keys removed since the last batch, propagated to their dependents
    removed: BTreeSet<String>,
    /// Destinations deleted since the last batch
    deleted: Vec<PathBuf>,
    reported_misses: BTreeSet<PathBuf>,
    no_write: bool,
}

impl Builder {
    /// `config` must already have its paths resolved
    pub fn new(config: Config, fs: Arc<dyn FileSystem>, plugins: PluginRegistry) -> LatheResult<Self> {
        let layout = config.layout();
        let filter = SourceFilter::new(
            config.build.sources.clone(),
            &config.build.include,
            &config.build.exclude,
        )?;
        let options = PipelineOptions::from_config(&config);
        let copy: Arc<dyn BatchHandler> = Arc::new(CopyHandler::new(layout.clone()));
        let sources = SourceRegistry::new(config.build.capacity);
        let no_write = config.build.no_write;

        Ok(Self {
            config,
            fs,
            fetcher: Arc::new(OfflineFetcher),
            plugins,
            options,
            layout,
            filter,
            copy,
            sources,
            cache: DependencyCache::new(),
            removed: BTreeSet::new(),
            deleted: Vec::new(),
            reported_misses: BTreeSet::new(),
            no_write,
        })
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_cache(mut self, cache: DependencyCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_no_write(mut self, no_write: bool) -> Self {
        self.no_write = self.no_write || no_write;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &DependencyCache {
        &self.cache
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Discover every source file on disk
    pub fn scan(&mut self) -> LatheResult<usize> {
        let skip = [self.layout.output.clone(), self.config.build.cache.clone()];
        let files = scan_sources(&self.config.build.sources, &skip)?;
        for path in &files {
            self.track(path);
        }
        tracing::debug!(files = files.len(), "scanned sources");
        Ok(files.len())
    }

    /// Whether a watch event for `path` concerns the build at all
    pub fn is_relevant(&self, path: &Path) -> bool {
        let in_sources = self.config.build.sources.iter().any(|s| path.starts_with(s));
        let cache_file = &self.config.build.cache;
        let lock_file = PathBuf::from(format!("{}.lock", cache_file.display()));
        in_sources
            && !self.layout.is_output(path)
            && !path.starts_with(cache_file)
            && path != lock_file
            && !self.filter.is_hidden(path)
    }

    /// Watch: a file appeared
    pub fn file_added(&mut self, path: &Path) -> bool {
        self.file_changed(path)
    }

    /// Watch: a file changed. Directory events are ignored; the files
    /// inside them report on their own.
    pub fn file_changed(&mut self, path: &Path) -> bool {
        if !self.is_relevant(path) || self.fs.is_dir(path) {
            return false;
        }
        self.sources.ensure(path).mark_dirty();
        true
    }

    /// Watch: a file went away. Its destination is deleted right away and
    /// its dependents are invalidated on the next batch.
    pub fn file_removed(&mut self, path: &Path) -> bool {
        if !self.is_relevant(path) {
            return false;
        }
        self.remove_source(path);
        true
    }

    fn track(&mut self, path: &Path) {
        if self.sources.contains(path) {
            return;
        }
        let dirty = is_dirty(self.fs.as_ref(), path, self.cache.get_path(path));
        let record = self.sources.ensure(path);
        if !dirty {
            record.mark_clean();
        }
    }

    fn remove_source(&mut self, path: &Path) {
        self.sources.remove(path);
        let key = cache_key(path);

        let destination = match self.cache.remove(&key) {
            Some(entry) => match (entry.destination(), entry.group()) {
                (Some(Destination::One(dest)), _) => Some(dest.clone()),
                (_, Some(group)) => {
                    // the group is rebuilt from its remaining members
                    self.removed.insert(group.to_string());
                    None
                }
                _ => None,
            },
            // failed compiles drop their entry
            None => self.predicted_destination(path),
        };

        if let Some(dest) = destination {
            if self.fs.exists(&dest) && self.fs.remove(&dest).is_ok() {
                tracing::info!(source = %path.display(), dest = %dest.display(), "removed output");
                self.deleted.push(dest);
            }
        }
        self.removed.insert(key);
    }

    fn predicted_destination(&self, path: &Path) -> Option<PathBuf> {
        let chain = SuffixChain::parse(path);
        if chain.is_partial() || !self.plugins.extensions.handles(&chain, &self.options.disabled) {
            return None;
        }
        let compiler = Compiler::new(
            &self.plugins.extensions,
            &self.options,
            &self.plugins.hooks,
            self.fs.as_ref(),
            &self.layout,
        );
        Some(compiler.destination_of(path))
    }

    /// Paths a batch considers: the registry plus everything the cache
    /// remembers
    pub fn known_paths(&self) -> BTreeSet<PathBuf> {
        let mut paths: BTreeSet<PathBuf> = self.sources.paths().map(Path::to_path_buf).collect();
        for (key, entry) in self.cache.entries() {
            if !entry.is_group() {
                paths.insert(PathBuf::from(key));
            }
        }
        paths
    }

    fn cleanup_orphans(&mut self) {
        let orphans: Vec<PathBuf> = self
            .cache
            .entries()
            .filter(|(key, entry)| !entry.is_group() && !self.fs.exists(Path::new(key)))
            .map(|(key, _)| PathBuf::from(key))
            .collect();
        for path in orphans {
            tracing::debug!(path = %path.display(), "source no longer exists");
            self.remove_source(&path);
        }
    }

    fn resolve(&mut self, force: bool, report: &mut BuildReport) -> BatchState {
        let mut batch = BatchState {
            dirty: check(self.fs.as_ref(), &self.cache),
            ..Default::default()
        };
        batch.dirty.append(&mut self.removed);
        for record in self.sources.iter().filter(|r| r.is_dirty()) {
            batch.dirty.insert(cache_key(record.path()));
        }
        cascade_groups(&self.cache, &mut batch.dirty);

        report.hops = propagate_to_fixpoint(&mut self.cache, &mut batch.dirty);

        let extensions = &self.plugins.extensions;
        for path in self.known_paths() {
            if !self.fs.exists(&path) || self.filter.is_hidden(&path) || !self.filter.allows(&path) {
                continue;
            }

            let key = cache_key(&path);
            let dirty = force || batch.dirty.contains(&key) || !self.cache.contains(&key);
            if !dirty {
                continue;
            }

            if let Some(binding) = self.plugins.namespaces.matching(&path) {
                batch.groups.entry(binding.label.clone()).or_default().push(path);
                continue;
            }

            let chain = SuffixChain::parse(&path);
            if chain.is_partial() {
                batch.partials.push(path);
                continue;
            }

            if extensions.handles(&chain, &self.options.disabled) {
                let label = extensions.predict_label(&chain, &self.options.disabled, &self.options.exempt);
                if is_markup(&label) {
                    batch.markup.push(path);
                } else {
                    batch.scripts.push(path);
                }
                continue;
            }

            if self.reported_misses.insert(path.clone()) {
                tracing::warn!(path = %path.display(), "no stage or namespace for file, copying");
                batch.misses.push(path.clone());
            }
            batch.groups.entry(COPY_NAMESPACE.to_string()).or_default().push(path);
        }

        batch
    }

    /// Resolve and dispatch one batch. `force` treats every candidate as dirty.
    pub fn run_batch(&mut self, force: bool) -> BuildReport {
        let mut report = BuildReport::default();

        self.cleanup_orphans();
        let batch = self.resolve(force, &mut report);
        report.removed = std::mem::take(&mut self.deleted);
        report.misses = batch.misses.clone();

        tracing::debug!(
            dirty = batch.dirty.len(),
            groups = batch.groups.len(),
            scripts = batch.scripts.len(),
            markup = batch.markup.len(),
            "resolved batch"
        );

        for (label, paths) in &batch.groups {
            self.dispatch_namespace(label, paths, &mut report);
        }

        let mut outputs = self.known_outputs();
        self.compile_wave(&batch.scripts, &mut outputs, &mut report);
        self.compile_wave(&batch.markup, &mut outputs, &mut report);

        self.settle(&batch);
        self.sources.enforce_capacity();

        tracing::info!(
            compiled = report.compiled.len(),
            written = report.written.len(),
            failed = report.failures.len(),
            "batch complete"
        );
        report
    }

    /// Destination -> source for every per-file output the cache knows about
    fn known_outputs(&self) -> BTreeMap<PathBuf, PathBuf> {
        self.cache
            .entries()
            .filter_map(|(key, entry)| match entry.destination() {
                Some(Destination::One(dest)) => Some((dest.clone(), PathBuf::from(key))),
                _ => None,
            })
            .collect()
    }

    fn handler_for(&self, label: &str) -> Option<Arc<dyn BatchHandler>> {
        self.plugins
            .namespaces
            .handler(label)
            .cloned()
            .or_else(|| (label == COPY_NAMESPACE).then(|| Arc::clone(&self.copy)))
    }

    fn dispatch_namespace(&mut self, label: &str, paths: &[PathBuf], report: &mut BuildReport) {
        let Some(handler) = self.handler_for(label) else {
            return;
        };

        let outputs = match handler.handle(paths) {
            Ok(outputs) => outputs,
            Err(e) => {
                let err = LatheError::Namespace {
                    namespace: label.to_string(),
                    message: e.to_string(),
                };
                tracing::warn!("{}", err);
                report.failures.push(BuildFailure {
                    file: None,
                    namespace: Some(label.to_string()),
                    message: err.to_string(),
                });
                return;
            }
        };

        let mut destinations = Vec::with_capacity(outputs.len());
        let mut failed_outputs = Vec::new();
        // members whose output was not produced stay dirty
        let mut unfinished: BTreeSet<PathBuf> = BTreeSet::new();
        for output in outputs {
            if !self.no_write {
                let result = match &output.body {
                    NamespaceBody::Content(content) => self.fs.write(&output.destination, content.as_bytes()),
                    NamespaceBody::CopyFrom(source) => self.fs.copy(source, &output.destination),
                };
                if let Err(e) = result {
                    report.failures.push(BuildFailure {
                        file: Some(output.destination.clone()),
                        namespace: Some(label.to_string()),
                        message: e.to_string(),
                    });
                    match &output.body {
                        NamespaceBody::CopyFrom(source) if paths.contains(source) => {
                            unfinished.insert(source.clone());
                        }
                        // produced from the whole group
                        _ => unfinished.extend(paths.iter().cloned()),
                    }
                    failed_outputs.push(output.destination);
                    continue;
                }
                report.written.push(output.destination.clone());
            }
            destinations.push(output.destination);
        }

        let mtimes: Vec<(PathBuf, Option<u64>)> = paths
            .iter()
            .map(|p| (p.clone(), self.fs.modified(p).map(to_millis)))
            .collect();
        let newest = mtimes.iter().filter_map(|(_, m)| *m).max().unwrap_or(0);

        let members: BTreeSet<String> = self.cache.members_of(label).map(String::from).collect();
        let complete = members.iter().all(|m| paths.iter().any(|p| cache_key(p) == *m));
        if complete {
            // full rebuild: outputs nobody produced any more are stale
            if let Some(Destination::Many(previous)) = self.cache.get(label).and_then(|e| e.destination()) {
                let stale = previous
                    .iter()
                    .filter(|d| !destinations.contains(d) && !failed_outputs.contains(d));
                for stale in stale {
                    if self.fs.exists(stale) && self.fs.remove(stale).is_ok() {
                        report.removed.push(stale.clone());
                    }
                }
            }
            self.cache.set(label, CacheEntry::grouped(label, newest, destinations));
        } else {
            self.cache.merge_group(label, newest, destinations);
        }

        for (path, modified) in mtimes {
            if unfinished.contains(&path) {
                self.cache.remove_path(&path);
                continue;
            }
            self.cache.set_path(&path, CacheEntry::member(label, modified));
            if let Some(record) = self.sources.get_mut(&path) {
                record.mark_clean();
            }
        }
    }

    fn compile_wave(
        &mut self,
        paths: &[PathBuf],
        outputs: &mut BTreeMap<PathBuf, PathBuf>,
        report: &mut BuildReport,
    ) {
        if paths.is_empty() {
            return;
        }
        for path in paths {
            self.sources.ensure(path);
        }
        let mut records = self.sources.take(paths);

        let results: Vec<_> = {
            let compiler = Compiler::new(
                &self.plugins.extensions,
                &self.options,
                &self.plugins.hooks,
                self.fs.as_ref(),
                &self.layout,
            )
            .with_fetcher(self.fetcher.as_ref())
            .with_outputs(outputs)
            .with_no_write(self.no_write);

            records
                .par_iter_mut()
                .map(|record| compiler.compile(record))
                .collect()
        };

        for (record, result) in records.iter().zip(results) {
            let path = record.path();
            let key = cache_key(path);
            match result {
                Ok(compiled) => {
                    tracing::debug!(
                        file = %path.display(),
                        label = record.label(),
                        work_ms = record.work_time().as_millis() as u64,
                        "compiled"
                    );
                    let modified = self.fs.modified(path).map(to_millis);
                    self.cache.set(
                        key,
                        CacheEntry::compiled(modified, compiled.destination.clone(), record.deps().to_vec()),
                    );
                    for dep in record.deps() {
                        if !self.cache.contains(&cache_key(dep)) {
                            if let Some(modified) = self.fs.modified(dep) {
                                self.cache.set_path(dep, CacheEntry::modified_only(to_millis(modified)));
                            }
                        }
                    }
                    outputs.insert(compiled.destination.clone(), path.to_path_buf());
                    report.compiled.push(path.to_path_buf());
                    if compiled.written {
                        report.written.push(compiled.destination);
                    }
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    self.cache.remove(&key);
                    report.failures.push(BuildFailure {
                        file: Some(path.to_path_buf()),
                        namespace: None,
                        message: e.to_string(),
                    });
                }
            }
        }

        self.sources.restore(records);
    }

    /// Bring timestamp-only entries up to date once their dependents ran
    fn settle(&mut self, batch: &BatchState) {
        let stale: Vec<String> = batch
            .dirty
            .iter()
            .filter(|key| {
                self.cache
                    .get(key)
                    .is_some_and(|e| e.destination().is_none() && e.group().is_none())
            })
            .cloned()
            .collect();

        let refresh = stale
            .iter()
            .map(PathBuf::from)
            .chain(batch.partials.iter().cloned());
        let refreshed: Vec<(PathBuf, u64)> = refresh
            .filter_map(|p| self.fs.modified(&p).map(|m| (p, to_millis(m))))
            .collect();
        for (path, modified) in refreshed {
            self.cache.set_path(&path, CacheEntry::modified_only(modified));
        }

        for path in &batch.partials {
            if let Some(record) = self.sources.get_mut(path) {
                record.mark_clean();
            }
        }
    }
}

/// One-shot build options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub force: bool,
    pub dry_run: bool,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// One-shot build: scan, run a single batch, persist the cache
pub struct BuildUseCase<R: CacheRepository> {
    repo: R,
    fs: Arc<dyn FileSystem>,
    fetcher: Arc<dyn Fetcher>,
}

impl<R: CacheRepository> BuildUseCase<R> {
    pub fn new(repo: R, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            repo,
            fs,
            fetcher: Arc::new(OfflineFetcher),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn execute(
        &self,
        config: Config,
        plugins: PluginRegistry,
        options: BuildOptions,
    ) -> LatheResult<BuildReport> {
        let cache_path = config.build.cache.clone();
        let cache = load_cache(&self.repo, &cache_path);

        let mut builder = Builder::new(config, Arc::clone(&self.fs), plugins)?
            .with_cache(cache)
            .with_fetcher(Arc::clone(&self.fetcher))
            .with_no_write(options.dry_run);

        builder.scan()?;
        let report = builder.run_batch(options.force);

        if !options.dry_run {
            self.repo.save(builder.cache(), &cache_path)?;
        }
        Ok(report)
    }
}

/// Load the persisted cache; an unreadable one is reported and replaced
pub fn load_cache<R: CacheRepository + ?Sized>(repo: &R, path: &Path) -> DependencyCache {
    match repo.load(path) {
        Ok(cache) => cache,
        Err(e) => {
            tracing::warn!("ignoring cache {}: {}", path.display(), e);
            DependencyCache::new()
        }
    }
}
