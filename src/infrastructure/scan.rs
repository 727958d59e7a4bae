//! Source discovery
//!
//! Walks the source directories with `ignore` (hidden entries skipped, VCS
//! ignore files not consulted) and applies the configured include/exclude
//! globs.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::error::{LatheError, LatheResult};

/// Include/exclude glob filters, matched against paths relative to their
/// source root
#[derive(Debug, Clone)]
pub struct SourceFilter {
    roots: Vec<PathBuf>,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl SourceFilter {
    pub fn new(roots: Vec<PathBuf>, include: &[String], exclude: &[String]) -> LatheResult<Self> {
        Ok(Self {
            roots,
            include: build_set(include)?,
            exclude: build_set(exclude)?,
        })
    }

    /// Filter that lets everything through
    pub fn allow_all(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            include: None,
            exclude: None,
        }
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        self.roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .unwrap_or(path)
    }

    pub fn allows(&self, path: &Path) -> bool {
        let rel = self.relative(path);
        if self.exclude.as_ref().is_some_and(|set| set.is_match(rel)) {
            return false;
        }
        self.include.as_ref().map_or(true, |set| set.is_match(rel))
    }

    /// Dot-prefixed files or directories below the source root
    pub fn is_hidden(&self, path: &Path) -> bool {
        self.relative(path).components().any(|c| match c {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        })
    }
}

fn build_set(patterns: &[String]) -> LatheResult<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| LatheError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map(Some).map_err(|e| LatheError::Pattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

/// Every regular file under `sources`, skipping anything under `skip`
pub fn scan_sources(sources: &[PathBuf], skip: &[PathBuf]) -> LatheResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for root in sources {
        if !root.is_dir() {
            return Err(LatheError::DirectoryNotFound { path: root.clone() });
        }

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .follow_links(true)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.into_path();
            if skip.iter().any(|s| path.starts_with(s)) {
                continue;
            }
            files.push(path);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}
