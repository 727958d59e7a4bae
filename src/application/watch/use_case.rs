//! Watch Use Case implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::application::build::{load_cache, Builder};
use crate::application::plugins::PluginRegistry;
use crate::domain::ports::{CacheRepository, Fetcher, FileSystem, OfflineFetcher};
use crate::error::{LatheError, LatheResult};
use crate::infrastructure::exec::PostBuildCommand;
use crate::infrastructure::fs::LocalFs;

use super::event::{ChangeKind, WatchEvent, WatchOptions};
use super::flush::CacheFlusher;
use super::scheduler::{Settled, WatchScheduler};

/// Watch Use Case
///
/// Orchestrates continuous rebuilding. This is the entry point for the
/// `lathe watch` command.
pub struct WatchUseCase<R: CacheRepository> {
    options: WatchOptions,
    repo: R,
    plugins: PluginRegistry,
    fetcher: Arc<dyn Fetcher>,
}

/// Post-build command plus whether its current failure was reported
struct Exec {
    command: PostBuildCommand,
    reported: bool,
}

impl<R: CacheRepository> WatchUseCase<R> {
    pub fn new(options: WatchOptions, repo: R, plugins: PluginRegistry) -> Self {
        Self {
            options,
            repo,
            plugins,
            fetcher: Arc::new(OfflineFetcher),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Start watching (blocking)
    ///
    /// This method blocks until the running flag is set to false.
    /// Use the callback to receive events.
    pub fn start<F>(&self, running: Arc<AtomicBool>, on_event: F) -> LatheResult<()>
    where
        F: Fn(WatchEvent),
    {
        let config = &self.options.config;

        on_event(WatchEvent::WatchStarted {
            sources: config
                .build
                .sources
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            output: config.build.output.display().to_string(),
        });

        let fs: Arc<dyn FileSystem> = Arc::new(LocalFs::new());
        let cache = load_cache(&self.repo, &config.build.cache);
        let mut builder = Builder::new(config.clone(), fs, self.plugins.clone())?
            .with_cache(cache)
            .with_fetcher(Arc::clone(&self.fetcher))
            .with_no_write(self.options.dry_run);
        builder.scan()?;

        let mut scheduler = WatchScheduler::new(builder, self.options.debounce());
        let mut flusher = CacheFlusher::new(&self.repo, config.build.cache.clone(), self.options.flush_after())
            .with_enabled(!self.options.dry_run);
        let mut exec = config.watch.exec.as_ref().map(|command| Exec {
            command: PostBuildCommand::new(command.clone(), self.options.exec_cwd()),
            reported: false,
        });

        // Initial batch: whatever the cache says is stale
        on_event(WatchEvent::BatchStarted { changes: 0 });
        let settled = scheduler.prime();
        self.after_settle(settled, &mut flusher, exec.as_mut(), &on_event);

        // Set up file watcher
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                }
            },
            Config::default(),
        )
        .map_err(|e| LatheError::Io(std::io::Error::other(e.to_string())))?;

        for source in &config.build.sources {
            watcher
                .watch(source, RecursiveMode::Recursive)
                .map_err(|e| LatheError::Io(std::io::Error::other(e.to_string())))?;
        }

        // Startup cooldown: drain any initial events from notify (it sometimes sends
        // events for existing files when the watcher is first registered)
        let cooldown_end = Instant::now() + Duration::from_millis(500);
        while Instant::now() < cooldown_end {
            let _ = rx.recv_timeout(Duration::from_millis(50));
        }

        while running.load(Ordering::SeqCst) {
            if let Ok(path) = rx.recv_timeout(Duration::from_millis(50)) {
                // Renames and deletes both surface as paths that are gone
                let kind = if path.exists() {
                    ChangeKind::Changed
                } else {
                    ChangeKind::Removed
                };
                scheduler.notify(path, kind);
            }

            if scheduler.is_ready() {
                on_event(WatchEvent::BatchStarted {
                    changes: scheduler.pending(),
                });
                let settled = scheduler.run_pending();
                self.after_settle(settled, &mut flusher, exec.as_mut(), &on_event);
            }

            match flusher.flush_if_due(scheduler.builder().cache()) {
                Ok(true) => on_event(WatchEvent::CacheFlushed {
                    entries: scheduler.builder().cache().len(),
                }),
                Ok(false) => {}
                Err(e) => on_event(WatchEvent::Error {
                    message: e.to_string(),
                }),
            }

            if let Some(exec) = exec.as_mut() {
                if !exec.reported {
                    if let Some(failure) = exec.command.failure() {
                        exec.reported = true;
                        on_event(WatchEvent::CommandFailed {
                            message: failure.to_string(),
                        });
                    }
                }
            }
        }

        if let Err(e) = flusher.flush(scheduler.builder().cache()) {
            on_event(WatchEvent::Error {
                message: e.to_string(),
            });
        }
        if let Some(exec) = exec.as_mut() {
            exec.command.stop();
        }
        on_event(WatchEvent::Shutdown);
        Ok(())
    }

    fn after_settle(
        &self,
        settled: Settled,
        flusher: &mut CacheFlusher<'_>,
        exec: Option<&mut Exec>,
        on_event: &impl Fn(WatchEvent),
    ) {
        for (path, kind) in &settled.changes {
            on_event(WatchEvent::FileChanged {
                path: path.display().to_string(),
                kind: *kind,
                synthetic: false,
            });
        }
        for path in &settled.report.misses {
            on_event(WatchEvent::Miss {
                path: path.display().to_string(),
            });
        }
        for failure in &settled.report.failures {
            on_event(WatchEvent::Failure {
                file: failure.file.as_ref().map(|p| p.display().to_string()),
                namespace: failure.namespace.clone(),
                message: failure.message.clone(),
            });
        }

        let report = &settled.report;
        on_event(WatchEvent::BatchComplete {
            compiled: report.compiled.len(),
            written: report.written.len(),
            removed: report.removed.len(),
            failed: report.failures.len(),
            hops: report.hops,
            elapsed_ms: settled.elapsed.as_millis() as u64,
        });

        flusher.settled(report);

        if let Some(exec) = exec {
            exec.reported = false;
            match exec.command.restart() {
                Ok(pid) => on_event(WatchEvent::CommandStarted {
                    command: exec.command.command().to_string(),
                    pid,
                }),
                Err(e) => {
                    exec.reported = true;
                    on_event(WatchEvent::CommandFailed {
                        message: e.to_string(),
                    });
                }
            }
        }

        // One-time startup announcement; does not schedule another batch
        for path in settled.announce {
            on_event(WatchEvent::FileChanged {
                path: path.display().to_string(),
                kind: ChangeKind::Changed,
                synthetic: true,
            });
        }
    }
}

