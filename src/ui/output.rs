use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use lathe::application::watch::{ChangeKind, WatchEvent};
use lathe::application::{BuildReport, PluginRegistry};
use lathe::config::ConfigWarning;
use lathe::LatheError;

const RED: &str = "31";
const GREEN: &str = "32";
const YELLOW: &str = "33";
const DIM: &str = "2";

fn paint(text: &str, code: &str, color: bool) -> String {
    if color {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn relative_str(path: &str, root: &Path) -> String {
    relative(Path::new(path), root)
}

pub fn print_config_warnings(path: &Path, warnings: &[ConfigWarning]) {
    for w in warnings {
        if let Some(line) = w.line {
            eprintln!("⚠ Unknown config key '{}' in {}:{}", w.key, path.display(), line);
        } else {
            eprintln!("⚠ Unknown config key '{}' in {}", w.key, path.display());
        }

        if let Some(suggestion) = &w.suggestion {
            eprintln!("   Did you mean '{}'?\n", suggestion);
        }
    }
}

pub fn print_error(err: &anyhow::Error, json: bool) {
    if json {
        let _ = crate::ui::json::emit(serde_json::json!({
            "event": "error",
            "message": err.to_string(),
            "fatal": err.downcast_ref::<LatheError>().is_some_and(LatheError::is_fatal),
        }));
        return;
    }

    eprintln!("Error: {}", err);
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {}", cause);
    }
    if let Some(LatheError::DirectoryNotFound { .. }) = err.downcast_ref::<LatheError>() {
        eprintln!("  hint: set [build] sources in lathe.toml");
    }
}

pub fn render_build_report(report: &BuildReport, root: &Path, dry_run: bool, color: bool) -> String {
    let mut out = String::new();

    for path in &report.misses {
        let _ = writeln!(
            out,
            "{} {}: no stage or namespace, copied",
            paint("?", YELLOW, color),
            relative(path, root)
        );
    }
    for path in &report.removed {
        let _ = writeln!(out, "{} {}", paint("-", DIM, color), relative(path, root));
    }
    for failure in &report.failures {
        let subject = match (&failure.file, &failure.namespace) {
            (Some(file), _) => relative(file, root),
            (None, Some(namespace)) => format!("[{}]", namespace),
            (None, None) => String::from("?"),
        };
        let _ = writeln!(out, "{} {}: {}", paint("✗", RED, color), subject, failure.message);
    }

    if report.is_noop() && report.is_success() {
        let _ = writeln!(out, "{} Up to date", paint("✓", GREEN, color));
        return out;
    }

    let verb = if dry_run { "would write" } else { "wrote" };
    let summary = format!(
        "Compiled {} file{}, {} {} output{}",
        report.compiled.len(),
        plural(report.compiled.len()),
        verb,
        report.written.len(),
        plural(report.written.len()),
    );
    if report.is_success() {
        let _ = writeln!(out, "{} {}", paint("✓", GREEN, color), summary);
    } else {
        let _ = writeln!(
            out,
            "{} {} ({} failed)",
            paint("✗", RED, color),
            summary,
            report.failures.len()
        );
    }
    out
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

pub fn render_watch_event(timestamp: &str, event: &WatchEvent, root: &Path, color: bool) -> String {
    let ts = paint(&format!("[{}]", timestamp), DIM, color);

    match event {
        WatchEvent::WatchStarted { sources, output } => {
            let sources: Vec<String> = sources.iter().map(|s| relative_str(s, root)).collect();
            format!("{} Watching {} -> {}\n", ts, sources.join(", "), relative_str(output, root))
        }
        WatchEvent::FileChanged {
            path,
            kind,
            synthetic: false,
        } => {
            let verb = match kind {
                ChangeKind::Changed => "changed",
                ChangeKind::Removed => "removed",
            };
            format!("{} {} {}\n", ts, verb, relative_str(path, root))
        }
        WatchEvent::BatchComplete {
            compiled,
            written,
            failed,
            elapsed_ms,
            ..
        } => {
            if *failed > 0 {
                format!(
                    "{} {} compiled {}, wrote {}, {} failed ({} ms)\n",
                    ts,
                    paint("✗", RED, color),
                    compiled,
                    written,
                    failed,
                    elapsed_ms
                )
            } else {
                format!(
                    "{} {} compiled {}, wrote {} ({} ms)\n",
                    ts,
                    paint("✓", GREEN, color),
                    compiled,
                    written,
                    elapsed_ms
                )
            }
        }
        WatchEvent::Failure {
            file,
            namespace,
            message,
        } => {
            let subject = file
                .as_deref()
                .map(|f| relative_str(f, root))
                .or_else(|| namespace.as_ref().map(|n| format!("[{}]", n)))
                .unwrap_or_default();
            format!("{} {} {}: {}\n", ts, paint("✗", RED, color), subject, message)
        }
        WatchEvent::Miss { path } => format!(
            "{} {} {}: no stage or namespace, copied\n",
            ts,
            paint("?", YELLOW, color),
            relative_str(path, root)
        ),
        WatchEvent::CommandStarted { command, pid } => {
            format!("{} ▶ {} (pid {})\n", ts, command, pid)
        }
        WatchEvent::CommandFailed { message } | WatchEvent::Error { message } => {
            format!("{} {} {}\n", ts, paint("✗", RED, color), message)
        }
        WatchEvent::Shutdown => format!("{} Stopped\n", ts),
        WatchEvent::FileChanged { synthetic: true, .. }
        | WatchEvent::BatchStarted { .. }
        | WatchEvent::CacheFlushed { .. } => String::new(),
    }
}

pub fn render_stages(plugins: &PluginRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<10} {:<12} LABEL", "SUFFIX", "STAGE");
    for (suffix, binding) in plugins.extensions.bindings() {
        let _ = writeln!(
            out,
            "{:<10} {:<12} {}",
            suffix,
            binding.stage.name(),
            binding.label_for(suffix)
        );
    }

    let namespaces: BTreeSet<&str> = plugins.namespaces.labels().collect();
    let hooks: Vec<&str> = plugins.hooks.names().collect();
    let list = |items: Vec<&str>| {
        if items.is_empty() {
            String::from("(none)")
        } else {
            items.join(", ")
        }
    };
    let _ = writeln!(out);
    let _ = writeln!(out, "namespaces: {}", list(namespaces.into_iter().collect()));
    let _ = writeln!(out, "hooks: {}", list(hooks));
    out
}
