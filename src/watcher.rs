//! File watcher for continuous incremental builds
//!
//! Implements the `watch` command with:
//! - Debouncing (100ms)
//! - Incremental compilation of changed scripts only
//! - Graceful Ctrl+C shutdown
//! - NDJSON output for CI

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::builder::Builder;
use crate::config::BuildConfig;
use crate::detect::{ChangeDetector, ChangeEvent, ChangeKind};
use crate::error::{RbgenError, RbgenResult};
use crate::translate::ClassBindingTranslator;

/// Debounce duration in milliseconds
const DEBOUNCE_MS: u64 = 100;

/// Watch options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Project root containing the source and build trees
    pub project_root: PathBuf,
    /// Build layout
    pub config: BuildConfig,
    /// Output as NDJSON
    pub json: bool,
}

/// Watch event types for NDJSON output
#[derive(Debug, Clone)]
pub enum WatchEvent {
    Started { project_root: String },
    FileChanged { path: String },
    BuildStarted,
    BuildComplete { compiled: usize, written: usize, failed: usize },
    Error { message: String },
    Shutdown,
}

impl WatchEvent {
    pub fn to_json(&self) -> String {
        match self {
            WatchEvent::Started { project_root } => {
                format!(r#"{{"event":"started","project_root":"{}"}}"#, project_root)
            }
            WatchEvent::FileChanged { path } => {
                format!(r#"{{"event":"file_changed","path":"{}"}}"#, path)
            }
            WatchEvent::BuildStarted => r#"{"event":"build_started"}"#.to_string(),
            WatchEvent::BuildComplete { compiled, written, failed } => {
                format!(
                    r#"{{"event":"build_complete","compiled":{},"written":{},"failed":{}}}"#,
                    compiled, written, failed
                )
            }
            WatchEvent::Error { message } => {
                format!(r#"{{"event":"error","message":"{}"}}"#, message.replace('"', "\\\""))
            }
            WatchEvent::Shutdown => r#"{"event":"shutdown"}"#.to_string(),
        }
    }
}

/// Pending change queue with debouncing
///
/// Keeps events in arrival order (delta order is part of the incremental
/// contract) and coalesces immediate repeats of the same event.
struct WatcherState {
    pending: VecDeque<ChangeEvent>,
    last_change: Option<Instant>,
}

impl WatcherState {
    fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            last_change: None,
        }
    }

    fn add_change(&mut self, event: ChangeEvent) {
        if self.pending.back() != Some(&event) {
            self.pending.push_back(event);
        }
        self.last_change = Some(Instant::now());
    }

    fn should_build(&self) -> bool {
        match self.last_change {
            Some(last) => {
                !self.pending.is_empty() && last.elapsed() >= Duration::from_millis(DEBOUNCE_MS)
            }
            None => false,
        }
    }

    fn take_changes(&mut self) -> Vec<ChangeEvent> {
        self.last_change = None;
        self.pending.drain(..).collect()
    }
}

/// Map a notify event kind onto the delta vocabulary.
fn change_kind(kind: &EventKind) -> ChangeKind {
    match kind {
        EventKind::Create(_) => ChangeKind::Added,
        EventKind::Remove(_) => ChangeKind::Removed,
        _ => ChangeKind::Changed,
    }
}

/// Start watching for script changes
///
/// Runs an initial full build, then recompiles changed candidates as they
/// arrive until `running` drops to false.
pub fn watch(
    options: WatchOptions,
    running: Arc<AtomicBool>,
    event_callback: impl Fn(WatchEvent),
) -> RbgenResult<()> {
    event_callback(WatchEvent::Started {
        project_root: options.project_root.display().to_string(),
    });

    let detector = ChangeDetector::from_config(&options.config);
    let mut builder = Builder::new(
        options.project_root.clone(),
        options.config.clone(),
        ClassBindingTranslator::new(),
    );

    // Initial full build
    event_callback(WatchEvent::BuildStarted);
    match builder.full_build() {
        Ok(report) => event_callback(WatchEvent::BuildComplete {
            compiled: report.compiled.len(),
            written: report.written.len(),
            failed: report.failed.len(),
        }),
        Err(e) => {
            event_callback(WatchEvent::Error {
                message: e.to_string(),
            });
            return Err(e);
        }
    }

    // Set up file watcher over the source root
    let (tx, rx) = channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let kind = change_kind(&event.kind);
                for path in event.paths {
                    let _ = tx.send((kind, path));
                }
            }
        },
        Config::default(),
    )
    .map_err(|e| RbgenError::Watch(e.to_string()))?;

    let source_root = options.project_root.join(&options.config.source_root);
    watcher
        .watch(&source_root, RecursiveMode::Recursive)
        .map_err(|e| RbgenError::Watch(e.to_string()))?;

    // Watch loop with debouncing
    let mut state = WatcherState::new();

    while running.load(Ordering::SeqCst) {
        if let Ok((kind, path)) = rx.recv_timeout(Duration::from_millis(50)) {
            // notify hands back absolute paths; the delta speaks
            // project-relative
            if let Ok(relative) = path.strip_prefix(&options.project_root) {
                let relative = relative.to_path_buf();
                if detector.is_candidate_path(&relative) {
                    event_callback(WatchEvent::FileChanged {
                        path: relative.display().to_string(),
                    });
                    state.add_change(ChangeEvent::new(kind, relative));
                }
            }
        }

        if state.should_build() {
            let changes = state.take_changes();
            event_callback(WatchEvent::BuildStarted);
            let report = builder.incremental_build(&changes);
            event_callback(WatchEvent::BuildComplete {
                compiled: report.compiled.len(),
                written: report.written.len(),
                failed: report.failed.len(),
            });
        }
    }

    event_callback(WatchEvent::Shutdown);
    Ok(())
}
