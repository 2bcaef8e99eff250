//! Config file watcher driving `ObservabilityEngine::apply_config`.
//!
//! The parent directory is watched rather than the file itself: editors that
//! save by writing a temp file and renaming it over the original would
//! otherwise detach the watch after the first save.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::EngineConfig;

pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<EngineConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for validated, changed configs.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<EngineConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Keep the returned handle alive; dropping it stops events.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let directory = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // One save often yields several events; only forward real changes
        let mut last_sent = load_config(&path).ok();
        let target = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                };
                if !touches_file(&event, &target) {
                    return;
                }

                let config = match load_config(&target) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!(
                            path = %target.display(),
                            error = %e,
                            "Rejected config change, keeping current configuration"
                        );
                        return;
                    }
                };

                if last_sent.as_ref() == Some(&config) {
                    tracing::debug!(path = %target.display(), "Config unchanged after file event");
                    return;
                }
                tracing::info!(path = %target.display(), "Config change detected");
                last_sent = Some(config.clone());
                let _ = update_tx.send(config);
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// Content-changing event on `target`.
fn touches_file(event: &Event, target: &Path) -> bool {
    let relevant = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some() && p.file_name() == target.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    #[test]
    fn test_only_events_on_the_config_file_count() {
        let target = Path::new("/etc/engine/engine.toml");

        let modify = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/etc/engine/engine.toml"));
        assert!(touches_file(&modify, target));

        let sibling = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/etc/engine/other.toml"));
        assert!(!touches_file(&sibling, target));

        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/etc/engine/engine.toml"));
        assert!(!touches_file(&access, target));
    }
}
