//! The `FileSystemWatcher` facade: the single entry point a consumer
//! uses to start/stop watching and drain normalized events.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::WatchConfig;
use crate::error::Result;
use crate::event::FileEvent;
use crate::queue::EventQueue;
use crate::watch::adapter::WatcherAdapter;

/// Owns the OS watcher adapter and the event queue it feeds. Cloning the
/// queue handle out via `retrieve_file_event` is how a consumer drains
/// the normalized stream; this type itself is not `Clone` or shareable
/// across threads by design (only one owner starts/stops a given watch).
pub struct FileSystemWatcherFacade {
    adapter: WatcherAdapter,
    queue: Arc<EventQueue>,
    watching: bool,
    stopped_explicitly: bool,
    watched_root: Option<PathBuf>,
}

impl FileSystemWatcherFacade {
    pub fn new(config: &WatchConfig) -> Self {
        let queue = Arc::new(EventQueue::new());
        Self {
            adapter: WatcherAdapter::new(queue.clone(), config.moved_window),
            queue,
            watching: false,
            stopped_explicitly: true,
            watched_root: None,
        }
    }

    pub fn start_watching(&mut self, root: &Path) -> Result<()> {
        self.adapter.start_watching(root)?;
        self.watching = true;
        self.stopped_explicitly = false;
        self.watched_root = Some(root.to_path_buf());
        log::info!("started watching {}", root.display());
        Ok(())
    }

    pub fn stop_watching(&mut self) {
        if !self.watching {
            return;
        }
        self.adapter.stop_watching();
        self.watching = false;
        self.stopped_explicitly = true;
        if let Some(root) = &self.watched_root {
            log::info!("stopped watching {}", root.display());
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    pub fn has_file_events(&self) -> bool {
        self.queue.has_any()
    }

    pub fn file_events_available(&self) -> usize {
        self.queue.len()
    }

    pub fn retrieve_file_event(&self) -> Option<FileEvent> {
        self.queue.pop()
    }

    pub fn last_error(&self) -> Option<String> {
        self.adapter.last_error()
    }
}

impl Drop for FileSystemWatcherFacade {
    fn drop(&mut self) {
        if self.watching && !self.stopped_explicitly {
            log::warn!("FileSystemWatcherFacade dropped while still watching; stopping implicitly");
            self.stop_watching();
        }
    }
}
