//! Normalizes raw OS change notifications into `FileEvent`s.
//!
//! Backed by the `notify` crate rather than a platform-conditional
//! FSEvents/ReadDirectoryChangesW split, so the same adapter code runs on
//! every target `notify` supports (see REDESIGN FLAGS).
//!
//! Two correlation mechanisms feed the RENAMED/MOVED distinction:
//! - same-event rename (`RenameMode::Both`): the backend hands both the
//!   old and new path in a single notification.
//! - split rename (`RenameMode::From`/`RenameMode::To`): paired by the
//!   backend's rename cookie (`Event::tracker`), mirroring the
//!   `operations_buffer`/`rename_cookie` pairing in `itkovian-notify`'s
//!   debounce layer.
//! - no correlation at all: a bare REMOVED is stashed and paired with
//!   the next ADDED within the configured window, exactly as
//!   `WinFileWatcher::ProcessActions` stashes `FILE_ACTION_REMOVED` and
//!   waits for `FILE_ACTION_ADDED` before the timer fires.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fnv::FnvHashMap;
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use crate::error::{Result, WatchError};
use crate::event::FileEvent;
use crate::queue::EventQueue;
use crate::timer::Timer;

struct MovedSlot {
    waiting: bool,
    stashed_removed: Option<PathBuf>,
}

/// Normalizes a live `notify` event stream into `FileEvent`s pushed onto
/// a shared queue.
pub struct WatcherAdapter {
    watcher: Option<RecommendedWatcher>,
    queue: Arc<EventQueue>,
    moved: Arc<Mutex<MovedSlot>>,
    timer: Arc<Timer>,
    moved_window: Duration,
    rename_cookies: Arc<Mutex<FnvHashMap<usize, PathBuf>>>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl WatcherAdapter {
    pub fn new(queue: Arc<EventQueue>, moved_window: Duration) -> Self {
        let moved = Arc::new(Mutex::new(MovedSlot { waiting: false, stashed_removed: None }));
        let timer = Arc::new(Timer::new());

        let flush_moved = moved.clone();
        let flush_queue = queue.clone();
        timer.add_on_finish(move || {
            let mut slot = flush_moved.lock();
            if slot.waiting {
                if let Some(old) = slot.stashed_removed.take() {
                    log::debug!("MOVED window elapsed with no matching ADDED for {}", old.display());
                    flush_queue.push(FileEvent::removed(old));
                }
                slot.waiting = false;
            }
        });

        Self {
            watcher: None,
            queue,
            moved,
            timer,
            moved_window,
            rename_cookies: Arc::new(Mutex::new(FnvHashMap::default())),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn start_watching(&mut self, root: &Path) -> Result<()> {
        let queue = self.queue.clone();
        let moved = self.moved.clone();
        let timer = self.timer.clone();
        let moved_window = self.moved_window;
        let rename_cookies = self.rename_cookies.clone();
        let last_error = self.last_error.clone();

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            match result {
                Ok(event) => handle_event(event, &queue, &moved, &timer, moved_window, &rename_cookies),
                Err(err) => {
                    if matches!(err.kind, notify::ErrorKind::MaxFilesWatch) {
                        log::warn!(
                            "dropped-events warning: OS watch buffer overflow ({err}); consider resyncing by rebuilding the watched subtree"
                        );
                    } else {
                        log::warn!("filesystem watcher error: {err}");
                    }
                    *last_error.lock() = Some(err.to_string());
                }
            }
        })
        .map_err(classify_start_error)?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|err| classify_watch_error(root, err))?;

        self.watcher = Some(watcher);
        Ok(())
    }

    pub fn stop_watching(&mut self) {
        self.timer.stop();
        self.watcher = None;
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

fn handle_event(
    event: notify::Event,
    queue: &Arc<EventQueue>,
    moved: &Arc<Mutex<MovedSlot>>,
    timer: &Arc<Timer>,
    moved_window: Duration,
    rename_cookies: &Arc<Mutex<FnvHashMap<usize, PathBuf>>>,
) {
    match event.kind {
        EventKind::Create(_) => {
            for path in event.paths {
                on_added(path, queue, moved, timer);
            }
        }
        EventKind::Remove(_) => {
            for path in event.paths {
                on_removed(path, queue, moved, timer, moved_window);
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if event.paths.len() == 2 {
                emit_renamed_or_moved(event.paths[0].clone(), event.paths[1].clone(), queue);
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            if let (Some(path), Some(cookie)) = (event.paths.into_iter().next(), event.attrs.tracker()) {
                rename_cookies.lock().insert(cookie, path);
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            if let (Some(new_path), Some(cookie)) = (event.paths.into_iter().next(), event.attrs.tracker()) {
                match rename_cookies.lock().remove(&cookie) {
                    Some(old_path) => emit_renamed_or_moved(old_path, new_path, queue),
                    None => {
                        log::warn!("rename 'to' half arrived with no matching 'from'; treating as ADDED");
                        queue.push(FileEvent::added(new_path));
                    }
                }
            }
        }
        EventKind::Modify(_) => {
            for path in event.paths {
                queue.push(FileEvent::modified(path));
            }
        }
        EventKind::Access(_) | EventKind::Other | EventKind::Any => {}
    }
}

fn on_added(path: PathBuf, queue: &Arc<EventQueue>, moved: &Arc<Mutex<MovedSlot>>, timer: &Arc<Timer>) {
    let mut slot = moved.lock();
    if slot.waiting {
        let old = slot.stashed_removed.take();
        slot.waiting = false;
        drop(slot);
        // Dropped before `timer.stop()`: that call joins the timer
        // worker, and the worker's on-finish callback also locks
        // `moved` — holding the guard here would deadlock against it.
        timer.stop();
        match old {
            Some(old) => queue.push(FileEvent::moved(old, path)),
            None => queue.push(FileEvent::added(path)),
        }
    } else {
        drop(slot);
        queue.push(FileEvent::added(path));
    }
}

fn on_removed(
    path: PathBuf,
    queue: &Arc<EventQueue>,
    moved: &Arc<Mutex<MovedSlot>>,
    timer: &Arc<Timer>,
    moved_window: Duration,
) {
    let mut slot = moved.lock();
    if slot.waiting {
        if let Some(previous) = slot.stashed_removed.take() {
            queue.push(FileEvent::removed(previous));
        }
    }
    slot.stashed_removed = Some(path);
    slot.waiting = true;
    drop(slot);

    timer.set(moved_window);
    timer.start();
}

fn emit_renamed_or_moved(old_path: PathBuf, new_path: PathBuf, queue: &Arc<EventQueue>) {
    if old_path.parent() == new_path.parent() {
        queue.push(FileEvent::renamed(old_path, new_path));
    } else {
        queue.push(FileEvent::moved(old_path, new_path));
    }
}

fn classify_start_error(err: notify::Error) -> WatchError {
    WatchError::Notify(err)
}

fn classify_watch_error(path: &Path, err: notify::Error) -> WatchError {
    match &err.kind {
        notify::ErrorKind::PathNotFound => WatchError::PathNotFound(path.to_path_buf()),
        notify::ErrorKind::Generic(message) if message.to_lowercase().contains("permission") => {
            WatchError::AccessDenied(path.to_path_buf())
        }
        _ => WatchError::Notify(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_parent_rename_is_renamed_not_moved() {
        let queue = Arc::new(EventQueue::new());
        emit_renamed_or_moved(PathBuf::from("/a/old.txt"), PathBuf::from("/a/new.txt"), &queue);
        assert_eq!(queue.pop(), Some(FileEvent::renamed("/a/old.txt", "/a/new.txt")));
    }

    #[test]
    fn cross_parent_rename_is_moved() {
        let queue = Arc::new(EventQueue::new());
        emit_renamed_or_moved(PathBuf::from("/a/f.txt"), PathBuf::from("/b/f.txt"), &queue);
        assert_eq!(queue.pop(), Some(FileEvent::moved("/a/f.txt", "/b/f.txt")));
    }

    #[test]
    fn removed_then_added_within_window_synthesizes_moved() {
        let queue = Arc::new(EventQueue::new());
        let moved = Arc::new(Mutex::new(MovedSlot { waiting: false, stashed_removed: None }));
        let timer = Arc::new(Timer::new());

        on_removed(PathBuf::from("/a/old.txt"), &queue, &moved, &timer, Duration::from_millis(100));
        on_added(PathBuf::from("/b/new.txt"), &queue, &moved, &timer);

        assert_eq!(queue.pop(), Some(FileEvent::moved("/a/old.txt", "/b/new.txt")));
    }

    #[test]
    fn second_removed_while_waiting_flushes_first_as_plain_removed() {
        let queue = Arc::new(EventQueue::new());
        let moved = Arc::new(Mutex::new(MovedSlot { waiting: false, stashed_removed: None }));
        let timer = Arc::new(Timer::new());

        on_removed(PathBuf::from("/a/first.txt"), &queue, &moved, &timer, Duration::from_millis(100));
        on_removed(PathBuf::from("/a/second.txt"), &queue, &moved, &timer, Duration::from_millis(100));

        assert_eq!(queue.pop(), Some(FileEvent::removed("/a/first.txt")));
    }

    #[test]
    fn removed_with_no_added_flushes_as_plain_removed_after_window() {
        let queue = Arc::new(EventQueue::new());
        let moved = Arc::new(Mutex::new(MovedSlot { waiting: false, stashed_removed: None }));
        let timer = Arc::new(Timer::new());
        let flush_moved = moved.clone();
        let flush_queue = queue.clone();
        timer.add_on_finish(move || {
            let mut slot = flush_moved.lock();
            if slot.waiting {
                if let Some(old) = slot.stashed_removed.take() {
                    flush_queue.push(FileEvent::removed(old));
                }
                slot.waiting = false;
            }
        });

        on_removed(PathBuf::from("/x/f.png"), &queue, &moved, &timer, Duration::from_millis(50));
        std::thread::sleep(Duration::from_millis(150));

        assert_eq!(queue.pop(), Some(FileEvent::removed("/x/f.png")));
        assert_eq!(queue.pop(), None);
    }
}
