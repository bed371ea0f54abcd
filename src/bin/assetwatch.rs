//! Minimal CLI front-end over the asset-watching core.
//!
//! Takes one positional argument (the absolute watch path), builds the
//! initial tree, starts the watcher, and on each drained event applies it
//! to the tree and logs a one-line record of the resulting mutation. This
//! is the reference implementation of the Event Consumer Contract: no
//! GUI, no asset browser, just the minimal main loop the contract
//! describes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assetwatch::event::FileEvent;
use assetwatch::tree::DirectoryTreeListener;
use assetwatch::{DirectoryTree, FileSystemWatcherFacade, WatchConfig};

/// How long the main loop sleeps between polls when the queue is empty.
/// Non-blocking by contract; this is a CPU-courtesy nap, not a wait.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let (verbose, positionals) = split_flags(&args[1..]);

    init_logging(verbose);

    let Some(watch_path) = positionals.first() else {
        eprintln!("usage: assetwatch [-v|--verbose] <absolute-watch-path>");
        return ExitCode::FAILURE;
    };
    let watch_path = PathBuf::from(watch_path.as_str());

    match run(&watch_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn split_flags(args: &[String]) -> (bool, Vec<&String>) {
    let mut verbose = false;
    let mut positionals = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            _ => positionals.push(arg),
        }
    }
    (verbose, positionals)
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn run(watch_path: &Path) -> assetwatch::Result<()> {
    let config = WatchConfig::default();

    let mut tree = DirectoryTree::new(config.clone());
    tree.add_listener(Box::new(StatusLogListener));
    tree.build_root_tree(watch_path)?;
    log::info!("built initial tree for {}", watch_path.display());

    let mut facade = FileSystemWatcherFacade::new(&config);
    facade.start_watching(watch_path)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let ctrlc_flag = shutdown.clone();
    // Best-effort: if a handler is already installed (e.g. under a test
    // harness), keep running under the existing one rather than failing.
    let _ = ctrlc::set_handler(move || ctrlc_flag.store(true, Ordering::SeqCst));

    while !shutdown.load(Ordering::SeqCst) {
        let mut any_changes = false;
        while let Some(event) = facade.retrieve_file_event() {
            any_changes = true;
            apply_event(&mut tree, watch_path, event);
        }
        if let Some(err) = facade.last_error() {
            log::warn!("watcher reported a dropped-events condition: {err}");
        }
        if !any_changes {
            std::thread::sleep(IDLE_POLL_INTERVAL);
        }
    }

    facade.stop_watching();
    log::info!("shutting down");
    Ok(())
}

/// Applies one normalized event to the tree, resolving file-vs-directory
/// ambiguity from whether the path carries an extension (§4.7).
fn apply_event(tree: &mut DirectoryTree, watch_path: &Path, event: FileEvent) {
    let result = match &event {
        FileEvent::Added { new_path } => {
            let (parent, name) = split(new_path);
            if has_extension(new_path) {
                tree.add_new_file(parent, name)
            } else {
                tree.add_new_directory(parent, name)
            }
        }
        FileEvent::Removed { old_path } => {
            if has_extension(old_path) {
                tree.remove_file(old_path)
            } else {
                tree.remove_directory(old_path)
            }
        }
        FileEvent::Modified { old_path } => tree.mark_modified(old_path),
        FileEvent::Moved { old_path, new_path } => {
            if has_extension(old_path) != has_extension(new_path) {
                log::warn!(
                    "dropping ambiguous MOVED event ({} -> {}): file/directory disagreement",
                    old_path.display(),
                    new_path.display()
                );
                return;
            }
            if has_extension(new_path) {
                tree.move_file(old_path, new_path)
            } else {
                tree.move_directory(old_path, new_path)
            }
        }
        FileEvent::Renamed { old_path, new_path } => {
            if has_extension(old_path) != has_extension(new_path) {
                log::warn!(
                    "dropping ambiguous RENAMED event ({} -> {}): file/directory disagreement",
                    old_path.display(),
                    new_path.display()
                );
                return;
            }
            let new_name = new_path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if has_extension(new_path) {
                tree.rename_file(old_path, new_name)
            } else {
                tree.rename_directory(old_path, new_name)
            }
        }
    };

    match result {
        Ok(()) => {
            log::debug!("applied {} under {}", event.kind_str(), watch_path.display());
        }
        Err(err) => log::warn!("failed to apply {} event: {err}", event.kind_str()),
    }
}

fn has_extension(path: &Path) -> bool {
    path.extension().is_some()
}

fn split(path: &Path) -> (&Path, &str) {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    (parent, name)
}

/// Logs a one-line status record for every tree mutation, matching the
/// "minimal line-oriented status logger" the CLI front-end is scoped to.
struct StatusLogListener;

impl DirectoryTreeListener for StatusLogListener {
    fn on_directory_added(&mut self, path: &Path) {
        log::info!("+ dir  {}", path.display());
    }
    fn on_directory_removed(&mut self, path: &Path) {
        log::info!("- dir  {}", path.display());
    }
    fn on_file_added(&mut self, path: &Path) {
        log::info!("+ file {}", path.display());
    }
    fn on_file_removed(&mut self, path: &Path) {
        log::info!("- file {}", path.display());
    }
    fn on_file_path_changed(&mut self, old_path: &Path, new_path: &Path) {
        log::info!("~ file {} -> {}", old_path.display(), new_path.display());
    }
    fn on_directory_path_changed(&mut self, old_path: &Path, new_path: &Path) {
        log::info!("~ dir  {} -> {}", old_path.display(), new_path.display());
    }
}
