//! Interned file/directory name storage.
//!
//! Tree nodes store only their own name (not a full path), so the same
//! leaf name recurs constantly across a large tree (`"index.ts"`,
//! `"mod.rs"`, ...). Interning collapses repeats into one allocation and
//! lets nodes hold a cheap `&'static str` instead of an owned `String`.
//!
//! The pool never frees an entry: names live for the process lifetime,
//! same trade-off the original storage layer makes.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use parking_lot::Mutex;

pub static NAME_POOL: LazyLock<NamePool> = LazyLock::new(NamePool::new);

pub struct NamePool {
    interned: Mutex<BTreeSet<Box<str>>>,
}

impl NamePool {
    pub fn new() -> Self {
        Self { interned: Mutex::new(BTreeSet::new()) }
    }

    /// Interns `name`, returning a `'static` reference into the pool.
    ///
    /// # Safety of the lifetime extension
    /// The returned reference is only ever handed out for strings stored
    /// in `self.interned`, a `BTreeSet<Box<str>>` that is never mutated
    /// to remove entries and is never dropped (it lives in a
    /// `LazyLock` for the life of the process), so the `Box<str>`
    /// backing allocation never moves or frees.
    pub fn intern(&self, name: &str) -> &'static str {
        let mut set = self.interned.lock();
        if let Some(existing) = set.get(name) {
            return unsafe { &*(existing.as_ref() as *const str) };
        }
        let boxed: Box<str> = name.into();
        let ptr: *const str = boxed.as_ref();
        set.insert(boxed);
        unsafe { &*ptr }
    }
}

impl Default for NamePool {
    fn default() -> Self {
        Self::new()
    }
}

// `Box<str>` keys never move once inserted into a `BTreeSet` (the set
// reorders pointers, not the heap allocation each points at), so handing
// out long-lived references into them across threads is sound as long as
// no entry is ever removed.
unsafe impl Sync for NamePool {}
