//! Identity-keyed memoization of manifest validation.
//!
//! Entries are keyed by the address of an `Rc<RawManifest>`, not by content.
//! Each entry holds a `Weak` to its key, which keeps the allocation (and so
//! the address) reserved until the entry is swept; an address can therefore
//! never be reused by a different manifest while its entry exists.
//!
//! A manifest cannot be edited in place while cached: `Rc::get_mut` refuses
//! while the cache holds a `Weak`, and `Rc::make_mut` clones into a new
//! allocation, which is a cache miss. Edit by building a new `Rc` and
//! validate it again.
//!
//! Not thread-safe; meant for the single-threaded orchestration layer.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::error::ValidationError;
use crate::model::{Manifest, RawManifest};
use crate::validator::ManifestValidator;

type CachedResult = Result<Rc<Manifest>, ValidationError>;

struct CacheEntry {
    key: Weak<RawManifest>,
    result: CachedResult,
}

/// Memoizing wrapper around [`ManifestValidator`].
#[derive(Default)]
pub struct ValidationCache {
    validator: ManifestValidator,
    entries: RefCell<HashMap<*const RawManifest, CacheEntry>>,
    hits: Cell<u64>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `raw`, reusing the result of an earlier call on the same `Rc`.
    pub fn validate(&self, raw: &Rc<RawManifest>) -> CachedResult {
        let address = Rc::as_ptr(raw);

        if let Some(entry) = self.entries.borrow().get(&address) {
            if entry.key.strong_count() > 0 {
                self.hits.set(self.hits.get() + 1);
                return entry.result.clone();
            }
        }

        self.sweep();
        let result = self.validator.validate(raw).map(Rc::new);
        self.entries.borrow_mut().insert(
            address,
            CacheEntry {
                key: Rc::downgrade(raw),
                result: result.clone(),
            },
        );
        result
    }

    /// Drop entries whose manifest is no longer referenced.
    pub fn sweep(&self) {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|_, entry| entry.key.strong_count() > 0);
        let dropped = before - entries.len();
        if dropped > 0 {
            debug!("Swept {} stale validation cache entr(ies)", dropped);
        }
    }

    /// Number of live and not-yet-swept entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.get()
    }
}
