//! Corpus snapshots and live list sources.
//!
//! A [`Corpus`] is an immutable, cheaply clonable view of the strings a run
//! searches, together with the workload threshold sized for it. Rebuilding
//! from typed elements is all-or-nothing: if any conversion fails the caller
//! keeps whatever corpus it had.
//!
//! [`ObservableList`] is the live source: every structural change notifies
//! its listeners with the new contents.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::workload_threshold;
use crate::interface::TypeAheadError;

#[derive(Debug, Clone)]
pub struct Corpus {
    strings: Arc<[String]>,
    threshold: usize,
}

impl Corpus {
    pub fn new(strings: Vec<String>, parallelism: usize) -> Self {
        let threshold = workload_threshold(strings.len(), parallelism);
        Self {
            strings: strings.into(),
            threshold,
        }
    }

    pub fn empty(parallelism: usize) -> Self {
        Self::new(Vec::new(), parallelism)
    }

    /// Convert every element; the first failure aborts the whole rebuild.
    pub fn convert<T, F, E>(items: &[T], parallelism: usize, converter: F) -> Result<Self, TypeAheadError>
    where
        F: Fn(&T) -> Result<String, E>,
        E: Display,
    {
        let strings = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                converter(item).map_err(|e| TypeAheadError::Conversion {
                    index,
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(strings, parallelism))
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    /// Shared handle to the strings, for a run to hold onto
    pub fn strings(&self) -> Arc<[String]> {
        Arc::clone(&self.strings)
    }
}

type Listener<T> = Arc<dyn Fn(&[T]) -> bool + Send + Sync>;

/// A list that tells its subscribers about every structural change.
///
/// Listeners receive the full contents after each mutation and return
/// `false` to unsubscribe. They run on the mutating thread, after the write
/// lock is released, and may read the list or subscribe others. A listener
/// must not mutate the list it is observing: the contents stay read-locked
/// while listeners run. Out-of-range `remove` and `set` change nothing and
/// notify no one.
pub struct ObservableList<T> {
    items: RwLock<Vec<T>>,
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    next_listener: AtomicU64,
}

impl<T> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> ObservableList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    // Reads are recursive because listeners run with the contents read-locked.

    pub fn len(&self) -> usize {
        self.items.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read_recursive().is_empty()
    }

    /// Run `f` against the current contents without notifying anyone
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.items.read_recursive())
    }

    /// Register a listener and immediately call it with the current contents.
    pub fn subscribe<F>(&self, listener: F) -> u64
    where
        F: Fn(&[T]) -> bool + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        let keep = self.with_items(|items| listener(items));
        if keep {
            self.listeners.lock().push((id, Arc::new(listener)));
        }
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.listeners.lock().retain(|(listener_id, _)| *listener_id != id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn push(&self, item: T) {
        self.mutate(|items| items.push(item));
    }

    pub fn insert(&self, index: usize, item: T) {
        self.mutate(|items| items.insert(index.min(items.len()), item));
    }

    pub fn remove(&self, index: usize) -> Option<T> {
        self.mutate_if(|items| (index < items.len()).then(|| items.remove(index)))
    }

    pub fn set(&self, index: usize, item: T) -> Option<T> {
        self.mutate_if(|items| items.get_mut(index).map(|slot| std::mem::replace(slot, item)))
    }

    pub fn replace_all(&self, new_items: Vec<T>) {
        self.mutate(|items| *items = new_items);
    }

    pub fn clear(&self) {
        self.mutate(Vec::clear);
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let result = f(&mut self.items.write());
        self.notify();
        result
    }

    /// Like `mutate`, but only notifies when `f` reports a change.
    fn mutate_if<R>(&self, f: impl FnOnce(&mut Vec<T>) -> Option<R>) -> Option<R> {
        let result = f(&mut self.items.write());
        if result.is_some() {
            self.notify();
        }
        result
    }

    fn notify(&self) {
        // Snapshot so listeners can subscribe without re-entering the mutex.
        let listeners = self.listeners.lock().clone();
        let items = self.items.read_recursive();
        let finished: Vec<u64> = listeners
            .iter()
            .filter(|(_, listener)| !listener(&items))
            .map(|(id, _)| *id)
            .collect();
        drop(items);

        if !finished.is_empty() {
            self.listeners.lock().retain(|(id, _)| !finished.contains(id));
        }
    }
}
