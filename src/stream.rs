//! Last-value-wins push streams.
//!
//! Sensor and location callbacks arrive asynchronously from platform sources.
//! Only the most recent value is ever meaningful, so nothing is queued: a
//! [`Latest`] cell is overwritten by its single writer and read by any number
//! of consumers, and a [`Feed`] pushes values straight into subscribed sinks.
use std::{
    cell::RefCell,
    sync::{
        Arc, Mutex, MutexGuard, RwLock,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

/// A shared cell holding the most recent value of a stream.
///
/// Cloning a `Latest` yields another handle onto the same cell.
#[derive(Debug)]
pub struct Latest<T> {
    inner: Arc<LatestInner<T>>,
}

#[derive(Debug)]
struct LatestInner<T> {
    value: RwLock<Option<T>>,
    version: AtomicU64,
}

impl<T> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(LatestInner {
                value: RwLock::new(None),
                version: AtomicU64::new(0),
            }),
        }
    }
}

impl<T: Clone> Latest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current value.
    pub fn publish(&self, value: T) {
        // A poisoned lock only means a reader panicked; the value is still whole.
        let mut guard = self.inner.value.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(value);
        self.inner.version.fetch_add(1, Ordering::Release);
    }

    /// Returns a copy of the current value, or `None` if nothing has been
    /// published yet.
    pub fn get(&self) -> Option<T> {
        self.inner
            .value
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of values published so far.
    ///
    /// Consumers compare versions to tell whether anything changed since
    /// their last read.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Drops the current value.
    pub fn clear(&self) {
        let mut guard = self.inner.value.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        self.inner.version.fetch_add(1, Ordering::Release);
    }
}

/// A handle to an active subscription.
///
/// The sink stops receiving values once the handle is cancelled or dropped.
#[must_use = "dropping a Subscription cancels it"]
#[derive(Debug)]
pub struct Subscription {
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// Creates a subscription together with the token the source checks
    /// before every delivery.
    pub fn new() -> (Self, SubscriptionToken) {
        let active = Arc::new(AtomicBool::new(true));
        (
            Self {
                active: Arc::clone(&active),
            },
            SubscriptionToken { active },
        )
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stops delivery. Once this returns no new callback starts; a value
    /// already being delivered on another thread may still complete.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Source side of a [`Subscription`].
#[derive(Clone, Debug)]
pub struct SubscriptionToken {
    active: Arc<AtomicBool>,
}

impl SubscriptionToken {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

pub type Sink<T> = Box<dyn FnMut(T) + Send>;

static NEXT_SINK_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// Sinks currently running on this thread.
    static DELIVERING: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

struct Entry<T> {
    id: u64,
    token: SubscriptionToken,
    sink: Mutex<Sink<T>>,
}

/// Marks a sink as running on this thread until dropped, also on unwind.
struct Delivering(u64);

impl Delivering {
    fn enter(id: u64) -> Option<Self> {
        DELIVERING.with(|running| {
            let mut running = running.borrow_mut();
            match running.contains(&id) {
                true => None,
                false => {
                    running.push(id);
                    Some(Self(id))
                }
            }
        })
    }
}

impl Drop for Delivering {
    fn drop(&mut self) {
        DELIVERING.with(|running| running.borrow_mut().retain(|&id| id != self.0));
    }
}

/// An in-process push source.
///
/// Platform glue forwards callbacks into [`Feed::push`]; consumers attach
/// with [`Feed::subscribe`]. Sinks run without the subscriber list locked,
/// so a sink may push to, subscribe to or inspect its own feed. A value
/// pushed from inside a sink reaches every other sink but not the one
/// pushing it.
pub struct Feed<T> {
    entries: Arc<Mutex<Vec<Arc<Entry<T>>>>>,
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> Feed<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `sink`; it receives every value pushed while the returned
    /// subscription is active.
    pub fn subscribe(&self, sink: Sink<T>) -> Subscription {
        let (subscription, token) = Subscription::new();
        let entry = Entry {
            id: NEXT_SINK_ID.fetch_add(1, Ordering::Relaxed),
            token,
            sink: Mutex::new(sink),
        };
        self.live_entries().push(Arc::new(entry));
        subscription
    }

    /// Delivers `value` to every active sink and forgets cancelled ones.
    pub fn push(&self, value: T) {
        let entries = self.live_entries().clone();

        for entry in entries {
            if !entry.token.is_active() {
                continue;
            }

            let Some(_delivering) = Delivering::enter(entry.id) else {
                log::trace!("skipping nested delivery to sink {}", entry.id);
                continue;
            };

            let mut sink = entry.sink.lock().unwrap_or_else(|e| e.into_inner());
            (*sink)(value.clone());
        }
    }

    /// Number of sinks that are still attached.
    pub fn subscriber_count(&self) -> usize {
        self.live_entries().len()
    }

    /// Locks the subscriber list after dropping cancelled entries.
    fn live_entries(&self) -> MutexGuard<'_, Vec<Arc<Entry<T>>>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|entry| entry.token.is_active());
        entries
    }
}
