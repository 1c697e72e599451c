use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, Weak},
};

use nix::unistd::Pid;
use tracing::{debug, trace};

use super::{EventSlots, Result};

/// The integer handle a process uses to name one of its AIO contexts. This is the index of the
/// context inside the process' [super::AioContextTable], and it is what `io_setup` hands back to
/// user space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u32);

impl ContextId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for ContextId {
    fn from(value: u32) -> Self {
        ContextId(value)
    }
}

impl From<ContextId> for u32 {
    fn from(value: ContextId) -> Self {
        value.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lock guarded half of an [AioContext].
#[derive(Debug)]
pub struct ContextState {
    owner: Option<Pid>,
    events: EventSlots,
}

impl ContextState {
    pub fn is_owned_by_task(&self) -> bool {
        self.owner.is_some()
    }

    /// The owning process, only present while the context is still owned by a task.
    pub fn pid(&self) -> Option<Pid> {
        self.owner
    }

    pub fn events(&self) -> &EventSlots {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventSlots {
        &mut self.events
    }
}

struct Inner {
    events_capacity: u32,
    state: Mutex<ContextState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        debug!(
            events_capacity = self.events_capacity,
            "destroying AIO context"
        );
    }
}

/// A shared, reference counted handle to a single AIO context.
///
/// Every live [AioContext] value is one reference: the owning process holds one through its
/// [super::AioContextTable] and every in-flight [super::AioRequest] holds another. Cloning the
/// handle via [AioContext::retain] adds a reference and dropping it or calling
/// [AioContext::release] removes one. The event storage is freed exactly once, by whichever holder
/// lets go of the last reference.
///
/// Once the owning process lets go of the context, via [AioContext::release_from_task], the context
/// is no longer owned by any task. It stays alive while requests are still draining but any result
/// those requests produce is discarded.
pub struct AioContext {
    inner: Arc<Inner>,
}

impl AioContext {
    /// Create a new context owned by `pid` with room for `events_capacity` simultaneous events.
    /// The returned handle is the only reference to the context.
    pub fn new(events_capacity: u32, pid: Pid) -> Result<AioContext> {
        let events = EventSlots::new(events_capacity)?;
        let inner = Arc::new(Inner {
            events_capacity,
            state: Mutex::new(ContextState {
                owner: Some(pid),
                events,
            }),
        });

        debug!(events_capacity, %pid, "created AIO context");
        Ok(AioContext { inner })
    }

    /// Take an additional reference to this context.
    pub fn retain(&self) -> AioContext {
        let ctx = AioContext {
            inner: self.inner.clone(),
        };
        trace!(refcount = ctx.refcount(), "retained AIO context");
        ctx
    }

    /// [AioContext::retain] for callers that may not have a context at all.
    pub fn retain_opt(ctx: Option<&AioContext>) -> Option<AioContext> {
        ctx.map(AioContext::retain)
    }

    /// Give up this reference. If it was the last one the context is destroyed.
    pub fn release(self) {
        trace!(refcount = self.refcount() - 1, "releasing AIO context");
        drop(self);
    }

    /// [AioContext::release] for callers that may not have a context at all.
    pub fn release_opt(ctx: Option<AioContext>) {
        if let Some(ctx) = ctx {
            ctx.release();
        }
    }

    /// Disown the context from its process and give up the process' reference.
    ///
    /// This is an implicit cancellation of everything on the context from the owner's point of
    /// view: completed events that were never reaped are thrown away, and requests that are still
    /// in flight keep the context alive but have their results discarded when they finish.
    pub fn release_from_task(self) {
        {
            let mut state = self.lock();
            let pid = state.owner.take();
            let discarded = state.events.discard_completed();
            debug!(
                ?pid,
                discarded,
                pending = state.events.in_use(),
                "released AIO context from task"
            );
        }
        self.release();
    }

    /// Lock the context, giving access to its ownership state and event slots.
    pub fn lock(&self) -> MutexGuard<'_, ContextState> {
        self.inner
            .state
            .lock()
            .expect("Failed to take lock on AIO context: poisoned")
    }

    pub fn events_capacity(&self) -> u32 {
        self.inner.events_capacity
    }

    pub fn is_owned_by_task(&self) -> bool {
        self.lock().is_owned_by_task()
    }

    pub fn pid(&self) -> Option<Pid> {
        self.lock().pid()
    }

    /// The number of outstanding references, including this one.
    pub fn refcount(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Create a non owning observer of this context.
    pub fn downgrade(&self) -> WeakAioContext {
        WeakAioContext {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same context.
    pub fn ptr_eq(&self, other: &AioContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for AioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AioContext")
            .field("refcount", &self.refcount())
            .field("events_capacity", &self.events_capacity())
            .finish()
    }
}

/// A non owning observer of an [AioContext]. It does not keep the context alive.
#[derive(Clone)]
pub struct WeakAioContext {
    inner: Weak<Inner>,
}

impl WeakAioContext {
    /// Take a new reference to the context if it hasn't been destroyed yet.
    pub fn upgrade(&self) -> Option<AioContext> {
        self.inner.upgrade().map(|inner| AioContext { inner })
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.strong_count() == 0
    }
}

impl fmt::Debug for WeakAioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakAioContext")
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
