use std::{
    cmp, fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::{debug, warn};

use super::{storage, AioContext, ContextId, Error, Result};

type Slots = Vec<Option<AioContext>>;

/// The per-process table of AIO contexts, indexed by [ContextId].
///
/// Each occupied slot holds the process' reference to its context. The table only ever grows, so
/// an ID handed out by [AioContextTable::insert] keeps naming the same slot until it is removed,
/// after which the slot may be reused by a later insert. Dropping the table, or calling
/// [AioContextTable::delete], releases every context still in it from the task.
pub struct AioContextTable {
    limit: usize,
    slots: Mutex<Slots>,
}

impl AioContextTable {
    /// Create a new table with `capacity` empty slots. A capacity of zero is fine, the table will
    /// grow on the first insert.
    pub fn new(capacity: u32) -> Result<AioContextTable> {
        AioContextTable::with_limit(capacity, u32::MAX)
    }

    /// Create a new table with `capacity` empty slots that will never grow past `max_capacity`
    /// slots.
    pub fn with_limit(capacity: u32, max_capacity: u32) -> Result<AioContextTable> {
        let limit = cmp::min(max_capacity as usize, storage::max_count::<Option<AioContext>>());
        if capacity as usize > limit {
            return Err(Error::ResourceExhausted(
                "initial capacity exceeds context table limit",
            ));
        }

        // Not shared with anyone yet, so no lock needed to size it.
        let mut slots = Slots::new();
        ensure_capacity(&mut slots, capacity as usize)?;

        Ok(AioContextTable {
            limit,
            slots: Mutex::new(slots),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots
            .lock()
            .expect("Failed to take lock on AIO context table: poisoned")
    }

    /// The current number of slots, occupied or not.
    pub fn capacity(&self) -> u32 {
        self.lock().len() as u32
    }

    /// The number of slots the table may grow to.
    pub fn limit(&self) -> u32 {
        self.limit as u32
    }

    /// The number of occupied slots.
    pub fn len(&self) -> usize {
        self.lock().iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().iter().all(Option::is_none)
    }

    /// Grow the table to at least `capacity` slots. Requests to shrink are ignored, and on failure
    /// the table is left exactly as it was.
    pub fn ensure_capacity(&self, capacity: u32) -> Result<()> {
        if capacity as usize > self.limit {
            return Err(Error::ResourceExhausted("context table limit reached"));
        }
        ensure_capacity(&mut self.lock(), capacity as usize)
    }

    /// Insert `ctx` into the first free slot, growing the table if there is none, and return the
    /// slot's index as the context's ID. The table takes its own reference to the context.
    pub fn insert(&self, ctx: &AioContext) -> Result<ContextId> {
        let mut slots = self.lock();

        let index = match slots.iter().position(Option::is_none) {
            Some(index) => index,
            None => {
                let capacity = slots.len();
                if capacity >= self.limit {
                    warn!(capacity, "AIO context table is full");
                    return Err(Error::ResourceExhausted("context table limit reached"));
                }

                let grown = cmp::max(capacity.saturating_mul(2), capacity + 1);
                ensure_capacity(&mut slots, cmp::min(grown, self.limit))?;
                capacity
            }
        };

        slots[index] = Some(ctx.retain());
        Ok(ContextId::from(index as u32))
    }

    /// Look up the context stored at `id`, returning a new reference to it.
    pub fn get(&self, id: ContextId) -> Result<AioContext> {
        match self.lock().get(id.index()) {
            Some(Some(ctx)) => Ok(ctx.retain()),
            _ => Err(Error::InvalidHandle(id.into())),
        }
    }

    /// Remove the context stored at `id` and release it from the task. Any requests still in
    /// flight on it keep it alive until they finish, but their results are discarded.
    pub fn remove(&self, id: ContextId) -> Result<()> {
        let ctx = self.lock().get_mut(id.index()).and_then(Option::take);

        match ctx {
            Some(ctx) => {
                ctx.release_from_task();
                Ok(())
            }
            None => {
                debug!(%id, "refusing to remove unknown AIO context");
                Err(Error::InvalidHandle(id.into()))
            }
        }
    }

    /// Tear the table down, releasing every remaining context from the task. This is what
    /// happens when the owning process exits.
    pub fn delete(self) {
        debug!(remaining = self.len(), "deleting AIO context table");
    }
}

impl Drop for AioContextTable {
    fn drop(&mut self) {
        let slots = self
            .slots
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);

        for ctx in slots.drain(..).flatten() {
            ctx.release_from_task();
        }
    }
}

impl fmt::Debug for AioContextTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AioContextTable")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("limit", &self.limit)
            .finish()
    }
}

fn ensure_capacity(slots: &mut Slots, capacity: usize) -> Result<()> {
    let old = slots.len();
    if old >= capacity {
        return Ok(());
    }

    storage::try_grow(slots, capacity)?;
    debug!(old, new = capacity, "grew AIO context table");
    Ok(())
}
