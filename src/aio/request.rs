use std::fmt;

use tracing::debug;

use super::{AioContext, Error, Result};

/// Represents a single in-flight operation against an [AioContext]. While it exists it holds its
/// own reference to the context and one claimed completion event slot, so the context outlives the
/// operation even if the owning process destroys it in the meantime.
///
/// The operation is finished with [AioRequest::complete]. Dropping a request that was never
/// completed cancels it, freeing its slot without delivering anything.
pub struct AioRequest {
    ctx: Option<AioContext>,
    slot: usize,
    user_data: u64,
}

impl AioRequest {
    /// Retain `ctx` and claim a completion slot tagged with `user_data`. Fails with
    /// [Error::EventsExhausted] when every slot is already in use, or [Error::InvalidArgument]
    /// when the context was already released from its task. Either way the reference taken here
    /// is released again before returning.
    pub fn begin(ctx: &AioContext, user_data: u64) -> Result<AioRequest> {
        let ctx = ctx.retain();
        let slot = {
            let mut state = ctx.lock();
            if !state.is_owned_by_task() {
                debug!(user_data, "refusing request on released AIO context");
                return Err(Error::InvalidArgument("context released from its task"));
            }
            state.events_mut().claim(user_data)?
        };

        Ok(AioRequest {
            ctx: Some(ctx),
            slot,
            user_data,
        })
    }

    /// The completion slot this request will report into.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn user_data(&self) -> u64 {
        self.user_data
    }

    pub fn context(&self) -> Option<&AioContext> {
        self.ctx.as_ref()
    }

    /// Record the result of the operation and release the request's context reference.
    ///
    /// Returns true if the result was stored for the owning process to reap, or false if the
    /// context was already released from its task, in which case the result is discarded.
    pub fn complete(mut self, res: i64, res2: i64) -> bool {
        let ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => return false,
        };

        let delivered = {
            let mut state = ctx.lock();
            if state.is_owned_by_task() {
                state.events_mut().complete(self.slot, [res, res2])
            } else {
                state.events_mut().cancel(self.slot);
                false
            }
        };

        if !delivered {
            debug!(
                user_data = self.user_data,
                slot = self.slot,
                res,
                "discarding completion for released AIO context"
            );
        }

        ctx.release();
        delivered
    }
}

impl Drop for AioRequest {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            ctx.lock().events_mut().cancel(self.slot);
            ctx.release();
        }
    }
}

impl fmt::Debug for AioRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AioRequest")
            .field("slot", &self.slot)
            .field("user_data", &self.user_data)
            .finish()
    }
}
