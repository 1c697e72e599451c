use std::{fmt, sync::Arc};

use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::aio::{
    AioConfig, AioContext, AioContextTable, AioRequest, CompletedEvent, ContextId, Error, Result,
};

/// Represents the AIO state of a single emulated process: its [Pid] and its [AioContextTable].
/// The syscall layer calls into this with the IDs user space hands it.
///
/// Cloning a [Process] hands out another handle to the same table, one per thread acting for the
/// process. Once the last handle is dropped, or calls [Process::exit], the table is deleted and
/// every context still in it is released from the task.
#[derive(Clone)]
pub struct Process {
    pid: Pid,
    max_events: u32,
    aio: Arc<AioContextTable>,
}

impl Process {
    /// Create the AIO state for `pid` with the default [AioConfig].
    pub fn new(pid: Pid) -> Result<Process> {
        Process::with_config(pid, &AioConfig::default())
    }

    /// Create the AIO state for `pid` with the given configuration.
    pub fn with_config(pid: Pid, config: &AioConfig) -> Result<Process> {
        let aio = config.create_table()?;
        Ok(Process {
            pid,
            max_events: config.get_max_events(),
            aio: Arc::new(aio),
        })
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// The process' context table.
    pub fn aio(&self) -> &AioContextTable {
        &self.aio
    }

    /// Create a new context with room for `nr_events` events and return its ID, the analog of
    /// `io_setup(nr_events, ctx_idp)`.
    pub fn io_setup(&self, nr_events: u32) -> Result<ContextId> {
        if nr_events == 0 {
            return Err(Error::InvalidArgument("nr_events must be non-zero"));
        }
        if nr_events > self.max_events {
            warn!(pid = %self.pid, nr_events, max_events = self.max_events, "io_setup refused");
            return Err(Error::ResourceExhausted("nr_events exceeds the per context maximum"));
        }

        let ctx = AioContext::new(nr_events, self.pid)?;
        let id = self.aio.insert(&ctx)?;
        ctx.release();

        debug!(pid = %self.pid, %id, nr_events, "io_setup");
        Ok(id)
    }

    /// Destroy the context named by `id`, the analog of `io_destroy(ctx)`.
    pub fn io_destroy(&self, id: ContextId) -> Result<()> {
        self.aio.remove(id)?;
        debug!(pid = %self.pid, %id, "io_destroy");
        Ok(())
    }

    /// Start a single request on the context named by `id`. The returned [AioRequest] is handed to
    /// whatever performs the I/O, which completes it once the operation finishes.
    pub fn io_submit(&self, id: ContextId, user_data: u64) -> Result<AioRequest> {
        let ctx = self.aio.get(id)?;
        AioRequest::begin(&ctx, user_data)
    }

    /// Reap up to `max` completed events from the context named by `id`. This never waits, if
    /// nothing has completed yet the result is empty.
    pub fn io_getevents(&self, id: ContextId, max: usize) -> Result<Vec<CompletedEvent>> {
        let ctx = self.aio.get(id)?;
        let events = ctx.lock().events_mut().reap(max);
        Ok(events)
    }

    /// Give up this handle on the process' AIO state, tearing it down if no other handle is left.
    /// Returns true if the table was deleted.
    pub fn exit(self) -> bool {
        match Arc::try_unwrap(self.aio) {
            Ok(aio) => {
                debug!(pid = %self.pid, "process exiting");
                aio.delete();
                true
            }
            Err(_) => {
                debug!(pid = %self.pid, "process handle dropped, other handles remain");
                false
            }
        }
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("aio", &self.aio)
            .finish()
    }
}
