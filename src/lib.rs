//! # libaioctx
//!
//! This is the asynchronous I/O context subsystem of a linux kernel emulation layer. It reproduces
//! the in-kernel bookkeeping behind `io_setup`, `io_submit`, `io_getevents` and `io_destroy`
//! without tying itself to any particular syscall dispatcher. The package is split up into two
//! modules:
//! - [aio] holds the reference counted [AioContext], the per-process [AioContextTable] and the
//! completion event storage the submission and reaping paths work inside of.
//! - [process] holds the [Process] object a syscall layer drives those structures through.
//!
//! A context is shared between the table of the process that created it and every request still
//! in flight on it. Destroying it, or exiting the process, only drops the table's share and marks
//! the context as no longer owned by a task; requests that are still running keep it alive until
//! they finish and their results are quietly discarded.
//!
//! ```
//! use nix::unistd::Pid;
//!
//! use libaioctx::Process;
//!
//! # fn main() -> libaioctx::Result<()> {
//! let process = Process::new(Pid::from_raw(42))?;
//!
//! // io_setup(10, &ctx)
//! let ctx = process.io_setup(10)?;
//!
//! // io_submit(ctx, 1, &reqs), the request is handed off to whatever performs the I/O which
//! // completes it with the result words of the operation.
//! let req = process.io_submit(ctx, 0xDEADBEEF)?;
//! req.complete(23, 0);
//!
//! // io_getevents(ctx, 0, 1, &evt, NULL)
//! let events = process.io_getevents(ctx, 1)?;
//! assert_eq!(events[0].user_data, 0xDEADBEEF);
//! assert_eq!(events[0].res, 23);
//!
//! // io_destroy(ctx)
//! process.io_destroy(ctx)?;
//! # Ok(())
//! # }
//! ```

pub mod aio;
pub mod process;

pub use aio::{
    AioConfig, AioContext, AioContextTable, AioRequest, CompletedEvent, ContextId, Error, Result,
};
pub use process::Process;
