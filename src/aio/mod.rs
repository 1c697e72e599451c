//! The [crate::aio] module holds the in-kernel data structures behind linux's `io_setup`,
//! `io_submit`, `io_getevents` and `io_destroy` family of syscalls. It is split into:
//! - The [AioContext], a reference counted async I/O session with fixed capacity completion event
//! storage and a flag recording whether its owning process still holds it.
//! - The [AioContextTable], the per-process growable table that maps small integer [ContextId]s to
//! contexts.
//! - The [EventSlots] embedded in every context, which bound how many requests may be in flight on
//! it at once.
//! - The [AioRequest], the reference an in-flight operation holds on its context.
//!
//! A context can outlive the process that created it: removing it from the table releases it from
//! the task, but requests still in flight keep it alive until they finish. Results produced after
//! that point have nobody to go to and are dropped.

mod config;
mod context;
mod error;
mod event;
mod request;
mod storage;
mod table;

pub use config::{AioConfig, DEFAULT_MAX_EVENTS};
pub use context::{AioContext, ContextId, ContextState, WeakAioContext};
pub use error::{Error, Result};
pub use event::{AioEvent, CompletedEvent, EventSlots};
pub use request::AioRequest;
pub use table::AioContextTable;
