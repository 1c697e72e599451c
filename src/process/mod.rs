//! The process module is the boundary between the [crate::aio] core and whatever emulates
//! processes and dispatches syscalls. It exposes a [Process] handle that shares the process' one and
//! only [crate::aio::AioContextTable] and implements the AIO syscalls on top of it.
//!
//! Callers reach a table through the [Process] they are acting on behalf of, there is no global
//! table.

mod handle;

pub use handle::Process;
