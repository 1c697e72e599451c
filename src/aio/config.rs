use std::fmt;

use super::{AioContextTable, Result};

/// The default upper bound on the number of events a single context may be set up with, this
/// mirrors the default of linux's `fs.aio-max-nr`.
pub const DEFAULT_MAX_EVENTS: u32 = 65536;

/// AIO configuration for a process.
///
/// ```
/// use libaioctx::AioConfig;
///
/// let table = AioConfig::new()
///     .initial_contexts(4)
///     .max_contexts(128)
///     .create_table()
///     .unwrap();
/// assert_eq!(table.capacity(), 4);
/// ```
#[derive(Clone)]
pub struct AioConfig {
    initial_contexts: u32,
    max_contexts: u32,
    max_events: u32,
}

impl AioConfig {
    /// Create a default configuration.
    ///
    /// See the other methods on this type for details on the defaults.
    pub fn new() -> Self {
        Self {
            initial_contexts: 0,
            max_contexts: u32::MAX,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }

    /// Set the number of context slots a new table starts out with.
    ///
    /// By default tables start empty and grow on the first insert.
    pub fn initial_contexts(&mut self, capacity: u32) -> &mut Self {
        self.initial_contexts = capacity;
        self
    }

    /// Set the maximum number of context slots a table may grow to.
    ///
    /// By default this is only bounded by the largest table that can be allocated, which keeps
    /// every context ID inside the positive `i32` range.
    pub fn max_contexts(&mut self, capacity: u32) -> &mut Self {
        self.max_contexts = capacity;
        self
    }

    /// Set the maximum number of events a single context may be set up with.
    ///
    /// By default this is [DEFAULT_MAX_EVENTS].
    pub fn max_events(&mut self, events: u32) -> &mut Self {
        self.max_events = events;
        self
    }

    pub fn get_initial_contexts(&self) -> u32 {
        self.initial_contexts
    }

    pub fn get_max_contexts(&self) -> u32 {
        self.max_contexts
    }

    pub fn get_max_events(&self) -> u32 {
        self.max_events
    }

    /// Create an [AioContextTable] with the given configuration.
    pub fn create_table(&self) -> Result<AioContextTable> {
        AioContextTable::with_limit(self.initial_contexts, self.max_contexts)
    }
}

impl Default for AioConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AioConfig")
            .field("initial_contexts", &self.initial_contexts)
            .field("max_contexts", &self.max_contexts)
            .field("max_events", &self.max_events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AioConfig::default();
        assert_eq!(config.get_initial_contexts(), 0);
        assert_eq!(config.get_max_contexts(), u32::MAX);
        assert_eq!(config.get_max_events(), DEFAULT_MAX_EVENTS);

        let table = config.create_table().unwrap();
        assert_eq!(table.capacity(), 0);
    }

    #[test]
    fn test_create_table() {
        let table = AioConfig::new()
            .initial_contexts(2)
            .max_contexts(3)
            .create_table()
            .unwrap();
        assert_eq!(table.capacity(), 2);
        assert_eq!(table.limit(), 3);
    }

    #[test]
    fn test_create_table_initial_beyond_max() {
        assert!(AioConfig::new()
            .initial_contexts(4)
            .max_contexts(2)
            .create_table()
            .is_err());
    }
}
