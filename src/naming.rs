//! Unique name registry.
//!
//! Every generated graph node and optimizer gets a name of the form
//! `base_N`, where `N` counts calls for that base starting at 1. The
//! registry lives behind a mutex so graphs can be built from several
//! threads at once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Thread-safe `base → count` map.
#[derive(Debug, Default)]
pub struct NameRegistry {
    counters: Mutex<HashMap<String, u64>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh shared registry, for callers that want isolation from the
    /// process-wide one.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The process-wide registry. Created on first use, never reset.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<NameRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(NameRegistry::shared).clone()
    }

    /// Next name for `base`: `base_1`, `base_2`, ...
    ///
    /// Trailing underscores on `base` are dropped before counting, so
    /// `"lstm_"` and `"lstm"` share one counter.
    pub fn unique_name(&self, base: &str) -> String {
        let base = base.trim_end_matches('_');
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let count = counters.entry(base.to_string()).or_insert(0);
        *count += 1;
        format!("{}_{}", base, count)
    }

    /// How many names have been handed out for `base`.
    pub fn count(&self, base: &str) -> u64 {
        let counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        counters
            .get(base.trim_end_matches('_'))
            .copied()
            .unwrap_or(0)
    }
}
