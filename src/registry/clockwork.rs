//! Running clockwork jobs, one per origin

use parking_lot::Mutex;
use std::collections::HashMap;
use crate::core::clockwork::ClockworkHandle;
use crate::core::module::Origin;

#[derive(Default)]
pub struct ClockworkRegistry {
    tasks: Mutex<HashMap<Origin, ClockworkHandle>>,
}

impl ClockworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `handle` for `origin`, cancelling any job it replaces.
    pub fn register(&self, origin: &Origin, handle: ClockworkHandle) {
        let replaced = self.tasks.lock().insert(origin.clone(), handle);
        if let Some(mut previous) = replaced {
            tracing::warn!(origin = %origin, "replacing running clockwork");
            previous.cancel();
        }
    }

    /// Cancel the job owned by `origin`. Returns whether one was running.
    pub fn unload(&self, origin: &Origin) -> bool {
        let removed = self.tasks.lock().remove(origin);
        match removed {
            Some(mut handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, origin: &Origin) -> bool {
        self.tasks.lock().contains_key(origin)
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let drained: Vec<_> = self.tasks.lock().drain().collect();
        for (origin, mut handle) in drained {
            tracing::debug!(origin = %origin, "cancelling clockwork");
            handle.cancel();
        }
    }
}
